//! DP engine seam.
//!
//! The scheduler treats the alignment recurrence as a collaborator: anything
//! implementing [`DpEngine`] can be driven by scalar or vectorized workers.
//! [`AffineGapEngine`] is the built-in local (Smith-Waterman/Gotoh) engine with
//! a scalar path and a lockstep Structure-of-Arrays lane path. The lane path is
//! written so the inner per-lane loop autovectorizes; both paths produce
//! identical results, including which cell wins a score tie (the first maximum
//! in row-major order over `v` then `h`).

use super::types::{AlignmentResult, LaneJob, ScoringScheme};
use super::workspace::{BatchWorkspace, NEG_INF, with_scalar_rows};
use crate::compute::simd::{SimdEngineType, detect_optimal_simd_engine, i32_lane_count};
use crate::error::AlignError;

/// A pairwise DP computation primitive.
pub trait DpEngine: Send + Sync + 'static {
    /// Align one pair.
    fn compute(
        &self,
        h: &[u8],
        v: &[u8],
        scoring: &ScoringScheme,
    ) -> Result<AlignmentResult, AlignError>;

    /// Align a group of pairs as one vectorized step, one result per lane in
    /// input order. The default runs each lane through [`DpEngine::compute`].
    fn compute_lanes(
        &self,
        lanes: &[LaneJob<'_>],
        workspace: &mut BatchWorkspace,
    ) -> Vec<Result<AlignmentResult, AlignError>> {
        let _ = workspace;
        lanes
            .iter()
            .map(|job| self.compute(job.h, job.v, job.scoring))
            .collect()
    }
}

/// Local alignment with affine gaps.
#[derive(Debug, Clone, Copy)]
pub struct AffineGapEngine {
    lane_width: usize,
}

impl Default for AffineGapEngine {
    fn default() -> Self {
        Self::for_simd_engine(detect_optimal_simd_engine())
    }
}

impl AffineGapEngine {
    /// Engine whose lane path processes `lane_width` pairs per pass.
    pub fn new(lane_width: usize) -> Self {
        Self {
            lane_width: lane_width.max(1),
        }
    }

    /// Engine sized to the i32 lane count of `engine`.
    pub fn for_simd_engine(engine: SimdEngineType) -> Self {
        Self::new(i32_lane_count(engine))
    }

    pub fn lane_width(&self) -> usize {
        self.lane_width
    }

    /// Lockstep pass over at most `lane_width` jobs; idle lanes are padding.
    fn compute_pass(
        &self,
        jobs: &[LaneJob<'_>],
        ws: &mut BatchWorkspace,
        out: &mut Vec<Result<AlignmentResult, AlignError>>,
    ) {
        let lanes = self.lane_width;
        debug_assert!(jobs.len() <= lanes);

        // Lanes that fail validation stay idle and report their own error.
        let verdicts: Vec<Result<(), AlignError>> = jobs
            .iter()
            .map(|job| {
                job.scoring.validate()?;
                job.scoring.check_score_range(job.h.len(), job.v.len())
            })
            .collect();

        let (max_h, max_v) = jobs
            .iter()
            .zip(&verdicts)
            .filter(|(_, ok)| ok.is_ok())
            .fold((0, 0), |(mh, mv), (job, _)| {
                (mh.max(job.h.len()), mv.max(job.v.len()))
            });

        ws.prepare(lanes, max_h, max_v);

        for (lane, (job, verdict)) in jobs.iter().zip(&verdicts).enumerate() {
            if verdict.is_err() {
                continue;
            }
            ws.h_len[lane] = job.h.len();
            ws.v_len[lane] = job.v.len();
            ws.match_score[lane] = job.scoring.match_score;
            ws.mismatch_penalty[lane] = job.scoring.mismatch_penalty;
            ws.gap_open_extend[lane] = job.scoring.gap_open_extend();
            ws.gap_extend[lane] = job.scoring.gap_extend;
            for (pos, &base) in job.h.iter().enumerate() {
                ws.h_soa[pos * lanes + lane] = base;
            }
            for (pos, &base) in job.v.iter().enumerate() {
                ws.v_soa[pos * lanes + lane] = base;
            }
        }

        fill_lanes(ws);

        for (lane, verdict) in verdicts.into_iter().enumerate() {
            out.push(verdict.map(|()| AlignmentResult {
                score: ws.best[lane],
                h_end: ws.best_h[lane],
                v_end: ws.best_v[lane],
            }));
        }
    }
}

impl DpEngine for AffineGapEngine {
    fn compute(
        &self,
        h: &[u8],
        v: &[u8],
        scoring: &ScoringScheme,
    ) -> Result<AlignmentResult, AlignError> {
        scoring.validate()?;
        scoring.check_score_range(h.len(), v.len())?;
        Ok(with_scalar_rows(|rows| {
            rows.reset(h.len());
            scalar_local_affine(h, v, scoring, &mut rows.h, &mut rows.f)
        }))
    }

    fn compute_lanes(
        &self,
        lanes: &[LaneJob<'_>],
        workspace: &mut BatchWorkspace,
    ) -> Vec<Result<AlignmentResult, AlignError>> {
        let mut out = Vec::with_capacity(lanes.len());
        for pass in lanes.chunks(self.lane_width) {
            self.compute_pass(pass, workspace, &mut out);
        }
        out
    }
}

/// Scalar Gotoh recurrence over prepared rows (`h` zeroed, `f` at `NEG_INF`).
fn scalar_local_affine(
    h: &[u8],
    v: &[u8],
    scoring: &ScoringScheme,
    h_row: &mut [i32],
    f_row: &mut [i32],
) -> AlignmentResult {
    let oe = scoring.gap_open_extend();
    let ge = scoring.gap_extend;
    let mut best = AlignmentResult::default();

    for (i, &vb) in v.iter().enumerate() {
        let mut diag = 0;
        let mut h_left = 0;
        let mut e = NEG_INF;
        for (j, &hb) in h.iter().enumerate() {
            let col = j + 1;
            e = (h_left - oe).max(e - ge);
            let f = (h_row[col] - oe).max(f_row[col] - ge);
            f_row[col] = f;
            let s = if vb == hb {
                scoring.match_score
            } else {
                -scoring.mismatch_penalty
            };
            let cell = (diag + s).max(0).max(e).max(f);
            diag = h_row[col];
            h_row[col] = cell;
            h_left = cell;
            if cell > best.score {
                best = AlignmentResult {
                    score: cell,
                    h_end: col,
                    v_end: i + 1,
                };
            }
        }
    }
    best
}

/// Lockstep recurrence over all lanes of a prepared workspace.
fn fill_lanes(ws: &mut BatchWorkspace) {
    let BatchWorkspace {
        lanes,
        max_h,
        max_v,
        h_soa,
        v_soa,
        h_row,
        f_row,
        diag,
        h_left,
        e,
        h_len,
        v_len,
        match_score,
        mismatch_penalty,
        gap_open_extend,
        gap_extend,
        best,
        best_h,
        best_v,
    } = ws;
    let lanes = *lanes;

    for i in 1..=*max_v {
        diag.fill(0);
        h_left.fill(0);
        e.fill(NEG_INF);
        let v_base = &v_soa[(i - 1) * lanes..i * lanes];

        for j in 1..=*max_h {
            let h_base = &h_soa[(j - 1) * lanes..j * lanes];
            let row = j * lanes;

            for l in 0..lanes {
                if i > v_len[l] || j > h_len[l] {
                    continue;
                }
                let e_new = (h_left[l] - gap_open_extend[l]).max(e[l] - gap_extend[l]);
                let f_new = (h_row[row + l] - gap_open_extend[l]).max(f_row[row + l] - gap_extend[l]);
                let s = if v_base[l] == h_base[l] {
                    match_score[l]
                } else {
                    -mismatch_penalty[l]
                };
                let cell = (diag[l] + s).max(0).max(e_new).max(f_new);

                e[l] = e_new;
                f_row[row + l] = f_new;
                diag[l] = h_row[row + l];
                h_row[row + l] = cell;
                h_left[l] = cell;

                if cell > best[l] {
                    best[l] = cell;
                    best_h[l] = j;
                    best_v[l] = i;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn align(h: &[u8], v: &[u8]) -> AlignmentResult {
        AffineGapEngine::new(4)
            .compute(h, v, &ScoringScheme::default())
            .unwrap()
    }

    #[test]
    fn test_identical_sequences_score_full_length() {
        let r = align(b"ACGTACGT", b"ACGTACGT");
        assert_eq!(r, AlignmentResult { score: 8, h_end: 8, v_end: 8 });
    }

    #[test]
    fn test_disjoint_sequences_score_zero() {
        let r = align(b"AAAA", b"TTTT");
        assert_eq!(r, AlignmentResult::default());
    }

    #[test]
    fn test_empty_sequence_scores_zero() {
        assert_eq!(align(b"", b"ACGT"), AlignmentResult::default());
        assert_eq!(align(b"ACGT", b""), AlignmentResult::default());
    }

    #[test]
    fn test_local_alignment_finds_embedded_match() {
        // "GATTACA" sits at h[3..10] and v[2..9]
        let r = align(b"CCCGATTACACC", b"TTGATTACATT");
        assert_eq!(r.score, 7);
        assert_eq!(r.h_end, 10);
        assert_eq!(r.v_end, 9);
    }

    #[test]
    fn test_affine_gap_in_both_directions() {
        // Two extra bases in h: 20 - (6 + 2) + 20 beats any ungapped path.
        let mut h = vec![b'A'; 20];
        h.extend_from_slice(b"GG");
        h.extend(std::iter::repeat(b'C').take(20));
        let mut v = vec![b'A'; 20];
        v.extend(std::iter::repeat(b'C').take(20));

        let r = align(&h, &v);
        assert_eq!(r, AlignmentResult { score: 32, h_end: 42, v_end: 40 });

        let r = align(&v, &h);
        assert_eq!(r, AlignmentResult { score: 32, h_end: 40, v_end: 42 });
    }

    #[test]
    fn test_invalid_scoring_is_an_error() {
        let engine = AffineGapEngine::new(4);
        let bad = ScoringScheme::new(0, 4, 6, 1);
        assert!(matches!(
            engine.compute(b"ACGT", b"ACGT", &bad),
            Err(AlignError::InvalidScoring(_))
        ));
    }

    #[test]
    fn test_lane_path_matches_scalar_with_padding_and_bad_lane() {
        let engine = AffineGapEngine::new(4);
        let good = ScoringScheme::default();
        let generous = ScoringScheme::new(2, 3, 5, 2);
        let bad = ScoringScheme::new(1, -3, 6, 1);
        let pairs: [(&[u8], &[u8], &ScoringScheme); 6] = [
            (b"ACGTACGTTT", b"ACGTTCGT", &good),
            (b"GATTACA", b"GATCACA", &generous),
            (b"AAAA", b"CCCC", &good),
            (b"ACGT", b"ACGT", &bad),
            (b"", b"ACGT", &good),
            (b"TTTTGGGGCCCCAAAA", b"TTTTCCCCAAAA", &generous),
        ];
        let jobs: Vec<LaneJob<'_>> = pairs
            .iter()
            .map(|&(h, v, scoring)| LaneJob { h, v, scoring })
            .collect();

        let mut ws = BatchWorkspace::new();
        let lanes = engine.compute_lanes(&jobs, &mut ws);
        assert_eq!(lanes.len(), jobs.len());

        for (job, lane) in jobs.iter().zip(&lanes) {
            let scalar = engine.compute(job.h, job.v, job.scoring);
            assert_eq!(&scalar, lane);
        }
        assert!(lanes[3].is_err());
    }

    #[test]
    fn test_score_past_i32_range_is_an_error_not_a_wrong_score() {
        let engine = AffineGapEngine::new(4);
        let heavy = ScoringScheme::new(1 << 20, 4, 6, 1);
        let long = vec![b'A'; 2100];

        assert!(matches!(
            engine.compute(&long, &long, &heavy),
            Err(AlignError::ScoreOverflow { .. })
        ));

        // The overflowing lane is isolated; its neighbours still score.
        let short = ScoringScheme::default();
        let jobs = [
            LaneJob { h: &long, v: &long, scoring: &heavy },
            LaneJob { h: b"ACGT", v: b"ACGT", scoring: &short },
            LaneJob { h: &long[..2000], v: &long[..2000], scoring: &heavy },
        ];
        let lanes = engine.compute_lanes(&jobs, &mut BatchWorkspace::new());
        assert!(matches!(lanes[0], Err(AlignError::ScoreOverflow { .. })));
        assert_eq!(lanes[1].as_ref().map(|r| r.score), Ok(4));
        assert_eq!(lanes[2].as_ref().map(|r| r.score), Ok(2000 << 20));
    }
}
