use crate::defaults;
use crate::error::AlignError;

/// Linear match/mismatch scoring with affine gaps.
///
/// A gap of length `k` costs `gap_open + k * gap_extend`, the same convention
/// as bwa's `o_del`/`e_del` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringScheme {
    pub match_score: i32,
    pub mismatch_penalty: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Default for ScoringScheme {
    fn default() -> Self {
        Self {
            match_score: defaults::MATCH_SCORE,
            mismatch_penalty: defaults::MISMATCH_PENALTY,
            gap_open: defaults::GAP_OPEN_PENALTY,
            gap_extend: defaults::GAP_EXTEND_PENALTY,
        }
    }
}

impl ScoringScheme {
    pub fn new(match_score: i32, mismatch_penalty: i32, gap_open: i32, gap_extend: i32) -> Self {
        Self {
            match_score,
            mismatch_penalty,
            gap_open,
            gap_extend,
        }
    }

    /// Reject schemes the local-alignment recurrence cannot score meaningfully.
    pub fn validate(&self) -> Result<(), AlignError> {
        if self.match_score <= 0 {
            return Err(AlignError::InvalidScoring(format!(
                "match score must be positive, got {}",
                self.match_score
            )));
        }
        for (name, value) in [
            ("mismatch penalty", self.mismatch_penalty),
            ("gap open penalty", self.gap_open),
            ("gap extend penalty", self.gap_extend),
        ] {
            if !(0..=defaults::MAX_PENALTY).contains(&value) {
                return Err(AlignError::InvalidScoring(format!(
                    "{name} must be in 0..={}, got {value}",
                    defaults::MAX_PENALTY
                )));
            }
        }
        if self.match_score > defaults::MAX_PENALTY {
            return Err(AlignError::InvalidScoring(format!(
                "match score must be at most {}, got {}",
                defaults::MAX_PENALTY,
                self.match_score
            )));
        }
        Ok(())
    }

    /// Fail if a local alignment of an `h_len` x `v_len` pair could score
    /// past `i32::MAX`. The best cell is bounded by a full match run.
    pub fn check_score_range(&self, h_len: usize, v_len: usize) -> Result<(), AlignError> {
        let bound = i64::from(self.match_score).saturating_mul(h_len.min(v_len) as i64);
        if bound > i64::from(i32::MAX) {
            return Err(AlignError::ScoreOverflow { bound });
        }
        Ok(())
    }

    /// Cost of opening a gap and extending it by one base.
    #[inline]
    pub fn gap_open_extend(&self) -> i32 {
        self.gap_open + self.gap_extend
    }
}

/// Best local alignment of one sequence pair.
///
/// End positions are exclusive offsets into the horizontal (`h`) and vertical
/// (`v`) sequence. Both are 0 when no positive-scoring alignment exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AlignmentResult {
    pub score: i32,
    pub h_end: usize,
    pub v_end: usize,
}

/// One lane of a vectorized DP step, before transposition.
#[derive(Clone, Copy, Debug)]
pub struct LaneJob<'a> {
    pub h: &'a [u8],
    pub v: &'a [u8],
    pub scoring: &'a ScoringScheme,
}
