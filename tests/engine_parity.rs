// tests/engine_parity.rs
// The lockstep lane path must reproduce the scalar recurrence exactly,
// including end coordinates, for every lane width the scheduler may use.

use ferrous_batch_align::compute::simd::{detect_optimal_simd_engine, i32_lane_count};
use ferrous_batch_align::core::alignment::{BatchWorkspace, LaneJob};
use ferrous_batch_align::{AffineGapEngine, DpEngine, ScoringScheme};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_sequence(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}

/// Copy of `seq` with roughly `rate` of positions substituted, deleted or
/// followed by an insertion.
fn mutate(rng: &mut StdRng, seq: &[u8], rate: f64) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len() + 8);
    for &base in seq {
        if rng.gen_bool(rate) {
            match rng.gen_range(0..3) {
                0 => out.push(b"ACGT"[rng.gen_range(0..4)]),
                1 => {}
                _ => {
                    out.push(base);
                    out.push(b"ACGT"[rng.gen_range(0..4)]);
                }
            }
        } else {
            out.push(base);
        }
    }
    out
}

#[test]
fn test_lane_path_matches_scalar_on_random_pairs() {
    let mut rng = StdRng::seed_from_u64(2024);
    let schemes = [
        ScoringScheme::default(),
        ScoringScheme::new(2, 3, 5, 2),
        ScoringScheme::new(1, 1, 0, 1),
        ScoringScheme::new(5, 4, 10, 1),
    ];

    for width in [1, 2, 4, 8, 16] {
        let engine = AffineGapEngine::new(width);
        let mut ws = BatchWorkspace::new();

        for round in 0..8 {
            let pairs: Vec<(Vec<u8>, Vec<u8>, ScoringScheme)> = (0..width * 2 + round % 3)
                .map(|_| {
                    let len = rng.gen_range(0..80);
                    let h = random_sequence(&mut rng, len);
                    let v = mutate(&mut rng, &h, 0.1);
                    let scoring = schemes[rng.gen_range(0..schemes.len())];
                    (h, v, scoring)
                })
                .collect();
            let jobs: Vec<LaneJob<'_>> = pairs
                .iter()
                .map(|(h, v, scoring)| LaneJob { h, v, scoring })
                .collect();

            let lanes = engine.compute_lanes(&jobs, &mut ws);
            assert_eq!(lanes.len(), jobs.len());
            for (i, (job, lane)) in jobs.iter().zip(&lanes).enumerate() {
                let scalar = engine.compute(job.h, job.v, job.scoring);
                assert_eq!(&scalar, lane, "width={width} round={round} lane={i}");
            }
        }
    }
}

#[test]
fn test_detected_width_engine_matches_scalar() {
    let width = i32_lane_count(detect_optimal_simd_engine());
    let engine = AffineGapEngine::default();
    assert_eq!(engine.lane_width(), width);

    let mut rng = StdRng::seed_from_u64(99);
    let scoring = ScoringScheme::default();
    let pairs: Vec<(Vec<u8>, Vec<u8>)> = (0..width + 1)
        .map(|_| {
            let h = random_sequence(&mut rng, 150);
            let v = mutate(&mut rng, &h, 0.05);
            (h, v)
        })
        .collect();
    let jobs: Vec<LaneJob<'_>> = pairs
        .iter()
        .map(|(h, v)| LaneJob {
            h,
            v,
            scoring: &scoring,
        })
        .collect();

    let mut ws = BatchWorkspace::new();
    for (job, lane) in jobs.iter().zip(engine.compute_lanes(&jobs, &mut ws)) {
        let scalar = engine.compute(job.h, job.v, job.scoring).unwrap();
        assert_eq!(lane.unwrap(), scalar);
        assert!(scalar.score > 0, "related sequences must align");
    }
}
