use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ferrous_batch_align::compute::simd::{
    detect_optimal_simd_engine, i32_lane_count, simd_engine_description,
};
use ferrous_batch_align::scheduler::SequenceBatch;
use ferrous_batch_align::{
    AffineGapEngine, AlignError, AlignmentResult, DpEngine, ExecutionConfig, RequestId,
    ScoringScheme, align_batch,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

fn generate_pairs(count: usize, len: usize, seed: u64) -> (SequenceBatch, SequenceBatch) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut seqs_h = Vec::with_capacity(count);
    let mut seqs_v = Vec::with_capacity(count);
    for _ in 0..count {
        let h: Vec<u8> = (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
        let v: Vec<u8> = h
            .iter()
            .map(|&b| {
                if rng.gen_bool(0.05) {
                    b"ACGT"[rng.gen_range(0..4)]
                } else {
                    b
                }
            })
            .collect();
        seqs_h.push(h);
        seqs_v.push(v);
    }
    (seqs_h.into(), seqs_v.into())
}

fn bench_strategies(c: &mut Criterion) {
    let engine_type = detect_optimal_simd_engine();
    let width = i32_lane_count(engine_type);
    eprintln!("SIMD engine: {}", simd_engine_description(engine_type));

    let threads = num_threads();
    let mut group = c.benchmark_group("batch_align");
    group.sample_size(10);

    for len in [64usize, 256] {
        let (seqs_h, seqs_v) = generate_pairs(512, len, 42);
        group.throughput(Throughput::Elements(seqs_h.len() as u64));

        group.bench_with_input(BenchmarkId::new("scalar", len), &len, |b, _| {
            b.iter(|| {
                run(
                    ExecutionConfig::default().with_threads(threads).scalar(),
                    AffineGapEngine::new(1),
                    &seqs_h,
                    &seqs_v,
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("vectorized", len), &len, |b, _| {
            b.iter(|| {
                run(
                    ExecutionConfig::default()
                        .with_threads(threads)
                        .vectorized(width),
                    AffineGapEngine::new(width),
                    &seqs_h,
                    &seqs_v,
                )
            })
        });

        // Baseline: same engine, no scheduler, rayon work stealing
        group.bench_with_input(BenchmarkId::new("rayon_par_iter", len), &len, |b, _| {
            let engine = AffineGapEngine::new(1);
            let scoring = ScoringScheme::default();
            b.iter(|| {
                let total: i64 = seqs_h
                    .par_iter()
                    .zip(seqs_v.par_iter())
                    .map(|(h, v)| {
                        engine
                            .compute(h, v, &scoring)
                            .map(|r| r.score as i64)
                            .unwrap_or(0)
                    })
                    .sum();
                black_box(total)
            })
        });
    }
    group.finish();
}

fn run(
    config: ExecutionConfig,
    engine: AffineGapEngine,
    seqs_h: &SequenceBatch,
    seqs_v: &SequenceBatch,
) -> i64 {
    let total = Arc::new(AtomicI64::new(0));
    let sink = Arc::clone(&total);
    let delegate = move |_id: RequestId, result: Result<AlignmentResult, AlignError>| {
        if let Ok(r) = result {
            sink.fetch_add(r.score as i64, Ordering::Relaxed);
        }
    };
    align_batch(
        config,
        Arc::new(engine),
        ScoringScheme::default(),
        seqs_h,
        seqs_v,
        delegate,
    )
    .ok();
    black_box(total.load(Ordering::Relaxed))
}

fn num_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

criterion_group!(benches, bench_strategies);
criterion_main!(benches);
