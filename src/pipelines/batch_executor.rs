//! Batch entry point.
//!
//! Pairs `seqs_h[i]` with `seqs_v[i]`, schedules one request per pair and
//! routes every result to one delegate tagged with the request id.

use crate::config::ExecutionConfig;
use crate::core::alignment::{DpEngine, ScoringScheme};
use crate::error::SchedulerError;
use crate::scheduler::{
    AlignmentDelegate, AlignmentRequest, AlignmentScheduler, RequestId, SequenceBatch, SequenceRef,
    StatsSnapshot,
};
use std::sync::Arc;
use std::time::Instant;

/// What a batch run needs besides the sequences: the scheduler to feed and
/// the scoring shared by every request.
pub struct AlignmentContext<'s, E: DpEngine> {
    pub scheduler: &'s AlignmentScheduler<E>,
    pub scoring: Arc<ScoringScheme>,
    /// Id given to the first pair; pair `i` gets `first_request_id + i`.
    pub first_request_id: usize,
}

impl<'s, E: DpEngine> AlignmentContext<'s, E> {
    pub fn new(scheduler: &'s AlignmentScheduler<E>, scoring: Arc<ScoringScheme>) -> Self {
        Self {
            scheduler,
            scoring,
            first_request_id: 0,
        }
    }

    pub fn with_first_request_id(mut self, first_request_id: usize) -> Self {
        self.first_request_id = first_request_id;
        self
    }
}

pub struct BatchAlignmentExecutor;

impl BatchAlignmentExecutor {
    /// Schedule one request per sequence pair; returns how many were scheduled.
    ///
    /// Does not wait for results and does not finish producing, so several
    /// batches can feed the same scheduler. Fails before scheduling anything
    /// if the two batches differ in length.
    pub fn run<E, D>(
        context: &AlignmentContext<'_, E>,
        seqs_h: &SequenceBatch,
        seqs_v: &SequenceBatch,
        delegate: D,
    ) -> Result<usize, SchedulerError>
    where
        E: DpEngine,
        D: AlignmentDelegate + 'static,
    {
        check_lengths(seqs_h, seqs_v)?;
        let delegate: Arc<dyn AlignmentDelegate> = Arc::new(delegate);

        for index in 0..seqs_h.len() {
            context.scheduler.schedule(AlignmentRequest::new(
                RequestId(context.first_request_id + index),
                SequenceRef::at(seqs_h, index),
                SequenceRef::at(seqs_v, index),
                Arc::clone(&context.scoring),
                Arc::clone(&delegate),
            ))?;
        }

        log::debug!("Scheduled {} alignment requests", seqs_h.len());
        Ok(seqs_h.len())
    }
}

fn check_lengths(seqs_h: &SequenceBatch, seqs_v: &SequenceBatch) -> Result<(), SchedulerError> {
    if seqs_h.len() != seqs_v.len() {
        return Err(SchedulerError::BatchLengthMismatch {
            horizontal: seqs_h.len(),
            vertical: seqs_v.len(),
        });
    }
    Ok(())
}

/// Align `seqs_h[i]` against `seqs_v[i]` for every `i` on a fresh scheduler.
///
/// Returns after every delegate call has completed. The worker pool is joined
/// on every path, including an error part-way through scheduling.
pub fn align_batch<E, D>(
    config: ExecutionConfig,
    engine: Arc<E>,
    scoring: ScoringScheme,
    seqs_h: &SequenceBatch,
    seqs_v: &SequenceBatch,
    delegate: D,
) -> Result<StatsSnapshot, SchedulerError>
where
    E: DpEngine,
    D: AlignmentDelegate + 'static,
{
    check_lengths(seqs_h, seqs_v)?;

    let start = Instant::now();
    let scheduler = AlignmentScheduler::new(config, engine)?;
    let context = AlignmentContext::new(&scheduler, Arc::new(scoring));
    let scheduled = BatchAlignmentExecutor::run(&context, seqs_h, seqs_v, delegate)?;

    let workers = scheduler.num_parallel_workers();
    let strategy = scheduler.strategy();
    let stats = scheduler.join();

    log::info!(
        "Aligned {} pairs on {} {} workers in {:.3} s ({} vector groups, mean fill {:.2})",
        scheduled,
        workers,
        strategy,
        start.elapsed().as_secs_f64(),
        stats.vector_groups,
        stats.mean_group_fill()
    );
    Ok(stats)
}
