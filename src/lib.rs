//! Parallel scheduling engine for batches of pairwise sequence alignments.
//!
//! Each sequence pair becomes a task on a shared queue; a fixed pool of
//! scalar or vectorized workers executes them and reports every result to a
//! caller-supplied delegate.

pub mod compute;
pub mod config;
pub mod core;
pub mod defaults;
pub mod error;
pub mod io;
pub mod pairs;
pub mod pipelines;
pub mod scheduler;

pub use crate::config::ExecutionConfig;
pub use crate::core::alignment::{AffineGapEngine, AlignmentResult, DpEngine, ScoringScheme};
pub use error::{AlignError, QueueError, SchedulerError};
pub use pipelines::{AlignmentContext, BatchAlignmentExecutor, align_batch};
pub use scheduler::{
    AlignmentDelegate, AlignmentRequest, AlignmentScheduler, RequestId, SequenceBatch,
    SequenceRef, WorkerStrategy,
};
