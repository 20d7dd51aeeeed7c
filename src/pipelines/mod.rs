//! Batch alignment pipelines.
//!
//! - `batch_executor`: one request per sequence pair, driven through an
//!   [`AlignmentScheduler`](crate::scheduler::AlignmentScheduler)

pub mod batch_executor;

pub use batch_executor::{AlignmentContext, BatchAlignmentExecutor, align_batch};
