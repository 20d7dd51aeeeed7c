//! Parallel task scheduling for pairwise alignment.
//!
//! Requests are wrapped into tasks, stored in a [`TaskArena`] and published as
//! handles on a [`ConcurrentTaskQueue`]. A fixed pool of [`Worker`] threads
//! pops handles, one at a time or in groups of up to the vector width, and
//! delivers each result through the request's [`AlignmentDelegate`].

pub mod alignment_scheduler;
pub mod arena;
pub mod delegate;
pub mod queue;
pub mod request;
pub mod stats;
pub mod task;
pub mod worker;

pub use alignment_scheduler::{
    AlignmentProducer, AlignmentScheduler, Producer, Scheduler, SchedulerState,
};
pub use arena::{TaskArena, TaskHandle};
pub use delegate::{AlignmentDelegate, ChannelDelegate, Completion, channel_delegate};
pub use queue::{ConcurrentTaskQueue, Pop, ProducerGuard};
pub use request::{AlignmentRequest, RequestId, SequenceBatch, SequenceRef};
pub use stats::{SchedulerStats, StatsSnapshot};
pub use task::{AlignmentTask, Task, TaskSubmitter, WorkerContext};
pub use worker::{Worker, WorkerStrategy};
