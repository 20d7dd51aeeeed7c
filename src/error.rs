//! Error types for the batch alignment scheduler.
//!
//! Three families, matching how failures propagate:
//! - [`AlignError`]: one request failed; delivered through that request's delegate
//! - [`QueueError`]: queue lifecycle misuse (push after close, producer underflow)
//! - [`SchedulerError`]: returned synchronously to whoever built or fed the scheduler

use std::any::Any;
use thiserror::Error;

/// Failure of a single alignment request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
    #[error("invalid scoring scheme: {0}")]
    InvalidScoring(String),

    #[error("alignment engine panicked: {0}")]
    EnginePanicked(String),

    #[error("best score may reach {bound}, beyond the i32 score range")]
    ScoreOverflow { bound: i64 },
}

/// Lifecycle violations on the concurrent task queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("task queue is closed")]
    Closed,

    #[error("producer deregistered while no producers were live")]
    ProducerUnderflow,
}

/// Errors reported to the caller of the scheduler or the batch executor.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid execution config: {0}")]
    InvalidConfig(String),

    #[error("sequence batches differ in length: {horizontal} horizontal vs {vertical} vertical")]
    BatchLengthMismatch { horizontal: usize, vertical: usize },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("failed to spawn worker thread {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_extracts_str_and_string() {
        let payload = std::panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(&*payload), "static message");

        let payload = std::panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
        assert_eq!(panic_message(&*payload), "formatted 42");
    }

    #[test]
    fn test_queue_error_converts_into_scheduler_error() {
        let err: SchedulerError = QueueError::Closed.into();
        assert!(matches!(err, SchedulerError::Queue(QueueError::Closed)));
        assert_eq!(err.to_string(), "task queue is closed");
    }
}
