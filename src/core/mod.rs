//! Core reusable components for alignment operations.
//!
//! Nothing in here knows about threads or queues; the scheduler drives these
//! pieces from its workers.

pub mod alignment;
