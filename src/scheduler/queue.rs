//! Multi-producer/multi-consumer FIFO with producer counting.
//!
//! The queue is the only shared mutable structure of a scheduler. All state
//! lives behind one mutex; two condition variables wake consumers waiting for
//! work and workers waiting at the producer start-up barrier.
//!
//! ## Termination
//!
//! Popped items count as *in flight* until the consumer calls
//! [`ConcurrentTaskQueue::complete`]. The queue closes for good once it is
//! empty, no producer is live and nothing is in flight; from then on every
//! [`pop`](ConcurrentTaskQueue::pop) returns [`Pop::Done`]. Counting in-flight
//! items lets a running task push follow-up work after the last external
//! producer has gone away without a sibling worker exiting early.

use crate::error::QueueError;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

/// Result of a blocking pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pop<T> {
    Task(T),
    /// No more work will ever arrive.
    Done,
}

struct QueueState<T> {
    pending: VecDeque<T>,
    live_producers: usize,
    registered_producers: usize,
    in_flight: usize,
    barrier_released: bool,
    closed: bool,
}

impl<T> QueueState<T> {
    /// Enter the terminal state if nothing can produce more work.
    /// Returns true only on the transition.
    fn close_if_drained(&mut self) -> bool {
        if !self.closed
            && self.pending.is_empty()
            && self.live_producers == 0
            && self.in_flight == 0
        {
            self.closed = true;
            return true;
        }
        false
    }
}

pub struct ConcurrentTaskQueue<T> {
    state: Mutex<QueueState<T>>,
    work_available: Condvar,
    producers_changed: Condvar,
}

impl<T> Default for ConcurrentTaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ConcurrentTaskQueue<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::with_capacity(capacity),
                live_producers: 0,
                registered_producers: 0,
                in_flight: 0,
                barrier_released: false,
                closed: false,
            }),
            work_available: Condvar::new(),
            producers_changed: Condvar::new(),
        }
    }

    fn notify_closed(&self) {
        self.work_available.notify_all();
        self.producers_changed.notify_all();
    }

    /// Append an item. Never blocks on capacity.
    pub fn push(&self, item: T) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(QueueError::Closed);
        }
        state.pending.push_back(item);
        drop(state);
        self.work_available.notify_one();
        Ok(())
    }

    /// Remove the oldest item, blocking while the queue is empty but still open.
    pub fn pop(&self) -> Pop<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.pending.pop_front() {
                state.in_flight += 1;
                return Pop::Task(item);
            }
            if state.close_if_drained() {
                self.notify_closed();
            }
            if state.closed {
                return Pop::Done;
            }
            self.work_available.wait(&mut state);
        }
    }

    /// Pop a lead item like [`pop`](Self::pop), then move up to `width - 1`
    /// items that are already queued into `extras` within the same critical
    /// section. Never waits for extras to arrive.
    pub fn pop_group(&self, width: usize, extras: &mut Vec<T>) -> Pop<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(lead) = state.pending.pop_front() {
                let take = width.saturating_sub(1).min(state.pending.len());
                extras.extend(state.pending.drain(..take));
                state.in_flight += 1 + take;
                return Pop::Task(lead);
            }
            if state.close_if_drained() {
                self.notify_closed();
            }
            if state.closed {
                return Pop::Done;
            }
            self.work_available.wait(&mut state);
        }
    }

    /// Mark `count` popped items as finished.
    pub fn complete(&self, count: usize) {
        let mut state = self.state.lock();
        debug_assert!(state.in_flight >= count, "completed more items than were popped");
        state.in_flight = state.in_flight.saturating_sub(count);
        if state.close_if_drained() {
            drop(state);
            self.notify_closed();
        }
    }

    pub fn register_producer(&self) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(QueueError::Closed);
        }
        state.live_producers += 1;
        state.registered_producers += 1;
        drop(state);
        self.producers_changed.notify_all();
        Ok(())
    }

    pub fn deregister_producer(&self) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        if state.live_producers == 0 {
            log::error!("Task queue: producer deregistered with no live producers");
            return Err(QueueError::ProducerUnderflow);
        }
        state.live_producers -= 1;
        if state.close_if_drained() {
            drop(state);
            self.notify_closed();
        }
        Ok(())
    }

    /// Register a producer that deregisters itself when dropped.
    pub fn producer(self: &Arc<Self>) -> Result<ProducerGuard<T>, QueueError> {
        self.register_producer()?;
        Ok(ProducerGuard {
            queue: Arc::clone(self),
        })
    }

    /// Start-up barrier: block until at least `expected` producers have ever
    /// registered, the barrier was released, or the queue closed.
    pub fn wait_for_producers(&self, expected: usize) {
        let mut state = self.state.lock();
        while state.registered_producers < expected && !state.barrier_released && !state.closed {
            self.producers_changed.wait(&mut state);
        }
    }

    /// Let workers past the start-up barrier regardless of the producer count.
    pub fn release_barrier(&self) {
        self.state.lock().barrier_released = true;
        self.producers_changed.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn live_producers(&self) -> usize {
        self.state.lock().live_producers
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

/// A live producer registration on a shared queue.
pub struct ProducerGuard<T> {
    queue: Arc<ConcurrentTaskQueue<T>>,
}

impl<T> ProducerGuard<T> {
    pub fn push(&self, item: T) -> Result<(), QueueError> {
        self.queue.push(item)
    }
}

impl<T> Drop for ProducerGuard<T> {
    fn drop(&mut self) {
        let _ = self.queue.deregister_producer();
    }
}
