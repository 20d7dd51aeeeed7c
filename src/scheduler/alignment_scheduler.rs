//! Scheduler lifecycle.
//!
//! A scheduler owns a fixed pool of worker threads and the queue they share.
//! It registers itself as the single logical producer at construction and
//! deregisters in [`Scheduler::finish_producing`]:
//!
//! ```text
//! Running --finish_producing--> Draining --queue drained, workers exit--> Terminated
//! ```
//!
//! [`Scheduler::join`] and `Drop` both finish producing and join every worker,
//! so the pool is torn down on every exit path. Producer registrations handed
//! out by [`Scheduler::register_producer`] borrow the scheduler, so `join`
//! cannot run while one is still alive.

use super::arena::{TaskArena, TaskHandle};
use super::queue::{ConcurrentTaskQueue, ProducerGuard};
use super::request::AlignmentRequest;
use super::stats::{SchedulerStats, StatsSnapshot};
use super::task::{AlignmentTask, Task, TaskSubmitter};
use super::worker::{Worker, WorkerStrategy};
use crate::config::ExecutionConfig;
use crate::core::alignment::DpEngine;
use crate::error::{QueueError, SchedulerError, panic_message};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Accepting new tasks.
    Running,
    /// No new tasks from the scheduler itself; workers drain the queue.
    Draining,
    /// Every worker has exited.
    Terminated,
}

pub struct Scheduler<T: Task> {
    submitter: TaskSubmitter<T>,
    workers: Vec<JoinHandle<()>>,
    config: ExecutionConfig,
    stats: Arc<SchedulerStats>,
    producing: AtomicBool,
}

impl<T: Task> Scheduler<T> {
    /// Validate `config` and start the worker pool.
    pub fn new(config: ExecutionConfig) -> Result<Self, SchedulerError> {
        config.validate()?;

        let queue = Arc::new(ConcurrentTaskQueue::with_capacity(
            config.initial_task_capacity,
        ));
        let arena = Arc::new(TaskArena::with_capacity(config.initial_task_capacity));
        queue.register_producer()?;

        let mut scheduler = Self {
            submitter: TaskSubmitter::new(queue, arena),
            workers: Vec::with_capacity(config.num_threads),
            stats: Arc::new(SchedulerStats::default()),
            producing: AtomicBool::new(true),
            config,
        };

        for index in 0..scheduler.config.num_threads {
            let worker = Worker::new(
                index,
                scheduler.submitter.clone(),
                scheduler.config.strategy,
                scheduler.config.expected_producers,
                Arc::clone(&scheduler.stats),
            );
            // On failure, Drop tears down the workers already started
            let handle = thread::Builder::new()
                .name(format!("align-worker-{index}"))
                .spawn(move || worker.run())
                .map_err(|source| SchedulerError::Spawn { index, source })?;
            scheduler.workers.push(handle);
        }

        log::info!(
            "Scheduler: started {} {} workers",
            scheduler.config.num_threads,
            scheduler.config.strategy
        );
        Ok(scheduler)
    }

    /// Publish a task. Fails once [`finish_producing`](Self::finish_producing)
    /// has been called or the queue has closed.
    pub fn submit(&self, task: T) -> Result<(), SchedulerError> {
        if !self.producing.load(Ordering::Acquire) {
            return Err(QueueError::Closed.into());
        }
        self.submitter.submit(task)
    }

    /// Register an additional concurrent feeder.
    pub fn register_producer(&self) -> Result<Producer<'_, T>, SchedulerError> {
        let registration = self.submitter.queue().producer()?;
        Ok(Producer {
            _registration: registration,
            submitter: &self.submitter,
        })
    }

    /// Drop the scheduler's own producer registration. Idempotent.
    pub fn finish_producing(&self) {
        if self.producing.swap(false, Ordering::AcqRel) {
            if let Err(e) = self.submitter.queue().deregister_producer() {
                log::error!("Scheduler: failed to deregister: {}", e);
            }
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.producing.load(Ordering::Acquire) {
            SchedulerState::Running
        } else if self.workers.iter().all(|w| w.is_finished()) {
            SchedulerState::Terminated
        } else {
            SchedulerState::Draining
        }
    }

    pub fn num_parallel_workers(&self) -> usize {
        self.config.num_threads
    }

    pub fn strategy(&self) -> WorkerStrategy {
        self.config.strategy
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Finish producing, wait for the queue to drain and every worker to exit.
    pub fn join(mut self) -> StatsSnapshot {
        self.shutdown();
        self.stats.snapshot()
    }

    fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.finish_producing();
        // Workers still waiting for producers that never registered would block forever
        self.submitter.queue().release_barrier();

        for (index, handle) in self.workers.drain(..).enumerate() {
            if let Err(payload) = handle.join() {
                log::error!(
                    "Scheduler: worker {} panicked: {}",
                    index,
                    panic_message(&*payload)
                );
            }
        }
        log::debug!("Scheduler: all workers joined");
    }
}

impl<T: Task> Drop for Scheduler<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A live producer registration that can submit tasks.
///
/// Deregisters when dropped; the queue cannot close while one is alive. It
/// borrows its scheduler, so joining with a live producer does not compile:
///
/// ```compile_fail
/// use ferrous_batch_align::ExecutionConfig;
/// use ferrous_batch_align::scheduler::{Scheduler, Task, WorkerContext};
///
/// struct Noop;
/// impl Task for Noop {
///     fn execute(self, co_batch: &mut Vec<Self>, _ctx: &mut WorkerContext<'_, Self>) {
///         co_batch.clear();
///     }
/// }
///
/// let scheduler: Scheduler<Noop> = Scheduler::new(ExecutionConfig::default()).unwrap();
/// let producer = scheduler.register_producer().unwrap();
/// scheduler.join();
/// producer.submit(Noop).unwrap();
/// ```
pub struct Producer<'s, T: Task> {
    _registration: ProducerGuard<TaskHandle>,
    submitter: &'s TaskSubmitter<T>,
}

impl<T: Task> Producer<'_, T> {
    pub fn submit(&self, task: T) -> Result<(), SchedulerError> {
        self.submitter.submit(task)
    }
}

/// Scheduler specialised to pairwise alignment requests.
pub struct AlignmentScheduler<E: DpEngine> {
    inner: Scheduler<AlignmentTask<E>>,
    engine: Arc<E>,
}

impl<E: DpEngine> AlignmentScheduler<E> {
    pub fn new(config: ExecutionConfig, engine: Arc<E>) -> Result<Self, SchedulerError> {
        Ok(Self {
            inner: Scheduler::new(config)?,
            engine,
        })
    }

    /// Wrap `request` into a task and publish it. Safe to call from several
    /// producer threads at once.
    pub fn schedule(&self, request: AlignmentRequest) -> Result<(), SchedulerError> {
        self.inner
            .submit(AlignmentTask::new(request, Arc::clone(&self.engine)))
    }

    pub fn register_producer(&self) -> Result<AlignmentProducer<'_, E>, SchedulerError> {
        Ok(AlignmentProducer {
            inner: self.inner.register_producer()?,
            engine: &self.engine,
        })
    }

    pub fn finish_producing(&self) {
        self.inner.finish_producing();
    }

    pub fn join(self) -> StatsSnapshot {
        self.inner.join()
    }

    pub fn state(&self) -> SchedulerState {
        self.inner.state()
    }

    pub fn num_parallel_workers(&self) -> usize {
        self.inner.num_parallel_workers()
    }

    pub fn strategy(&self) -> WorkerStrategy {
        self.inner.strategy()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats()
    }
}

/// Extra feeder for an [`AlignmentScheduler`], borrowed like [`Producer`].
pub struct AlignmentProducer<'s, E: DpEngine> {
    inner: Producer<'s, AlignmentTask<E>>,
    engine: &'s Arc<E>,
}

impl<E: DpEngine> AlignmentProducer<'_, E> {
    pub fn schedule(&self, request: AlignmentRequest) -> Result<(), SchedulerError> {
        self.inner
            .submit(AlignmentTask::new(request, Arc::clone(self.engine)))
    }
}
