//! Schedulable units of work.
//!
//! A [`Task`] is moved out of the arena by exactly one worker and consumed by
//! [`Task::execute`], so it runs at most once by construction. Vectorized
//! workers hand the lead task a buffer of siblings (`co_batch`) popped in the
//! same critical section; the lead drains it and executes the whole group as
//! one step. Siblings left in the buffer are run on their own afterwards.

use super::arena::{TaskArena, TaskHandle};
use super::queue::ConcurrentTaskQueue;
use super::request::AlignmentRequest;
use crate::core::alignment::{AlignmentResult, BatchWorkspace, DpEngine, LaneJob};
use crate::error::{AlignError, SchedulerError, panic_message};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

pub trait Task: Send + Sized + 'static {
    /// Run this task and every task in `co_batch`.
    ///
    /// `co_batch` is empty for scalar execution. `ctx` gives access to the
    /// executing worker, its DP workspace and follow-up submission.
    fn execute(self, co_batch: &mut Vec<Self>, ctx: &mut WorkerContext<'_, Self>);
}

/// Stores tasks in the arena and publishes their handles on the queue.
pub struct TaskSubmitter<T> {
    queue: Arc<ConcurrentTaskQueue<TaskHandle>>,
    arena: Arc<TaskArena<T>>,
}

impl<T> Clone for TaskSubmitter<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            arena: Arc::clone(&self.arena),
        }
    }
}

impl<T> TaskSubmitter<T> {
    pub fn new(queue: Arc<ConcurrentTaskQueue<TaskHandle>>, arena: Arc<TaskArena<T>>) -> Self {
        Self { queue, arena }
    }

    /// Publish `task`. On a closed queue the task is dropped unexecuted.
    pub fn submit(&self, task: T) -> Result<(), SchedulerError> {
        let handle = self.arena.insert(task);
        if let Err(e) = self.queue.push(handle) {
            drop(self.arena.take(handle));
            return Err(e.into());
        }
        Ok(())
    }

    pub fn queue(&self) -> &Arc<ConcurrentTaskQueue<TaskHandle>> {
        &self.queue
    }

    pub fn arena(&self) -> &Arc<TaskArena<T>> {
        &self.arena
    }
}

/// Per-execution view of the worker running a task.
pub struct WorkerContext<'a, T> {
    worker_id: usize,
    submitter: &'a TaskSubmitter<T>,
    workspace: &'a mut BatchWorkspace,
}

impl<'a, T> WorkerContext<'a, T> {
    pub fn new(
        worker_id: usize,
        submitter: &'a TaskSubmitter<T>,
        workspace: &'a mut BatchWorkspace,
    ) -> Self {
        Self {
            worker_id,
            submitter,
            workspace,
        }
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Enqueue a follow-up task. Allowed after the last producer has left:
    /// the running task keeps the queue open until it completes.
    pub fn spawn(&self, task: T) -> Result<(), SchedulerError> {
        self.submitter.submit(task)
    }

    pub fn workspace(&mut self) -> &mut BatchWorkspace {
        self.workspace
    }
}

/// One pairwise alignment bound to the engine that computes it.
pub struct AlignmentTask<E: DpEngine> {
    request: AlignmentRequest,
    engine: Arc<E>,
}

impl<E: DpEngine> AlignmentTask<E> {
    pub fn new(request: AlignmentRequest, engine: Arc<E>) -> Self {
        Self { request, engine }
    }

    pub fn request(&self) -> &AlignmentRequest {
        &self.request
    }

    fn compute(&self) -> Result<AlignmentResult, AlignError> {
        let request = &self.request;
        catch_unwind(AssertUnwindSafe(|| {
            self.engine
                .compute(&request.seq_h, &request.seq_v, &request.scoring)
        }))
        .unwrap_or_else(|payload| Err(AlignError::EnginePanicked(panic_message(&*payload))))
    }

    fn run_alone(self) {
        let result = self.compute();
        if let Err(e) = &result {
            log::debug!("Request {} failed: {}", self.request.id, e);
        }
        self.request.complete(result);
    }
}

impl<E: DpEngine> Task for AlignmentTask<E> {
    fn execute(self, co_batch: &mut Vec<Self>, ctx: &mut WorkerContext<'_, Self>) {
        if co_batch.is_empty() {
            self.run_alone();
            return;
        }

        co_batch.insert(0, self);
        let outcome = {
            let jobs: Vec<LaneJob<'_>> = co_batch
                .iter()
                .map(|task| LaneJob {
                    h: &task.request.seq_h,
                    v: &task.request.seq_v,
                    scoring: &task.request.scoring,
                })
                .collect();
            let engine = &co_batch[0].engine;
            let workspace = ctx.workspace();
            catch_unwind(AssertUnwindSafe(|| engine.compute_lanes(&jobs, workspace)))
        };

        match outcome {
            Ok(results) if results.len() == co_batch.len() => {
                for (task, result) in co_batch.drain(..).zip(results) {
                    task.request.complete(result);
                }
            }
            Ok(results) => {
                log::error!(
                    "Worker {}: engine returned {} results for {} lanes, re-running individually",
                    ctx.worker_id(),
                    results.len(),
                    co_batch.len()
                );
                for task in co_batch.drain(..) {
                    task.run_alone();
                }
            }
            Err(payload) => {
                log::warn!(
                    "Worker {}: vectorized step of {} lanes panicked ({}), re-running individually",
                    ctx.worker_id(),
                    co_batch.len(),
                    panic_message(&*payload)
                );
                for task in co_batch.drain(..) {
                    task.run_alone();
                }
            }
        }
    }
}
