//! Worker threads.
//!
//! One loop serves both strategies: a scalar worker pops a single handle, a
//! vectorized worker pops a lead handle plus whatever siblings are already
//! queued, up to its vector width, and never waits to fill the group.

use super::arena::TaskHandle;
use super::queue::Pop;
use super::stats::SchedulerStats;
use super::task::{Task, TaskSubmitter, WorkerContext};
use crate::core::alignment::BatchWorkspace;
use crate::error::panic_message;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// How a worker groups tasks, selected once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStrategy {
    Scalar,
    Vectorized { width: usize },
}

impl WorkerStrategy {
    /// Maximum tasks per step. A vectorized width of 0 or 1 is scalar.
    pub fn vector_width(&self) -> usize {
        match *self {
            WorkerStrategy::Scalar => 1,
            WorkerStrategy::Vectorized { width } => width.max(1),
        }
    }

    pub fn is_vectorized(&self) -> bool {
        self.vector_width() > 1
    }
}

impl fmt::Display for WorkerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerStrategy::Scalar => write!(f, "scalar"),
            WorkerStrategy::Vectorized { width } => write!(f, "vectorized x{width}"),
        }
    }
}

pub struct Worker<T: Task> {
    id: usize,
    submitter: TaskSubmitter<T>,
    strategy: WorkerStrategy,
    expected_producers: usize,
    stats: Arc<SchedulerStats>,

    // Reused across iterations
    extras: Vec<TaskHandle>,
    group: Vec<T>,
    leftovers: Vec<T>,
    workspace: BatchWorkspace,
}

impl<T: Task> Worker<T> {
    pub fn new(
        id: usize,
        submitter: TaskSubmitter<T>,
        strategy: WorkerStrategy,
        expected_producers: usize,
        stats: Arc<SchedulerStats>,
    ) -> Self {
        let width = strategy.vector_width();
        Self {
            id,
            submitter,
            strategy,
            expected_producers,
            stats,
            extras: Vec::with_capacity(width),
            group: Vec::with_capacity(width),
            leftovers: Vec::with_capacity(width),
            workspace: BatchWorkspace::new(),
        }
    }

    /// Pop and execute until the queue reports that no more work will arrive.
    pub fn run(mut self) {
        let queue = Arc::clone(self.submitter.queue());
        queue.wait_for_producers(self.expected_producers);

        let width = self.strategy.vector_width();
        let mut steps = 0u64;
        let mut executed = 0u64;
        log::debug!("Worker {}: started ({})", self.id, self.strategy);

        loop {
            self.extras.clear();
            self.group.clear();

            let popped = if width > 1 {
                queue.pop_group(width, &mut self.extras)
            } else {
                queue.pop()
            };
            let lead = match popped {
                Pop::Task(handle) => handle,
                Pop::Done => break,
            };
            let claimed = 1 + self.extras.len();

            let arena = self.submitter.arena();
            let lead = arena.take(lead);
            let mut stale = usize::from(lead.is_none());
            stale += arena.take_all(&self.extras, &mut self.group);
            if stale > 0 {
                log::error!(
                    "Worker {}: {} popped handles had no task in the arena",
                    self.id,
                    stale
                );
            }

            if let Some(lead) = lead.or_else(|| self.group.pop()) {
                executed += 1 + self.group.len() as u64;
                steps += self.execute_group(lead);
            }
            queue.complete(claimed);
        }

        log::debug!(
            "Worker {}: exiting after {} tasks in {} steps",
            self.id,
            executed,
            steps
        );
    }

    /// Execute `lead` with `self.group` as its co-batch; returns the number
    /// of steps taken.
    fn execute_group(&mut self, lead: T) -> u64 {
        let mut steps = 1;
        self.execute_step(lead);

        // Siblings the lead did not claim run on their own
        while !self.group.is_empty() {
            let mut leftovers = std::mem::take(&mut self.leftovers);
            std::mem::swap(&mut leftovers, &mut self.group);
            for task in leftovers.drain(..) {
                self.execute_step(task);
                steps += 1;
            }
            self.leftovers = leftovers;
        }
        steps
    }

    fn execute_step(&mut self, task: T) {
        let siblings = self.group.len();
        let mut ctx = WorkerContext::new(self.id, &self.submitter, &mut self.workspace);
        let co_batch = &mut self.group;
        let outcome = catch_unwind(AssertUnwindSafe(|| task.execute(co_batch, &mut ctx)));

        let lanes = 1 + siblings.saturating_sub(self.group.len());
        if lanes == 1 {
            self.stats.record_scalar();
        } else {
            self.stats.record_group(lanes);
        }

        if let Err(payload) = outcome {
            self.stats.record_panic();
            log::error!(
                "Worker {}: task panicked: {}",
                self.id,
                panic_message(&*payload)
            );
        }
    }
}
