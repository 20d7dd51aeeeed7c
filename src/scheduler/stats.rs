use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by all workers of one scheduler.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    tasks_executed: AtomicU64,
    scalar_steps: AtomicU64,
    vector_groups: AtomicU64,
    vector_lanes: AtomicU64,
    task_panics: AtomicU64,
}

/// Point-in-time copy of [`SchedulerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub tasks_executed: u64,
    pub scalar_steps: u64,
    pub vector_groups: u64,
    pub vector_lanes: u64,
    pub task_panics: u64,
}

impl StatsSnapshot {
    /// Average number of tasks per vectorized step, 0.0 if none ran.
    pub fn mean_group_fill(&self) -> f64 {
        if self.vector_groups == 0 {
            0.0
        } else {
            self.vector_lanes as f64 / self.vector_groups as f64
        }
    }
}

impl SchedulerStats {
    pub fn record_scalar(&self) {
        self.tasks_executed.fetch_add(1, Ordering::Relaxed);
        self.scalar_steps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_group(&self, lanes: usize) {
        self.tasks_executed.fetch_add(lanes as u64, Ordering::Relaxed);
        self.vector_groups.fetch_add(1, Ordering::Relaxed);
        self.vector_lanes.fetch_add(lanes as u64, Ordering::Relaxed);
    }

    pub fn record_panic(&self) {
        self.task_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            tasks_executed: self.tasks_executed.load(Ordering::Relaxed),
            scalar_steps: self.scalar_steps.load(Ordering::Relaxed),
            vector_groups: self.vector_groups.load(Ordering::Relaxed),
            vector_lanes: self.vector_lanes.load(Ordering::Relaxed),
            task_panics: self.task_panics.load(Ordering::Relaxed),
        }
    }
}
