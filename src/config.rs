// Execution options for the scheduler: pool size, worker strategy and the
// producer start-up barrier. Alignment parameters live in ScoringScheme.

use crate::compute::simd::{detect_optimal_simd_engine, i32_lane_count};
use crate::defaults;
use crate::error::SchedulerError;
use crate::scheduler::WorkerStrategy;

/// Read-only execution configuration, fixed for the lifetime of a scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    pub num_threads: usize,          // Worker pool size
    pub strategy: WorkerStrategy,    // Scalar or vectorized workers
    pub expected_producers: usize,   // Workers wait for this many registrations before popping
    pub initial_task_capacity: usize, // Pre-sized task arena slots
}

impl Default for ExecutionConfig {
    /// All cores, vectorized with the detected i32 lane count, one producer.
    fn default() -> Self {
        let width = i32_lane_count(detect_optimal_simd_engine());
        Self {
            num_threads: num_cpus::get().max(1),
            strategy: WorkerStrategy::Vectorized { width },
            expected_producers: defaults::EXPECTED_PRODUCERS,
            initial_task_capacity: defaults::INITIAL_TASK_CAPACITY,
        }
    }
}

impl ExecutionConfig {
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_strategy(mut self, strategy: WorkerStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn scalar(self) -> Self {
        self.with_strategy(WorkerStrategy::Scalar)
    }

    pub fn vectorized(self, width: usize) -> Self {
        self.with_strategy(WorkerStrategy::Vectorized { width })
    }

    pub fn with_expected_producers(mut self, expected_producers: usize) -> Self {
        self.expected_producers = expected_producers;
        self
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.num_threads == 0 {
            return Err(SchedulerError::InvalidConfig(
                "worker pool needs at least one thread".to_string(),
            ));
        }
        if let WorkerStrategy::Vectorized { width: 0 } = self.strategy {
            return Err(SchedulerError::InvalidConfig(
                "vector width must be at least 1".to_string(),
            ));
        }
        if self.expected_producers == 0 {
            return Err(SchedulerError::InvalidConfig(
                "expected producer count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
