// src/defaults.rs

// Scoring Constants
pub const MATCH_SCORE: i32 = 1;
pub const MISMATCH_PENALTY: i32 = 4;
pub const GAP_OPEN_PENALTY: i32 = 6;
pub const GAP_EXTEND_PENALTY: i32 = 1;

// Upper bound for any single score or penalty. Long sequences can still overflow
// i32 cells, which the engine checks per pair.
pub const MAX_PENALTY: i32 = 1 << 20;

// Scheduling Constants
pub const EXPECTED_PRODUCERS: usize = 1;
pub const INITIAL_TASK_CAPACITY: usize = 1024;

// Other Constants
pub const VERBOSITY: i32 = 3;
