//! Hardware capability probing used to size vectorized execution groups.

pub mod simd;

pub use simd::{SimdEngineType, detect_optimal_simd_engine, i32_lane_count, simd_engine_description};
