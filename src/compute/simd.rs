//! Runtime vector-width detection.
//!
//! The scheduler never calls intrinsics itself; it only needs to know how many
//! alignments fit side by side in one vector register so it can size the
//! groups handed to vectorized workers. DP cells are 32-bit, so the lane count
//! is the register width divided by 32.

/// Widest vector register the running CPU offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdEngineType {
    /// SSE or NEON, always present
    Engine128,
    #[cfg(target_arch = "x86_64")]
    Engine256,
    /// Only reported with the `avx512` feature
    #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
    Engine512,
}

impl SimdEngineType {
    pub fn register_bits(self) -> usize {
        match self {
            SimdEngineType::Engine128 => 128,
            #[cfg(target_arch = "x86_64")]
            SimdEngineType::Engine256 => 256,
            #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
            SimdEngineType::Engine512 => 512,
        }
    }

    fn isa_name(self) -> &'static str {
        match self {
            #[cfg(target_arch = "x86_64")]
            SimdEngineType::Engine128 => "SSE",
            #[cfg(not(target_arch = "x86_64"))]
            SimdEngineType::Engine128 => "NEON",
            #[cfg(target_arch = "x86_64")]
            SimdEngineType::Engine256 => "AVX2",
            #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
            SimdEngineType::Engine512 => "AVX-512",
        }
    }
}

/// `FERROUS_BATCH_FORCE_SSE=1` pins detection to 128-bit registers on x86_64.
pub fn detect_optimal_simd_engine() -> SimdEngineType {
    #[cfg(target_arch = "x86_64")]
    {
        if std::env::var("FERROUS_BATCH_FORCE_SSE").is_ok_and(|v| v == "1") {
            log::info!("FERROUS_BATCH_FORCE_SSE=1: grouping for 128-bit registers");
            return SimdEngineType::Engine128;
        }

        #[cfg(feature = "avx512")]
        if is_x86_feature_detected!("avx512bw") {
            return SimdEngineType::Engine512;
        }

        if is_x86_feature_detected!("avx2") {
            return SimdEngineType::Engine256;
        }
    }

    SimdEngineType::Engine128
}

/// Number of 32-bit lanes in one vector register of `engine`; the default
/// vector width for grouping alignment tasks.
pub fn i32_lane_count(engine: SimdEngineType) -> usize {
    engine.register_bits() / 32
}

pub fn simd_engine_description(engine: SimdEngineType) -> String {
    format!(
        "{} ({}-bit, {} x i32 lanes)",
        engine.isa_name(),
        engine.register_bits(),
        i32_lane_count(engine)
    )
}
