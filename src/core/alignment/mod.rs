//! Alignment collaborator used by the scheduler: scoring types, the DP engine
//! seam with its built-in affine-gap implementation, and reusable workspaces.

pub mod engine;
pub mod types;
pub mod workspace; // Per-worker SoA buffers and thread-local scalar rows

pub use engine::{AffineGapEngine, DpEngine};
pub use types::{AlignmentResult, LaneJob, ScoringScheme};
pub use workspace::BatchWorkspace;
