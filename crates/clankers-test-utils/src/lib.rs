//! Shared test fixtures and utilities for Clankers crates.
//!
//! Provides a point-foot quadruped collaborator, analytic terrain, and
//! deterministic RNG setup for randomized phase plans.

pub mod quadruped;
pub mod rng;
pub mod terrain;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use quadruped::{PointFootQuadruped, QUADRUPED_FEET};
pub use rng::{random_control, seeded_rng};
pub use terrain::PlaneTerrain;
