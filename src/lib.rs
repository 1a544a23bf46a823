//! or-tabu-core - Tabu Search optimization for operating-room scheduling
//! with sequence-dependent setup times.
//!
//! A host hands the engine an [`domain::OptimizationInput`] snapshot and a
//! set of [`params::OptimizationParameters`]; [`engine::Engine`] validates
//! both, runs the search on its own thread, and hands back a
//! [`engine::RunHandle`] for live progress plus the eventual
//! [`result::OptimizationResult`]. Everything in between — timing, the
//! feasibility checker, the cost evaluator, neighborhood generation, tabu
//! memory, and the four algorithm variants — is exposed as its own module
//! so a host can also drive the search loop manually or unit-test a stage
//! in isolation.

pub mod cache;
pub mod domain;
pub mod driver;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod feasibility;
pub mod fingerprint;
pub mod neighborhood;
pub mod params;
pub mod progress;
pub mod result;
pub mod tabu;
pub mod timing;
pub mod variant;

pub use engine::{CancelToken, Engine, RunHandle};
pub use error::OptimizationError;
pub use params::OptimizationParameters;
pub use result::OptimizationResult;

/// Generates a host-facing run identifier (UUID v4). The engine does not
/// require run ids to be globally unique, but a host juggling many
/// concurrent runs typically wants them to be.
pub fn generate_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
