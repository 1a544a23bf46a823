//! Terminal error kinds (§7).
//!
//! Candidate-level rejections (a single neighbor's timing or feasibility
//! failure) are *not* represented here — those are plain `Result` values
//! local to [`crate::timing`] and [`crate::feasibility`] that the driver
//! consumes by dropping the candidate, never by propagating an error.
//! Only failures that end an entire run reach this enum.

use thiserror::Error;

use crate::domain::{RoomId, SurgeryId};

/// A terminal error ending an optimization run before or during execution.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptimizationError {
    /// Malformed input snapshot or parameters, rejected before any
    /// iteration runs. Never cached.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Initial-solution construction could not place a surgery in any
    /// room. Never cached.
    #[error("surgery {surgery_id} could not be scheduled in any room")]
    UnschedulableSurgery {
        surgery_id: SurgeryId,
        /// Per-room reason the surgery was rejected.
        reasons: Vec<(RoomId, String)>,
    },

    /// A post-condition check failed deep in the loop (evaluator produced
    /// a non-finite score, a move left the solution invariants broken).
    /// Never cached; the host should treat this as a bug report.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}
