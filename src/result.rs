//! `OptimizationResult`: what a run ultimately produces (§6).

use crate::domain::Solution;
use crate::evaluator::CostBreakdown;
use crate::progress::RunStatus;
use crate::variant::Variant;

/// The outcome of one optimization run, successful or not.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationResult {
    pub run_id: String,
    pub status: RunStatus,
    pub best_solution: Option<Solution>,
    pub cost: Option<f64>,
    pub breakdown: Option<CostBreakdown>,
    pub iterations: u64,
    pub elapsed_ms: u64,
    /// Best cost recorded after each iteration; monotonically non-increasing
    /// (§8 property 4).
    pub convergence: Vec<f64>,
    pub variant: Variant,
    pub seed: Option<u64>,
}

impl OptimizationResult {
    /// Whether this result is eligible for the result cache: only completed
    /// or time-limited runs are a legitimate cacheable answer (§4.10, §7).
    pub fn is_cacheable(&self) -> bool {
        matches!(self.status, RunStatus::Completed | RunStatus::TimedOut)
    }
}
