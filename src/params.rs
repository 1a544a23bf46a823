//! `OptimizationParameters` (§6): the whole configuration surface of the
//! core, enumerated explicitly with documented defaults rather than an open
//! dictionary (Design Notes — "dynamically-typed parameter blobs").

use crate::evaluator::{PreferenceTable, Weights};
use crate::variant::Variant;

/// All tunables for one `run_optimization` call. Every field is optional in
/// spirit (has a sensible default, reproduced here via `Default`); hosts
/// override only what they need.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationParameters {
    pub variant: Variant,
    pub max_iterations: u64,
    pub tabu_tenure: usize,
    pub min_tabu_tenure: usize,
    pub max_tabu_tenure: usize,
    pub tenure_adaptation_factor: f64,
    pub max_no_improvement: u64,
    pub time_limit_ms: u64,
    pub max_neighbors: usize,
    pub max_shift_minutes: u32,
    pub weights: Weights,
    /// Per-(surgery, room) penalty for assigning a surgery outside its
    /// preferred room(s); feeds the `SurgeonPreference` cost component.
    pub preferences: PreferenceTable,
    pub diversification_threshold: u64,
    pub diversification_strength: f64,
    pub reactive_window: usize,
    pub deadend_limit: u32,
    pub progress_interval_ms: u64,
    pub cache_results: bool,
    pub seed: Option<u64>,
}

impl Default for OptimizationParameters {
    fn default() -> Self {
        Self {
            variant: Variant::Basic,
            max_iterations: 100,
            tabu_tenure: 10,
            min_tabu_tenure: 5,
            max_tabu_tenure: 20,
            tenure_adaptation_factor: 1.2,
            max_no_improvement: 20,
            time_limit_ms: 300_000,
            max_neighbors: 200,
            max_shift_minutes: 0,
            weights: Weights::new(),
            preferences: PreferenceTable::new(),
            diversification_threshold: 50,
            diversification_strength: 0.3,
            reactive_window: 25,
            deadend_limit: 5,
            progress_interval_ms: 200,
            cache_results: true,
            seed: None,
        }
    }
}

impl OptimizationParameters {
    /// Boundary validation: rejects parameter combinations that would make
    /// the rest of the driver ill-defined. Returns the offending message on
    /// failure so the caller can wrap it in `OptimizationError::InvalidInput`.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_tabu_tenure == 0 {
            return Err("min_tabu_tenure must be at least 1".to_string());
        }
        if self.min_tabu_tenure > self.max_tabu_tenure {
            return Err(format!(
                "min_tabu_tenure ({}) exceeds max_tabu_tenure ({})",
                self.min_tabu_tenure, self.max_tabu_tenure
            ));
        }
        if self.tabu_tenure < self.min_tabu_tenure || self.tabu_tenure > self.max_tabu_tenure {
            return Err(format!(
                "tabu_tenure ({}) must lie within [{}, {}]",
                self.tabu_tenure, self.min_tabu_tenure, self.max_tabu_tenure
            ));
        }
        if self.tenure_adaptation_factor <= 1.0 {
            return Err("tenure_adaptation_factor must be greater than 1.0".to_string());
        }
        if self.max_neighbors == 0 {
            return Err("max_neighbors must be at least 1".to_string());
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.diversification_strength) {
            return Err("diversification_strength must lie within [0.0, 1.0]".to_string());
        }
        if self.deadend_limit == 0 {
            return Err("deadend_limit must be at least 1".to_string());
        }
        Ok(())
    }
}
