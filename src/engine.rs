//! The host-facing API: [`Engine::run_optimization`] validates input and
//! parameters, then spawns the search driver on its own thread, optionally
//! routing it through the result cache (§3 Lifecycles, §4.10).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use crate::cache::{CacheConfig, CacheStats, ResultCache};
use crate::domain::OptimizationInput;
use crate::driver;
use crate::error::OptimizationError;
use crate::fingerprint;
use crate::params::OptimizationParameters;
use crate::progress::{ProgressHandle, ProgressWriter};
use crate::result::OptimizationResult;

/// Cooperative cancellation flag a host can clone and set from anywhere;
/// the driver checks it once per iteration (§3, §7).
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn shared(&self) -> Arc<AtomicBool> {
        self.0.clone()
    }
}

/// What `run_optimization` hands back immediately: a live progress view and
/// a channel that yields exactly one [`OptimizationResult`] when the run
/// ends, however it ends.
pub struct RunHandle {
    pub run_id: String,
    pub progress: ProgressHandle,
    receiver: mpsc::Receiver<OptimizationResult>,
}

impl RunHandle {
    /// Blocks until the run finishes and returns its result. Panics if the
    /// driver thread panicked without sending a result — a defect, not a
    /// reportable run outcome.
    pub fn join(self) -> OptimizationResult {
        self.receiver
            .recv()
            .expect("driver thread exited without sending a result")
    }

    /// Polls for a finished result without blocking.
    pub fn try_recv(&self) -> Option<OptimizationResult> {
        self.receiver.try_recv().ok()
    }
}

/// Owns the result cache across calls; cheap to keep for the lifetime of a
/// host process. `Clone` shares the same cache and thread pool state.
#[derive(Clone)]
pub struct Engine {
    cache: Arc<ResultCache>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl Engine {
    pub fn new(cache_config: CacheConfig) -> Self {
        Self {
            cache: Arc::new(ResultCache::new(cache_config)),
        }
    }

    /// Validates `input`/`params`, then starts a run on its own thread and
    /// returns immediately with a [`RunHandle`]. Returns an error instead of
    /// spawning anything if the input or parameters are malformed (§7,
    /// never cached).
    pub fn run_optimization(
        &self,
        input: OptimizationInput,
        params: OptimizationParameters,
        run_id: String,
    ) -> Result<(RunHandle, CancelToken), OptimizationError> {
        params
            .validate()
            .map_err(OptimizationError::InvalidInput)?;
        validate_input(&input)?;

        let cancel_token = CancelToken::new();
        let cancel_shared = cancel_token.shared();
        let (writer, progress) = ProgressWriter::new(run_id.clone(), params.max_iterations, params.progress_interval_ms);
        let (sender, receiver) = mpsc::channel();

        let cache = self.cache.clone();
        let thread_run_id = run_id.clone();
        thread::spawn(move || {
            let mut writer = writer;
            let key = fingerprint::fingerprint(&input, &params);
            let outcome = if params.cache_results {
                cache.compute_or_get(key, || {
                    run_uncached(&thread_run_id, &input, &params, &cancel_shared, &mut writer)
                })
            } else {
                run_uncached(&thread_run_id, &input, &params, &cancel_shared, &mut writer)
            };
            // The channel's receiver may have been dropped by a host that
            // lost interest in this run; that is not this thread's problem.
            let _ = sender.send(outcome);
        });

        Ok((
            RunHandle {
                run_id,
                progress,
                receiver,
            },
            cancel_token,
        ))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache_clear(&self) {
        self.cache.clear();
    }

    /// Evicts expired cache entries outside the normal LRU/TTL lookup path.
    /// Returns how many were removed.
    pub fn cache_cleanup(&self) -> usize {
        self.cache.cleanup_expired()
    }
}

fn run_uncached(
    run_id: &str,
    input: &OptimizationInput,
    params: &OptimizationParameters,
    cancel: &AtomicBool,
    writer: &mut ProgressWriter,
) -> OptimizationResult {
    match driver::run(run_id.to_string(), input, params, cancel, writer) {
        Ok(result) => result,
        Err(err) => {
            writer.finish(crate::progress::RunStatus::Failed, Some(err.to_string()));
            OptimizationResult {
                run_id: run_id.to_string(),
                status: crate::progress::RunStatus::Failed,
                best_solution: None,
                cost: None,
                breakdown: None,
                iterations: 0,
                elapsed_ms: 0,
                convergence: Vec::new(),
                variant: params.variant,
                seed: params.seed,
            }
        }
    }
}

fn validate_input(input: &OptimizationInput) -> Result<(), OptimizationError> {
    use std::collections::HashSet;

    if input.surgeries.is_empty() {
        return Err(OptimizationError::InvalidInput(
            "no pending surgeries to schedule".to_string(),
        ));
    }

    let known_types = input.surgery_type_ids();
    let mut seen_surgeries = HashSet::new();
    for surgery in &input.surgeries {
        if !seen_surgeries.insert(&surgery.id) {
            return Err(OptimizationError::InvalidInput(format!(
                "duplicate surgery id {}",
                surgery.id
            )));
        }
        if !known_types.contains(&surgery.type_id) {
            return Err(OptimizationError::InvalidInput(format!(
                "surgery {} references unknown type_id {}",
                surgery.id, surgery.type_id
            )));
        }
        if surgery.duration_minutes == 0 {
            return Err(OptimizationError::InvalidInput(format!(
                "surgery {} has zero duration_minutes",
                surgery.id
            )));
        }
    }
    let mut seen_rooms = HashSet::new();
    for room in &input.rooms {
        if !seen_rooms.insert(&room.id) {
            return Err(OptimizationError::InvalidInput(format!(
                "duplicate room id {}",
                room.id
            )));
        }
        if let Some(closing) = room.closing_time {
            if closing < room.opening_time {
                return Err(OptimizationError::InvalidInput(format!(
                    "room {} has closing_time before opening_time",
                    room.id
                )));
            }
        }
    }
    if input.rooms.is_empty() {
        return Err(OptimizationError::InvalidInput(
            "no rooms available for a non-empty surgery list".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Room, Surgery, SurgeryType, Urgency};
    use std::collections::BTreeSet;

    fn surgery(id: &str) -> Surgery {
        Surgery {
            id: id.to_string(),
            type_id: "A".to_string(),
            duration_minutes: 30,
            surgeon_id: None,
            required_equipment: BTreeSet::new(),
            urgency: Urgency::Low,
            earliest_start: None,
            latest_finish: None,
        }
    }

    fn room(id: &str) -> Room {
        Room {
            id: id.to_string(),
            opening_time: crate::domain::Minutes::ZERO,
            closing_time: None,
            capabilities: BTreeSet::new(),
        }
    }

    fn surgery_types() -> Vec<SurgeryType> {
        vec![SurgeryType {
            id: "A".to_string(),
            label: "A".to_string(),
        }]
    }

    #[test]
    fn run_optimization_rejects_invalid_parameters() {
        let engine = Engine::default();
        let input = OptimizationInput::default();
        let mut params = OptimizationParameters::default();
        params.min_tabu_tenure = 0;
        let err = engine
            .run_optimization(input, params, "run-1".to_string())
            .unwrap_err();
        assert!(matches!(err, OptimizationError::InvalidInput(_)));
    }

    #[test]
    fn run_optimization_rejects_empty_surgery_list() {
        let engine = Engine::default();
        let input = OptimizationInput::default();
        let err = engine
            .run_optimization(input, OptimizationParameters::default(), "run-1".to_string())
            .unwrap_err();
        assert!(matches!(err, OptimizationError::InvalidInput(_)));
    }

    #[test]
    fn run_optimization_rejects_duplicate_surgery_ids() {
        let engine = Engine::default();
        let mut input = OptimizationInput::default();
        input.surgeries = vec![surgery("A1"), surgery("A1")];
        input.rooms = vec![room("R1")];
        input.surgery_types = surgery_types();
        let err = engine
            .run_optimization(input, OptimizationParameters::default(), "run-1".to_string())
            .unwrap_err();
        assert!(matches!(err, OptimizationError::InvalidInput(_)));
    }

    #[test]
    fn run_optimization_rejects_unknown_surgery_type() {
        let engine = Engine::default();
        let mut input = OptimizationInput::default();
        input.surgeries = vec![surgery("A1")];
        input.rooms = vec![room("R1")];
        // input.surgery_types left empty: "A" is not a declared type.
        let err = engine
            .run_optimization(input, OptimizationParameters::default(), "run-1".to_string())
            .unwrap_err();
        assert!(matches!(err, OptimizationError::InvalidInput(_)));
    }

    #[test]
    fn run_optimization_rejects_zero_duration_surgery() {
        let engine = Engine::default();
        let mut input = OptimizationInput::default();
        let mut s = surgery("A1");
        s.duration_minutes = 0;
        input.surgeries = vec![s];
        input.rooms = vec![room("R1")];
        input.surgery_types = surgery_types();
        let err = engine
            .run_optimization(input, OptimizationParameters::default(), "run-1".to_string())
            .unwrap_err();
        assert!(matches!(err, OptimizationError::InvalidInput(_)));
    }

    #[test]
    fn run_optimization_completes_and_reports_progress() {
        let engine = Engine::default();
        let mut input = OptimizationInput::default();
        input.surgeries = vec![surgery("A1")];
        input.rooms = vec![room("R1")];
        input.surgery_types = surgery_types();
        let mut params = OptimizationParameters::default();
        params.max_iterations = 5;

        let (handle, _cancel) = engine
            .run_optimization(input, params, "run-1".to_string())
            .unwrap();
        let result = handle.join();
        assert_eq!(result.status, crate::progress::RunStatus::Completed);
    }

    #[test]
    fn cancel_token_is_observed() {
        let engine = Engine::default();
        let mut input = OptimizationInput::default();
        input.surgeries = vec![surgery("A1")];
        input.rooms = vec![room("R1")];
        input.surgery_types = surgery_types();
        let mut params = OptimizationParameters::default();
        params.max_iterations = 1_000_000;
        params.time_limit_ms = 60_000;

        let (handle, cancel) = engine
            .run_optimization(input, params, "run-1".to_string())
            .unwrap();
        cancel.cancel();
        let result = handle.join();
        assert!(matches!(
            result.status,
            crate::progress::RunStatus::Cancelled | crate::progress::RunStatus::Completed
        ));
    }
}
