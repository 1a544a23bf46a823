//! Progress tracker (C9, §4.9, §5).
//!
//! Single-writer (the driver thread), many-reader. Readers observe an
//! atomically-swapped snapshot so no partial update is ever visible; the
//! writer self-throttles to `progress_interval_ms`, readers may poll at any
//! rate.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    TimedOut,
}

/// One consistent view of a running (or finished) optimization.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressSnapshot {
    pub run_id: String,
    pub status: RunStatus,
    pub iteration: u64,
    pub total_iterations_planned: u64,
    pub best_cost: Option<f64>,
    pub current_cost: Option<f64>,
    pub elapsed_ms: u64,
    pub estimated_remaining_ms: Option<u64>,
    pub last_error: Option<String>,
}

impl ProgressSnapshot {
    fn pending(run_id: String, total_iterations_planned: u64) -> Self {
        Self {
            run_id,
            status: RunStatus::Pending,
            iteration: 0,
            total_iterations_planned,
            best_cost: None,
            current_cost: None,
            elapsed_ms: 0,
            estimated_remaining_ms: None,
            last_error: None,
        }
    }
}

/// Owned by the driver; publishes snapshots no more often than
/// `progress_interval_ms`.
pub struct ProgressWriter {
    shared: Arc<RwLock<ProgressSnapshot>>,
    interval: Duration,
    last_published: Instant,
    started_at: Instant,
}

impl ProgressWriter {
    pub fn new(run_id: String, total_iterations_planned: u64, interval_ms: u64) -> (Self, ProgressHandle) {
        let shared = Arc::new(RwLock::new(ProgressSnapshot::pending(
            run_id,
            total_iterations_planned,
        )));
        let handle = ProgressHandle {
            shared: shared.clone(),
        };
        let now = Instant::now();
        let writer = Self {
            shared,
            interval: Duration::from_millis(interval_ms),
            last_published: now,
            started_at: now,
        };
        (writer, handle)
    }

    /// Marks the run as started, bypassing the rate limit (readers should
    /// never observe `Pending` once work has begun).
    pub fn mark_running(&mut self) {
        self.force_publish(|s| s.status = RunStatus::Running);
    }

    /// Publishes the given iteration/cost state, subject to the rate
    /// limit. Call `force` for transitions that must always be visible
    /// (terminal states).
    pub fn publish(&mut self, iteration: u64, best_cost: f64, current_cost: f64, force: bool) {
        let now = Instant::now();
        if !force && now.duration_since(self.last_published) < self.interval {
            return;
        }
        self.last_published = now;
        let elapsed_ms = self.started_at.elapsed().as_millis() as u64;
        let total = self.shared.read().unwrap().total_iterations_planned;
        let estimated_remaining_ms = if iteration > 0 {
            Some(elapsed_ms.saturating_mul(total.saturating_sub(iteration)) / iteration.max(1))
        } else {
            None
        };
        let mut guard = self.shared.write().unwrap();
        guard.iteration = iteration;
        guard.best_cost = Some(best_cost);
        guard.current_cost = Some(current_cost);
        guard.elapsed_ms = elapsed_ms;
        guard.estimated_remaining_ms = estimated_remaining_ms;
    }

    pub fn finish(&mut self, status: RunStatus, error: Option<String>) {
        self.force_publish(|s| {
            s.status = status;
            s.last_error = error.clone();
        });
    }

    fn force_publish(&mut self, f: impl FnOnce(&mut ProgressSnapshot)) {
        let elapsed_ms = self.started_at.elapsed().as_millis() as u64;
        let mut guard = self.shared.write().unwrap();
        guard.elapsed_ms = elapsed_ms;
        f(&mut guard);
    }
}

/// Cloneable, read-only view a host polls for a run's live progress.
#[derive(Clone)]
pub struct ProgressHandle {
    shared: Arc<RwLock<ProgressSnapshot>>,
}

impl ProgressHandle {
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.shared.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_never_see_torn_state() {
        let (mut writer, handle) = ProgressWriter::new("run-1".to_string(), 100, 0);
        writer.mark_running();
        writer.publish(10, 50.0, 55.0, true);
        let snap = handle.snapshot();
        assert_eq!(snap.status, RunStatus::Running);
        assert_eq!(snap.iteration, 10);
        assert_eq!(snap.best_cost, Some(50.0));
    }

    #[test]
    fn rate_limit_suppresses_frequent_updates() {
        let (mut writer, handle) = ProgressWriter::new("run-1".to_string(), 100, 60_000);
        writer.mark_running();
        writer.publish(1, 1.0, 1.0, false);
        writer.publish(2, 2.0, 2.0, false);
        let snap = handle.snapshot();
        assert_eq!(snap.iteration, 0); // both publishes land inside the interval and are suppressed
    }

    #[test]
    fn finish_always_publishes() {
        let (mut writer, handle) = ProgressWriter::new("run-1".to_string(), 100, 60_000);
        writer.finish(RunStatus::Completed, None);
        assert_eq!(handle.snapshot().status, RunStatus::Completed);
    }
}
