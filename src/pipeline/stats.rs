//! Processing counters kept by the orchestrator.
//!
//! `ProcessingStats` is a snapshot; `StatsManager` owns the live counters and
//! updates them under a mutex so one orchestrator can be shared across threads.

use super::state::PipelineState;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Snapshot of the orchestrator's counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingStats {
    /// Requests handled, successful or not.
    pub total_processed: usize,
    /// Requests that produced an artifact.
    pub succeeded: usize,
    /// Requests that ended in a failure.
    pub failed: usize,
    /// Running mean processing time of successful requests, in milliseconds.
    pub average_duration_ms: f64,
    /// Failures keyed by the stage they occurred in.
    pub failures_by_stage: BTreeMap<String, usize>,
}

impl ProcessingStats {
    /// Share of successful requests, 0.0 to 100.0.
    pub fn success_rate(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.total_processed as f64) * 100.0
        }
    }
}

impl fmt::Display for ProcessingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processing Statistics:")?;
        writeln!(f, "  Total processed: {}", self.total_processed)?;
        writeln!(
            f,
            "  Succeeded: {} ({:.1}%)",
            self.succeeded,
            self.success_rate()
        )?;
        writeln!(f, "  Failed: {}", self.failed)?;
        for (stage, count) in &self.failures_by_stage {
            writeln!(f, "    during {stage}: {count}")?;
        }
        writeln!(f, "  Average duration: {:.2} ms", self.average_duration_ms)
    }
}

/// Thread-safe owner of the live counters.
#[derive(Debug, Default)]
pub struct StatsManager {
    stats: Mutex<ProcessingStats>,
}

impl StatsManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ProcessingStats> {
        // A poisoned lock still holds valid counters.
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a copy of the current counters.
    pub fn snapshot(&self) -> ProcessingStats {
        self.lock().clone()
    }

    /// Records a request that produced an artifact.
    pub fn record_success(&self, duration: Duration) {
        let mut stats = self.lock();
        let previous = stats.succeeded as f64;
        stats.total_processed += 1;
        stats.succeeded += 1;
        let total_ms = stats.average_duration_ms * previous + duration.as_secs_f64() * 1000.0;
        stats.average_duration_ms = total_ms / stats.succeeded as f64;
    }

    /// Records a request that failed in `stage`.
    pub fn record_failure(&self, stage: PipelineState) {
        let mut stats = self.lock();
        stats.total_processed += 1;
        stats.failed += 1;
        *stats.failures_by_stage.entry(stage.to_string()).or_insert(0) += 1;
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        *self.lock() = ProcessingStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_handles_zero_processed() {
        assert_eq!(ProcessingStats::default().success_rate(), 0.0);
    }

    #[test]
    fn running_mean_covers_successes_only() {
        let manager = StatsManager::new();
        manager.record_success(Duration::from_millis(10));
        manager.record_success(Duration::from_millis(30));
        manager.record_failure(PipelineState::Loading);

        let stats = manager.snapshot();
        assert_eq!(stats.total_processed, 3);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert!((stats.average_duration_ms - 20.0).abs() < 1e-9);
        assert_eq!(stats.failures_by_stage.get("loading"), Some(&1));
    }

    #[test]
    fn reset_zeroes_counters() {
        let manager = StatsManager::new();
        manager.record_failure(PipelineState::Inferring);
        manager.reset();
        assert_eq!(manager.snapshot(), ProcessingStats::default());
    }
}
