//! Run metrics.
//!
//! Each trial tallies its own [`TrialEvents`] without synchronisation; the
//! batch driver folds them into the shared [`SimulationCounters`] once per
//! trial, so rayon workers only touch the atomics at trial boundaries.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Per-trial tallies
// ---------------------------------------------------------------------------

/// Events counted during a single trial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialEvents {
    /// Memoranda encoded.
    pub memoranda_encoded: u64,
    /// Distractors encoded (one per processing operation).
    pub distractors_encoded: u64,
    /// Focus-window passes of the refresh scheduler.
    pub refresh_passes: u64,
    /// Positions re-encoded while refreshing.
    pub items_refreshed: u64,
    /// Positions probed at recall.
    pub recall_attempts: u64,
    /// Recall probes that stayed below threshold.
    pub recall_misses: u64,
}

// ---------------------------------------------------------------------------
// Shared counters
// ---------------------------------------------------------------------------

/// Lock-free counters shared by every worker of a batch.
#[derive(Debug)]
pub struct SimulationCounters {
    /// Trials completed.
    pub trials: AtomicU64,
    /// Memoranda encoded.
    pub memoranda_encoded: AtomicU64,
    /// Distractors encoded.
    pub distractors_encoded: AtomicU64,
    /// Refresh passes.
    pub refresh_passes: AtomicU64,
    /// Positions re-encoded while refreshing.
    pub items_refreshed: AtomicU64,
    /// Recall probes.
    pub recall_attempts: AtomicU64,
    /// Below-threshold recall probes.
    pub recall_misses: AtomicU64,
}

impl SimulationCounters {
    /// Zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            trials: AtomicU64::new(0),
            memoranda_encoded: AtomicU64::new(0),
            distractors_encoded: AtomicU64::new(0),
            refresh_passes: AtomicU64::new(0),
            items_refreshed: AtomicU64::new(0),
            recall_attempts: AtomicU64::new(0),
            recall_misses: AtomicU64::new(0),
        }
    }

    /// Fold one finished trial into the counters.
    pub fn record_trial(&self, events: &TrialEvents) {
        self.trials.fetch_add(1, Ordering::Relaxed);
        self.memoranda_encoded
            .fetch_add(events.memoranda_encoded, Ordering::Relaxed);
        self.distractors_encoded
            .fetch_add(events.distractors_encoded, Ordering::Relaxed);
        self.refresh_passes
            .fetch_add(events.refresh_passes, Ordering::Relaxed);
        self.items_refreshed
            .fetch_add(events.items_refreshed, Ordering::Relaxed);
        self.recall_attempts
            .fetch_add(events.recall_attempts, Ordering::Relaxed);
        self.recall_misses
            .fetch_add(events.recall_misses, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            trials: self.trials.load(Ordering::Relaxed),
            memoranda_encoded: self.memoranda_encoded.load(Ordering::Relaxed),
            distractors_encoded: self.distractors_encoded.load(Ordering::Relaxed),
            refresh_passes: self.refresh_passes.load(Ordering::Relaxed),
            items_refreshed: self.items_refreshed.load(Ordering::Relaxed),
            recall_attempts: self.recall_attempts.load(Ordering::Relaxed),
            recall_misses: self.recall_misses.load(Ordering::Relaxed),
        }
    }

    /// Reset every counter to zero.
    pub fn reset(&self) {
        for counter in [
            &self.trials,
            &self.memoranda_encoded,
            &self.distractors_encoded,
            &self.refresh_passes,
            &self.items_refreshed,
            &self.recall_attempts,
            &self.recall_misses,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for SimulationCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// Trials completed.
    pub trials: u64,
    /// Memoranda encoded.
    pub memoranda_encoded: u64,
    /// Distractors encoded.
    pub distractors_encoded: u64,
    /// Refresh passes.
    pub refresh_passes: u64,
    /// Positions re-encoded while refreshing.
    pub items_refreshed: u64,
    /// Recall probes.
    pub recall_attempts: u64,
    /// Below-threshold recall probes.
    pub recall_misses: u64,
}

impl CounterSnapshot {
    /// Fraction of recall probes that retrieved nothing.
    #[must_use]
    pub fn miss_rate(&self) -> f64 {
        if self.recall_attempts == 0 {
            0.0
        } else {
            self.recall_misses as f64 / self.recall_attempts as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trials_fold_into_counters() {
        let counters = SimulationCounters::new();
        let events = TrialEvents {
            memoranda_encoded: 5,
            distractors_encoded: 10,
            refresh_passes: 30,
            items_refreshed: 30,
            recall_attempts: 5,
            recall_misses: 1,
        };
        counters.record_trial(&events);
        counters.record_trial(&events);
        let snap = counters.snapshot();
        assert_eq!(snap.trials, 2);
        assert_eq!(snap.distractors_encoded, 20);
        assert!((snap.miss_rate() - 0.2).abs() < 1e-12);

        counters.reset();
        assert_eq!(counters.snapshot(), CounterSnapshot::default());
    }
}
