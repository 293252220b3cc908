//! Trial outcomes and batch statistics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::TbrsConfig;
use crate::error::{Result, TbrsError};
use crate::metrics::{CounterSnapshot, TrialEvents};
use crate::types::ItemId;

// ---------------------------------------------------------------------------
// Single trial
// ---------------------------------------------------------------------------

/// What was reported at one serial position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecallResponse {
    /// An item was retrieved above threshold.
    Item(ItemId),
    /// Nothing crossed the retrieval threshold.
    NoRetrieval,
}

impl RecallResponse {
    /// Trace character: the item label, or `.` for no retrieval.
    #[must_use]
    pub fn label(self) -> char {
        match self {
            Self::Item(id) => id.label(),
            Self::NoRetrieval => '.',
        }
    }
}

/// The ordered responses of one trial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallTrace {
    responses: Vec<RecallResponse>,
}

impl RecallTrace {
    /// An empty trace with room for `positions` responses.
    #[must_use]
    pub fn with_capacity(positions: usize) -> Self {
        Self {
            responses: Vec::with_capacity(positions),
        }
    }

    /// Append the response for the next position.
    pub fn push(&mut self, response: RecallResponse) {
        self.responses.push(response);
    }

    /// Responses in serial order.
    #[must_use]
    pub fn responses(&self) -> &[RecallResponse] {
        &self.responses
    }

    /// Number of recalled positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Whether nothing was recalled at all (no positions studied).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Per-position correctness against the studied order: position `p` is
    /// correct iff `expected[p]` was reported there. Positions beyond
    /// `expected` are wrong.
    #[must_use]
    pub fn score(&self, expected: &[ItemId]) -> Vec<bool> {
        self.responses
            .iter()
            .enumerate()
            .map(|(i, r)| {
                expected
                    .get(i)
                    .is_some_and(|item| *r == RecallResponse::Item(*item))
            })
            .collect()
    }
}

impl fmt::Display for RecallTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for response in &self.responses {
            write!(f, "{}", response.label())?;
        }
        Ok(())
    }
}

/// Everything one replication produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    /// Replication index within the batch.
    pub replication: u64,
    /// Recalled sequence.
    pub trace: RecallTrace,
    /// Per-position correctness.
    pub correct: Vec<bool>,
    /// Simulated duration of the trial (final clock value).
    pub duration: f64,
    /// Event tallies.
    pub events: TrialEvents,
}

impl TrialOutcome {
    /// Proportion of positions recalled in correct serial order.
    #[must_use]
    pub fn proportion_correct(&self) -> f64 {
        if self.correct.is_empty() {
            return 0.0;
        }
        self.correct.iter().filter(|c| **c).count() as f64 / self.correct.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Accumulation
// ---------------------------------------------------------------------------

/// Running totals across replications.
///
/// Merging is commutative and associative, so tallies built on different
/// workers combine in any order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerialPositionTally {
    trials: u64,
    proportion_sum: f64,
    correct: Vec<u64>,
}

impl SerialPositionTally {
    /// An empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one trial.
    pub fn add(&mut self, outcome: &TrialOutcome) {
        self.trials += 1;
        self.proportion_sum += outcome.proportion_correct();
        if self.correct.len() < outcome.correct.len() {
            self.correct.resize(outcome.correct.len(), 0);
        }
        for (count, hit) in self.correct.iter_mut().zip(&outcome.correct) {
            *count += u64::from(*hit);
        }
    }

    /// Combine with another tally.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.trials += other.trials;
        self.proportion_sum += other.proportion_sum;
        if self.correct.len() < other.correct.len() {
            self.correct.resize(other.correct.len(), 0);
        }
        for (count, add) in self.correct.iter_mut().zip(other.correct) {
            *count += add;
        }
        self
    }

    /// Trials tallied.
    #[must_use]
    pub fn trials(&self) -> u64 {
        self.trials
    }

    /// Correct counts per serial position.
    #[must_use]
    pub fn correct_counts(&self) -> &[u64] {
        &self.correct
    }

    /// Mean per-trial proportion correct.
    #[must_use]
    pub fn proportion_correct(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.proportion_sum / self.trials as f64
        }
    }

    /// Proportion correct at each serial position.
    #[must_use]
    pub fn serial_position_curve(&self) -> Vec<f64> {
        if self.trials == 0 {
            return vec![0.0; self.correct.len()];
        }
        self.correct
            .iter()
            .map(|c| *c as f64 / self.trials as f64)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Aggregate result of a batch of replications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Configuration the batch ran with.
    pub config: TbrsConfig,
    /// Base seed of the replication streams.
    pub seed: u64,
    /// Script that every replication followed.
    pub script: String,
    /// Replications run.
    pub replications: u64,
    /// Overall proportion of positions recalled in correct order.
    pub proportion_correct: f64,
    /// Proportion correct per serial position.
    pub serial_position: Vec<f64>,
    /// Mean simulated trial duration.
    pub mean_trial_duration: f64,
    /// Counters accumulated over the batch.
    pub counters: CounterSnapshot,
    /// Recall trace of every replication, in replication order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traces: Vec<String>,
}

impl BatchSummary {
    /// Pretty-printed JSON.
    ///
    /// # Errors
    /// Returns `TbrsError::Config` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| TbrsError::Config(e.to_string()))
    }
}

/// One batch per list length, `1..=memoranda`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanSweep {
    /// Batch summaries, shortest list first.
    pub batches: Vec<BatchSummary>,
    /// Span estimate: the sum of proportions correct over all list lengths.
    pub span: f64,
}

impl SpanSweep {
    /// Build a sweep from its batches.
    #[must_use]
    pub fn from_batches(batches: Vec<BatchSummary>) -> Self {
        let span = batches.iter().map(|b| b.proportion_correct).sum();
        Self { batches, span }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    /// Returns `TbrsError::Config` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| TbrsError::Config(e.to_string()))
    }
}
