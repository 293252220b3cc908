//! Retrieval: from a position cue to a reported item.
//!
//! Two stages:
//!
//! 1. **Competition.** Every live item gets `activation = cue · row + noise`;
//!    the highest activation names the best WM trace.
//! 2. **Identification.** That WM pattern, possibly degraded by interference,
//!    is matched by RMSE against every live LTM pattern. The closest LTM item
//!    is what the model reports, which is how a distorted trace turns into a
//!    substitution error.
//!
//! Recall retrieval is gated by the threshold `theta`. Refresh retrieval is
//! not: the best trace is always re-encoded.

use tracing::trace;

use crate::items::ItemStore;
use crate::state::{Model, SimulationState};
use crate::types::ItemId;

/// Smallest noise standard deviation used in the competition.
pub const MIN_RETRIEVAL_NOISE: f64 = 1e-4;

/// Why a retrieval is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Selecting what to re-encode; no threshold, duration set by the caller.
    Refresh,
    /// Reporting an item; threshold-gated, duration drawn here.
    Recall,
}

/// Result of one retrieval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retrieval {
    /// Item whose WM trace won the competition.
    pub best_wm_item: ItemId,
    /// Its activation, noise included.
    pub activation: f64,
    /// LTM item closest to the winning trace; `None` when a recall stays
    /// below threshold.
    pub identity: Option<ItemId>,
    /// Drawn retrieval duration (recall only, zero for refresh).
    pub duration: f64,
}

/// Cue-driven retrieval over the live items of a trial.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalEngine<'a> {
    model: &'a Model,
}

impl<'a> RetrievalEngine<'a> {
    /// Create a retrieval engine for `model`.
    #[must_use]
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    /// Retrieve at serial position `position` (1-based).
    pub fn retrieve(
        &self,
        state: &mut SimulationState,
        position: usize,
        mode: RetrievalMode,
    ) -> Retrieval {
        let duration = match mode {
            RetrievalMode::Recall => {
                let r = self.model.draw_rate(&mut state.rng);
                self.model.encoding_duration(r)
            }
            RetrievalMode::Refresh => 0.0,
        };

        let noise = self.model.params.retrieval_noise.max(MIN_RETRIEVAL_NOISE);
        let cue = state.positions.cue(position);
        let mut best_wm_item = ItemId::Memorandum(0);
        let mut activation = f64::NEG_INFINITY;
        for item in state.items.live_items() {
            let a = state.associations.activation(item, cue) + state.rng.normal(0.0, 1.0) * noise;
            trace!(position, item = %item, activation = a, "activation");
            if a > activation {
                activation = a;
                best_wm_item = item;
            }
        }

        let gated = mode == RetrievalMode::Recall
            && activation <= self.model.params.retrieval_threshold;
        let identity = if gated {
            None
        } else {
            Some(identify(&state.items, best_wm_item))
        };

        Retrieval {
            best_wm_item,
            activation,
            identity,
            duration,
        }
    }
}

/// The live LTM item closest (by RMSE) to the WM pattern of `wm_item`.
///
/// Ties resolve to the lowest identity.
#[must_use]
pub fn identify(items: &ItemStore, wm_item: ItemId) -> ItemId {
    let trace = items.wm(wm_item);
    let mut closest = wm_item;
    let mut min_rmse = f64::INFINITY;
    for item in items.live_items() {
        let rmse = trace.rmse(items.ltm(item));
        if rmse < min_rmse {
            min_rmse = rmse;
            closest = item;
        }
    }
    closest
}
