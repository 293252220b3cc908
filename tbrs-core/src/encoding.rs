//! Encoding: strengthening item-position associations.
//!
//! Three regimes share the same exponential strength law,
//! `eta = 1 - exp(-r * duration)` with `r ~ Normal(R, s)`:
//!
//! | regime              | duration                         | decay while encoding |
//! |---------------------|----------------------------------|----------------------|
//! | memorandum          | `-ln(1 - tauE) / r`, ≤ presentation | all other items   |
//! | distractor          | processing duration (given)      | done by processing   |
//! | refresh re-encoding | `-ln(1 - tauR) / r`, ≤ time left | all other items, once per pass |
//!
//! A distractor is entangled into the WM trace currently cued at the active
//! position, and is itself only weakly bound to that position.

use tracing::debug;

use crate::error::Result;
use crate::items::DistractorSlot;
use crate::retrieval::{RetrievalEngine, RetrievalMode};
use crate::state::{Model, SimulationState};
use crate::types::ItemId;

/// Encoding and re-encoding of items at serial positions.
#[derive(Debug, Clone, Copy)]
pub struct EncodingEngine<'a> {
    model: &'a Model,
}

impl<'a> EncodingEngine<'a> {
    /// Create an encoding engine for `model`.
    #[must_use]
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    /// Initial encoding of memorandum `item` at `position`.
    ///
    /// Returns the encoding duration; the caller refreshes for the rest of
    /// the presentation time.
    pub fn encode_memorandum(
        &self,
        state: &mut SimulationState,
        item: ItemId,
        position: usize,
    ) -> f64 {
        let r = self.model.draw_rate(&mut state.rng);
        state.items.copy_ltm_to_wm(item);
        let duration = self.model.encoding_duration(r);
        let eta = 1.0 - (-r * duration).exp();

        state.clock.advance(duration);
        state
            .associations
            .decay(self.model.decay_factor(duration), Some(item));
        let cue = state.positions.cue(position);
        state
            .associations
            .reinforce(item, cue, eta, self.model.params.asymptote);
        state.events.memoranda_encoded += 1;

        debug!(
            t = %state.clock,
            item = %item,
            position,
            duration,
            eta,
            "memorandum encoded"
        );
        duration
    }

    /// Initial encoding of a distractor during a processing step of `duration`.
    ///
    /// Retrieves the trace cued at `position`, builds the distractor pattern
    /// from it if the distractor is fresh, entangles the distractor into that
    /// trace, and binds the distractor weakly to the position. Returns the
    /// item whose trace was entangled.
    ///
    /// # Errors
    /// Returns `TbrsError::Config` if the overlap fraction is out of range.
    pub fn encode_distractor(
        &self,
        state: &mut SimulationState,
        distractor: DistractorSlot,
        position: usize,
        duration: f64,
    ) -> Result<ItemId> {
        let weight = self.model.params.distractor_encoding_weight;
        let r = self.model.draw_rate(&mut state.rng);

        let cued =
            RetrievalEngine::new(self.model).retrieve(state, position, RetrievalMode::Refresh);
        let target = cued.identity.unwrap_or(cued.best_wm_item);

        if distractor.fresh {
            let pattern = state.items.create_overlapping_pattern(
                target,
                self.model.task.item_distractor_overlap,
                self.model.task.item_distractor_noise,
                &mut state.rng,
            )?;
            state.items.set_ltm(distractor.id, pattern);
        }
        state.items.copy_ltm_to_wm(distractor.id);
        let moved = state.items.entangle(target, distractor.id, weight);

        let eta = (1.0 - (-r * duration).exp()) * weight;
        let cue = state.positions.cue(position);
        state
            .associations
            .reinforce(distractor.id, cue, eta, self.model.params.asymptote);
        state.events.distractors_encoded += 1;

        debug!(
            t = %state.clock,
            distractor = %distractor.id,
            fresh = distractor.fresh,
            target = %target,
            moved,
            position,
            eta,
            "distractor entangled"
        );
        Ok(target)
    }

    /// Re-encode `item` at `position` while refreshing, and pull the WM trace
    /// of `wm_item` halfway (by `refresh_restoration`) back to the LTM pattern
    /// of `item`.
    ///
    /// With `duration == None` the duration is drawn, capped at `time_left`,
    /// and every other item decays for it. A given duration means the pass
    /// already drew it and decay was applied. Strength is divided by
    /// `divisor`, the size of the focus window.
    ///
    /// Returns the re-encoding duration.
    #[allow(clippy::too_many_arguments)]
    pub fn reencode(
        &self,
        state: &mut SimulationState,
        item: ItemId,
        wm_item: ItemId,
        position: usize,
        time_left: f64,
        duration: Option<f64>,
        divisor: usize,
    ) -> f64 {
        let r = self.model.draw_rate(&mut state.rng);
        let drawn = duration.is_none();
        let duration =
            duration.unwrap_or_else(|| (self.model.rates.log_tau_r() / r).min(time_left));
        let eta = (1.0 - (-r * duration).exp()) / divisor.max(1) as f64;

        state.clock.advance(duration);
        if drawn {
            state
                .associations
                .decay(self.model.decay_factor(duration), Some(item));
        }
        let cue = state.positions.cue(position);
        state
            .associations
            .reinforce(item, cue, eta, self.model.params.asymptote);
        state
            .items
            .restore(wm_item, item, self.model.params.refresh_restoration);
        state.events.items_refreshed += 1;
        duration
    }
}
