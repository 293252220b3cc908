//! Attentional refreshing.
//!
//! Free time is spent cycling through the studied positions. Each pass
//! re-encodes a focus window of `min(attentional_focus, last_position)`
//! consecutive positions, wrapping from the last position back to the first:
//!
//! ```text
//!   last_position = 4, focus = 2, start = 3
//!   pass 1: [3, 4]   pass 2: [1, 2]   pass 3: [3, 4] ...
//! ```
//!
//! The first position of a pass draws the pass duration; the others reuse it
//! and split the encoding strength. The budget shrinks by one duration per
//! pass and is clamped at zero, so it is always spent exactly.

use tracing::debug;

use crate::encoding::EncodingEngine;
use crate::retrieval::{RetrievalEngine, RetrievalMode};
use crate::state::{Model, SimulationState};

/// Spends free time refreshing studied positions.
#[derive(Debug, Clone, Copy)]
pub struct RefreshScheduler<'a> {
    model: &'a Model,
}

impl<'a> RefreshScheduler<'a> {
    /// Create a scheduler for `model`.
    #[must_use]
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    /// Refresh for `time_available`. Returns the number of passes made.
    ///
    /// Does nothing before the first memorandum or without positive time.
    pub fn refresh(&self, state: &mut SimulationState, time_available: f64) -> usize {
        let last = state.last_position;
        if last == 0 || time_available.is_nan() || time_available <= 0.0 {
            return 0;
        }

        let retrieval = RetrievalEngine::new(self.model);
        let encoding = EncodingEngine::new(self.model);
        let window = self.model.task.attentional_focus.min(last);

        let resume = self.model.task.refresh_resumes && (1..=last).contains(&state.refresh_cursor);
        let mut position = if resume { state.refresh_cursor } else { 1 };
        let mut time = time_available;
        let mut passes = 0;

        while time > 0.0 {
            let mut pass_duration = None;
            for _ in 0..window {
                let cued = retrieval.retrieve(state, position, RetrievalMode::Refresh);
                let item = cued.identity.unwrap_or(cued.best_wm_item);
                let duration = encoding.reencode(
                    state,
                    item,
                    cued.best_wm_item,
                    position,
                    time,
                    pass_duration,
                    window,
                );
                debug!(
                    t = %state.clock,
                    position,
                    item = %item,
                    wm_item = %cued.best_wm_item,
                    duration,
                    "refreshed"
                );
                pass_duration = Some(duration);
                position = if position >= last { 1 } else { position + 1 };
            }
            time = (time - pass_duration.unwrap_or(time)).max(0.0);
            passes += 1;
        }

        state.refresh_cursor = position;
        state.events.refresh_passes += passes as u64;
        passes
    }
}
