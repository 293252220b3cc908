//! Serial recall.

use tracing::debug;

use crate::outcome::{RecallResponse, RecallTrace};
use crate::retrieval::{RetrievalEngine, RetrievalMode};
use crate::state::{Model, SimulationState};

/// Longest duration a single recall retrieval may take.
pub const MAX_RECALL_DURATION: f64 = 5.0;

/// Forward serial recall of every studied position.
#[derive(Debug, Clone, Copy)]
pub struct RecallEngine<'a> {
    model: &'a Model,
}

impl<'a> RecallEngine<'a> {
    /// Create a recall engine for `model`.
    #[must_use]
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    /// Probe positions `1..=last_position` in order.
    ///
    /// Each probe decays every association for its duration. A response
    /// above threshold is recorded and suppressed: the reported item loses
    /// `L * activation` at each position unit whose index is a characterized,
    /// non-zero dimension of its WM pattern (clamped at zero).
    pub fn recall(&self, state: &mut SimulationState) -> RecallTrace {
        let retrieval = RetrievalEngine::new(self.model);
        let mut trace = RecallTrace::with_capacity(state.last_position);

        for position in 1..=state.last_position {
            let probe = retrieval.retrieve(state, position, RetrievalMode::Recall);
            let duration = probe.duration.min(MAX_RECALL_DURATION);
            state
                .associations
                .decay(self.model.decay_factor(duration), None);
            state.events.recall_attempts += 1;

            let response = match probe.identity {
                Some(item) => {
                    let units = state.associations.units();
                    let suppressed: Vec<usize> = state
                        .items
                        .wm(item)
                        .dims()
                        .iter()
                        .take(units)
                        .enumerate()
                        .filter(|(_, d)| matches!(d, Some(v) if *v != 0.0))
                        .map(|(unit, _)| unit)
                        .collect();
                    state.associations.suppress(
                        item,
                        suppressed,
                        self.model.params.asymptote * probe.activation,
                    );
                    RecallResponse::Item(item)
                }
                None => {
                    state.events.recall_misses += 1;
                    RecallResponse::NoRetrieval
                }
            };

            debug!(
                t = %state.clock,
                position,
                response = %response.label(),
                activation = probe.activation,
                "recalled"
            );
            trace.push(response);
            state.clock.advance(duration);
        }
        trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TbrsConfig;
    use crate::encoding::EncodingEngine;
    use crate::random::RandomProcess;
    use crate::types::ItemId;

    fn studied(n: usize, theta: f64) -> (Model, SimulationState) {
        let mut config = TbrsConfig::default();
        config.model.position_persistence = 0.0;
        config.model.retrieval_noise = 0.0;
        config.model.retrieval_threshold = theta;
        let model = Model::new(&config).expect("model");
        let mut state = SimulationState::new(&model.geometry, RandomProcess::seeded(51));
        state.begin_trial(&model, n, None).expect("begin");
        let encoding = EncodingEngine::new(&model);
        for i in 0..n {
            state.last_position = i + 1;
            encoding.encode_memorandum(&mut state, ItemId::Memorandum(i), i + 1);
        }
        (model, state)
    }

    #[test]
    fn recalls_every_studied_position() {
        let (model, mut state) = studied(3, 0.0);
        let trace = RecallEngine::new(&model).recall(&mut state);
        assert_eq!(trace.len(), 3);
        assert_eq!(state.events.recall_attempts, 3);
    }

    #[test]
    fn high_threshold_recalls_nothing() {
        let (model, mut state) = studied(2, 10.0);
        let t0 = state.clock.now();
        let trace = RecallEngine::new(&model).recall(&mut state);
        assert_eq!(trace.to_string(), "..");
        assert_eq!(state.events.recall_misses, 2);
        assert!(state.clock.now() > t0);
    }

    #[test]
    fn recalled_item_is_suppressed() {
        let (model, mut state) = studied(1, 0.0);
        let a = ItemId::Memorandum(0);
        let before = state.associations.row(a).iter().sum::<f64>();
        let trace = RecallEngine::new(&model).recall(&mut state);
        assert_eq!(trace.to_string(), "A");
        let after = state.associations.row(a).iter().sum::<f64>();
        assert!(after < before);
        assert!(state.associations.row(a).iter().all(|w| *w >= 0.0));
    }
}
