//! Processing operations.
//!
//! A processing operation captures attention for
//! `ta = -ln(1 - tauOp) / r_op`, with `r_op ~ Normal(-ln(1 - tauOp) / Ta, s)`.
//! While it runs, a distractor is encoded at the most recent position and
//! every association decays.

use tracing::{debug, warn};

use crate::encoding::EncodingEngine;
use crate::error::{Result, TbrsError};
use crate::state::{Model, SimulationState};

/// One attention-capturing distractor operation.
#[derive(Debug, Clone, Copy)]
pub struct ProcessingStep<'a> {
    model: &'a Model,
}

impl<'a> ProcessingStep<'a> {
    /// Create a processing step for `model`.
    #[must_use]
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    /// Run one operation found at `script_index`. Returns its duration.
    ///
    /// When free time includes the operation, the duration is truncated to
    /// the free time.
    ///
    /// # Errors
    /// `OperationBeforeMemorandum` if no position is active yet,
    /// `DistractorBudgetExhausted` when the trial runs out of distractors,
    /// `Config` for an out-of-range overlap fraction.
    pub fn run(&self, state: &mut SimulationState, script_index: usize) -> Result<f64> {
        let position = state.last_position;
        if position == 0 {
            return Err(TbrsError::OperationBeforeMemorandum {
                index: script_index,
            });
        }
        let task = &self.model.task;
        let distractor = state.items.distractor_for_operation(task.same_distractor)?;

        let rate = state
            .rng
            .rate(self.model.rates.processing_rate, self.model.params.rate_std);
        let mut duration = self.model.rates.log_tau_op / rate;
        if task.free_time_includes_operation && duration > task.free_time {
            warn!(
                t = %state.clock,
                planned = duration,
                free_time = task.free_time,
                "processing truncated to the free time"
            );
            duration = task.free_time;
        }

        EncodingEngine::new(self.model).encode_distractor(state, distractor, position, duration)?;
        state.elapse(self.model, duration);

        debug!(t = %state.clock, position, duration, "processing done");
        Ok(duration)
    }

    /// Free time left for refreshing after an operation of `duration`.
    #[must_use]
    pub fn time_left(&self, duration: f64) -> f64 {
        let task = &self.model.task;
        if task.free_time_includes_operation {
            (task.free_time - duration).max(0.0)
        } else {
            task.free_time
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TbrsConfig;
    use crate::random::RandomProcess;
    use crate::types::ItemId;

    fn setup(config: &TbrsConfig) -> (Model, SimulationState) {
        let model = Model::new(config).expect("model");
        let mut state = SimulationState::new(&model.geometry, RandomProcess::seeded(41));
        state.begin_trial(&model, 2, None).expect("begin");
        (model, state)
    }

    fn study_first(model: &Model, state: &mut SimulationState) {
        state.last_position = 1;
        EncodingEngine::new(model).encode_memorandum(state, ItemId::Memorandum(0), 1);
    }

    #[test]
    fn operation_before_any_memorandum_fails() {
        let (model, mut state) = setup(&TbrsConfig::default());
        assert!(matches!(
            ProcessingStep::new(&model).run(&mut state, 0),
            Err(TbrsError::OperationBeforeMemorandum { index: 0 })
        ));
    }

    #[test]
    fn duration_is_truncated_to_free_time() {
        let mut config = TbrsConfig::default();
        config.task.free_time = 0.01;
        let (model, mut state) = setup(&config);
        study_first(&model, &mut state);
        let step = ProcessingStep::new(&model);
        let duration = step.run(&mut state, 1).expect("run");
        assert!((duration - 0.01).abs() < 1e-12);
        assert!(step.time_left(duration).abs() < 1e-12);
    }

    #[test]
    fn free_time_may_exclude_the_operation() {
        let mut config = TbrsConfig::default();
        config.task.free_time = 0.01;
        config.task.free_time_includes_operation = false;
        let (model, mut state) = setup(&config);
        study_first(&model, &mut state);
        let step = ProcessingStep::new(&model);
        let duration = step.run(&mut state, 1).expect("run");
        assert!(duration > 0.01);
        assert!((step.time_left(duration) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn processing_decays_everything_and_advances_the_clock() {
        let (model, mut state) = setup(&TbrsConfig::default());
        study_first(&model, &mut state);
        let a = ItemId::Memorandum(0);
        let before = state.associations.row(a).iter().sum::<f64>();
        let t0 = state.clock.now();
        let duration = ProcessingStep::new(&model).run(&mut state, 1).expect("run");
        assert!((state.clock.now() - t0 - duration).abs() < 1e-12);
        let after = state.associations.row(a).iter().sum::<f64>();
        assert!(after < before);
        assert_eq!(state.items.allocated_distractors(), 1);
        assert_eq!(state.events.distractors_encoded, 1);
    }

    #[test]
    fn shared_distractor_is_reused() {
        let mut config = TbrsConfig::default();
        config.task.same_distractor = true;
        let (model, mut state) = setup(&config);
        study_first(&model, &mut state);
        let step = ProcessingStep::new(&model);
        for i in 0..5 {
            step.run(&mut state, i + 1).expect("run");
        }
        assert_eq!(state.items.allocated_distractors(), 1);
        assert_eq!(state.events.distractors_encoded, 5);
    }
}
