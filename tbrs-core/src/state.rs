//! Simulation state.
//!
//! [`Model`] holds everything fixed for a run (validated configuration and
//! derived rates). [`SimulationState`] holds everything that changes within
//! one replication. The trial driver owns one state per replication and
//! lends it to each engine call; nothing survives a replication boundary.

use crate::association::AssociationMatrix;
use crate::config::{DerivedRates, GeometryConfig, ModelParams, TaskConfig, TbrsConfig};
use crate::embedding::EmbeddingTable;
use crate::error::{Result, TbrsError};
use crate::items::ItemStore;
use crate::metrics::TrialEvents;
use crate::position::{PositionField, PositionVector};
use crate::random::RandomProcess;
use crate::types::GlobalClock;

/// Run-wide constants shared read-only by every engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Layer sizes.
    pub geometry: GeometryConfig,
    /// Free parameters.
    pub params: ModelParams,
    /// Task timing and distractor settings.
    pub task: TaskConfig,
    /// Quantities derived from `params`.
    pub rates: DerivedRates,
}

impl Model {
    /// Validate `config` and derive the run constants.
    ///
    /// # Errors
    /// Returns the first violated precondition.
    pub fn new(config: &TbrsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            geometry: config.geometry.clone(),
            params: config.model.clone(),
            task: config.task.clone(),
            rates: DerivedRates::from_params(&config.model),
        })
    }

    /// `exp(-D * duration)`: the decay factor for an elapsed duration.
    #[must_use]
    pub fn decay_factor(&self, duration: f64) -> f64 {
        (-self.params.decay_rate * duration).exp()
    }

    /// A memory processing rate drawn from `Normal(R, s)`.
    pub fn draw_rate(&self, rng: &mut RandomProcess) -> f64 {
        rng.rate(self.params.rate_mean, self.params.rate_std)
    }

    /// Duration of an encoding or recall retrieval at rate `r`, capped at the
    /// presentation time.
    #[must_use]
    pub fn encoding_duration(&self, r: f64) -> f64 {
        (self.rates.log_tau_e / r).min(self.task.presentation_time)
    }
}

/// Mutable state of one replication.
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Simulated time.
    pub clock: GlobalClock,
    /// Position codes of this trial.
    pub positions: PositionField,
    /// LTM and WM patterns.
    pub items: ItemStore,
    /// Item × position-unit weights.
    pub associations: AssociationMatrix,
    /// The replication's random stream.
    pub rng: RandomProcess,
    /// Serial position of the most recent memorandum (0 before the first).
    pub last_position: usize,
    /// Where the next refresh episode starts when refreshing resumes.
    pub refresh_cursor: usize,
    /// Event tallies.
    pub events: TrialEvents,
}

impl SimulationState {
    /// A blank state for the given geometry.
    #[must_use]
    pub fn new(geometry: &GeometryConfig, rng: RandomProcess) -> Self {
        let items = ItemStore::new(geometry);
        let associations = AssociationMatrix::new(items.layout(), geometry.position_units);
        Self {
            clock: GlobalClock::new(),
            positions: PositionField::default(),
            items,
            associations,
            rng,
            last_position: 0,
            refresh_cursor: 1,
            events: TrialEvents::default(),
        }
    }

    /// Prepare a fresh trial that studies `positions` serial positions.
    ///
    /// Position codes are drawn first, then memorandum LTM patterns.
    ///
    /// # Errors
    /// Returns `TbrsError::ScriptTooLong` if more positions are needed than
    /// the geometry provides, or an embedding error from the item store.
    pub fn begin_trial(
        &mut self,
        model: &Model,
        positions: usize,
        table: Option<&EmbeddingTable>,
    ) -> Result<()> {
        if positions > model.geometry.max_positions {
            return Err(TbrsError::ScriptTooLong {
                positions,
                max: model.geometry.max_positions,
            });
        }
        self.positions = PositionField::generate(
            &model.geometry,
            model.params.position_persistence,
            positions,
            &mut self.rng,
        );
        self.items.generate_ltm(&mut self.rng, table)?;
        self.associations.reset();
        self.clock = GlobalClock::new();
        self.last_position = 0;
        self.refresh_cursor = 1;
        self.events = TrialEvents::default();
        Ok(())
    }

    /// Code of serial position `position` (1-based).
    #[must_use]
    pub fn cue(&self, position: usize) -> &PositionVector {
        self.positions.cue(position)
    }

    /// Advance the clock and decay every association for `duration`.
    pub fn elapse(&mut self, model: &Model, duration: f64) {
        self.clock.advance(duration);
        self.associations.decay(model.decay_factor(duration), None);
    }
}
