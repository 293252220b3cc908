//! Trial driver: runs stimulus scripts and aggregates replications.
//!
//! ```text
//!   TrialDriver::new(config, table)        validate once
//!        │
//!        ├── run_trial(seed, i)             one replication, own RNG stream
//!        │      begin_trial → A 1 2 B 1 2 ... # → score
//!        │
//!        └── run_batch()                    replications 0..n (rayon or serial)
//!               → BatchSummary              folded in replication order
//! ```
//!
//! Replications share nothing but the read-only [`Model`] and the atomic
//! counters, so the batch runs embarrassingly parallel. The first error
//! aborts the whole batch.

use rayon::prelude::*;
use tracing::{debug, debug_span, info};

use crate::config::TbrsConfig;
use crate::embedding::EmbeddingTable;
use crate::encoding::EncodingEngine;
use crate::error::{Result, TbrsError};
use crate::metrics::SimulationCounters;
use crate::outcome::{BatchSummary, SerialPositionTally, SpanSweep, TrialOutcome};
use crate::processing::ProcessingStep;
use crate::random::RandomProcess;
use crate::recall::RecallEngine;
use crate::refresh::RefreshScheduler;
use crate::state::{Model, SimulationState};
use crate::stimulus::{StimulusScript, Symbol};
use crate::types::ItemId;

/// Runs trials of one configuration.
#[derive(Debug)]
pub struct TrialDriver {
    config: TbrsConfig,
    model: Model,
    script: StimulusScript,
    expected: Vec<ItemId>,
    table: Option<EmbeddingTable>,
    counters: SimulationCounters,
}

impl TrialDriver {
    /// Validate `config` (and `table`, if given) and build the canonical script.
    ///
    /// # Errors
    /// Returns the first violated precondition.
    pub fn new(config: TbrsConfig, table: Option<EmbeddingTable>) -> Result<Self> {
        let model = Model::new(&config)?;
        if let Some(table) = &table {
            table.validate_shape(model.geometry.max_memoranda, model.geometry.item_units)?;
        }
        let script = StimulusScript::build(config.task.memoranda, config.task.operations)?;
        Ok(Self {
            config,
            model,
            expected: script.studied_order(),
            script,
            table,
            counters: SimulationCounters::new(),
        })
    }

    /// Replace the canonical script with a custom one.
    ///
    /// # Errors
    /// Returns `TbrsError::ScriptTooLong` if the script studies more
    /// positions than exist, or `TbrsError::Config` if it names a memorandum
    /// beyond the item store.
    pub fn with_script(mut self, script: StimulusScript) -> Result<Self> {
        let geometry = &self.model.geometry;
        if script.positions() > geometry.max_positions {
            return Err(TbrsError::ScriptTooLong {
                positions: script.positions(),
                max: geometry.max_positions,
            });
        }
        if let Some(highest) = script.highest_memorandum() {
            if highest >= geometry.max_memoranda {
                return Err(TbrsError::Config(format!(
                    "script names memorandum {} but only {} are stored",
                    highest + 1,
                    geometry.max_memoranda
                )));
            }
        }
        self.expected = script.studied_order();
        self.script = script;
        Ok(self)
    }

    /// The validated run constants.
    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The script every replication follows.
    #[must_use]
    pub fn script(&self) -> &StimulusScript {
        &self.script
    }

    /// Counters of the most recent batch. Standalone [`TrialDriver::run_trial`]
    /// calls are not counted.
    #[must_use]
    pub fn counters(&self) -> &SimulationCounters {
        &self.counters
    }

    /// Base seed for the next batch: the configured seed when deterministic,
    /// otherwise fresh entropy.
    #[must_use]
    pub fn resolve_seed(&self) -> u64 {
        if self.config.run.deterministic {
            self.config.run.seed
        } else {
            rand::random()
        }
    }

    /// Run replication `replication` of the stream seeded with `seed`.
    ///
    /// # Errors
    /// Any fatal error raised while walking the script.
    pub fn run_trial(&self, seed: u64, replication: u64) -> Result<TrialOutcome> {
        let _span = debug_span!("trial", replication).entered();
        let model = &self.model;
        let mut state = SimulationState::new(
            &model.geometry,
            RandomProcess::for_replication(seed, replication),
        );
        state.begin_trial(model, self.script.positions(), self.table.as_ref())?;

        let encoding = EncodingEngine::new(model);
        let refresh = RefreshScheduler::new(model);
        let processing = ProcessingStep::new(model);
        let mut trace = None;

        for (index, symbol) in self.script.symbols().iter().enumerate() {
            match *symbol {
                Symbol::Memorandum(item) => {
                    state.last_position += 1;
                    let position = state.last_position;
                    let duration =
                        encoding.encode_memorandum(&mut state, ItemId::Memorandum(item), position);
                    refresh.refresh(&mut state, model.task.presentation_time - duration);
                }
                Symbol::Operation(_) => {
                    let duration = processing.run(&mut state, index)?;
                    refresh.refresh(&mut state, processing.time_left(duration));
                }
                Symbol::Recall => {
                    trace = Some(RecallEngine::new(model).recall(&mut state));
                    break;
                }
            }
        }

        let trace = trace.unwrap_or_default();
        let correct = trace.score(&self.expected);
        let outcome = TrialOutcome {
            replication,
            trace,
            correct,
            duration: state.clock.now(),
            events: state.events,
        };
        debug!(
            trace = %outcome.trace,
            correct = outcome.proportion_correct(),
            t = outcome.duration,
            "trial done"
        );
        Ok(outcome)
    }

    /// Run every replication and summarise.
    ///
    /// # Errors
    /// The first fatal error of any replication; no partial summary is returned.
    pub fn run_batch(&self) -> Result<BatchSummary> {
        let seed = self.resolve_seed();
        self.run_batch_with_seed(seed)
    }

    /// [`TrialDriver::run_batch`] with an explicit base seed.
    ///
    /// # Errors
    /// The first fatal error of any replication.
    pub fn run_batch_with_seed(&self, seed: u64) -> Result<BatchSummary> {
        let replications = self.config.run.replications as u64;
        self.counters.reset();
        info!(
            seed,
            replications,
            script = %self.script,
            parallel = self.config.run.parallel,
            "batch started"
        );

        let counted = |i: u64| -> Result<TrialOutcome> {
            let outcome = self.run_trial(seed, i)?;
            self.counters.record_trial(&outcome.events);
            Ok(outcome)
        };
        let outcomes: Vec<TrialOutcome> = if self.config.run.parallel {
            (0..replications)
                .into_par_iter()
                .map(counted)
                .collect::<Result<Vec<_>>>()?
        } else {
            (0..replications).map(counted).collect::<Result<Vec<_>>>()?
        };

        let mut tally = SerialPositionTally::new();
        let mut total_duration = 0.0;
        for outcome in &outcomes {
            tally.add(outcome);
            total_duration += outcome.duration;
        }

        let mean_trial_duration = if outcomes.is_empty() {
            0.0
        } else {
            total_duration / outcomes.len() as f64
        };
        let summary = BatchSummary {
            config: self.config.clone(),
            seed,
            script: self.script.to_string(),
            replications,
            proportion_correct: tally.proportion_correct(),
            serial_position: tally.serial_position_curve(),
            mean_trial_duration,
            counters: self.counters.snapshot(),
            traces: outcomes.iter().map(|o| o.trace.to_string()).collect(),
        };
        info!(
            proportion_correct = summary.proportion_correct,
            mean_trial_duration,
            "batch finished"
        );
        Ok(summary)
    }
}

/// Run one batch per list length `1..=config.task.memoranda`.
///
/// Every batch shares the same base seed, so list lengths are compared on
/// common random streams.
///
/// # Errors
/// The first fatal error of any batch.
pub fn run_span_sweep(config: &TbrsConfig, table: Option<&EmbeddingTable>) -> Result<SpanSweep> {
    let top = config.task.memoranda;
    let seed = TrialDriver::new(config.clone(), table.cloned())?.resolve_seed();
    let mut batches = Vec::with_capacity(top);
    for length in 1..=top {
        let mut config = config.clone();
        config.task.memoranda = length;
        let driver = TrialDriver::new(config, table.cloned())?;
        batches.push(driver.run_batch_with_seed(seed)?);
    }
    let sweep = SpanSweep::from_batches(batches);
    info!(span = sweep.span, lengths = top, "span sweep finished");
    Ok(sweep)
}
