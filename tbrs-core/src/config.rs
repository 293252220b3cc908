//! Configuration for the TBRS simulation.
//!
//! Maps directly to `tbrs.toml`. Every field has a default, and the short
//! parameter names used in the modelling literature (`nbmemo`, `P`, `tauE`,
//! ...) are accepted as aliases so existing parameter files keep working.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TbrsError};

/// Largest number of processing operations that may follow one memorandum.
pub const MAX_OPERATIONS_PER_ITEM: usize = 16;

/// Memoranda are labelled `A..Z` in recall traces.
pub const MAX_LABELLED_MEMORANDA: usize = 26;

/// Top-level TBRS configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TbrsConfig {
    /// Fixed sizes of the position and item layers.
    #[serde(default)]
    pub geometry: GeometryConfig,
    /// Free parameters of the memory model.
    #[serde(default)]
    pub model: ModelParams,
    /// Experimental task: list length, distraction, timing.
    #[serde(default)]
    pub task: TaskConfig,
    /// Replication count and randomness.
    #[serde(default)]
    pub run: RunConfig,
}

impl TbrsConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `TbrsError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| TbrsError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Serialize back to TOML (used to echo the configuration of a run).
    ///
    /// # Errors
    /// Returns `TbrsError::Config` if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TbrsError::Config(e.to_string()))
    }

    /// Check every precondition once, before any trial runs.
    ///
    /// # Errors
    /// Returns the first violated precondition.
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        self.model.validate()?;
        self.task.validate(&self.geometry)?;
        if self.run.replications == 0 {
            return Err(TbrsError::Config("replications must be at least 1".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Sizes of the position layer and the item store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Number of unit blocks in the position layer.
    #[serde(default = "default_unit_blocks")]
    pub unit_blocks: usize,
    /// Units per block; exactly one is active in each block.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Total units in the position layer. Must equal `unit_blocks * block_size`.
    #[serde(default = "default_position_units")]
    pub position_units: usize,
    /// Maximum number of serial positions.
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,
    /// Number of memoranda held in LTM (studied or not).
    #[serde(default = "default_max_memoranda")]
    pub max_memoranda: usize,
    /// Distractor slots available per trial.
    #[serde(default = "default_max_distractors")]
    pub max_distractors: usize,
    /// Dimensions of an item pattern.
    #[serde(default = "default_item_units")]
    pub item_units: usize,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            unit_blocks: 9,
            block_size: 6,
            position_units: 54,
            max_positions: 100,
            max_memoranda: 10,
            max_distractors: 90,
            item_units: 100,
        }
    }
}

impl GeometryConfig {
    fn validate(&self) -> Result<()> {
        if self.unit_blocks == 0 || self.block_size == 0 {
            return Err(TbrsError::Config(
                "position layer needs at least one block of at least one unit".into(),
            ));
        }
        if self.unit_blocks * self.block_size != self.position_units {
            return Err(TbrsError::Config(format!(
                "{} blocks of {} units do not tile a position layer of {} units",
                self.unit_blocks, self.block_size, self.position_units
            )));
        }
        if self.max_positions == 0 || self.max_memoranda == 0 || self.item_units == 0 {
            return Err(TbrsError::Config(
                "max_positions, max_memoranda and item_units must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Free parameters of the memory model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Probability that a block keeps its active unit from one position to the next.
    #[serde(default = "default_position_persistence", alias = "P")]
    pub position_persistence: f64,
    /// Mean memory processing rate (encoding, refreshing, recall).
    #[serde(default = "default_rate_mean", alias = "R")]
    pub rate_mean: f64,
    /// Standard deviation of processing rates.
    #[serde(default = "default_rate_std", alias = "s")]
    pub rate_std: f64,
    /// Criterion for encoding strength.
    #[serde(default = "default_encoding_criterion", alias = "tauE")]
    pub encoding_criterion: f64,
    /// Asymptote of item-position association strength.
    #[serde(default = "default_asymptote", alias = "L")]
    pub asymptote: f64,
    /// Retrieval threshold.
    #[serde(default = "default_retrieval_threshold", alias = "theta")]
    pub retrieval_threshold: f64,
    /// Std of the Gaussian noise added to activations at retrieval.
    #[serde(default = "default_retrieval_noise", alias = "sigma")]
    pub retrieval_noise: f64,
    /// Decay rate of associations per unit of time.
    #[serde(default = "default_decay_rate", alias = "D")]
    pub decay_rate: f64,
    /// Mean time taken to refresh an item.
    #[serde(default = "default_refresh_duration", alias = "Tr")]
    pub refresh_duration: f64,
    /// Response criterion for processing operations.
    #[serde(default = "default_processing_criterion", alias = "tauOp")]
    pub processing_criterion: f64,
    /// Mean duration of attentional capture by a processing operation.
    #[serde(default = "default_processing_duration", alias = "Ta")]
    pub processing_duration: f64,
    /// Strength of distractor encoding and entanglement relative to items.
    #[serde(default = "default_half")]
    pub distractor_encoding_weight: f64,
    /// How far a refresh pulls the WM pattern back toward its LTM pattern.
    #[serde(default = "default_half")]
    pub refresh_restoration: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            position_persistence: 0.3,
            rate_mean: 6.0,
            rate_std: 1.0,
            encoding_criterion: 0.95,
            asymptote: 1.0 / 9.0,
            retrieval_threshold: 0.05,
            retrieval_noise: 0.02,
            decay_rate: 0.5,
            refresh_duration: 0.08,
            processing_criterion: 0.95,
            processing_duration: 0.5,
            distractor_encoding_weight: 0.5,
            refresh_restoration: 0.5,
        }
    }
}

impl ModelParams {
    fn validate(&self) -> Result<()> {
        unit_interval("position_persistence", self.position_persistence)?;
        unit_interval("distractor_encoding_weight", self.distractor_encoding_weight)?;
        unit_interval("refresh_restoration", self.refresh_restoration)?;
        open_unit_interval("encoding_criterion", self.encoding_criterion)?;
        open_unit_interval("processing_criterion", self.processing_criterion)?;
        positive("rate_mean", self.rate_mean)?;
        positive("refresh_duration", self.refresh_duration)?;
        positive("processing_duration", self.processing_duration)?;
        positive("asymptote", self.asymptote)?;
        non_negative("rate_std", self.rate_std)?;
        non_negative("retrieval_noise", self.retrieval_noise)?;
        non_negative("decay_rate", self.decay_rate)?;
        if !self.retrieval_threshold.is_finite() {
            return Err(TbrsError::Config("retrieval_threshold must be finite".into()));
        }
        Ok(())
    }
}

/// The experimental task: what is presented, and how time is split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Number of memoranda in the list.
    #[serde(default = "default_memoranda", alias = "nbmemo")]
    pub memoranda: usize,
    /// Processing operations after each memorandum.
    #[serde(default = "default_operations", alias = "nbop")]
    pub operations: usize,
    /// Presentation time of a memorandum.
    #[serde(default = "default_presentation_time")]
    pub presentation_time: f64,
    /// Free time following each processing operation.
    #[serde(default = "default_free_time", alias = "freeTime")]
    pub free_time: f64,
    /// Whether the free time includes the operation duration.
    #[serde(default = "default_true", alias = "ftiod")]
    pub free_time_includes_operation: bool,
    /// Positions refreshed together in one pass.
    #[serde(default = "default_attentional_focus")]
    pub attentional_focus: usize,
    /// Resume refreshing after the last refreshed position instead of position 1.
    #[serde(default, alias = "refreshLastStopped")]
    pub refresh_resumes: bool,
    /// All processing operations of a trial share one distractor.
    #[serde(default, alias = "sameDist")]
    pub same_distractor: bool,
    /// Fraction of a distractor's dimensions shared with the cued item.
    #[serde(default = "default_item_distractor_overlap", alias = "ido")]
    pub item_distractor_overlap: f64,
    /// Noise applied to the shared dimensions of a distractor.
    #[serde(default = "default_item_distractor_noise", alias = "idn")]
    pub item_distractor_noise: f64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            memoranda: 7,
            operations: 4,
            presentation_time: 1.5,
            free_time: 1.0,
            free_time_includes_operation: true,
            attentional_focus: 1,
            refresh_resumes: false,
            same_distractor: false,
            item_distractor_overlap: 0.4,
            item_distractor_noise: 1.0,
        }
    }
}

impl TaskConfig {
    fn validate(&self, geometry: &GeometryConfig) -> Result<()> {
        if self.operations > MAX_OPERATIONS_PER_ITEM {
            return Err(TbrsError::TooManyOperations {
                requested: self.operations,
                max: MAX_OPERATIONS_PER_ITEM,
            });
        }
        if !(0.0..=1.0).contains(&self.item_distractor_overlap) {
            return Err(TbrsError::Config(
                "item distractor overlap should be between 0 and 1".into(),
            ));
        }
        let limit = geometry
            .max_memoranda
            .min(geometry.max_positions)
            .min(MAX_LABELLED_MEMORANDA);
        if self.memoranda == 0 || self.memoranda > limit {
            return Err(TbrsError::Config(format!(
                "memoranda must be between 1 and {limit} (got {})",
                self.memoranda
            )));
        }
        if self.attentional_focus == 0 {
            return Err(TbrsError::Config("attentional_focus must be at least 1".into()));
        }
        positive("presentation_time", self.presentation_time)?;
        non_negative("free_time", self.free_time)?;
        non_negative("item_distractor_noise", self.item_distractor_noise)?;
        Ok(())
    }
}

/// Replications and randomness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of independent replications.
    #[serde(default = "default_replications", alias = "nbSimulations")]
    pub replications: usize,
    /// Use `seed` instead of OS entropy.
    #[serde(default, alias = "determ")]
    pub deterministic: bool,
    /// Base seed when `deterministic` is set.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Run replications on the rayon thread pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            replications: 500,
            deterministic: false,
            seed: 1,
            parallel: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived quantities
// ---------------------------------------------------------------------------

/// Quantities derived once per run from [`ModelParams`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedRates {
    /// `-ln(1 - tauE)`: numerator of encoding and recall durations.
    pub log_tau_e: f64,
    /// `1 - exp(-R * Tr)`: criterion for refresh re-encoding.
    pub tau_r: f64,
    /// `-ln(1 - tauOp)`: numerator of processing durations.
    pub log_tau_op: f64,
    /// `-ln(1 - tauOp) / Ta`: mean processing rate.
    pub processing_rate: f64,
}

impl DerivedRates {
    /// Derive the run constants from model parameters.
    #[must_use]
    pub fn from_params(params: &ModelParams) -> Self {
        let log_tau_e = -(1.0 - params.encoding_criterion).ln();
        let tau_r = 1.0 - (-params.rate_mean * params.refresh_duration).exp();
        let log_tau_op = -(1.0 - params.processing_criterion).ln();
        Self {
            log_tau_e,
            tau_r,
            log_tau_op,
            processing_rate: log_tau_op / params.processing_duration,
        }
    }

    /// Refresh duration numerator `-ln(1 - tau_r)`.
    #[must_use]
    pub fn log_tau_r(&self) -> f64 {
        -(1.0 - self.tau_r).ln()
    }
}

// ---------------------------------------------------------------------------
// Range checks
// ---------------------------------------------------------------------------

fn unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TbrsError::Config(format!("{name} must lie in [0, 1] (got {value})")))
    }
}

fn open_unit_interval(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(TbrsError::Config(format!("{name} must lie in (0, 1) (got {value})")))
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TbrsError::Config(format!("{name} must be positive (got {value})")))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TbrsError::Config(format!("{name} must not be negative (got {value})")))
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_half() -> f64 { 0.5 }
fn default_unit_blocks() -> usize { 9 }
fn default_block_size() -> usize { 6 }
fn default_position_units() -> usize { 54 }
fn default_max_positions() -> usize { 100 }
fn default_max_memoranda() -> usize { 10 }
fn default_max_distractors() -> usize { 90 }
fn default_item_units() -> usize { 100 }
fn default_position_persistence() -> f64 { 0.3 }
fn default_rate_mean() -> f64 { 6.0 }
fn default_rate_std() -> f64 { 1.0 }
fn default_encoding_criterion() -> f64 { 0.95 }
fn default_asymptote() -> f64 { 1.0 / 9.0 }
fn default_retrieval_threshold() -> f64 { 0.05 }
fn default_retrieval_noise() -> f64 { 0.02 }
fn default_decay_rate() -> f64 { 0.5 }
fn default_refresh_duration() -> f64 { 0.08 }
fn default_processing_criterion() -> f64 { 0.95 }
fn default_processing_duration() -> f64 { 0.5 }
fn default_memoranda() -> usize { 7 }
fn default_operations() -> usize { 4 }
fn default_presentation_time() -> f64 { 1.5 }
fn default_free_time() -> f64 { 1.0 }
fn default_attentional_focus() -> usize { 1 }
fn default_item_distractor_overlap() -> f64 { 0.4 }
fn default_item_distractor_noise() -> f64 { 1.0 }
fn default_replications() -> usize { 500 }
fn default_seed() -> u64 { 1 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        TbrsConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = TbrsConfig::from_toml("").expect("parse");
        assert_eq!(config, TbrsConfig::default());
    }

    #[test]
    fn short_names_are_accepted() {
        let config = TbrsConfig::from_toml(
            r"
            [model]
            P = 0.7
            theta = 0.1
            [task]
            nbmemo = 5
            nbop = 8
            ido = 0.25
            [run]
            determ = true
            ",
        )
        .expect("parse");
        assert!((config.model.position_persistence - 0.7).abs() < f64::EPSILON);
        assert!((config.model.retrieval_threshold - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.task.memoranda, 5);
        assert_eq!(config.task.operations, 8);
        assert!((config.task.item_distractor_overlap - 0.25).abs() < f64::EPSILON);
        assert!(config.run.deterministic);
    }

    #[test]
    fn toml_round_trip() {
        let mut config = TbrsConfig::default();
        config.task.memoranda = 4;
        config.model.decay_rate = 0.8;
        let text = config.to_toml().expect("serialize");
        let back = TbrsConfig::from_toml(&text).expect("parse");
        assert_eq!(back, config);
    }

    #[test]
    fn rejects_overlap_out_of_range() {
        let mut config = TbrsConfig::default();
        config.task.item_distractor_overlap = 1.2;
        assert!(matches!(config.validate(), Err(TbrsError::Config(_))));
        config.task.item_distractor_overlap = -0.1;
        assert!(matches!(config.validate(), Err(TbrsError::Config(_))));
    }

    #[test]
    fn rejects_too_many_operations() {
        let mut config = TbrsConfig::default();
        config.task.operations = 17;
        assert!(matches!(
            config.validate(),
            Err(TbrsError::TooManyOperations { requested: 17, max: 16 })
        ));
        config.task.operations = 16;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_untiled_geometry() {
        let mut config = TbrsConfig::default();
        config.geometry.position_units = 50;
        assert!(matches!(config.validate(), Err(TbrsError::Config(_))));
    }

    #[test]
    fn rejects_list_longer_than_store() {
        let mut config = TbrsConfig::default();
        config.task.memoranda = 11;
        assert!(config.validate().is_err());
        config.task.memoranda = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_degenerate_criteria() {
        let mut config = TbrsConfig::default();
        config.model.encoding_criterion = 1.0;
        assert!(config.validate().is_err());

        let mut config = TbrsConfig::default();
        config.model.refresh_duration = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn derived_rates_match_closed_form() {
        let rates = DerivedRates::from_params(&ModelParams::default());
        assert!((rates.log_tau_e - 20.0_f64.ln()).abs() < 1e-12);
        assert!((rates.tau_r - (1.0 - (-0.48_f64).exp())).abs() < 1e-12);
        assert!((rates.processing_rate - 20.0_f64.ln() / 0.5).abs() < 1e-12);
        assert!((rates.log_tau_r() - 0.48).abs() < 1e-12);
    }
}
