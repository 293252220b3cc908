//! # TBRS Core Library
//!
//! A simulation engine for the time-based resource-sharing model of working
//! memory. Memoranda are bound to distributed position codes; processing
//! operations steal attention, let associations decay and entangle
//! distractors into the stored traces; free time is spent refreshing.
//! Recall reads the traces back in serial order.
//!
//! - **Positions** drift from one serial position to the next
//!   ([`position`]).
//! - **Items** have a static LTM pattern and a mutable WM copy ([`items`]).
//! - **Associations** bind items to position units, and decay over time
//!   ([`association`]).
//! - **Operators**: [`encoding`], [`interference`], [`retrieval`],
//!   [`refresh`], [`processing`], [`recall`].
//! - **Driver**: [`trial`] runs scripts over many independent replications.
//!
//! ```no_run
//! use tbrs_core::{TbrsConfig, TrialDriver};
//!
//! let mut config = TbrsConfig::default();
//! config.task.memoranda = 5;
//! config.task.operations = 8;
//! let summary = TrialDriver::new(config, None)?.run_batch()?;
//! println!("{:.3}", summary.proportion_correct);
//! # Ok::<(), tbrs_core::TbrsError>(())
//! ```

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod association;
pub mod config;
pub mod embedding;
pub mod encoding;
pub mod error;
pub mod interference;
pub mod items;
pub mod metrics;
pub mod outcome;
pub mod pattern;
pub mod position;
pub mod processing;
pub mod random;
pub mod recall;
pub mod refresh;
pub mod retrieval;
pub mod state;
pub mod stimulus;
pub mod trial;
pub mod types;

pub use config::TbrsConfig;
pub use embedding::EmbeddingTable;
pub use error::{Result, TbrsError};
pub use outcome::{BatchSummary, RecallResponse, RecallTrace, SpanSweep, TrialOutcome};
pub use stimulus::StimulusScript;
pub use trial::{TrialDriver, run_span_sweep};
pub use types::*;
