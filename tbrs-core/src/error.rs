//! Error types for the TBRS engine.
//!
//! Every variant is fatal for a batch: the driver stops at the first error
//! and no partial results are reported. A recall that stays below threshold
//! is *not* an error; see [`crate::outcome::RecallResponse::NoRetrieval`].

use thiserror::Error;

/// Top-level error type for all TBRS operations.
#[derive(Error, Debug)]
pub enum TbrsError {
    /// A configuration knob is out of range or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// More processing operations per memorandum than the script alphabet supports.
    #[error("Cannot handle more than {max} operations per memorandum (requested {requested})")]
    TooManyOperations {
        /// Operations requested per memorandum.
        requested: usize,
        /// Largest supported count.
        max: usize,
    },

    /// The trial consumed more distractors than the item store can hold.
    #[error("Distractor budget exhausted: at most {capacity} distractors per trial")]
    DistractorBudgetExhausted {
        /// Configured distractor capacity.
        capacity: usize,
    },

    /// A stimulus script contains a character with no meaning.
    #[error("Unknown symbol {symbol:?} in stimulus at index {index}")]
    UnknownSymbol {
        /// The offending character.
        symbol: char,
        /// Its index in the script.
        index: usize,
    },

    /// A processing operation appeared before any memorandum was presented.
    #[error("Processing operation at script index {index} precedes every memorandum")]
    OperationBeforeMemorandum {
        /// Script index of the operation.
        index: usize,
    },

    /// The script studies more memoranda than there are position representations.
    #[error("Stimulus needs {positions} positions but only {max} are available")]
    ScriptTooLong {
        /// Positions the script needs.
        positions: usize,
        /// Configured position capacity.
        max: usize,
    },

    /// The pretrained embedding table is malformed or too small.
    #[error("Embedding table error: {0}")]
    Embedding(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, TbrsError>;
