use thiserror::Error;

use crate::data::model::EntityKind;

pub type Result<T> = std::result::Result<T, FrameError>;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("row index {index} is out of range for {kind} rows (len {len})")]
    IndexOutOfRange {
        kind: EntityKind,
        index: usize,
        len: usize,
    },
    #[error("no attribute named '{name}' for {kind} rows")]
    UnknownAttribute { kind: EntityKind, name: String },
    #[error("column '{name}' has {actual} values but the batch has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error(
        "stored {kind} column '{name}' has {actual} values but the incoming batch has {expected}; \
         overwrite it in the same batch"
    )]
    StaleColumnLength {
        kind: EntityKind,
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("bin width search for '{attribute}' did not converge after {iterations} steps (range {min}..{max})")]
    BinningDidNotConverge {
        attribute: String,
        iterations: usize,
        min: f64,
        max: f64,
    },
    #[error("invalid binning hint for '{attribute}': {reason}")]
    InvalidBinningHint { attribute: String, reason: String },
    #[error("value at row {index} of '{attribute}' is not a finite number")]
    NonNumericValue { attribute: String, index: usize },
    #[error("unknown entity kind '{0}' (expected 'point' or 'edge')")]
    UnknownEntityKind(String),
    #[error("unknown data type '{0}'")]
    UnknownDataType(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
