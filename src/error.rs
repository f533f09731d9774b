// External crates
use chrono::NaiveDate;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the direction pipeline
///
/// Every stage propagates these to the caller; nothing is retried.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Required column {0} not found")]
    MissingColumn(String),

    #[error("Could not parse date '{value}' at row {row}")]
    InvalidDate { row: usize, value: String },

    #[error("Duplicate date {0} in price series")]
    DuplicateDate(NaiveDate),

    #[error("Not enough data: {0}")]
    InsufficientData(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Train range must end before test range starts (train ends {train_end}, test starts {test_start})")]
    OverlappingSplits {
        train_end: NaiveDate,
        test_start: NaiveDate,
    },

    #[error("Empty {split} split: no rows between {start} and {end}")]
    EmptySplit {
        split: &'static str,
        start: String,
        end: String,
    },

    #[error("Feature dimension mismatch: expected {expected} columns, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid label {0}: labels must be 0 or 1")]
    InvalidLabel(f64),

    #[error("Length mismatch: {predictions} predictions vs {labels} labels")]
    LengthMismatch { predictions: usize, labels: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Empty split for a matrix that has no date range attached
    pub fn empty(split: &'static str) -> Self {
        PipelineError::EmptySplit {
            split,
            start: "-".to_string(),
            end: "-".to_string(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
