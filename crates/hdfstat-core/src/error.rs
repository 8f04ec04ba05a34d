//! Error types for hdfstat-core.
//!
//! Every stage of the pipeline reports through [`HdfError`]. Format problems
//! abort the whole parse, alignment and ordering problems abort segmentation,
//! and [`AggregationError`] only ever affects the segment it was raised for.

use thiserror::Error;

/// The main error type for hdfstat operations.
#[derive(Debug, Error)]
pub enum HdfError {
    /// Invalid timezone name provided.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// The export does not follow the expected tabular format.
    #[error("Invalid format: {0}")]
    Format(#[from] FormatError),

    /// A reading does not end on a clock minute of 0 or 30.
    #[error("Timestamp {timestamp} is not aligned with 30 minutes")]
    Alignment { timestamp: String },

    /// Two consecutive readings are not strictly ascending.
    #[error("Data is not sorted by time: last {previous}, current {current}")]
    Ordering { previous: String, current: String },

    /// A segment could not be resampled into hourly statistics.
    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),
}

/// Problems found while reading the header and data rows of an export.
///
/// Row indexes are 1-based and count data rows only, the header excluded.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("input is empty, expected a header")]
    EmptyInput,

    #[error("cannot read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("header is {got} long, want {want}")]
    HeaderLength { got: usize, want: usize },

    #[error("field {index} in header is {got:?}, want {want:?}")]
    HeaderField {
        index: usize,
        got: String,
        want: &'static str,
    },

    #[error("row {row} is missing field {field:?}")]
    MissingField { row: usize, field: &'static str },

    #[error("row {row} has {got} fields, want {want}")]
    ExtraFields { row: usize, got: usize, want: usize },

    #[error("row {row} has read type {got:?}, want {want:?}")]
    ReadType {
        row: usize,
        got: String,
        want: &'static str,
    },

    #[error("row {row} has invalid read value {value:?}: {reason}")]
    Value {
        row: usize,
        value: String,
        reason: String,
    },

    #[error("row {row} has invalid timestamp {value:?}: {reason}")]
    Timestamp {
        row: usize,
        value: String,
        reason: String,
    },

    #[error("row {row} has timestamp {value:?} which does not exist in {zone}")]
    NonexistentTime {
        row: usize,
        value: String,
        zone: String,
    },

    #[error("multiple MPRN found ({first:?} and {found:?}) on row {row}")]
    MixedMprn {
        row: usize,
        first: String,
        found: String,
    },

    #[error("multiple meter serial numbers found ({first:?} and {found:?}) on row {row}")]
    MixedSerialNumber {
        row: usize,
        first: String,
        found: String,
    },
}

/// Reasons a single segment cannot be turned into hourly statistics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    #[error("not enough data")]
    NotEnoughData,

    #[error(
        "value {index}: entries should be recorded at 30 minutes increment, got {minutes} ({previous} -> {current})"
    )]
    Spacing {
        index: usize,
        minutes: i64,
        previous: String,
        current: String,
    },
}

/// Result type alias for hdfstat operations.
pub type Result<T> = std::result::Result<T, HdfError>;
