//! Core data types for hdfstat.
//!
//! This module defines the values flowing through the pipeline:
//! - [`Reading`] - One half-hour power sample
//! - [`Series`] - Every reading of one export, ascending
//! - [`Segment`] - A maximal run of readings 30 minutes apart
//! - [`StatPoint`] - One hourly energy value with its running sum
//! - [`StatisticMetadata`] / [`Statistics`] - An import batch for the statistics store
//! - [`Diagnostic`] - Non-fatal conditions reported alongside results

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::tz::{format_rfc3339, serialize_rfc3339};

/// The only read type the ingestor accepts.
pub const READ_TYPE: &str = "Active Import Interval (kW)";

/// Unit of every emitted statistic.
pub const UNIT_KWH: &str = "kWh";

/// One measured power value at the end of a 30-minute interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    /// Instantaneous power in kW.
    pub value: f64,
    /// End of the half-hour interval the value was recorded for.
    #[serde(serialize_with = "serialize_rfc3339")]
    pub end_time: DateTime<Tz>,
}

/// All readings of one export, in ascending time order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub mprn: String,
    pub meter_serial_number: String,
    pub read_type: String,
    pub readings: Vec<Reading>,
}

/// A maximal run of readings with exact 30-minute spacing.
///
/// Segments are built by the segmenter only and never change afterwards.
///
/// ```compile_fail
/// use hdfstat_core::models::Segment;
///
/// let segment = Segment::new(Vec::new());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    readings: Vec<Reading>,
}

impl Segment {
    pub(crate) fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn first(&self) -> Option<&Reading> {
        self.readings.first()
    }

    pub fn last(&self) -> Option<&Reading> {
        self.readings.last()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// One hourly energy value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatPoint {
    #[serde(serialize_with = "serialize_rfc3339")]
    pub start: DateTime<Tz>,
    /// Energy in kWh for this bucket.
    pub state: f64,
    /// Running total in kWh, restarting at every segment.
    pub sum: f64,
}

/// Describes the series a batch of statistics belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticMetadata {
    /// Always `recorder`, the store imports these as recorder statistics.
    pub source: &'static str,
    pub statistic_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub unit_of_measurement: &'static str,
    pub has_sum: bool,
    pub has_mean: bool,
}

impl StatisticMetadata {
    /// Metadata for a cumulative kWh statistic.
    pub fn energy(statistic_id: impl Into<String>) -> Self {
        Self {
            source: "recorder",
            statistic_id: statistic_id.into(),
            name: None,
            unit_of_measurement: UNIT_KWH,
            has_sum: true,
            has_mean: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// One import batch: the statistics derived from a single segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub metadata: StatisticMetadata,
    pub stats: Vec<StatPoint>,
}

/// Non-fatal conditions found while processing a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A daylight-saving reading had no neighbor one hour away on either
    /// side, so it could not be checked against the repeated hour.
    InsufficientContext {
        index: usize,
        #[serde(serialize_with = "serialize_rfc3339")]
        end_time: DateTime<Tz>,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::InsufficientContext { index, end_time } => write!(
                f,
                "too little data to check timezone of reading {} ({})",
                index,
                format_rfc3339(end_time)
            ),
        }
    }
}
