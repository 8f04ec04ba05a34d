//! End-to-end conversion of an export into import batches.
//!
//! The stages run strictly forward: parse, repair the repeated hour, split
//! into segments, then resample each segment on its own. Segments never
//! share state, so a segment that fails to aggregate does not affect the
//! others.

use std::io::Read;

use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregate::translate;
use crate::disambiguate::fix_repeated_hour;
use crate::error::{AggregationError, HdfError, Result};
use crate::models::{Diagnostic, Segment, Series, StatisticMetadata, Statistics};
use crate::parse::parse_hdf;
use crate::segment::split_segments;
use crate::tz::HomeZone;

/// An export after parsing, repair and segmentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingested {
    pub series: Series,
    pub segments: Vec<Segment>,
    pub diagnostics: Vec<Diagnostic>,
}

/// The result of aggregating one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentOutcome {
    /// Position of the segment in the series, starting at zero.
    pub index: usize,
    pub readings: usize,
    pub result: std::result::Result<Statistics, AggregationError>,
}

/// An export converted into one import batch per segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub mprn: String,
    pub meter_serial_number: String,
    pub read_type: String,
    pub outcomes: Vec<SegmentOutcome>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Conversion {
    /// Batches of the segments that aggregated successfully, in time order.
    pub fn batches(&self) -> impl Iterator<Item = &Statistics> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Segments that failed to aggregate, with their error.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &AggregationError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.index, e)))
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Parse an export, repair the repeated hour and split it into segments.
pub fn ingest<R: Read>(input: R, zone: &HomeZone) -> Result<Ingested> {
    let mut series = parse_hdf(input, zone)?;
    // Spacing only holds once the repeated hour is repaired.
    let diagnostics = fix_repeated_hour(&mut series, zone);
    let segments = split_segments(&series)?;

    debug!(
        readings = series.readings.len(),
        segments = segments.len(),
        diagnostics = diagnostics.len(),
        "ingested export"
    );

    Ok(Ingested {
        series,
        segments,
        diagnostics,
    })
}

/// Convert an export into import batches, one per segment.
///
/// Fails on any format, alignment or ordering problem, and when the export
/// holds no readings at all. Aggregation problems are recorded per segment.
///
/// # Examples
///
/// ```
/// use hdfstat_core::models::StatisticMetadata;
/// use hdfstat_core::pipeline::convert;
/// use hdfstat_core::tz::HomeZone;
///
/// let data = "MPRN,Meter Serial Number,Read Value,Read Type,Read Date and End Time
/// 123,45,1.0,Active Import Interval (kW),15-01-2023 23:30
/// 123,45,1.0,Active Import Interval (kW),15-01-2023 23:00
/// 123,45,1.0,Active Import Interval (kW),15-01-2023 22:30";
///
/// let conversion = convert(
///     data.as_bytes(),
///     &HomeZone::dublin(),
///     &StatisticMetadata::energy("sensor.esb"),
/// )
/// .unwrap();
///
/// assert!(conversion.is_complete());
/// assert_eq!(conversion.batches().count(), 1);
/// ```
pub fn convert<R: Read>(
    input: R,
    zone: &HomeZone,
    metadata: &StatisticMetadata,
) -> Result<Conversion> {
    let ingested = ingest(input, zone)?;
    if ingested.segments.is_empty() {
        return Err(HdfError::Aggregation(AggregationError::NotEnoughData));
    }

    let outcomes = ingested
        .segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            let result = translate(segment, metadata);
            if let Err(e) = &result {
                warn!(
                    segment = index,
                    readings = segment.len(),
                    "cannot aggregate segment: {e}"
                );
            }
            SegmentOutcome {
                index,
                readings: segment.len(),
                result,
            }
        })
        .collect();

    let Ingested {
        series,
        diagnostics,
        ..
    } = ingested;

    Ok(Conversion {
        mprn: series.mprn,
        meter_serial_number: series.meter_serial_number,
        read_type: series.read_type,
        outcomes,
        diagnostics,
    })
}
