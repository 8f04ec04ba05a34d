//! Hourly energy resampling.
//!
//! ESB exports kW every half an hour, while the statistics store wants kWh
//! every hour, with the timestamp at the start of the period rather than at
//! its end. kW is power and kWh is energy, so a half-hour reading of `v` kW
//! is worth `v / 2` kWh.

use chrono::{DateTime, Duration, Timelike};
use chrono_tz::Tz;

use crate::error::AggregationError;
use crate::models::{Segment, StatPoint, StatisticMetadata, Statistics};
use crate::segment::cadence;
use crate::tz::format_rfc3339;

/// Resample one segment into hourly [`StatPoint`]s.
///
/// A leading reading on the hour is dropped so the run starts on a half
/// hour. Readings are folded into the current bucket until an even, non-zero
/// index is reached, then the bucket is emitted with `start` set to the
/// reading before the one that closed it. The first bucket therefore holds
/// three half hours and every later one two; `start` sits between the two
/// values it is centred on. A trailing reading that does not close a bucket
/// is discarded. `sum` restarts at zero for every segment.
///
/// # Examples
///
/// ```
/// use hdfstat_core::aggregate::aggregate;
/// use hdfstat_core::parse::parse_hdf;
/// use hdfstat_core::segment::split_segments;
/// use hdfstat_core::tz::HomeZone;
///
/// let data = "MPRN,Meter Serial Number,Read Value,Read Type,Read Date and End Time
/// 123,45,1.0,Active Import Interval (kW),15-01-2023 23:30
/// 123,45,1.0,Active Import Interval (kW),15-01-2023 23:00
/// 123,45,1.0,Active Import Interval (kW),15-01-2023 22:30";
///
/// let series = parse_hdf(data.as_bytes(), &HomeZone::dublin()).unwrap();
/// let segments = split_segments(&series).unwrap();
/// let points = aggregate(&segments[0]).unwrap();
///
/// assert_eq!(points.len(), 1);
/// assert_eq!(points[0].state, 1.5);
/// assert_eq!(points[0].sum, 1.5);
/// ```
pub fn aggregate(segment: &Segment) -> Result<Vec<StatPoint>, AggregationError> {
    let mut reads = segment.readings();
    if reads.first().is_some_and(|r| is_round_hour(&r.end_time)) {
        // Start from a half hour.
        reads = &reads[1..];
    }
    let first = reads.first().ok_or(AggregationError::NotEnoughData)?;

    let mut previous = first.end_time - cadence();
    let mut value = 0.0;
    let mut sum = 0.0;
    let mut points = Vec::with_capacity(reads.len() / 2);

    for (i, reading) in reads.iter().enumerate() {
        let delta = reading.end_time.signed_duration_since(previous);
        if delta != cadence() {
            return Err(AggregationError::Spacing {
                index: i,
                minutes: delta.num_minutes(),
                previous: format_rfc3339(&previous),
                current: format_rfc3339(&reading.end_time),
            });
        }
        previous = reading.end_time;

        value += reading.value * 0.5;

        if i % 2 == 0 && i > 0 {
            sum += value;
            points.push(StatPoint {
                start: reads[i - 1].end_time,
                state: value,
                sum,
            });
            value = 0.0;
        }
    }

    Ok(points)
}

/// Resample one segment and wrap the points into an import batch.
pub fn translate(
    segment: &Segment,
    metadata: &StatisticMetadata,
) -> Result<Statistics, AggregationError> {
    Ok(Statistics {
        metadata: metadata.clone(),
        stats: aggregate(segment)?,
    })
}

fn is_round_hour(ts: &DateTime<Tz>) -> bool {
    ts.minute() == 0 && ts.second() == 0 && ts.nanosecond() == 0
}

/// Total energy in kWh of a batch, the last running sum.
pub fn total_energy(points: &[StatPoint]) -> f64 {
    points.last().map_or(0.0, |p| p.sum)
}

/// Length of the period a batch covers, from first to last bucket start.
pub fn covered_span(points: &[StatPoint]) -> Duration {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => last.start.signed_duration_since(first.start),
        _ => Duration::zero(),
    }
}
