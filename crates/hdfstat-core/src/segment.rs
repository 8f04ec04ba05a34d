//! Series segmentation.
//!
//! ESB data sometimes has holes. The segmenter splits an ascending series
//! into maximal runs of readings exactly 30 minutes apart; every hole starts
//! a new run. Runs are never merged back together.

use chrono::{DateTime, Duration, Timelike};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{HdfError, Result};
use crate::models::{Reading, Segment, Series};
use crate::tz::format_rfc3339;

/// Spacing between two consecutive readings.
pub fn cadence() -> Duration {
    Duration::minutes(30)
}

/// Split the readings of `series` into contiguous [`Segment`]s.
///
/// Fails if a reading is not on minute 0 or 30, or if a reading is not
/// strictly after the previous one. An empty series yields no segments.
///
/// # Examples
///
/// ```
/// use hdfstat_core::parse::parse_hdf;
/// use hdfstat_core::segment::split_segments;
/// use hdfstat_core::tz::HomeZone;
///
/// let data = "MPRN,Meter Serial Number,Read Value,Read Type,Read Date and End Time
/// 123,45,0.3,Active Import Interval (kW),20-01-2023 02:30
/// 123,45,0.2,Active Import Interval (kW),15-01-2023 23:30
/// 123,45,0.1,Active Import Interval (kW),15-01-2023 23:00";
///
/// let series = parse_hdf(data.as_bytes(), &HomeZone::dublin()).unwrap();
/// let segments = split_segments(&series).unwrap();
/// assert_eq!(segments.len(), 2);
/// ```
pub fn split_segments(series: &Series) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut current: Vec<Reading> = Vec::new();
    let mut previous: Option<DateTime<Tz>> = None;

    for reading in &series.readings {
        let ts = reading.end_time;
        check_alignment(&ts)?;

        if let Some(last) = previous {
            let delta = ts.signed_duration_since(last);
            if delta <= Duration::zero() {
                return Err(HdfError::Ordering {
                    previous: format_rfc3339(&last),
                    current: format_rfc3339(&ts),
                });
            }
            if delta != cadence() {
                debug!(
                    from = %format_rfc3339(&last),
                    to = %format_rfc3339(&ts),
                    "gap in data, starting a new segment"
                );
                segments.push(Segment::new(std::mem::take(&mut current)));
            }
        }

        current.push(*reading);
        previous = Some(ts);
    }

    if !current.is_empty() {
        segments.push(Segment::new(current));
    }

    Ok(segments)
}

/// Check that the timestamp is at the hour or half an hour sharp.
pub fn check_alignment(ts: &DateTime<Tz>) -> Result<()> {
    let minute = ts.minute();
    if ts.second() != 0 || ts.nanosecond() != 0 || (minute != 0 && minute != 30) {
        return Err(HdfError::Alignment {
            timestamp: format_rfc3339(ts),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disambiguate::fix_repeated_hour;
    use crate::parse::parse_hdf;
    use crate::tz::HomeZone;
    use chrono::TimeZone;

    const HEADER_LINE: &str =
        "MPRN,Meter Serial Number,Read Value,Read Type,Read Date and End Time";

    fn series_from(rows: &[(&str, &str)]) -> Series {
        let mut data = HEADER_LINE.to_string();
        for (value, ts) in rows {
            data.push_str(&format!(
                "\n123,45,{value},Active Import Interval (kW),{ts}"
            ));
        }
        let zone = HomeZone::dublin();
        let mut series = parse_hdf(data.as_bytes(), &zone).unwrap();
        fix_repeated_hour(&mut series, &zone);
        series
    }

    fn values(segment: &Segment) -> Vec<f64> {
        segment.readings().iter().map(|r| r.value).collect()
    }

    #[test]
    fn contiguous_data_is_one_segment() {
        let series = series_from(&[
            ("0.3", "15-01-2023 23:30"),
            ("0.2", "15-01-2023 23:00"),
            ("0.1", "15-01-2023 22:30"),
        ]);
        let segments = split_segments(&series).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(values(&segments[0]), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn holes_in_data() {
        let series = series_from(&[
            ("0.6", "20-01-2023 02:30"),
            ("0.5", "20-01-2023 00:30"),
            ("0.4", "20-01-2023 00:00"),
            ("0.3", "15-01-2023 23:30"),
            ("0.2", "15-01-2023 23:00"),
            ("0.1", "15-01-2023 22:30"),
        ]);
        let segments = split_segments(&series).unwrap();

        assert_eq!(segments.len(), 3);
        assert_eq!(values(&segments[0]), vec![0.1, 0.2, 0.3]);
        assert_eq!(values(&segments[1]), vec![0.4, 0.5]);
        assert_eq!(values(&segments[2]), vec![0.6]);
        for segment in &segments {
            for pair in segment.readings().windows(2) {
                assert_eq!(
                    pair[1].end_time.signed_duration_since(pair[0].end_time),
                    cadence()
                );
            }
        }
    }

    #[test]
    fn gap_across_days_splits() {
        let series = series_from(&[
            ("0.3", "16-01-2023 03:00"),
            ("0.2", "16-01-2023 02:30"),
            ("0.1", "15-01-2023 23:30"),
        ]);
        let segments = split_segments(&series).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 1);
        assert_eq!(segments[1].len(), 2);
        assert_eq!(
            segments[1].first().unwrap().end_time,
            chrono_tz::Europe::Dublin
                .with_ymd_and_hms(2023, 1, 16, 2, 30, 0)
                .single()
                .unwrap()
        );
    }

    #[test]
    fn entering_daylight_saving_time_is_one_segment() {
        let series = series_from(&[
            ("0.1", "26-03-2023 02:30"),
            ("0.1", "26-03-2023 02:00"),
            ("0.1", "26-03-2023 00:30"),
            ("0.1", "26-03-2023 00:00"),
        ]);
        let segments = split_segments(&series).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 4);
    }

    #[test]
    fn leaving_daylight_saving_time_is_one_segment() {
        let series = series_from(&[
            ("0.1", "29-10-2023 01:00"),
            ("0.1", "29-10-2023 00:30"),
            ("0.1", "29-10-2023 00:00"),
            ("0.1", "29-10-2023 00:30"),
        ]);
        let segments = split_segments(&series).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 4);
    }

    #[test]
    fn wrong_order() {
        let series = series_from(&[
            ("0.157", "15-01-2023 23:00"),
            ("0.194", "15-01-2023 23:30"),
        ]);
        let err = split_segments(&series).unwrap_err();
        assert!(matches!(err, HdfError::Ordering { .. }));
        assert_eq!(
            err.to_string(),
            "Data is not sorted by time: last 2023-01-15T23:30:00+00:00, current 2023-01-15T23:00:00+00:00"
        );
    }

    #[test]
    fn duplicate_timestamp_is_not_sorted() {
        let series = series_from(&[
            ("0.2", "15-01-2023 23:30"),
            ("0.1", "15-01-2023 23:30"),
        ]);
        assert!(matches!(
            split_segments(&series),
            Err(HdfError::Ordering { .. })
        ));
    }

    #[test]
    fn not_aligned() {
        let series = series_from(&[("0.194", "15-01-2023 23:33")]);
        let err = split_segments(&series).unwrap_err();
        match err {
            HdfError::Alignment { timestamp } => {
                assert_eq!(timestamp, "2023-01-15T23:33:00+00:00")
            }
            other => panic!("Expected Alignment error, got {other:?}"),
        }
    }

    #[test]
    fn empty_series_has_no_segments() {
        let series = series_from(&[]);
        assert!(split_segments(&series).unwrap().is_empty());
    }

    #[test]
    fn summer_hole_splits_without_moving_readings() {
        let series = series_from(&[
            ("0.6", "15-07-2023 13:30"),
            ("0.5", "15-07-2023 13:00"),
            ("0.4", "15-07-2023 11:30"),
            ("0.3", "15-07-2023 11:00"),
            ("0.2", "15-07-2023 10:30"),
            ("0.1", "15-07-2023 10:00"),
        ]);
        let segments = split_segments(&series).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(values(&segments[0]), vec![0.1, 0.2, 0.3, 0.4]);
        assert_eq!(values(&segments[1]), vec![0.5, 0.6]);
        assert_eq!(
            format_rfc3339(&segments[0].last().unwrap().end_time),
            "2023-07-15T11:30:00+01:00"
        );
        assert_eq!(
            format_rfc3339(&segments[1].first().unwrap().end_time),
            "2023-07-15T13:00:00+01:00"
        );
    }
}
