//! Repeated-hour repair.
//!
//! Exports record wall-clock time only. When clocks go back, one local hour
//! happens twice and the calendar rules alone cannot tell which occurrence a
//! row belongs to. Readings are exactly 30 minutes apart, so the readings two
//! positions away are one hour away, and comparing against them tells the two
//! occurrences apart.
//!
//! The repair assumes a 30-minute cadence and at least one neighbor one hour
//! away. Readings without any such neighbor are left untouched and reported
//! as [`Diagnostic::InsufficientContext`].

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::models::{Diagnostic, Reading, Series};
use crate::tz::HomeZone;

/// Repair readings misplaced by the repeated hour, in place.
///
/// Runs two passes over the ascending readings:
///
/// 1. A standard-offset reading whose wall-clock time is ambiguous and equals
///    the reading two positions later is the first occurrence of the
///    repeated hour; it moves to the daylight-saving offset.
/// 2. A daylight-saving reading is moved to standard time when the reading
///    two positions earlier has the same instant. Only when there is no such
///    earlier reading, it is moved when the moved instant lands exactly one
///    hour before the reading two positions later.
///
/// Already-clean series are returned unchanged.
///
/// # Examples
///
/// ```
/// use hdfstat_core::disambiguate::fix_repeated_hour;
/// use hdfstat_core::parse::parse_hdf;
/// use hdfstat_core::tz::HomeZone;
///
/// let data = "MPRN,Meter Serial Number,Read Value,Read Type,Read Date and End Time
/// 123,45,0.1,Active Import Interval (kW),29-10-2023 01:00
/// 123,45,0.1,Active Import Interval (kW),29-10-2023 00:30
/// 123,45,0.1,Active Import Interval (kW),29-10-2023 00:00
/// 123,45,0.1,Active Import Interval (kW),29-10-2023 00:30";
///
/// let zone = HomeZone::dublin();
/// let mut series = parse_hdf(data.as_bytes(), &zone).unwrap();
/// let diagnostics = fix_repeated_hour(&mut series, &zone);
///
/// assert!(diagnostics.is_empty());
/// assert!(series.readings.windows(2).all(|w| w[0].end_time < w[1].end_time));
/// ```
pub fn fix_repeated_hour(series: &mut Series, zone: &HomeZone) -> Vec<Diagnostic> {
    let readings = series.readings.as_mut_slice();
    let moved_back = shift_first_occurrences(readings, zone);
    let (moved_forward, diagnostics) = shift_second_occurrences(readings, zone);

    if moved_back + moved_forward > 0 {
        debug!(moved_back, moved_forward, "repaired repeated hour");
    }
    diagnostics
}

fn shift_first_occurrences(readings: &mut [Reading], zone: &HomeZone) -> usize {
    let mut moved = 0;
    for i in 0..readings.len() {
        let current = readings[i].end_time;
        if zone.is_daylight_saving(&current) || !zone.is_ambiguous(&current) {
            continue;
        }
        if later(readings, i) == Some(current) {
            readings[i].end_time = zone.as_daylight_saving_time(&current);
            moved += 1;
        }
    }
    moved
}

fn shift_second_occurrences(
    readings: &mut [Reading],
    zone: &HomeZone,
) -> (usize, Vec<Diagnostic>) {
    let mut moved = 0;
    let mut diagnostics = Vec::new();

    for i in 0..readings.len() {
        let current = readings[i].end_time;
        if !zone.is_daylight_saving(&current) {
            continue;
        }

        let earlier = earlier(readings, i);
        let later = later(readings, i);
        let fixed = zone.as_standard_time(&current);

        let misplaced = match (earlier, later) {
            (None, None) => {
                let diagnostic = Diagnostic::InsufficientContext {
                    index: i,
                    end_time: current,
                };
                warn!("{diagnostic}");
                diagnostics.push(diagnostic);
                false
            }
            (Some(earlier), _) => earlier == current,
            (None, Some(later)) => later.signed_duration_since(fixed) == Duration::hours(1),
        };

        if misplaced {
            readings[i].end_time = fixed;
            moved += 1;
        }
    }

    (moved, diagnostics)
}

/// The reading one hour before `i`.
fn earlier(readings: &[Reading], i: usize) -> Option<DateTime<Tz>> {
    i.checked_sub(2).map(|j| readings[j].end_time)
}

/// The reading one hour after `i`.
fn later(readings: &[Reading], i: usize) -> Option<DateTime<Tz>> {
    readings.get(i + 2).map(|r| r.end_time)
}
