//! Home time zone handling.
//!
//! Exports carry wall-clock timestamps only, without a UTC offset. This
//! module owns the civil rules used to turn those wall-clock values into
//! instants and to tell the daylight-saving offset apart from the standard
//! one.

use chrono::offset::LocalResult;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serializer;

use crate::error::{HdfError, Result};

/// The zone ESB exports are recorded in.
pub const DEFAULT_ZONE: &str = "Europe/Dublin";

/// Parse an IANA timezone name into a [`chrono_tz::Tz`].
///
/// # Examples
///
/// ```
/// use hdfstat_core::tz::parse_tz;
///
/// let tz = parse_tz("Europe/Dublin").unwrap();
/// assert_eq!(tz.to_string(), "Europe/Dublin");
/// ```
pub fn parse_tz(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| HdfError::InvalidTimezone(name.to_string()))
}

/// Immutable handle on the civil time zone an export was recorded in.
///
/// Built once and passed by reference to the stages that need calendar
/// rules, so no stage reaches for ambient global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomeZone {
    tz: Tz,
}

impl HomeZone {
    /// Build a home zone from an IANA name.
    pub fn new(name: &str) -> Result<Self> {
        parse_tz(name).map(Self::from_tz)
    }

    pub fn from_tz(tz: Tz) -> Self {
        Self { tz }
    }

    /// The zone ESB exports use.
    pub fn dublin() -> Self {
        Self::from_tz(chrono_tz::Europe::Dublin)
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Resolve a wall-clock time into an instant.
    ///
    /// Ambiguous wall-clock times (the repeated hour when leaving
    /// daylight-saving time) resolve to the later instant, on the standard
    /// offset. Wall-clock times skipped when entering daylight-saving time
    /// return `None`.
    pub fn resolve(&self, local: NaiveDateTime) -> Option<DateTime<Tz>> {
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => Some(dt),
            LocalResult::Ambiguous(_, later) => Some(later),
            LocalResult::None => None,
        }
    }

    /// The standard (winter) UTC offset in seconds for the given year.
    ///
    /// Taken as the smaller of the offsets in force on 1 January and
    /// 1 July, which holds in both hemispheres.
    pub fn standard_offset_seconds(&self, year: i32) -> i32 {
        [(1, 1), (7, 1)]
            .iter()
            .filter_map(|&(month, day)| NaiveDate::from_ymd_opt(year, month, day))
            .filter_map(|date| date.and_hms_opt(0, 0, 0))
            .map(|midnight| self.offset_seconds_at(&midnight))
            .min()
            .unwrap_or(0)
    }

    /// Whether the instant is on the zone's daylight-saving offset.
    pub fn is_daylight_saving(&self, dt: &DateTime<Tz>) -> bool {
        offset_seconds(dt) > self.standard_offset_seconds(dt.year())
    }

    /// Whether the instant's wall-clock time occurs twice in this zone.
    pub fn is_ambiguous(&self, dt: &DateTime<Tz>) -> bool {
        matches!(
            self.tz.from_local_datetime(&dt.naive_local()),
            LocalResult::Ambiguous(..)
        )
    }

    /// Reinterpret the instant's wall-clock time at the standard offset.
    ///
    /// For a daylight-saving instant one hour ahead of standard time this
    /// yields the instant one hour later.
    pub fn as_standard_time(&self, dt: &DateTime<Tz>) -> DateTime<Tz> {
        let offset = Duration::seconds(i64::from(self.standard_offset_seconds(dt.year())));
        self.tz.from_utc_datetime(&(dt.naive_local() - offset))
    }

    /// Reinterpret an ambiguous wall-clock time at its earlier occurrence.
    ///
    /// Instants whose wall-clock time is not ambiguous are returned as is.
    pub fn as_daylight_saving_time(&self, dt: &DateTime<Tz>) -> DateTime<Tz> {
        match self.tz.from_local_datetime(&dt.naive_local()) {
            LocalResult::Ambiguous(earlier, _) => earlier,
            _ => *dt,
        }
    }

    fn offset_seconds_at(&self, utc: &NaiveDateTime) -> i32 {
        self.tz.offset_from_utc_datetime(utc).fix().local_minus_utc()
    }
}

impl Default for HomeZone {
    fn default() -> Self {
        Self::dublin()
    }
}

impl std::fmt::Display for HomeZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tz)
    }
}

fn offset_seconds(dt: &DateTime<Tz>) -> i32 {
    dt.offset().fix().local_minus_utc()
}

/// Format a datetime as RFC3339 with timezone offset.
///
/// An RFC3339 formatted string (e.g., "2023-10-29T01:00:00+00:00").
pub fn format_rfc3339<T: TimeZone>(dt: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Format a UTC datetime as RFC3339 with Z suffix.
pub fn format_rfc3339_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Serde helper writing zoned instants with [`format_rfc3339`].
pub fn serialize_rfc3339<S>(
    dt: &DateTime<Tz>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_rfc3339(dt))
}
