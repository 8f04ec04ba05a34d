//! Row ingestion for ESB "Harmonised Downloadable File" (HDF) exports.
//!
//! An export is a CSV file with a fixed five-column header followed by one
//! row per half-hour reading, newest first:
//!
//! ```text
//! MPRN,Meter Serial Number,Read Value,Read Type,Read Date and End Time
//! 123,45,0.194000,Active Import Interval (kW),15-01-2023 23:30
//! ```
//!
//! Timestamps carry no UTC offset; they are interpreted in the [`HomeZone`].

use std::io::Read;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::{FormatError, Result};
use crate::models::{READ_TYPE, Reading, Series};
use crate::tz::HomeZone;

/// Expected header, names and order are exact.
pub const HEADER: [&str; 5] = [
    "MPRN",
    "Meter Serial Number",
    "Read Value",
    "Read Type",
    "Read Date and End Time",
];

/// `chrono` pattern for the `DD-MM-YYYY HH:MM` timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M";

/// One data row, before it becomes a [`Reading`].
struct RawRow<'a> {
    mprn: &'a str,
    serial_number: &'a str,
    value: &'a str,
    read_type: &'a str,
    timestamp: &'a str,
}

impl<'a> RawRow<'a> {
    fn from_record(row: usize, record: &'a StringRecord) -> std::result::Result<Self, FormatError> {
        if record.len() > HEADER.len() {
            return Err(FormatError::ExtraFields {
                row,
                got: record.len(),
                want: HEADER.len(),
            });
        }
        let field = move |index: usize| {
            record.get(index).ok_or(FormatError::MissingField {
                row,
                field: HEADER[index],
            })
        };

        Ok(Self {
            mprn: field(0)?,
            serial_number: field(1)?,
            value: field(2)?,
            read_type: field(3)?,
            timestamp: field(4)?,
        })
    }
}

/// Parse an HDF export into a [`Series`] in ascending time order.
///
/// Parsing stops at the first invalid row. Spacing and alignment are not
/// checked here: they only hold once repeated-hour timestamps are repaired,
/// see [`crate::disambiguate`] and [`crate::segment`].
///
/// # Examples
///
/// ```
/// use hdfstat_core::parse::parse_hdf;
/// use hdfstat_core::tz::HomeZone;
///
/// let data = "MPRN,Meter Serial Number,Read Value,Read Type,Read Date and End Time
/// 123,45,0.194000,Active Import Interval (kW),15-01-2023 23:30
/// 123,45,0.157000,Active Import Interval (kW),15-01-2023 23:00";
///
/// let series = parse_hdf(data.as_bytes(), &HomeZone::dublin()).unwrap();
/// assert_eq!(series.mprn, "123");
/// assert_eq!(series.readings[0].value, 0.157);
/// ```
pub fn parse_hdf<R: Read>(input: R, zone: &HomeZone) -> Result<Series> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut records = reader.records();

    let header = records
        .next()
        .ok_or(FormatError::EmptyInput)?
        .map_err(FormatError::from)?;
    validate_header(&header)?;

    let mut series = Series {
        mprn: String::new(),
        meter_serial_number: String::new(),
        read_type: READ_TYPE.to_string(),
        readings: Vec::new(),
    };

    for (index, record) in records.enumerate() {
        let row = index + 1;
        let record = record.map_err(FormatError::from)?;
        let raw = RawRow::from_record(row, &record)?;
        let reading = parse_row(row, &raw, zone)?;

        if row == 1 {
            series.mprn = raw.mprn.to_string();
            series.meter_serial_number = raw.serial_number.to_string();
        } else if series.mprn != raw.mprn {
            return Err(FormatError::MixedMprn {
                row,
                first: series.mprn,
                found: raw.mprn.to_string(),
            }
            .into());
        } else if series.meter_serial_number != raw.serial_number {
            return Err(FormatError::MixedSerialNumber {
                row,
                first: series.meter_serial_number,
                found: raw.serial_number.to_string(),
            }
            .into());
        }

        series.readings.push(reading);
    }

    // Exports list the newest reading first.
    series.readings.reverse();

    debug!(
        mprn = %series.mprn,
        serial = %series.meter_serial_number,
        readings = series.readings.len(),
        "parsed export"
    );

    Ok(series)
}

fn validate_header(header: &StringRecord) -> std::result::Result<(), FormatError> {
    if header.len() != HEADER.len() {
        return Err(FormatError::HeaderLength {
            got: header.len(),
            want: HEADER.len(),
        });
    }
    for (index, (got, want)) in header.iter().zip(HEADER).enumerate() {
        if got != want {
            return Err(FormatError::HeaderField {
                index,
                got: got.to_string(),
                want,
            });
        }
    }
    Ok(())
}

fn parse_row(
    row: usize,
    raw: &RawRow<'_>,
    zone: &HomeZone,
) -> std::result::Result<Reading, FormatError> {
    if raw.read_type != READ_TYPE {
        return Err(FormatError::ReadType {
            row,
            got: raw.read_type.to_string(),
            want: READ_TYPE,
        });
    }

    let value = parse_value(row, raw.value)?;

    let local = NaiveDateTime::parse_from_str(raw.timestamp, TIMESTAMP_FORMAT)
        .map_err(|e| FormatError::Timestamp {
            row,
            value: raw.timestamp.to_string(),
            reason: e.to_string(),
        })?;
    let end_time = zone.resolve(local).ok_or_else(|| FormatError::NonexistentTime {
        row,
        value: raw.timestamp.to_string(),
        zone: zone.to_string(),
    })?;

    Ok(Reading { value, end_time })
}

fn parse_value(row: usize, text: &str) -> std::result::Result<f64, FormatError> {
    let invalid = |reason: String| FormatError::Value {
        row,
        value: text.to_string(),
        reason,
    };

    let value: f64 = text.parse().map_err(|e| invalid(format!("{e}")))?;
    if !value.is_finite() {
        return Err(invalid("value is not finite".to_string()));
    }
    if value < 0.0 {
        return Err(invalid("value is negative".to_string()));
    }
    Ok(value)
}
