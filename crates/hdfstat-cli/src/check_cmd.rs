use std::process::ExitCode;

use chrono::Utc;
use hdfstat_core::tz::{format_rfc3339, format_rfc3339_utc};
use hdfstat_core::{Diagnostic, Ingested, ingest};
use serde::Serialize;

use crate::cli::CheckArgs;
use crate::error::{CliError, CliResult, EXIT_SUCCESS, OutputFormat};
use crate::shared::{open_input, parse_zone_or_input_error};

pub fn run_check(args: CheckArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let zone = parse_zone_or_input_error(&args.tz)?;
    let reader = open_input(&args.input)?;
    let ingested = ingest(reader, &zone).map_err(CliError::export)?;

    let report = CheckReport::from_ingested(&ingested, zone.to_string());

    match output_format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::runtime(format!("Failed to serialize JSON: {}", e)))?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", report.to_text()),
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}

#[derive(Debug, Serialize)]
struct CheckReport {
    mprn: String,
    meter_serial_number: String,
    read_type: String,
    tz: String,
    readings: usize,
    segments: Vec<SegmentSummary>,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Serialize)]
struct SegmentSummary {
    first: String,
    last: String,
    first_utc: String,
    last_utc: String,
    readings: usize,
}

impl CheckReport {
    fn from_ingested(ingested: &Ingested, tz: String) -> Self {
        let segments = ingested
            .segments
            .iter()
            .filter_map(|segment| {
                let first = segment.first()?.end_time;
                let last = segment.last()?.end_time;
                Some(SegmentSummary {
                    first: format_rfc3339(&first),
                    last: format_rfc3339(&last),
                    first_utc: format_rfc3339_utc(&first.with_timezone(&Utc)),
                    last_utc: format_rfc3339_utc(&last.with_timezone(&Utc)),
                    readings: segment.len(),
                })
            })
            .collect();

        Self {
            mprn: ingested.series.mprn.clone(),
            meter_serial_number: ingested.series.meter_serial_number.clone(),
            read_type: ingested.series.read_type.clone(),
            tz,
            readings: ingested.series.readings.len(),
            segments,
            diagnostics: ingested.diagnostics.clone(),
        }
    }

    fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("MPRN: {}\n", self.mprn));
        out.push_str(&format!("Meter: {}\n", self.meter_serial_number));
        out.push_str(&format!("Timezone: {}\n", self.tz));
        out.push_str(&format!("Readings: {}\n", self.readings));
        out.push_str(&format!("Segments: {}\n", self.segments.len()));
        for (i, segment) in self.segments.iter().enumerate() {
            out.push_str(&format!(
                "  [{}] {} .. {} ({} readings)\n",
                i, segment.first, segment.last, segment.readings
            ));
        }
        for diagnostic in &self.diagnostics {
            out.push_str(&format!("WARNING: {}\n", diagnostic));
        }
        out
    }
}
