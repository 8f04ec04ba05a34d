use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use hdfstat_core::aggregate::{covered_span, total_energy};
use hdfstat_core::tz::format_rfc3339;
use hdfstat_core::{StatisticMetadata, Statistics, StatisticsSink, convert, publish};
use tracing::info;

use crate::cli::ConvertArgs;
use crate::error::{CliError, CliResult, EXIT_SUCCESS, OutputFormat};
use crate::shared::{open_input, parse_zone_or_input_error};

pub fn run_convert(args: ConvertArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let zone = parse_zone_or_input_error(&args.tz)?;
    if args.statistic_id.trim().is_empty() {
        return Err(CliError::input("statistic_id must not be empty"));
    }

    let mut metadata = StatisticMetadata::energy(args.statistic_id);
    if let Some(name) = args.name {
        metadata = metadata.with_name(name);
    }

    let reader = open_input(&args.input)?;
    let conversion = convert(reader, &zone, &metadata).map_err(CliError::export)?;

    let stdout = io::stdout().lock();
    let report = match output_format {
        OutputFormat::Json => publish(&conversion, &mut JsonLinesSink::new(stdout)),
        OutputFormat::Text => publish(&conversion, &mut TextSink::new(stdout)),
    };

    info!(
        batches = report.summary.sent_batches,
        points = report.summary.sent_points,
        "converted export"
    );

    if !report.is_complete() {
        let errors: Vec<String> = report
            .errors
            .iter()
            .map(|(index, e)| format!("segment {}: {:#}", index, e))
            .collect();
        return Err(CliError::runtime(format!(
            "{} of {} batches could not be written ({})",
            errors.len(),
            report.summary.sent_batches + report.summary.failed_batches,
            errors.join("; ")
        )));
    }

    let failures: Vec<String> = conversion
        .failures()
        .map(|(index, err)| format!("segment {}: {}", index, err))
        .collect();
    if !failures.is_empty() {
        return Err(CliError::partial(format!(
            "{} of {} segments could not be converted ({})",
            failures.len(),
            conversion.outcomes.len(),
            failures.join("; ")
        )));
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}

/// Writes one JSON batch per line.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> StatisticsSink for JsonLinesSink<W> {
    type Error = anyhow::Error;

    fn send(&mut self, batch: &Statistics) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, batch).context("Failed to serialize JSON")?;
        writeln!(self.out).context("Failed to write batch")?;
        Ok(())
    }
}

/// Writes a readable summary and one line per hourly point.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> StatisticsSink for TextSink<W> {
    type Error = anyhow::Error;

    fn send(&mut self, batch: &Statistics) -> anyhow::Result<()> {
        let span = covered_span(&batch.stats);
        writeln!(
            self.out,
            "--- {} ({} points, {} h, {:.3} {}) ---",
            batch.metadata.statistic_id,
            batch.stats.len(),
            span.num_hours(),
            total_energy(&batch.stats),
            batch.metadata.unit_of_measurement
        )
        .context("Failed to write batch")?;
        for point in &batch.stats {
            writeln!(
                self.out,
                "{}  {:>10.3}  {:>12.3}",
                format_rfc3339(&point.start),
                point.state,
                point.sum
            )
            .context("Failed to write batch")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdfstat_core::tz::HomeZone;

    const DATA: &str = "MPRN,Meter Serial Number,Read Value,Read Type,Read Date and End Time
123,45,1.0,Active Import Interval (kW),15-01-2023 23:30
123,45,1.0,Active Import Interval (kW),15-01-2023 23:00
123,45,1.0,Active Import Interval (kW),15-01-2023 22:30";

    fn batch() -> Statistics {
        let conversion = convert(
            DATA.as_bytes(),
            &HomeZone::dublin(),
            &StatisticMetadata::energy("sensor.esb"),
        )
        .unwrap();
        conversion.batches().next().unwrap().clone()
    }

    #[test]
    fn json_lines_sink_writes_one_line_per_batch() {
        let mut out = Vec::new();
        let mut sink = JsonLinesSink::new(&mut out);
        sink.send(&batch()).unwrap();
        sink.send(&batch()).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"metadata":{"source":"recorder","statistic_id":"sensor.esb","unit_of_measurement":"kWh","has_sum":true,"has_mean":false},"stats":[{"start":"2023-01-15T23:00:00+00:00","state":1.5,"sum":1.5}]}"#
        );
    }

    #[test]
    fn text_sink_writes_summary_and_points() {
        let mut out = Vec::new();
        TextSink::new(&mut out).send(&batch()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "--- sensor.esb (1 points, 0 h, 1.500 kWh) ---\n\
             2023-01-15T23:00:00+00:00       1.500         1.500\n"
        );
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_are_reported_per_batch() {
        let data = "MPRN,Meter Serial Number,Read Value,Read Type,Read Date and End Time
123,45,1.0,Active Import Interval (kW),20-01-2023 23:30
123,45,1.0,Active Import Interval (kW),20-01-2023 23:00
123,45,1.0,Active Import Interval (kW),20-01-2023 22:30
123,45,1.0,Active Import Interval (kW),15-01-2023 23:30
123,45,1.0,Active Import Interval (kW),15-01-2023 23:00
123,45,1.0,Active Import Interval (kW),15-01-2023 22:30";
        let conversion = convert(
            data.as_bytes(),
            &HomeZone::dublin(),
            &StatisticMetadata::energy("sensor.esb"),
        )
        .unwrap();

        let report = publish(&conversion, &mut JsonLinesSink::new(ClosedPipe));

        assert_eq!(report.summary.failed_batches, 2);
        assert_eq!(report.summary.sent_batches, 0);
        let indexes: Vec<usize> = report.errors.iter().map(|(i, _)| *i).collect();
        assert_eq!(indexes, vec![0, 1]);
        assert!(format!("{:#}", report.errors[0].1).starts_with("Failed to serialize JSON"));
    }
}
