//! Delivery seam towards the statistics store.
//!
//! The transport that actually talks to the store lives outside this crate.
//! It only has to accept one batch at a time and report success or failure.

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::Statistics;
use crate::pipeline::Conversion;

/// Receives import batches, one per segment.
pub trait StatisticsSink {
    type Error;

    /// Deliver one batch. Batches arrive in ascending time order.
    fn send(&mut self, batch: &Statistics) -> Result<(), Self::Error>;
}

/// Collects batches in memory.
impl StatisticsSink for Vec<Statistics> {
    type Error = std::convert::Infallible;

    fn send(&mut self, batch: &Statistics) -> Result<(), Self::Error> {
        self.push(batch.clone());
        Ok(())
    }
}

/// What [`publish`] delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishSummary {
    pub sent_batches: usize,
    pub sent_points: usize,
    /// Batches the sink rejected.
    pub failed_batches: usize,
    /// Segments skipped because they could not be aggregated.
    pub failed_segments: usize,
}

/// Result of [`publish`]: counts plus every sink error, keyed by segment
/// index.
#[derive(Debug)]
pub struct PublishReport<E> {
    pub summary: PublishSummary,
    pub errors: Vec<(usize, E)>,
}

impl<E> PublishReport<E> {
    /// Whether the sink accepted every batch it was given.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Send every successfully aggregated batch of `conversion` to `sink`.
///
/// A batch the sink rejects does not stop the remaining ones from being
/// sent; its error is recorded in the report.
pub fn publish<S: StatisticsSink>(
    conversion: &Conversion,
    sink: &mut S,
) -> PublishReport<S::Error> {
    let mut summary = PublishSummary {
        failed_segments: conversion.failures().count(),
        ..PublishSummary::default()
    };
    let mut errors = Vec::new();

    for outcome in &conversion.outcomes {
        let Ok(batch) = &outcome.result else {
            continue;
        };
        match sink.send(batch) {
            Ok(()) => {
                summary.sent_batches += 1;
                summary.sent_points += batch.stats.len();
                debug!(segment = outcome.index, points = batch.stats.len(), "sent batch");
            }
            Err(e) => {
                summary.failed_batches += 1;
                warn!(segment = outcome.index, "sink rejected batch");
                errors.push((outcome.index, e));
            }
        }
    }

    PublishReport { summary, errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatisticMetadata;
    use crate::pipeline::convert;
    use crate::tz::HomeZone;

    const DATA: &str = "MPRN,Meter Serial Number,Read Value,Read Type,Read Date and End Time
123,45,1.0,Active Import Interval (kW),21-01-2023 11:30
123,45,1.0,Active Import Interval (kW),21-01-2023 11:00
123,45,1.0,Active Import Interval (kW),21-01-2023 10:30
123,45,1.0,Active Import Interval (kW),20-01-2023 02:00
123,45,1.0,Active Import Interval (kW),16-01-2023 00:30
123,45,1.0,Active Import Interval (kW),16-01-2023 00:00
123,45,1.0,Active Import Interval (kW),15-01-2023 23:30
123,45,1.0,Active Import Interval (kW),15-01-2023 23:00
123,45,1.0,Active Import Interval (kW),15-01-2023 22:30";

    fn conversion() -> Conversion {
        convert(
            DATA.as_bytes(),
            &HomeZone::dublin(),
            &StatisticMetadata::energy("sensor.esb"),
        )
        .unwrap()
    }

    /// Rejects the first batch it is given and accepts the rest.
    struct FlakySink {
        calls: usize,
    }

    impl StatisticsSink for FlakySink {
        type Error = String;

        fn send(&mut self, _batch: &Statistics) -> Result<(), Self::Error> {
            self.calls += 1;
            if self.calls == 1 {
                Err("connection refused".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn publish_sends_successful_batches() {
        let mut sink: Vec<Statistics> = Vec::new();
        let report = publish(&conversion(), &mut sink);

        assert!(report.is_complete());
        assert_eq!(
            report.summary,
            PublishSummary {
                sent_batches: 2,
                sent_points: 3,
                failed_batches: 0,
                failed_segments: 1,
            }
        );
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].stats[1].sum, 2.5);
        assert_eq!(sink[1].stats[0].state, 1.5);
    }

    #[test]
    fn publish_continues_after_sink_error() {
        let mut sink = FlakySink { calls: 0 };
        let report = publish(&conversion(), &mut sink);

        assert_eq!(sink.calls, 2);
        assert!(!report.is_complete());
        assert_eq!(report.errors, vec![(0, "connection refused".to_string())]);
        assert_eq!(report.summary.sent_batches, 1);
        assert_eq!(report.summary.sent_points, 1);
        assert_eq!(report.summary.failed_batches, 1);
        assert_eq!(report.summary.failed_segments, 1);
    }
}
