//! # hdfstat-core
//!
//! Turns a half-hourly electricity usage export into hourly energy
//! statistics ready to import into a statistics store.
//!
//! The export records wall-clock timestamps without a UTC offset, newest
//! first, and may have holes. The pipeline runs in four stages:
//!
//! - **Parse** ([`parse`]): validate the header and every row, reverse to
//!   ascending order.
//! - **Disambiguate** ([`disambiguate`]): repair readings misplaced by the
//!   repeated hour when clocks go back.
//! - **Segment** ([`segment`]): split into maximal runs 30 minutes apart.
//! - **Aggregate** ([`aggregate`]): resample each run into hourly kWh with a
//!   running sum.
//!
//! Everything is synchronous and free of I/O beyond reading the input:
//! the same bytes always give the same batches.
//!
//! ## Example
//!
//! ```rust
//! use hdfstat_core::prelude::*;
//!
//! let data = "MPRN,Meter Serial Number,Read Value,Read Type,Read Date and End Time
//! 123,45,0.5,Active Import Interval (kW),15-01-2023 23:30
//! 123,45,0.5,Active Import Interval (kW),15-01-2023 23:00
//! 123,45,0.5,Active Import Interval (kW),15-01-2023 22:30";
//!
//! let zone = HomeZone::dublin();
//! let metadata = StatisticMetadata::energy("sensor.esb_usage");
//! let conversion = convert(data.as_bytes(), &zone, &metadata).unwrap();
//!
//! for batch in conversion.batches() {
//!     println!("{} hourly points", batch.stats.len());
//! }
//! ```

pub mod aggregate;
pub mod disambiguate;
pub mod error;
pub mod models;
pub mod parse;
pub mod pipeline;
pub mod segment;
pub mod sink;
pub mod tz;

// Re-export commonly used types at the crate root
pub use aggregate::{aggregate, translate};
pub use disambiguate::fix_repeated_hour;
pub use error::{AggregationError, FormatError, HdfError, Result};
pub use models::{
    Diagnostic, READ_TYPE, Reading, Segment, Series, StatPoint, StatisticMetadata, Statistics,
};
pub use parse::parse_hdf;
pub use pipeline::{Conversion, Ingested, SegmentOutcome, convert, ingest};
pub use segment::split_segments;
pub use sink::{PublishReport, PublishSummary, StatisticsSink, publish};
pub use tz::HomeZone;

/// Prelude module for convenient imports.
///
/// ```
/// use hdfstat_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::aggregate::{aggregate, translate};
    pub use crate::error::{AggregationError, FormatError, HdfError, Result};
    pub use crate::models::*;
    pub use crate::pipeline::{Conversion, Ingested, convert, ingest};
    pub use crate::sink::{StatisticsSink, publish};
    pub use crate::tz::{HomeZone, parse_tz};
}
