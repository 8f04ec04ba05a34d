use std::fs::File;
use std::io::{self, BufReader, Read};

use hdfstat_core::HomeZone;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, CliResult};

pub fn parse_zone_or_input_error(name: &str) -> CliResult<HomeZone> {
    HomeZone::new(name).map_err(|e| CliError::input(format!("Invalid timezone '{}': {}", name, e)))
}

/// Open the export, `-` reads from stdin.
pub fn open_input(path: &str) -> CliResult<Box<dyn Read>> {
    if path == "-" {
        debug!("reading export from stdin");
        return Ok(Box::new(io::stdin().lock()));
    }

    let file = File::open(path)
        .map_err(|e| CliError::runtime(format!("Failed to open file '{}': {}", path, e)))?;
    debug!(path, "reading export");
    Ok(Box::new(BufReader::new(file)))
}

/// Log to stderr so stdout carries only batches.
///
/// `--verbose` forces debug output, otherwise `RUST_LOG` applies with a
/// default of `warn`.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
