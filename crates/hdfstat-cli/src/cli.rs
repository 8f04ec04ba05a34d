use clap::{Parser, Subcommand};

/// Convert half-hourly electricity usage exports into hourly statistics
#[derive(Parser, Debug)]
#[command(name = "hdfstat")]
#[command(version, about = "Convert half-hourly electricity usage exports into hourly statistics")]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert an export into hourly statistics batches, one per contiguous run
    Convert(ConvertArgs),
    /// Validate an export and list its contiguous runs without aggregating
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Input file path (use - for stdin)
    #[arg(long, default_value = "-")]
    pub input: String,

    /// IANA timezone the export was recorded in
    #[arg(short, long, env = "HDFSTAT_TZ", default_value = "Europe/Dublin")]
    pub tz: String,

    /// Statistic ID the batches are imported under (e.g., sensor.esb_usage)
    #[arg(long, env = "HA_SENSOR")]
    pub statistic_id: String,

    /// Display name of the statistic
    #[arg(long)]
    pub name: Option<String>,

    /// Output format: json, text
    #[arg(long, default_value = "json")]
    pub output_format: String,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Input file path (use - for stdin)
    #[arg(long, default_value = "-")]
    pub input: String,

    /// IANA timezone the export was recorded in
    #[arg(short, long, env = "HDFSTAT_TZ", default_value = "Europe/Dublin")]
    pub tz: String,

    /// Output format: json, text
    #[arg(long, default_value = "text")]
    pub output_format: String,
}
