use std::process::ExitCode;

use clap::Parser;

mod check_cmd;
mod cli;
mod convert_cmd;
mod error;
mod shared;

use check_cmd::run_check;
use cli::{Cli, Commands};
use convert_cmd::run_convert;
use error::{output_format_hint, parse_output_format, render_error};
use shared::init_tracing;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert(args) => {
            let fallback = output_format_hint(&args.output_format);
            let output_format = match parse_output_format(&args.output_format) {
                Ok(format) => format,
                Err(err) => return render_error(&err, fallback),
            };

            match run_convert(args, output_format) {
                Ok(code) => code,
                Err(err) => render_error(&err, output_format),
            }
        }
        Commands::Check(args) => {
            let fallback = output_format_hint(&args.output_format);
            let output_format = match parse_output_format(&args.output_format) {
                Ok(format) => format,
                Err(err) => return render_error(&err, fallback),
            };

            match run_check(args, output_format) {
                Ok(code) => code,
                Err(err) => render_error(&err, output_format),
            }
        }
    }
}
