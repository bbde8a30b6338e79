//! Station roster mapper CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use roster_cli::cli::{Cli, Command};
use roster_cli::commands::{run_import, run_lookup, run_map, run_sheets, run_stations};
use roster_cli::logging::{LogConfig, init_logging};

mod summary;

use crate::summary::{
    print_import, print_lookup, print_map_summary, print_sheets, print_stations,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let mapping_dir = cli.mapping_dir.as_path();
    let outcome = match &cli.command {
        Command::Map(args) => run_map(args, mapping_dir).map(|result| print_map_summary(&result)),
        Command::Sheets(args) => run_sheets(args).map(|sheets| print_sheets(&args.input, &sheets)),
        Command::Lookup(args) => {
            run_lookup(args, mapping_dir).map(|rows| print_lookup(&args.station, &rows))
        }
        Command::Import(args) => run_import(args, mapping_dir).map(|meta| print_import(&meta)),
        Command::Stations => run_stations(mapping_dir).map(|stations| print_stations(&stations)),
    };
    let exit_code = match outcome {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

/// Explicit `--log-level` wins over `-v`/`-q`; either one disables `RUST_LOG`.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let explicit = cli.log_level.map(LevelFilter::from);
    let level_filter = explicit.unwrap_or_else(|| cli.verbosity.tracing_level_filter());
    let with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    LogConfig {
        level_filter,
        use_env_filter: explicit.is_none() && !cli.verbosity.is_present(),
        with_spans: level_filter >= LevelFilter::DEBUG,
        ..LogConfig::default()
    }
    .with_format(cli.log_format.into())
    .with_log_file(cli.log_file.clone())
    .with_ansi(with_ansi)
}
