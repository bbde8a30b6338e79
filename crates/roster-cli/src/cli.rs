//! CLI argument definitions for the roster mapper.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tracing::level_filters::LevelFilter;

use roster_model::UnmappedPolicy;
use roster_xlsx::OutputMode;

use crate::logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "roster",
    version,
    about = "Station roster mapper - rewrite shift codes in Excel rosters",
    long_about = "Rewrite the shift codes in a station's Excel roster using that \
                  station's mapping table.\n\n\
                  Produces a styled copy that keeps every fill, font, border and merge \
                  of the source, and a plain values-only copy."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the per-station mapping tables.
    #[arg(
        long = "mapping-dir",
        value_name = "DIR",
        env = "ROSTER_MAPPING_DIR",
        default_value = "mappings",
        global = true
    )]
    pub mapping_dir: PathBuf,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Map the codes of a roster workbook and write the outputs.
    Map(MapArgs),

    /// List the sheets of a workbook.
    Sheets(SheetsArgs),

    /// Show how codes resolve for a station.
    Lookup(LookupArgs),

    /// Store a mapping table from a CSV, JSON or Excel file as a new version.
    Import(ImportArgs),

    /// List stations with stored mapping tables.
    Stations,
}

#[derive(Parser)]
pub struct MapArgs {
    /// Roster workbook (.xlsx).
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Station whose mapping table applies.
    #[arg(long = "station", short = 's')]
    pub station: String,

    /// Sheet to process; repeat for several. Default: every sheet.
    #[arg(long = "sheet", value_name = "NAME")]
    pub sheets: Vec<String>,

    /// Output directory (default: next to the input file).
    #[arg(long = "output-dir", value_name = "DIR", env = "ROSTER_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Which outputs to write.
    #[arg(long = "mode", value_enum, default_value = "both")]
    pub mode: ModeArg,

    /// What to do with codes that have no rule.
    #[arg(long = "unmapped", value_enum, default_value = "preserve")]
    pub unmapped: UnmappedArg,

    /// Token separators, in priority order.
    #[arg(long = "separators", value_name = "CHARS")]
    pub separators: Option<String>,
}

#[derive(Parser)]
pub struct SheetsArgs {
    /// Workbook (.xlsx).
    #[arg(value_name = "FILE")]
    pub input: PathBuf,
}

#[derive(Parser)]
pub struct LookupArgs {
    /// Station whose mapping table applies.
    #[arg(long = "station", short = 's')]
    pub station: String,

    /// What to do with codes that have no rule.
    #[arg(long = "unmapped", value_enum, default_value = "preserve")]
    pub unmapped: UnmappedArg,

    /// Codes or whole cell values to resolve.
    #[arg(value_name = "CODE", required = true)]
    pub codes: Vec<String>,
}

#[derive(Parser)]
pub struct ImportArgs {
    /// CSV or Excel (code, replacement columns) or JSON mapping file.
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Station the table belongs to (`global` applies to every station).
    #[arg(long = "station", short = 's')]
    pub station: String,

    /// Store the file as-is instead of merging it over the current table.
    #[arg(long = "replace")]
    pub replace: bool,

    /// Recorded in the version metadata.
    #[arg(long = "created-by", value_name = "NAME")]
    pub created_by: Option<String>,
}

/// CLI output mode choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Styled,
    Plain,
    Both,
}

impl From<ModeArg> for OutputMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Styled => OutputMode::Styled,
            ModeArg::Plain => OutputMode::Plain,
            ModeArg::Both => OutputMode::Both,
        }
    }
}

/// CLI unmapped-token policy choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum UnmappedArg {
    Preserve,
    Delete,
}

impl From<UnmappedArg> for UnmappedPolicy {
    fn from(policy: UnmappedArg) -> Self {
        match policy {
            UnmappedArg::Preserve => UnmappedPolicy::Preserve,
            UnmappedArg::Delete => UnmappedPolicy::Delete,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
