//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "recon",
    version,
    about = "Reconcile microbiome study metadata tables",
    long_about = "Reconcile microbiome study metadata tables.\n\n\
                  Each task file names a tab-separated metadata table, the auxiliary\n\
                  mapping files it is enriched from, and the ordered steps that correct it.\n\
                  Output is only written when every step succeeds."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
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
    /// Run one task file.
    Run(RunArgs),

    /// Run every task file (*.toml) in a directory, in file name order.
    Batch(BatchArgs),

    /// Validate task files and confirm their inputs exist, without running them.
    Check(CheckArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    #[arg(value_name = "TASK")]
    pub task: PathBuf,

    /// Write the reconciled table here instead of the task's output path.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Apply every step but write nothing.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Write a JSON run report.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
}

#[derive(Parser)]
pub struct BatchArgs {
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Apply every step but write nothing.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Write a JSON run report.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
}

#[derive(Parser)]
pub struct CheckArgs {
    #[arg(value_name = "TASK", required = true)]
    pub tasks: Vec<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
