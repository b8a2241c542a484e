//! Metadata reconciliation CLI.

use std::io::{self, IsTerminal};
use std::path::Path;

use chrono::Utc;
use clap::{ColorChoice, Parser};
use recon_cli::logging::{LogConfig, LogFormat, init_logging};
use recon_cli::report::{RunReport, TaskRun, write_report};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_batch, run_checks, run_single};
use crate::summary::{print_checks, print_summary};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match &cli.command {
        Command::Run(args) => finish_runs(&run_single(args), args.report.as_deref()),
        Command::Batch(args) => match run_batch(args) {
            Ok(runs) => finish_runs(&runs, args.report.as_deref()),
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Check(args) => {
            let checks = run_checks(args);
            print_checks(&checks);
            i32::from(checks.iter().any(|check| check.result.is_err()))
        }
    };
    std::process::exit(exit_code);
}

fn finish_runs(runs: &[TaskRun], report: Option<&Path>) -> i32 {
    print_summary(runs);
    if let Some(path) = report
        && let Err(error) = write_report(path, &RunReport::new(Utc::now(), runs))
    {
        eprintln!("error: {error:#}");
        return 1;
    }
    i32::from(runs.iter().any(TaskRun::failed))
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Off => LevelFilter::OFF,
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
