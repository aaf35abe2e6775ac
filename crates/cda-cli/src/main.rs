//! CDA import CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use cda_cli::logging::{LogConfig, LogFormat, init_logging};
use cda_core::ImportError;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_import_command, run_templates};
use crate::summary::{print_summary, print_validation_failure};

/// Exit code for failures an operator fixes in configuration, not in the document.
const EXIT_CONFIGURATION: i32 = 2;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match &cli.command {
        Command::Import(args) => match run_import_command(args) {
            Ok(outcome) => {
                print_summary(&outcome);
                0
            }
            Err(error) => report_failure(&error),
        },
        Command::Templates => match run_templates() {
            Ok(()) => 0,
            Err(error) => report_failure(&error),
        },
    };
    std::process::exit(exit_code);
}

fn report_failure(error: &anyhow::Error) -> i32 {
    let import_error = error.downcast_ref::<ImportError>();
    if let Some(ImportError::Validation { template, issues }) = import_error {
        print_validation_failure(template, issues);
    }
    eprintln!("error: {error:#}");
    match import_error {
        Some(error) if error.is_configuration_error() => {
            eprintln!("hint: set the named option in the --config file and re-run");
            EXIT_CONFIGURATION
        }
        _ => 1,
    }
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
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
