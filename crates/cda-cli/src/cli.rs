//! CLI argument definitions for the CDA importer.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cda-import",
    version,
    about = "Import CDA clinical documents into a patient record",
    long_about = "Import CDA clinical documents into a patient record.\n\n\
                  Allergy and problem concerns are validated against their IHE PCC \
                  templates, reconciled with items already on file and saved to a \
                  JSON store snapshot."
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

    /// Log patient identifiers and clinical codes in clear text.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import one document tree (JSON) for a patient.
    Import(ImportArgs),

    /// List the registered templates and their processors.
    Templates,
}

#[derive(Parser)]
pub struct ImportArgs {
    /// Path to the document tree, as JSON.
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Patient the document belongs to.
    #[arg(long = "patient", value_name = "ID")]
    pub patient: String,

    /// Author recorded on created and changed items when the document names none.
    #[arg(long = "author", value_name = "NAME")]
    pub author: String,

    /// TOML file with import options (default: built-in defaults).
    #[arg(long = "config", value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// JSON store snapshot to import into; created if missing.
    #[arg(long = "store", value_name = "JSON")]
    pub store: Option<PathBuf>,

    /// Run the import but do not write the store snapshot.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
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
