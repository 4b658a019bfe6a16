//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Batch Put - batched, partial-failure tolerant writes to a wide-column store
#[derive(Parser, Debug)]
#[command(
    name = "batch-put",
    author,
    version,
    about = "Batched put dispatcher for wide-column stores",
    long_about = "Reads records from a JSON-lines file, turns each one into a keyed write \n\
                  request, groups valid requests by destination and issues one bulk put \n\
                  per group. Every record is routed to success or failure."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "BATCH_PUT_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "BATCH_PUT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch a records file
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "BATCH_PUT_CONFIG")]
    pub config: PathBuf,

    /// JSON-lines file with one record per line
    #[arg(short, long, env = "BATCH_PUT_RECORDS")]
    pub records: PathBuf,

    /// Override dispatcher batch size from configuration
    #[arg(long, env = "BATCH_PUT_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Override provenance scheme from configuration
    #[arg(long, env = "BATCH_PUT_SCHEME")]
    pub scheme: Option<String>,

    /// Write failed records (with reason) to this JSON-lines file
    #[arg(long, env = "BATCH_PUT_FAILURES_OUT")]
    pub failures_out: Option<PathBuf>,

    /// Validate configuration and exit without dispatching
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "BATCH_PUT_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
