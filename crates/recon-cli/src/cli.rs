//! CLI argument definitions for order reconciliation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "order-recon",
    version,
    about = "Reconcile an order dataset against an ordering system, in resumable batches",
    long_about = "Verify every row of an order dataset against the ordering system.\n\n\
                  Rows are processed in fixed-size batches. Failures are written to the\n\
                  results store one section per batch, and a checkpoint lets an\n\
                  interrupted run resume at the first unfinished batch."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: ./order-recon.toml when present).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

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
    /// Verify the dataset, resuming from the checkpoint when one exists.
    Run(RunArgs),

    /// Build the dataset from the quantity and product exports.
    Prepare(PrepareArgs),

    /// Write every results section to a CSV file.
    Export(ExportArgs),

    /// Show the resume point and the sections recorded so far.
    Status(PathArgs),
}

/// Path overrides shared by the commands that touch run state.
#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Checkpoint file.
    #[arg(long = "checkpoint", value_name = "PATH")]
    pub checkpoint: Option<PathBuf>,

    /// Results store.
    #[arg(long = "results", value_name = "PATH")]
    pub results: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunArgs {
    /// Prepared dataset CSV.
    #[arg(long = "dataset", value_name = "PATH")]
    pub dataset: Option<PathBuf>,

    /// Product catalogue JSON backing the ordering session.
    #[arg(long = "catalog", value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Discard the checkpoint and start from the first batch.
    #[arg(long = "reset")]
    pub reset: bool,

    /// Rows per batch.
    #[arg(long = "batch-size", value_name = "ROWS")]
    pub batch_size: Option<usize>,

    /// Relative tolerance for total comparison.
    #[arg(long = "tolerance", value_name = "FRACTION")]
    pub tolerance: Option<f64>,

    /// Hide the progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    #[command(flatten)]
    pub paths: PathArgs,
}

#[derive(Args)]
pub struct PrepareArgs {
    /// Quantity export (Description, Qty, Cost per Unit, Total).
    #[arg(value_name = "QUANTITIES")]
    pub quantities: PathBuf,

    /// Product export (Code, Description, Order Size, Price).
    #[arg(value_name = "PRODUCTS")]
    pub products: PathBuf,

    /// Output dataset (default: the configured dataset path).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Directory for the CSV files.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    #[command(flatten)]
    pub paths: PathArgs,
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
