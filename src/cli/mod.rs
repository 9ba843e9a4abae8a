pub mod commands;

use clap::Parser;

pub use commands::{Commands, PreviewArgs, RenderArgs};

/// Reportforge — pentest report rendering pipeline
///
/// Normalizes schema-driven report data and hands rendering jobs to an
/// external PDF worker over a spool directory.
#[derive(Parser, Debug)]
#[command(
    name = "reportforge",
    version,
    about = "Reportforge — pentest report rendering pipeline",
    long_about = "Reportforge prepares structured pentest report data for PDF rendering.\nIt fills schema gaps, normalizes findings and users, sorts by severity,\nand dispatches the result to an asynchronous rendering worker."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}
