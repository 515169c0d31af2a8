//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::report::ReportArgs;

/// Monthly hour reports from WakaTime and Wakapi.
///
/// Buckets tracked time by branch, spreads unknown time, rounds to a billing
/// precision and splits the month into development and maintenance hours.
#[derive(Debug, Parser)]
#[command(name = "wakamonth", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Make an hour report for one month.
    Report(ReportArgs),
}
