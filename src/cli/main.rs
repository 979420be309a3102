use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(version, about = "Local-first journaling from the terminal")]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Override the primary data directory
    #[clap(long, value_parser)]
    pub data_dir: Option<PathBuf>,

    /// Override the mirror (fallback) directory
    #[clap(long, value_parser)]
    pub mirror_dir: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the daybook application
    #[clap(subcommand)]
    pub command: Commands,
}
