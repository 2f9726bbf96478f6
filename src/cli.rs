//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "TRENDPRESS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the daily scheduler and the admin HTTP API until Ctrl-C
    Serve {
        /// Override the configured listen address
        #[arg(long)]
        listen: Option<String>,

        /// Serve the admin API without starting the recurring timer
        #[arg(long)]
        no_scheduler: bool,
    },
    /// Run one scheduled cycle now, honoring the daily target
    Cycle,
    /// Generate posts immediately, ignoring the daily target
    Generate {
        /// Number of posts (defaults to generation.manual_default_count)
        #[arg(short = 'n', long)]
        count: Option<u32>,
    },
    /// Re-run trend analysis for today and replace the stored keywords
    Analyze,
    /// Show today's trend record and post totals
    Status,
}
