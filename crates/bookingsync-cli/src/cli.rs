//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// bookingsync - mirror rental bookings onto calendars
#[derive(Debug, Parser)]
#[command(name = "bookingsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "BOOKINGSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one reconciliation pass and exit
    Run {
        /// Decide every action but change nothing
        #[arg(long)]
        dry_run: bool,

        /// Print the pass report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the HTTP trigger and run passes periodically
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Seconds between scheduled passes, 0 to disable (overrides server.interval_secs)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
