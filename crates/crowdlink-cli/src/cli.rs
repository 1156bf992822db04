//! Command-line interface definitions and parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Paired peers file (JSON)
    #[arg(short, long)]
    pub peers: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show every CrowdLink device in range
    Scan {
        /// Stop after this many seconds instead of waiting for Ctrl+C
        #[arg(short, long)]
        duration: Option<u64>,
    },
    /// Show paired peers in range with estimated distance
    Nearby {
        /// Stop after this many seconds instead of waiting for Ctrl+C
        #[arg(short, long)]
        duration: Option<u64>,
    },
    /// Broadcast this device's identity until Ctrl+C
    Advertise {
        /// Identity to broadcast (defaults to config, then a fresh UUID)
        #[arg(short, long)]
        identity: Option<String>,
    },
    /// Record a paired peer
    Pair {
        /// Peer identity as seen on air
        #[arg(short, long)]
        identity: String,
        /// Display name
        #[arg(short, long)]
        name: String,
    },
    /// Forget a paired peer
    Unpair {
        /// Peer identity to remove
        identity: String,
    },
    /// List paired peers
    Peers,
}
