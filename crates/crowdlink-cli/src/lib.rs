//! CrowdLink CLI library
//!
//! Wires the proximity engine to the host BLE radio, a JSON peer list and
//! the terminal.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod peers;

pub use app::CrowdlinkApp;
pub use cli::{Cli, Commands};
pub use config::AppConfig;
pub use error::{CliError, Result};
pub use peers::PeerStore;
