//! Error handling for the CrowdLink CLI

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("CrowdLink engine error: {0}")]
    Core(#[from] crowdlink_core::CrowdlinkError),

    #[error("{operation} did not start: {reason_code}")]
    DidNotStart {
        operation: &'static str,
        reason_code: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Peer store error: {0}")]
    PeerStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),
}

impl CliError {
    /// Wrap an engine failure from starting `operation`
    pub fn did_not_start(operation: &'static str, err: &crowdlink_core::CrowdlinkError) -> Self {
        CliError::DidNotStart {
            operation,
            reason_code: err.reason_code(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
