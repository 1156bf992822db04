//! CrowdLink CLI configuration
//!
//! Loaded from a TOML file when `--config` is given; every section is
//! optional and falls back to defaults.
//!
//! ```toml
//! identity = "3f2504e0-4f89-41d3-9a0c-0305e82c3301"
//! peers_file = "/var/lib/crowdlink/peers.json"
//!
//! [proximity.path_loss]
//! tx_power = -62
//! path_loss_exponent = 2.2
//!
//! [radio]
//! filter_by_service = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crowdlink_ble::BleRadioConfig;
use crowdlink_core::ProximityConfig;

use crate::error::{CliError, Result};

const PEERS_FILE_NAME: &str = "peers.json";

// ----------------------------------------------------------------------------
// CLI Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the CrowdLink CLI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine tuning
    pub proximity: ProximityConfig,
    /// Platform radio options
    pub radio: BleRadioConfig,
    /// Identity to advertise; a fresh UUID is generated when unset
    pub identity: Option<String>,
    /// Paired peers file; defaults to the user data directory
    pub peers_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load and validate a TOML configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CliError::Config(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate TOML configuration text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.proximity
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        if let Some(identity) = &self.identity {
            if identity.trim().is_empty() {
                return Err(CliError::Config("identity must not be blank".to_string()));
            }
        }
        Ok(())
    }

    /// Peers file to use, preferring `override_path`, then config, then the data directory
    pub fn peers_path(&self, override_path: Option<&Path>) -> PathBuf {
        if let Some(path) = override_path {
            return path.to_path_buf();
        }
        if let Some(path) = &self.peers_file {
            return path.clone();
        }
        match dirs::data_dir() {
            Some(dir) => dir.join("crowdlink").join(PEERS_FILE_NAME),
            None => PathBuf::from(PEERS_FILE_NAME),
        }
    }
}
