//! Engine configuration
//!
//! All structs are serde-serializable so the CLI can load them from TOML, and
//! follow the `Default` + `with_*` builder convention.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{CrowdlinkError, Result};
use crate::types::Rssi;

/// Smallest advertisement slot any supported platform offers for the payload
pub const MIN_PAYLOAD_LEN: usize = 16;

/// Legacy (non-extended) advertisement PDU data limit
pub const MAX_PAYLOAD_LEN: usize = 31;

// ----------------------------------------------------------------------------
// Distance Model
// ----------------------------------------------------------------------------

/// Log-distance path-loss model constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathLossModel {
    /// Calibrated RSSI at one metre
    pub tx_power: Rssi,
    /// 2.0 models free space, larger values obstructed/indoor environments
    pub path_loss_exponent: f64,
}

impl Default for PathLossModel {
    fn default() -> Self {
        Self {
            tx_power: -59,
            path_loss_exponent: 2.5,
        }
    }
}

impl PathLossModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tx_power(mut self, tx_power: Rssi) -> Self {
        self.tx_power = tx_power;
        self
    }

    pub fn with_path_loss_exponent(mut self, exponent: f64) -> Self {
        self.path_loss_exponent = exponent;
        self
    }
}

// ----------------------------------------------------------------------------
// Smoothing
// ----------------------------------------------------------------------------

/// RSSI moving-average settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Number of most recent samples kept per device
    pub window: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { window: 10 }
    }
}

impl SmoothingConfig {
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }
}

// ----------------------------------------------------------------------------
// Codec
// ----------------------------------------------------------------------------

/// Identity payload settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Maximum payload bytes; UTF-8 identities longer than this are truncated
    pub max_payload_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_payload_len: MIN_PAYLOAD_LEN,
        }
    }
}

impl CodecConfig {
    pub fn with_max_payload_len(mut self, len: usize) -> Self {
        self.max_payload_len = len;
        self
    }
}

// ----------------------------------------------------------------------------
// Discovery
// ----------------------------------------------------------------------------

/// Scan session behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Devices unseen for this long drop out of the snapshot; `None` keeps them
    pub device_ttl: Option<Duration>,
    /// How often stale devices are pruned
    pub prune_interval: Duration,
    /// Capacity of the channel carrying scan events into the engine
    pub scan_event_buffer: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            device_ttl: Some(Duration::from_secs(30)),
            prune_interval: Duration::from_secs(5),
            scan_event_buffer: 256,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_device_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.device_ttl = ttl;
        self
    }

    pub fn with_prune_interval(mut self, interval: Duration) -> Self {
        self.prune_interval = interval;
        self
    }

    pub fn with_scan_event_buffer(mut self, size: usize) -> Self {
        self.scan_event_buffer = size;
        self
    }
}

// ----------------------------------------------------------------------------
// Complete Configuration
// ----------------------------------------------------------------------------

/// Complete proximity engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    pub path_loss: PathLossModel,
    pub smoothing: SmoothingConfig,
    pub codec: CodecConfig,
    pub discovery: DiscoveryConfig,
}

impl ProximityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_loss(mut self, path_loss: PathLossModel) -> Self {
        self.path_loss = path_loss;
        self
    }

    pub fn with_smoothing(mut self, smoothing: SmoothingConfig) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_codec(mut self, codec: CodecConfig) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let exponent = self.path_loss.path_loss_exponent;
        if !exponent.is_finite() || exponent <= 0.0 {
            return Err(CrowdlinkError::configuration(format!(
                "path_loss_exponent must be positive and finite, got {}",
                exponent
            )));
        }
        if self.smoothing.window == 0 {
            return Err(CrowdlinkError::configuration(
                "smoothing window must hold at least one sample",
            ));
        }
        let max_len = self.codec.max_payload_len;
        if !(MIN_PAYLOAD_LEN..=MAX_PAYLOAD_LEN).contains(&max_len) {
            return Err(CrowdlinkError::configuration(format!(
                "max_payload_len must be within {}..={}, got {}",
                MIN_PAYLOAD_LEN, MAX_PAYLOAD_LEN, max_len
            )));
        }
        if self.discovery.scan_event_buffer == 0 {
            return Err(CrowdlinkError::configuration(
                "scan_event_buffer must be non-zero",
            ));
        }
        if self.discovery.prune_interval.is_zero() {
            return Err(CrowdlinkError::configuration(
                "prune_interval must be non-zero",
            ));
        }
        Ok(())
    }
}
