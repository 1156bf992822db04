//! Core types for the proximity engine
//!
//! Value types flowing through the pipeline. Everything here is an immutable
//! snapshot; updates replace values wholesale.

use core::fmt;
use core::ops::Deref;
use serde::{Deserialize, Serialize};

/// Received signal strength in dBm, typically -100..0
pub type Rssi = i16;

/// Distance sentinel for "no usable reading"
pub const UNKNOWN_DISTANCE: f64 = -1.0;

// ----------------------------------------------------------------------------
// Device Identity
// ----------------------------------------------------------------------------

/// Application-level token naming a device
///
/// Either decoded from an advertisement payload or, when no payload decodes,
/// the transport address. Address fallbacks are not stable across MAC
/// rotation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for DeviceIdentity {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for DeviceIdentity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DeviceIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ----------------------------------------------------------------------------
// Timestamp
// ----------------------------------------------------------------------------

/// Wall-clock time in milliseconds since the Unix epoch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn new(millis: u64) -> Self {
        Self(millis)
    }

    pub fn now() -> Self {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(millis as u64)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed from `earlier` to `self`, zero if `earlier` is later
    pub fn saturating_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

// ----------------------------------------------------------------------------
// Observations and Snapshots
// ----------------------------------------------------------------------------

/// One radio scan event, consumed immediately by the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObservation {
    /// Transport (MAC) address, used as identity when no payload decodes
    pub address: String,
    /// Raw received signal strength
    pub rssi: Rssi,
    /// Identity payload bytes from the advertisement, if any
    pub payload: Option<Vec<u8>>,
    pub observed_at: Timestamp,
}

impl RawObservation {
    pub fn new(address: impl Into<String>, rssi: Rssi, payload: Option<Vec<u8>>) -> Self {
        Self {
            address: address.into(),
            rssi,
            payload,
            observed_at: Timestamp::now(),
        }
    }

    pub fn at(mut self, observed_at: Timestamp) -> Self {
        self.observed_at = observed_at;
        self
    }
}

/// Latest smoothed view of one observed device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    pub identity: DeviceIdentity,
    /// Moving-average RSSI; 0 means no usable reading
    pub rssi: Rssi,
    /// Estimated metres, [`UNKNOWN_DISTANCE`] exactly when `rssi == 0`
    pub estimated_distance: f64,
    pub last_seen: Timestamp,
}

impl DiscoveredDevice {
    pub fn has_distance(&self) -> bool {
        self.estimated_distance >= 0.0
    }
}

/// A paired peer, owned by the external registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownPeer {
    pub identity: DeviceIdentity,
    pub display_name: String,
    pub paired_at: Timestamp,
    pub last_seen: Timestamp,
}

impl KnownPeer {
    pub fn new(identity: impl Into<DeviceIdentity>, display_name: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            identity: identity.into(),
            display_name: display_name.into(),
            paired_at: now,
            last_seen: Timestamp::default(),
        }
    }
}

/// A known peer currently in radio range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyPeer {
    pub identity: DeviceIdentity,
    pub display_name: String,
    pub rssi: Rssi,
    pub estimated_distance: f64,
    pub last_seen: Timestamp,
}
