//! CrowdLink Proximity Discovery Engine
//!
//! This crate turns raw BLE advertisement observations into a stable "who is
//! nearby and how far" view for a set of paired peers. It contains no platform
//! radio code; radios plug in through the traits in [`radio`].
//!
//! ## Architecture
//!
//! - [`codec`] - Identity payload encoding and decoding (packed UUID / UTF-8)
//! - [`smoothing`] - Per-device bounded RSSI history and moving average
//! - [`distance`] - Log-distance path-loss estimation
//! - [`aggregator`] - Owns the device table and folds scan events into it
//! - [`correlator`] - Joins the device table with the known peer registry
//! - [`registry`] - Known peer records and an observable in-memory registry
//! - [`advertising`] - Start/stop broadcasting this device's identity
//! - [`engine`] - Actor tying scanning, registry updates and advertising together
//!
//! Data flows: radio scan events → [`ScanAggregator`] → device snapshot →
//! [`correlate`] → nearby peer snapshot → presentation.

pub mod advertising;
pub mod aggregator;
pub mod codec;
pub mod config;
pub mod correlator;
pub mod distance;
pub mod engine;
pub mod errors;
pub mod radio;
pub mod registry;
pub mod smoothing;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use advertising::AdvertisingController;
pub use aggregator::ScanAggregator;
pub use codec::{IdentityCodec, PayloadOutcome};
pub use config::{CodecConfig, DiscoveryConfig, PathLossModel, ProximityConfig, SmoothingConfig};
pub use correlator::{correlate, PeerCorrelator};
pub use distance::DistanceEstimator;
pub use engine::{EngineStatus, ProximityEngine, ProximityHandle};
pub use errors::{CrowdlinkError, RadioError, Result};
pub use radio::{
    AdvertiseMode, AdvertisePayload, AdvertiseRadio, AdvertiseSettings, ScanRadio, TxPowerLevel,
    CROWDLINK_MANUFACTURER_ID, CROWDLINK_SERVICE_UUID,
};
pub use registry::{InMemoryPeerRegistry, PeerRegistry};
pub use smoothing::{smoothed_rssi, SignalHistory, SignalSmoother};
pub use types::{
    DeviceIdentity, DiscoveredDevice, KnownPeer, NearbyPeer, RawObservation, Rssi, Timestamp,
    UNKNOWN_DISTANCE,
};
