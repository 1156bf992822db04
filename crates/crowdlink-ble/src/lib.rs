//! Bluetooth Low Energy radio adapters for CrowdLink
//!
//! This crate implements the radio traits from `crowdlink-core` over the
//! host's BLE stack so the proximity engine can run against real hardware.
//!
//! ## Architecture
//!
//! - [`config`] - Adapter selection and advertisement options
//! - [`error`] - Platform errors and their mapping to `RadioError`
//! - [`scanner`] - btleplug central scanner producing raw observations
//! - [`advertising`] - Platform advertisers (BlueZ on Linux)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use crowdlink_ble::{BleRadioConfig, BleScanner, PlatformAdvertiser};
//! use crowdlink_core::{InMemoryPeerRegistry, ProximityConfig, ProximityEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let radio = BleRadioConfig::new().with_filter_by_service(true);
//! let registry = InMemoryPeerRegistry::new();
//!
//! let handle = ProximityEngine::spawn(
//!     ProximityConfig::default(),
//!     BleScanner::new(radio.clone()),
//!     PlatformAdvertiser::new(radio),
//!     &registry,
//! )?;
//! handle.start_discovery().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Platform Support
//!
//! Scanning works wherever btleplug does. Advertising is implemented on
//! Linux through `bluer`; elsewhere it reports `RadioError::Unsupported`.

pub mod advertising;
mod config;
mod error;
mod scanner;

// Public API exports
pub use advertising::PlatformAdvertiser;
pub use config::BleRadioConfig;
pub use error::BleError;
pub use scanner::{extract_payload, is_crowdlink_advertisement, BleScanner};
