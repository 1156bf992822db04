//! Radio subsystem interface
//!
//! The engine drives the radio only through these traits. Platform crates
//! implement them over real BLE stacks; tests implement them with scripted
//! fakes. Faults come back as [`RadioError`] values, never panics.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::errors::RadioError;
use crate::types::RawObservation;

// ----------------------------------------------------------------------------
// Wire Constants
// ----------------------------------------------------------------------------

/// Service advertised by every CrowdLink device, also the scan filter
pub const CROWDLINK_SERVICE_UUID: Uuid = Uuid::from_u128(0x8f0c5a6e_2d3b_4c1a_9e7f_43a1c2b5d601);

/// Manufacturer data key carrying the identity payload
pub const CROWDLINK_MANUFACTURER_ID: u16 = 0xFFFF;

// ----------------------------------------------------------------------------
// Advertising Parameters
// ----------------------------------------------------------------------------

/// How aggressively to advertise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertiseMode {
    LowPower,
    Balanced,
    LowLatency,
}

impl AdvertiseMode {
    /// Nominal advertising interval for the mode
    pub fn interval(&self) -> Duration {
        match self {
            AdvertiseMode::LowPower => Duration::from_millis(1000),
            AdvertiseMode::Balanced => Duration::from_millis(250),
            AdvertiseMode::LowLatency => Duration::from_millis(100),
        }
    }
}

/// Transmit power level requested from the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPowerLevel {
    UltraLow,
    Low,
    Medium,
    High,
}

impl TxPowerLevel {
    /// Requested transmit power in dBm
    pub fn dbm(&self) -> i16 {
        match self {
            TxPowerLevel::UltraLow => -21,
            TxPowerLevel::Low => -15,
            TxPowerLevel::Medium => -7,
            TxPowerLevel::High => 1,
        }
    }
}

/// Broadcast settings for the identity beacon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertiseSettings {
    pub mode: AdvertiseMode,
    pub tx_power: TxPowerLevel,
    /// Peers never connect; the identity travels in the advertisement itself
    pub connectable: bool,
    /// `None` advertises until stopped
    pub timeout: Option<Duration>,
    /// Keep the device name out of the frame
    pub include_device_name: bool,
}

impl Default for AdvertiseSettings {
    fn default() -> Self {
        Self {
            mode: AdvertiseMode::LowLatency,
            tx_power: TxPowerLevel::High,
            connectable: false,
            timeout: None,
            include_device_name: false,
        }
    }
}

/// Everything a platform advertiser needs to put on air
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisePayload {
    pub service_uuid: Uuid,
    pub manufacturer_id: u16,
    /// Encoded identity bytes
    pub data: Vec<u8>,
    pub settings: AdvertiseSettings,
}

impl AdvertisePayload {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            service_uuid: CROWDLINK_SERVICE_UUID,
            manufacturer_id: CROWDLINK_MANUFACTURER_ID,
            data,
            settings: AdvertiseSettings::default(),
        }
    }
}

// ----------------------------------------------------------------------------
// Radio Traits
// ----------------------------------------------------------------------------

/// Scanning half of the radio
#[async_trait]
pub trait ScanRadio: Send {
    /// Begin delivering observations into `events` until [`ScanRadio::stop_scan`]
    async fn start_scan(&mut self, events: mpsc::Sender<RawObservation>) -> Result<(), RadioError>;

    /// Stop delivering observations; a no-op when not scanning
    async fn stop_scan(&mut self) -> Result<(), RadioError>;
}

/// Advertising half of the radio
#[async_trait]
pub trait AdvertiseRadio: Send {
    async fn start_advertising(&mut self, payload: &AdvertisePayload) -> Result<(), RadioError>;

    /// Stop broadcasting; a no-op when not advertising
    async fn stop_advertising(&mut self) -> Result<(), RadioError>;
}

#[async_trait]
impl<T: ScanRadio + ?Sized> ScanRadio for Box<T> {
    async fn start_scan(&mut self, events: mpsc::Sender<RawObservation>) -> Result<(), RadioError> {
        (**self).start_scan(events).await
    }

    async fn stop_scan(&mut self) -> Result<(), RadioError> {
        (**self).stop_scan().await
    }
}

#[async_trait]
impl<T: AdvertiseRadio + ?Sized> AdvertiseRadio for Box<T> {
    async fn start_advertising(&mut self, payload: &AdvertisePayload) -> Result<(), RadioError> {
        (**self).start_advertising(payload).await
    }

    async fn stop_advertising(&mut self) -> Result<(), RadioError> {
        (**self).stop_advertising().await
    }
}
