//! Error types for the BLE radio adapters

use crowdlink_core::RadioError;
use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors raised by the platform BLE stacks
#[derive(Error, Debug)]
pub enum BleError {
    #[error("BLE adapter not available")]
    AdapterNotAvailable,

    #[error("Bluetooth permission denied")]
    PermissionDenied,

    #[error("Failed to create BLE manager: {0}")]
    ManagerFailed(String),

    #[error("Failed to start BLE scan: {0}")]
    ScanFailed(String),

    #[error("Failed to get BLE events: {0}")]
    EventStreamFailed(String),

    #[error("Failed to start advertising: {0}")]
    AdvertiseFailed(String),

    #[error("{operation} is not supported on this platform")]
    Unsupported { operation: String },
}

impl BleError {
    /// Classify a btleplug failure, wrapping anything unrecognised with `wrap`
    pub fn from_btleplug(err: btleplug::Error, wrap: fn(String) -> BleError) -> Self {
        match err {
            btleplug::Error::PermissionDenied => BleError::PermissionDenied,
            btleplug::Error::DeviceNotFound => BleError::AdapterNotAvailable,
            btleplug::Error::NotSupported(operation) => BleError::Unsupported { operation },
            other => wrap(other.to_string()),
        }
    }

    /// Classify a BlueZ failure, wrapping anything unrecognised with `wrap`
    #[cfg(target_os = "linux")]
    pub fn from_bluer(err: bluer::Error, wrap: fn(String) -> BleError) -> Self {
        use bluer::ErrorKind;

        match err.kind {
            ErrorKind::NotPermitted | ErrorKind::NotAuthorized => BleError::PermissionDenied,
            ErrorKind::NotReady | ErrorKind::NotAvailable => BleError::AdapterNotAvailable,
            ErrorKind::NotSupported => BleError::Unsupported {
                operation: err.message,
            },
            _ => wrap(err.to_string()),
        }
    }
}

impl From<BleError> for RadioError {
    fn from(err: BleError) -> Self {
        match err {
            BleError::AdapterNotAvailable => RadioError::AdapterUnavailable,
            BleError::PermissionDenied => RadioError::PermissionDenied,
            BleError::Unsupported { operation } => RadioError::Unsupported { operation },
            BleError::AdvertiseFailed(reason) => RadioError::AdvertiseFailed { reason },
            other @ (BleError::ManagerFailed(_)
            | BleError::ScanFailed(_)
            | BleError::EventStreamFailed(_)) => RadioError::ScanFailed {
                reason: other.to_string(),
            },
        }
    }
}
