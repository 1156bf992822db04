//! Fallback advertising implementation for unsupported platforms

use async_trait::async_trait;
use crowdlink_core::{AdvertisePayload, AdvertiseRadio, RadioError};
use tracing::warn;

// ----------------------------------------------------------------------------
// Fallback Implementation
// ----------------------------------------------------------------------------

/// Advertiser for hosts without peripheral-mode support
///
/// Starting a broadcast fails with [`RadioError::Unsupported`] so callers can
/// report that the device will not be discoverable.
#[derive(Debug, Default)]
pub struct FallbackAdvertiser;

impl FallbackAdvertiser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AdvertiseRadio for FallbackAdvertiser {
    async fn start_advertising(&mut self, _payload: &AdvertisePayload) -> Result<(), RadioError> {
        warn!("BLE advertising not supported on this platform; this device will not be discoverable");
        Err(RadioError::Unsupported {
            operation: "advertising".to_string(),
        })
    }

    async fn stop_advertising(&mut self) -> Result<(), RadioError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_reports_unsupported() {
        let mut advertiser = FallbackAdvertiser::new();
        let err = tokio_test::block_on(
            advertiser.start_advertising(&AdvertisePayload::new(b"alice".to_vec())),
        )
        .unwrap_err();
        assert_eq!(err.reason_code(), "unsupported");
        tokio_test::assert_ok!(tokio_test::block_on(advertiser.stop_advertising()));
    }
}
