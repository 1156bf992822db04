//! Platform advertisers
//!
//! [`PlatformAdvertiser`] picks the implementation for the host at compile
//! time and exposes it as an [`AdvertiseRadio`].

pub mod fallback;
#[cfg(target_os = "linux")]
pub mod linux;

use async_trait::async_trait;
use crowdlink_core::{AdvertisePayload, AdvertiseRadio, RadioError};

use crate::config::BleRadioConfig;

// ----------------------------------------------------------------------------
// Platform Detection and Factory
// ----------------------------------------------------------------------------

/// Platform-specific advertiser enum
pub enum PlatformAdvertiser {
    #[cfg(target_os = "linux")]
    Linux(linux::LinuxAdvertiser),
    #[allow(dead_code)]
    Fallback(fallback::FallbackAdvertiser),
}

impl PlatformAdvertiser {
    /// Create the appropriate advertiser for the current platform
    pub fn new(config: BleRadioConfig) -> Self {
        #[cfg(target_os = "linux")]
        {
            Self::Linux(linux::LinuxAdvertiser::new(config))
        }
        #[cfg(not(target_os = "linux"))]
        {
            let _ = config;
            Self::Fallback(fallback::FallbackAdvertiser::new())
        }
    }

    /// Whether a broadcast is live on the radio
    pub fn is_advertising(&self) -> bool {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(advertiser) => advertiser.is_advertising(),
            Self::Fallback(_) => false,
        }
    }
}

impl Default for PlatformAdvertiser {
    fn default() -> Self {
        Self::new(BleRadioConfig::default())
    }
}

#[async_trait]
impl AdvertiseRadio for PlatformAdvertiser {
    async fn start_advertising(&mut self, payload: &AdvertisePayload) -> Result<(), RadioError> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut advertiser) => advertiser.start_advertising(payload).await,
            Self::Fallback(ref mut advertiser) => advertiser.start_advertising(payload).await,
        }
    }

    async fn stop_advertising(&mut self) -> Result<(), RadioError> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut advertiser) => advertiser.stop_advertising().await,
            Self::Fallback(ref mut advertiser) => advertiser.stop_advertising().await,
        }
    }
}
