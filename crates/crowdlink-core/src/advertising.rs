//! Advertising controller
//!
//! Broadcasts this device's identity through an [`AdvertiseRadio`]. At most
//! one broadcast is live: starting again stops the previous one first, and
//! stopping when idle does nothing.

use tracing::{debug, info, warn};

use crate::codec::IdentityCodec;
use crate::errors::RadioError;
use crate::radio::{AdvertisePayload, AdvertiseRadio};
use crate::types::DeviceIdentity;

pub struct AdvertisingController<A> {
    radio: A,
    codec: IdentityCodec,
    current: Option<DeviceIdentity>,
}

impl<A: AdvertiseRadio> AdvertisingController<A> {
    pub fn new(radio: A, codec: IdentityCodec) -> Self {
        Self {
            radio,
            codec,
            current: None,
        }
    }

    /// Broadcast `identity` indefinitely, replacing any running broadcast
    pub async fn start(&mut self, identity: &str) -> Result<(), RadioError> {
        if self.current.is_some() {
            debug!("Replacing running advertisement");
            self.stop().await?;
        }

        let payload = AdvertisePayload::new(self.codec.encode(identity));
        if payload.data.len() > self.codec.max_payload_len() {
            return Err(RadioError::PayloadTooLarge {
                size: payload.data.len(),
                max_size: self.codec.max_payload_len(),
            });
        }

        if let Err(e) = self.radio.start_advertising(&payload).await {
            warn!("Advertising did not start: {}", e);
            return Err(e);
        }

        self.current = Some(DeviceIdentity::new(identity));
        info!(
            "Advertising identity {} ({} byte payload)",
            identity,
            payload.data.len()
        );
        Ok(())
    }

    /// Stop broadcasting; safe to call when idle
    ///
    /// The current identity is kept if the radio fails to stop.
    pub async fn stop(&mut self) -> Result<(), RadioError> {
        if self.current.is_none() {
            return Ok(());
        }
        self.radio.stop_advertising().await?;
        if let Some(identity) = self.current.take() {
            info!("Stopped advertising {}", identity);
        }
        Ok(())
    }

    pub fn is_advertising(&self) -> bool {
        self.current.is_some()
    }

    /// Identity currently on air
    pub fn current(&self) -> Option<&DeviceIdentity> {
        self.current.as_ref()
    }

    pub fn radio(&self) -> &A {
        &self.radio
    }
}
