//! Linux BLE advertising implementation using bluer (BlueZ)

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use bluer::adv::{Advertisement, AdvertisementHandle, Feature, Type};
use crowdlink_core::{AdvertisePayload, AdvertiseRadio, RadioError};
use tracing::{debug, info};

use crate::config::BleRadioConfig;
use crate::error::BleError;

// ----------------------------------------------------------------------------
// Linux Implementation
// ----------------------------------------------------------------------------

pub struct LinuxAdvertiser {
    config: BleRadioConfig,
    /// Keeps the BlueZ connection behind `adapter` open
    #[allow(dead_code)]
    session: Option<bluer::Session>,
    adapter: Option<bluer::Adapter>,
    /// Dropping the handle unregisters the advertisement
    handle: Option<AdvertisementHandle>,
}

impl LinuxAdvertiser {
    pub fn new(config: BleRadioConfig) -> Self {
        Self {
            config,
            session: None,
            adapter: None,
            handle: None,
        }
    }

    pub fn is_advertising(&self) -> bool {
        self.handle.is_some()
    }

    async fn initialize(&mut self) -> Result<bluer::Adapter, BleError> {
        if let Some(adapter) = &self.adapter {
            return Ok(adapter.clone());
        }

        let session = bluer::Session::new()
            .await
            .map_err(|e| BleError::from_bluer(e, BleError::AdvertiseFailed))?;
        let adapter = session
            .default_adapter()
            .await
            .map_err(|e| BleError::from_bluer(e, BleError::AdvertiseFailed))?;

        // Enable adapter if needed
        if !adapter.is_powered().await.unwrap_or(false) {
            adapter
                .set_powered(true)
                .await
                .map_err(|e| BleError::from_bluer(e, BleError::AdvertiseFailed))?;
        }

        self.session = Some(session);
        self.adapter = Some(adapter.clone());
        info!("Linux BLE adapter {} initialized for advertising", adapter.name());
        Ok(adapter)
    }

    fn advertisement(&self, payload: &AdvertisePayload) -> Advertisement {
        let settings = &payload.settings;

        let mut service_uuids = BTreeSet::new();
        if self.config.advertise_service_uuid {
            service_uuids.insert(payload.service_uuid);
        }

        let mut system_includes = BTreeSet::new();
        let local_name = if settings.include_device_name {
            system_includes.insert(Feature::LocalName);
            Some(self.config.local_name.clone())
        } else {
            None
        };

        Advertisement {
            advertisement_type: if settings.connectable {
                Type::Peripheral
            } else {
                Type::Broadcast
            },
            service_uuids,
            manufacturer_data: BTreeMap::from([(payload.manufacturer_id, payload.data.clone())]),
            system_includes,
            local_name,
            timeout: settings.timeout,
            min_interval: Some(settings.mode.interval()),
            max_interval: Some(settings.mode.interval()),
            tx_power: Some(settings.tx_power.dbm()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl AdvertiseRadio for LinuxAdvertiser {
    async fn start_advertising(&mut self, payload: &AdvertisePayload) -> Result<(), RadioError> {
        if self.handle.take().is_some() {
            debug!("Replacing live advertisement");
        }

        let adapter = self.initialize().await?;
        let advertisement = self.advertisement(payload);
        let handle = adapter
            .advertise(advertisement)
            .await
            .map_err(|e| BleError::from_bluer(e, BleError::AdvertiseFailed))?;

        self.handle = Some(handle);
        info!(
            "Started BLE advertising ({} byte payload under 0x{:04x})",
            payload.data.len(),
            payload.manufacturer_id
        );
        Ok(())
    }

    async fn stop_advertising(&mut self) -> Result<(), RadioError> {
        if let Some(handle) = self.handle.take() {
            drop(handle);
            info!("Stopped BLE advertising");
        }
        Ok(())
    }
}
