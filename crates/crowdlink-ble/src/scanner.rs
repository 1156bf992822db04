//! BLE central scanning
//!
//! Wraps a btleplug adapter as a [`ScanRadio`]. Each scan session spawns a
//! forwarding task that turns adapter events into [`RawObservation`]s for
//! the engine; stopping the scan aborts that task.

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use crowdlink_core::{
    RadioError, RawObservation, ScanRadio, CROWDLINK_MANUFACTURER_ID, CROWDLINK_SERVICE_UUID,
};
use futures::stream::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::config::BleRadioConfig;
use crate::error::BleError;

type EventStream = Pin<Box<dyn Stream<Item = CentralEvent> + Send>>;

// ----------------------------------------------------------------------------
// Scanner Implementation
// ----------------------------------------------------------------------------

/// Scans for CrowdLink advertisements through btleplug
pub struct BleScanner {
    config: BleRadioConfig,
    adapter: Option<Adapter>,
    forwarder: Option<JoinHandle<()>>,
}

impl BleScanner {
    pub fn new(config: BleRadioConfig) -> Self {
        Self {
            config,
            adapter: None,
            forwarder: None,
        }
    }

    /// Whether a scan session is running
    pub fn is_scanning(&self) -> bool {
        self.forwarder.is_some()
    }

    /// Resolve the configured adapter, once
    async fn initialize_adapter(&mut self) -> Result<Adapter, BleError> {
        if let Some(adapter) = &self.adapter {
            return Ok(adapter.clone());
        }

        let manager = Manager::new()
            .await
            .map_err(|e| BleError::from_btleplug(e, BleError::ManagerFailed))?;
        let adapters = manager
            .adapters()
            .await
            .map_err(|e| BleError::from_btleplug(e, BleError::ManagerFailed))?;

        let adapter = adapters
            .into_iter()
            .nth(self.config.adapter_index)
            .ok_or(BleError::AdapterNotAvailable)?;

        self.adapter = Some(adapter.clone());
        info!("BLE adapter {} initialized", self.config.adapter_index);
        Ok(adapter)
    }

    fn scan_filter(&self) -> ScanFilter {
        if self.config.filter_by_service {
            ScanFilter {
                services: vec![CROWDLINK_SERVICE_UUID],
            }
        } else {
            ScanFilter::default()
        }
    }
}

#[async_trait]
impl ScanRadio for BleScanner {
    async fn start_scan(&mut self, events: mpsc::Sender<RawObservation>) -> Result<(), RadioError> {
        if self.is_scanning() {
            self.stop_scan().await?;
        }

        let adapter = self.initialize_adapter().await?;
        let stream = adapter
            .events()
            .await
            .map_err(|e| BleError::from_btleplug(e, BleError::EventStreamFailed))?;
        adapter
            .start_scan(self.scan_filter())
            .await
            .map_err(|e| BleError::from_btleplug(e, BleError::ScanFailed))?;

        self.forwarder = Some(tokio::spawn(forward_events(adapter, stream, events)));
        info!("Started BLE scanning for CrowdLink devices");
        Ok(())
    }

    async fn stop_scan(&mut self) -> Result<(), RadioError> {
        let Some(forwarder) = self.forwarder.take() else {
            return Ok(());
        };
        forwarder.abort();

        if let Some(adapter) = &self.adapter {
            adapter
                .stop_scan()
                .await
                .map_err(|e| BleError::from_btleplug(e, BleError::ScanFailed))?;
        }
        info!("Stopped BLE scanning");
        Ok(())
    }
}

impl Drop for BleScanner {
    fn drop(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}

// ----------------------------------------------------------------------------
// Event Forwarding
// ----------------------------------------------------------------------------

async fn forward_events(
    adapter: Adapter,
    mut stream: EventStream,
    events: mpsc::Sender<RawObservation>,
) {
    while let Some(event) = stream.next().await {
        let id = match event {
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
            _ => continue,
        };

        let Some(raw) = observe_peripheral(&adapter, &id).await else {
            continue;
        };
        if events.send(raw).await.is_err() {
            debug!("Scan consumer went away; stopping event forwarding");
            break;
        }
    }
}

async fn observe_peripheral(adapter: &Adapter, id: &PeripheralId) -> Option<RawObservation> {
    let peripheral = adapter.peripheral(id).await.ok()?;
    let properties = peripheral.properties().await.ok()??;

    if !is_crowdlink_advertisement(
        &properties.services,
        &properties.manufacturer_data,
        &properties.service_data,
    ) {
        return None;
    }

    let Some(rssi) = properties.rssi else {
        trace!("Skipping {} without RSSI", properties.address);
        return None;
    };

    let payload = extract_payload(&properties.manufacturer_data, &properties.service_data);
    if let Some(bytes) = &payload {
        trace!("{} payload {}", properties.address, hex::encode(bytes));
    }
    Some(RawObservation::new(
        properties.address.to_string(),
        rssi,
        payload,
    ))
}

// ----------------------------------------------------------------------------
// Advertisement Parsing
// ----------------------------------------------------------------------------

/// Whether an advertisement carries any CrowdLink marker
pub fn is_crowdlink_advertisement(
    services: &[Uuid],
    manufacturer_data: &HashMap<u16, Vec<u8>>,
    service_data: &HashMap<Uuid, Vec<u8>>,
) -> bool {
    services.contains(&CROWDLINK_SERVICE_UUID)
        || manufacturer_data.contains_key(&CROWDLINK_MANUFACTURER_ID)
        || service_data.contains_key(&CROWDLINK_SERVICE_UUID)
}

/// Identity payload, from manufacturer data first and service data second
pub fn extract_payload(
    manufacturer_data: &HashMap<u16, Vec<u8>>,
    service_data: &HashMap<Uuid, Vec<u8>>,
) -> Option<Vec<u8>> {
    manufacturer_data
        .get(&CROWDLINK_MANUFACTURER_ID)
        .or_else(|| service_data.get(&CROWDLINK_SERVICE_UUID))
        .filter(|bytes| !bytes.is_empty())
        .cloned()
}
