//! Scan aggregation
//!
//! Folds raw scan events into the device table: resolve identity, smooth,
//! estimate, then replace the device's entry in place. The table keeps
//! first-seen order so the published snapshot is stable for display.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::codec::IdentityCodec;
use crate::config::ProximityConfig;
use crate::distance::DistanceEstimator;
use crate::smoothing::SignalSmoother;
use crate::types::{DeviceIdentity, DiscoveredDevice, RawObservation, Timestamp};

/// Owns the per-device history and the device snapshot table
#[derive(Debug, Clone, Default)]
pub struct ScanAggregator {
    codec: IdentityCodec,
    smoother: SignalSmoother,
    estimator: DistanceEstimator,
    devices: Vec<DiscoveredDevice>,
    index: HashMap<DeviceIdentity, usize>,
}

impl ScanAggregator {
    pub fn new(config: &ProximityConfig) -> Self {
        Self {
            codec: IdentityCodec::new(config.codec),
            smoother: SignalSmoother::new(config.smoothing),
            estimator: DistanceEstimator::new(config.path_loss),
            devices: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Fold one scan event into the table
    ///
    /// Returns the updated entry, or `None` when the event carried neither a
    /// decodable payload nor a usable address and was dropped.
    pub fn on_scan_event(&mut self, raw: RawObservation) -> Option<&DiscoveredDevice> {
        let outcome = self
            .codec
            .decode_outcome(raw.payload.as_deref(), &raw.address);
        let kind = outcome.kind();
        let Some(identity) = outcome.into_identity() else {
            warn!(
                "Dropping scan event with undecodable payload and no address (rssi {})",
                raw.rssi
            );
            return None;
        };

        let rssi = self.smoother.observe(&identity, raw.rssi);
        let estimated_distance = self.estimator.estimate(rssi);
        debug!(
            "Device {} ({}): rssi {} smoothed {} distance {:.1}m",
            identity, kind, raw.rssi, rssi, estimated_distance
        );

        let device = DiscoveredDevice {
            identity: identity.clone(),
            rssi,
            estimated_distance,
            last_seen: raw.observed_at,
        };

        let slot = match self.index.get(&identity) {
            Some(&slot) => {
                self.devices[slot] = device;
                slot
            }
            None => {
                let slot = self.devices.len();
                self.devices.push(device);
                self.index.insert(identity, slot);
                slot
            }
        };
        self.devices.get(slot)
    }

    /// Current devices in first-seen order
    pub fn snapshot(&self) -> Vec<DiscoveredDevice> {
        self.devices.clone()
    }

    pub fn devices(&self) -> &[DiscoveredDevice] {
        &self.devices
    }

    pub fn device(&self, identity: &DeviceIdentity) -> Option<&DiscoveredDevice> {
        self.index.get(identity).map(|&slot| &self.devices[slot])
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Drop every device unseen for longer than `ttl`, with its history
    ///
    /// Returns how many devices were removed.
    pub fn expire_stale(&mut self, now: Timestamp, ttl: Duration) -> usize {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let before = self.devices.len();
        let smoother = &mut self.smoother;
        self.devices.retain(|device| {
            let fresh = now.saturating_since(device.last_seen) <= ttl_ms;
            if !fresh {
                trace!("Device {} expired", device.identity);
                smoother.forget(&device.identity);
            }
            fresh
        });

        let removed = before - self.devices.len();
        if removed > 0 {
            self.rebuild_index();
            debug!("Expired {} stale device(s)", removed);
        }
        removed
    }

    /// Clear all history and devices so the next session starts empty
    pub fn reset(&mut self) {
        self.smoother.clear();
        self.devices.clear();
        self.index.clear();
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .devices
            .iter()
            .enumerate()
            .map(|(slot, device)| (device.identity.clone(), slot))
            .collect();
    }
}
