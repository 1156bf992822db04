//! Peer correlation
//!
//! Joins the device snapshot with the known peer list by exact identity. A
//! device that is not a known peer never appears in the output, and output
//! order follows the device snapshot.

use std::collections::HashMap;

use crate::types::{DeviceIdentity, DiscoveredDevice, KnownPeer, NearbyPeer};

/// Known peers present in `devices`, in device order
pub fn correlate(devices: &[DiscoveredDevice], peers: &[KnownPeer]) -> Vec<NearbyPeer> {
    if devices.is_empty() || peers.is_empty() {
        return Vec::new();
    }

    let known: HashMap<&DeviceIdentity, &KnownPeer> =
        peers.iter().map(|peer| (&peer.identity, peer)).collect();

    devices
        .iter()
        .filter_map(|device| {
            known.get(&device.identity).map(|peer| NearbyPeer {
                identity: device.identity.clone(),
                display_name: peer.display_name.clone(),
                rssi: device.rssi,
                estimated_distance: device.estimated_distance,
                last_seen: device.last_seen,
            })
        })
        .collect()
}

// ----------------------------------------------------------------------------
// Reconciliation State
// ----------------------------------------------------------------------------

/// Holds the latest copy of each input and recomputes on either change
#[derive(Debug, Clone, Default)]
pub struct PeerCorrelator {
    devices: Vec<DiscoveredDevice>,
    peers: Vec<KnownPeer>,
    nearby: Vec<NearbyPeer>,
}

impl PeerCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the device snapshot and return the recomputed view
    pub fn update_devices(&mut self, devices: Vec<DiscoveredDevice>) -> &[NearbyPeer] {
        self.devices = devices;
        self.recompute()
    }

    /// Replace the peer list and return the recomputed view
    pub fn update_peers(&mut self, peers: Vec<KnownPeer>) -> &[NearbyPeer] {
        self.peers = peers;
        self.recompute()
    }

    pub fn nearby(&self) -> &[NearbyPeer] {
        &self.nearby
    }

    pub fn peers(&self) -> &[KnownPeer] {
        &self.peers
    }

    fn recompute(&mut self) -> &[NearbyPeer] {
        self.nearby = correlate(&self.devices, &self.peers);
        &self.nearby
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;

    fn device(id: &str, rssi: i16) -> DiscoveredDevice {
        DiscoveredDevice {
            identity: id.into(),
            rssi,
            estimated_distance: 2.0,
            last_seen: Timestamp::new(42),
        }
    }

    #[test]
    fn test_only_known_peers_are_nearby() {
        let devices = vec![device("A", -60), device("B", -70)];
        let peers = vec![KnownPeer::new("A", "Alice")];

        let nearby = correlate(&devices, &peers);
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].identity.as_str(), "A");
        assert_eq!(nearby[0].display_name, "Alice");
        assert_eq!(nearby[0].rssi, -60);
        assert_eq!(nearby[0].last_seen, Timestamp::new(42));
    }

    #[test]
    fn test_order_follows_devices() {
        let devices = vec![device("C", -50), device("A", -60), device("B", -70)];
        let peers = vec![
            KnownPeer::new("A", "Alice"),
            KnownPeer::new("B", "Bob"),
            KnownPeer::new("C", "Carol"),
        ];
        let names: Vec<_> = correlate(&devices, &peers)
            .into_iter()
            .map(|p| p.display_name)
            .collect();
        assert_eq!(names, vec!["Carol", "Alice", "Bob"]);
    }

    #[test]
    fn test_no_prefix_matching() {
        let devices = vec![device("3f2504e0-4f89-41", -60)];
        let peers = vec![KnownPeer::new("3f2504e0-4f89-41d3-9a0c-0305e82c3301", "Alice")];
        assert!(correlate(&devices, &peers).is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(correlate(&[], &[KnownPeer::new("A", "Alice")]).is_empty());
        assert!(correlate(&[device("A", -60)], &[]).is_empty());
    }

    #[test]
    fn test_reconciles_on_either_input() {
        let mut correlator = PeerCorrelator::new();
        assert!(correlator.update_devices(vec![device("A", -60)]).is_empty());
        assert_eq!(
            correlator
                .update_peers(vec![KnownPeer::new("A", "Alice")])
                .len(),
            1
        );
        assert!(correlator.update_peers(Vec::new()).is_empty());
        assert!(correlator.nearby().is_empty());
    }
}
