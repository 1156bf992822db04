//! Terminal rendering of device and peer tables

use std::fmt::Write;

use crowdlink_core::{DiscoveredDevice, KnownPeer, NearbyPeer};

/// Distance column text; unknown readings show as `?`
pub fn format_distance(metres: f64) -> String {
    if metres < 0.0 {
        "?".to_string()
    } else {
        format!("{:.1} m", metres)
    }
}

pub fn format_devices(devices: &[DiscoveredDevice]) -> String {
    if devices.is_empty() {
        return "No devices in range".to_string();
    }
    let mut out = format!("{:<38} {:>6} {:>10}\n", "IDENTITY", "RSSI", "DISTANCE");
    for device in devices {
        let _ = writeln!(
            out,
            "{:<38} {:>6} {:>10}",
            device.identity.as_str(),
            device.rssi,
            format_distance(device.estimated_distance)
        );
    }
    out
}

pub fn format_nearby(peers: &[NearbyPeer]) -> String {
    if peers.is_empty() {
        return "No paired peers nearby".to_string();
    }
    let mut out = format!("{:<20} {:>6} {:>10}\n", "NAME", "RSSI", "DISTANCE");
    for peer in peers {
        let _ = writeln!(
            out,
            "{:<20} {:>6} {:>10}",
            peer.display_name,
            peer.rssi,
            format_distance(peer.estimated_distance)
        );
    }
    out
}

pub fn format_peers(peers: &[KnownPeer]) -> String {
    if peers.is_empty() {
        return "No paired peers".to_string();
    }
    let mut out = format!("{:<20} {}\n", "NAME", "IDENTITY");
    for peer in peers {
        let _ = writeln!(out, "{:<20} {}", peer.display_name, peer.identity);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowdlink_core::{Timestamp, UNKNOWN_DISTANCE};

    #[test]
    fn test_unknown_distance_is_marked() {
        assert_eq!(format_distance(UNKNOWN_DISTANCE), "?");
        assert_eq!(format_distance(2.75), "2.8 m");
    }

    #[test]
    fn test_nearby_table_lists_names() {
        let peers = vec![NearbyPeer {
            identity: "a".into(),
            display_name: "Alice".to_string(),
            rssi: -60,
            estimated_distance: 1.2,
            last_seen: Timestamp::new(0),
        }];
        let table = format_nearby(&peers);
        assert!(table.contains("Alice"));
        assert!(table.contains("1.2 m"));
        assert_eq!(table.lines().count(), 2);
    }

    #[test]
    fn test_empty_tables_have_placeholder() {
        assert_eq!(format_devices(&[]), "No devices in range");
        assert_eq!(format_nearby(&[]), "No paired peers nearby");
        assert_eq!(format_peers(&[]), "No paired peers");
    }
}
