//! Property-based tests for the signal pipeline
//!
//! Covers smoothing arithmetic, history eviction, distance monotonicity,
//! identity payload round trips and correlation membership.

use std::collections::HashSet;

use crowdlink_core::{
    correlate, smoothed_rssi, DiscoveredDevice, DistanceEstimator, IdentityCodec, KnownPeer,
    PathLossModel, SignalHistory, Timestamp,
};
use proptest::prelude::*;
use uuid::{Builder, Uuid};

/// Generate a plausible received signal strength
fn arb_rssi() -> impl Strategy<Value = i16> {
    -120i16..=20i16
}

/// Generate a random 128-bit token outside the NCS variant range
fn arb_uuid() -> impl Strategy<Value = Uuid> {
    prop_oneof![
        any::<[u8; 16]>().prop_map(|bytes| Builder::from_random_bytes(bytes).into_uuid()),
        any::<[u8; 16]>().prop_map(|mut bytes| {
            bytes[8] |= 0x80;
            Uuid::from_bytes(bytes)
        }),
    ]
}

/// Generate a short identity drawn from a small alphabet so devices and peers collide
fn arb_identity() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-d]{1,2}").unwrap()
}

fn arb_device() -> impl Strategy<Value = DiscoveredDevice> {
    (arb_identity(), arb_rssi()).prop_map(|(identity, rssi)| DiscoveredDevice {
        identity: identity.into(),
        rssi,
        estimated_distance: 1.0,
        last_seen: Timestamp::new(0),
    })
}

fn arb_peer() -> impl Strategy<Value = KnownPeer> {
    arb_identity().prop_map(|identity| KnownPeer::new(identity.as_str(), identity.to_uppercase()))
}

proptest! {
    /// Property: the smoothed value is the mean truncated toward zero
    #[test]
    fn smoothing_is_truncated_mean(samples in prop::collection::vec(arb_rssi(), 1..64)) {
        let sum: i64 = samples.iter().map(|&s| i64::from(s)).sum();
        let expected = (sum / samples.len() as i64) as i16;
        prop_assert_eq!(smoothed_rssi(&samples), expected);
    }

    /// Property: only the last ten readings influence the output
    #[test]
    fn history_keeps_last_ten(samples in prop::collection::vec(arb_rssi(), 11..80)) {
        let mut history = SignalHistory::new(10);
        for &rssi in &samples {
            history.push(rssi);
        }
        let tail = &samples[samples.len() - 10..];
        prop_assert_eq!(history.len(), 10);
        prop_assert_eq!(history.samples().collect::<Vec<_>>(), tail.to_vec());
        prop_assert_eq!(history.smoothed(), smoothed_rssi(tail));
    }

    /// Property: a weaker signal always yields a strictly larger distance
    #[test]
    fn distance_is_monotonic(a in -120i16..0, b in -120i16..0) {
        prop_assume!(a != b);
        let (weaker, stronger) = if a < b { (a, b) } else { (b, a) };
        let estimator = DistanceEstimator::new(PathLossModel::default());
        prop_assert!(estimator.estimate(weaker) > estimator.estimate(stronger));
    }

    /// Property: distances for real readings are finite and positive
    #[test]
    fn distance_is_positive(rssi in any::<i16>()) {
        prop_assume!(rssi != 0);
        let distance = DistanceEstimator::new(PathLossModel::default()).estimate(rssi);
        prop_assert!(distance.is_finite());
        prop_assert!(distance > 0.0);
    }

    /// Property: canonical non-NCS UUID identities survive the payload unchanged
    #[test]
    fn uuid_identity_round_trips(uuid in arb_uuid()) {
        let codec = IdentityCodec::default();
        let identity = uuid.hyphenated().to_string();
        let payload = codec.encode(&identity);
        prop_assert_eq!(payload.len(), 16);
        prop_assert_eq!(codec.decode(&payload, "fallback"), identity);
    }

    /// Property: long text identities decode to a prefix no longer than the payload limit
    #[test]
    fn long_text_identity_is_truncated(identity in "[a-z0-9 ]{17,60}") {
        let codec = IdentityCodec::default();
        let payload = codec.encode(&identity);
        prop_assert_eq!(payload.len(), 16);

        prop_assert_eq!(codec.decode(&payload, "fallback"), &identity[..16]);
    }

    /// Property: every nearby peer is a known peer and an observed device
    #[test]
    fn correlation_is_subset_of_peers(
        devices in prop::collection::vec(arb_device(), 0..8),
        peers in prop::collection::vec(arb_peer(), 0..8),
    ) {
        let nearby = correlate(&devices, &peers);
        let peer_ids: HashSet<_> = peers.iter().map(|p| p.identity.clone()).collect();
        let device_ids: HashSet<_> = devices.iter().map(|d| d.identity.clone()).collect();

        for peer in &nearby {
            prop_assert!(peer_ids.contains(&peer.identity));
            prop_assert!(device_ids.contains(&peer.identity));
        }
    }
}
