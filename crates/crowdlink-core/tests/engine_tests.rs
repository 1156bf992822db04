//! Engine Integration Tests
//!
//! Drives a spawned proximity engine through scripted radios: scan events in,
//! device and nearby-peer snapshots out, with registry changes and advertising
//! commands interleaved.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use crowdlink_core::{
    AdvertisePayload, AdvertiseRadio, CrowdlinkError, DiscoveryConfig, IdentityCodec,
    InMemoryPeerRegistry, ProximityConfig, ProximityEngine, ProximityHandle, RadioError,
    RawObservation, ScanRadio, SmoothingConfig,
};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_test::assert_ok;

// ----------------------------------------------------------------------------
// Test Utilities
// ----------------------------------------------------------------------------

#[derive(Default)]
struct ScannerState {
    events: Option<mpsc::Sender<RawObservation>>,
    starts: usize,
    stops: usize,
    fail_with: Option<RadioError>,
}

#[derive(Clone, Default)]
struct ScriptedScanner {
    state: Arc<Mutex<ScannerState>>,
}

impl ScriptedScanner {
    fn failing(err: RadioError) -> Self {
        let scanner = Self::default();
        scanner.state.lock().unwrap().fail_with = Some(err);
        scanner
    }

    fn sender(&self) -> mpsc::Sender<RawObservation> {
        self.state
            .lock()
            .unwrap()
            .events
            .clone()
            .expect("scanner is not running")
    }

    async fn emit(&self, identity: &str, rssi: i16) {
        let payload = IdentityCodec::default().encode(identity);
        self.sender()
            .send(RawObservation::new("AA:BB:CC:DD:EE:FF", rssi, Some(payload)))
            .await
            .expect("engine dropped the scan channel");
    }

    /// Drop the radio's sender as a failing adapter would
    fn close_stream(&self) {
        self.state.lock().unwrap().events = None;
    }

    fn counts(&self) -> (usize, usize) {
        let state = self.state.lock().unwrap();
        (state.starts, state.stops)
    }
}

#[async_trait]
impl ScanRadio for ScriptedScanner {
    async fn start_scan(&mut self, events: mpsc::Sender<RawObservation>) -> Result<(), RadioError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.fail_with.clone() {
            return Err(err);
        }
        state.events = Some(events);
        state.starts += 1;
        Ok(())
    }

    async fn stop_scan(&mut self) -> Result<(), RadioError> {
        let mut state = self.state.lock().unwrap();
        state.events = None;
        state.stops += 1;
        Ok(())
    }
}

#[derive(Clone, Default)]
struct ScriptedAdvertiser {
    on_air: Arc<Mutex<Vec<Vec<u8>>>>,
}

#[async_trait]
impl AdvertiseRadio for ScriptedAdvertiser {
    async fn start_advertising(&mut self, payload: &AdvertisePayload) -> Result<(), RadioError> {
        self.on_air.lock().unwrap().push(payload.data.clone());
        Ok(())
    }

    async fn stop_advertising(&mut self) -> Result<(), RadioError> {
        self.on_air.lock().unwrap().pop();
        Ok(())
    }
}

fn test_config() -> ProximityConfig {
    ProximityConfig::new().with_discovery(DiscoveryConfig::default().with_device_ttl(None))
}

fn spawn_engine(
    scanner: &ScriptedScanner,
    advertiser: &ScriptedAdvertiser,
    registry: &InMemoryPeerRegistry,
) -> ProximityHandle {
    ProximityEngine::spawn(test_config(), scanner.clone(), advertiser.clone(), registry)
        .expect("engine should start")
}

async fn wait_until<T: Clone>(rx: &mut watch::Receiver<T>, predicate: impl Fn(&T) -> bool) -> T {
    timeout(Duration::from_secs(2), async {
        loop {
            {
                let current = rx.borrow_and_update();
                if predicate(&current) {
                    return current.clone();
                }
            }
            rx.changed().await.expect("engine stopped publishing");
        }
    })
    .await
    .expect("timed out waiting for snapshot")
}

// ----------------------------------------------------------------------------
// Discovery
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_scan_events_reach_device_and_nearby_views() {
    let scanner = ScriptedScanner::default();
    let advertiser = ScriptedAdvertiser::default();
    let registry = InMemoryPeerRegistry::new();
    registry.pair("A", "Alice");

    let handle = spawn_engine(&scanner, &advertiser, &registry);
    handle.start_discovery().await.unwrap();

    scanner.emit("A", -60).await;
    scanner.emit("B", -70).await;

    let mut devices = handle.devices();
    let snapshot = wait_until(&mut devices, |d| d.len() == 2).await;
    assert_eq!(snapshot[0].identity.as_str(), "A");
    assert_eq!(snapshot[1].identity.as_str(), "B");

    let mut nearby = handle.nearby();
    let peers = wait_until(&mut nearby, |n| !n.is_empty()).await;
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].display_name, "Alice");
    assert_eq!(peers[0].rssi, -60);

    let status = handle.status().await.unwrap();
    assert!(status.discovering);
    assert_eq!(status.device_count, 2);
    assert_eq!(status.nearby_count, 1);
}

#[tokio::test]
async fn test_registry_changes_recompute_without_new_scans() {
    let scanner = ScriptedScanner::default();
    let advertiser = ScriptedAdvertiser::default();
    let registry = InMemoryPeerRegistry::new();

    let handle = spawn_engine(&scanner, &advertiser, &registry);
    handle.start_discovery().await.unwrap();
    scanner.emit("B", -70).await;

    let mut devices = handle.devices();
    wait_until(&mut devices, |d| d.len() == 1).await;
    assert!(handle.nearby().borrow().is_empty());

    registry.pair("B", "Bob");
    let mut nearby = handle.nearby();
    let peers = wait_until(&mut nearby, |n| n.len() == 1).await;
    assert_eq!(peers[0].display_name, "Bob");

    registry.remove(&"B".into());
    wait_until(&mut nearby, |n| n.is_empty()).await;
}

#[tokio::test]
async fn test_smoothing_runs_in_arrival_order() {
    let scanner = ScriptedScanner::default();
    let advertiser = ScriptedAdvertiser::default();
    let registry = InMemoryPeerRegistry::new();

    let handle = spawn_engine(&scanner, &advertiser, &registry);
    handle.start_discovery().await.unwrap();
    for rssi in [-60, -70, -80] {
        scanner.emit("X", rssi).await;
    }

    let mut devices = handle.devices();
    let snapshot = wait_until(&mut devices, |d| d.first().map(|x| x.rssi) == Some(-70)).await;
    assert_eq!(snapshot.len(), 1);
}

#[tokio::test]
async fn test_stop_discovery_clears_state_before_returning() {
    let scanner = ScriptedScanner::default();
    let advertiser = ScriptedAdvertiser::default();
    let registry = InMemoryPeerRegistry::new();
    registry.pair("X", "Xavier");

    let handle = spawn_engine(&scanner, &advertiser, &registry);
    handle.start_discovery().await.unwrap();
    scanner.emit("X", -90).await;
    scanner.emit("X", -90).await;

    let mut devices = handle.devices();
    wait_until(&mut devices, |d| d.len() == 1).await;

    let stale_sender = scanner.sender();
    handle.stop_discovery().await.unwrap();
    assert!(handle.devices().borrow().is_empty());
    assert!(handle.nearby().borrow().is_empty());
    assert!(stale_sender.is_closed());
    assert_eq!(scanner.counts(), (1, 1));

    handle.start_discovery().await.unwrap();
    scanner.emit("X", -50).await;
    let snapshot = wait_until(&mut devices, |d| d.len() == 1).await;
    assert_eq!(snapshot[0].rssi, -50);
}

#[tokio::test]
async fn test_closed_scan_stream_clears_published_state() {
    let scanner = ScriptedScanner::default();
    let advertiser = ScriptedAdvertiser::default();
    let registry = InMemoryPeerRegistry::new();
    registry.pair("A", "Alice");

    let handle = spawn_engine(&scanner, &advertiser, &registry);
    handle.start_discovery().await.unwrap();
    scanner.emit("A", -60).await;

    let mut devices = handle.devices();
    let mut nearby = handle.nearby();
    wait_until(&mut devices, |d| d.len() == 1).await;
    wait_until(&mut nearby, |n| n.len() == 1).await;

    scanner.close_stream();
    wait_until(&mut devices, |d| d.is_empty()).await;
    wait_until(&mut nearby, |n| n.is_empty()).await;

    let status = handle.status().await.unwrap();
    assert!(!status.discovering);
    assert_eq!(status.device_count, 0);
    assert_eq!(scanner.counts(), (1, 1));

    handle.start_discovery().await.unwrap();
    scanner.emit("A", -55).await;
    let snapshot = wait_until(&mut devices, |d| d.len() == 1).await;
    assert_eq!(snapshot[0].rssi, -55);
}

#[tokio::test]
async fn test_repeated_start_and_stop_are_no_ops() {
    let scanner = ScriptedScanner::default();
    let advertiser = ScriptedAdvertiser::default();
    let registry = InMemoryPeerRegistry::new();

    let handle = spawn_engine(&scanner, &advertiser, &registry);
    assert_ok!(handle.stop_discovery().await);
    assert_ok!(handle.start_discovery().await);
    assert_ok!(handle.start_discovery().await);
    assert_ok!(handle.stop_discovery().await);
    assert_ok!(handle.stop_discovery().await);
    assert_eq!(scanner.counts(), (1, 1));
}

#[tokio::test]
async fn test_scan_start_failure_is_reported() {
    let scanner = ScriptedScanner::failing(RadioError::AdapterUnavailable);
    let advertiser = ScriptedAdvertiser::default();
    let registry = InMemoryPeerRegistry::new();

    let handle = spawn_engine(&scanner, &advertiser, &registry);
    let err = handle.start_discovery().await.unwrap_err();
    assert!(matches!(
        err,
        CrowdlinkError::Radio(RadioError::AdapterUnavailable)
    ));
    assert_eq!(err.reason_code(), "adapter_unavailable");
    assert!(!handle.status().await.unwrap().discovering);
}

#[tokio::test]
async fn test_undecodable_events_do_not_stop_the_pipeline() {
    let scanner = ScriptedScanner::default();
    let advertiser = ScriptedAdvertiser::default();
    let registry = InMemoryPeerRegistry::new();

    let handle = spawn_engine(&scanner, &advertiser, &registry);
    handle.start_discovery().await.unwrap();

    scanner
        .sender()
        .send(RawObservation::new("", -60, Some(vec![0xff, 0xfe])))
        .await
        .unwrap();
    scanner.emit("A", -60).await;

    let mut devices = handle.devices();
    let snapshot = wait_until(&mut devices, |d| !d.is_empty()).await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].identity.as_str(), "A");
}

// ----------------------------------------------------------------------------
// Advertising
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_advertising_through_handle() {
    let scanner = ScriptedScanner::default();
    let advertiser = ScriptedAdvertiser::default();
    let registry = InMemoryPeerRegistry::new();
    let handle = spawn_engine(&scanner, &advertiser, &registry);

    handle.stop_advertising().await.unwrap();
    handle
        .start_advertising("3f2504e0-4f89-41d3-9a0c-0305e82c3301")
        .await
        .unwrap();
    handle.start_advertising("alice").await.unwrap();

    {
        let on_air = advertiser.on_air.lock().unwrap();
        assert_eq!(on_air.len(), 1);
        assert_eq!(on_air[0], b"alice".to_vec());
    }
    let status = handle.status().await.unwrap();
    assert_eq!(
        status.advertising.map(|id| id.into_inner()),
        Some("alice".to_string())
    );

    handle.stop_advertising().await.unwrap();
    handle.stop_advertising().await.unwrap();
    assert!(advertiser.on_air.lock().unwrap().is_empty());
    assert!(handle.status().await.unwrap().advertising.is_none());
}

#[tokio::test]
async fn test_shutdown_stops_radio_and_closes_handle() {
    let scanner = ScriptedScanner::default();
    let advertiser = ScriptedAdvertiser::default();
    let registry = InMemoryPeerRegistry::new();
    let handle = spawn_engine(&scanner, &advertiser, &registry);

    handle.start_discovery().await.unwrap();
    handle.start_advertising("alice").await.unwrap();
    handle.shutdown().await.unwrap();

    assert_eq!(scanner.counts(), (1, 1));
    assert!(advertiser.on_air.lock().unwrap().is_empty());
    assert!(matches!(
        handle.status().await,
        Err(CrowdlinkError::Channel { .. })
    ));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let registry = InMemoryPeerRegistry::new();
    let config = ProximityConfig::new().with_smoothing(SmoothingConfig::default().with_window(0));
    let result = ProximityEngine::spawn(
        config,
        ScriptedScanner::default(),
        ScriptedAdvertiser::default(),
        &registry,
    );
    assert!(matches!(result, Err(CrowdlinkError::Configuration { .. })));
}
