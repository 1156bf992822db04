//! Proximity engine task
//!
//! A single task owns the aggregator, the correlator and the advertising
//! controller. Scan events, registry changes and commands from handles are
//! all messages into that task, so no snapshot is ever read mid-update.
//! Results are published on `watch` channels:
//!
//! ```text
//! ScanRadio ──RawObservation──▶ ┌─────────────────┐ ──devices──▶ watch
//! PeerRegistry ──watch────────▶ │ ProximityEngine │ ──nearby───▶ watch
//! ProximityHandle ──commands──▶ └─────────────────┘ ──▶ AdvertiseRadio
//! ```

use std::future::pending;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::advertising::AdvertisingController;
use crate::aggregator::ScanAggregator;
use crate::codec::IdentityCodec;
use crate::config::ProximityConfig;
use crate::correlator::PeerCorrelator;
use crate::errors::{CrowdlinkError, RadioError, Result};
use crate::radio::{AdvertiseRadio, ScanRadio};
use crate::registry::PeerRegistry;
use crate::types::{
    DeviceIdentity, DiscoveredDevice, KnownPeer, NearbyPeer, RawObservation, Timestamp,
};

const COMMAND_BUFFER_SIZE: usize = 32;

// ----------------------------------------------------------------------------
// Commands and Status
// ----------------------------------------------------------------------------

enum EngineCommand {
    StartDiscovery {
        reply: oneshot::Sender<core::result::Result<(), RadioError>>,
    },
    StopDiscovery {
        reply: oneshot::Sender<()>,
    },
    StartAdvertising {
        identity: String,
        reply: oneshot::Sender<core::result::Result<(), RadioError>>,
    },
    StopAdvertising {
        reply: oneshot::Sender<core::result::Result<(), RadioError>>,
    },
    Status {
        reply: oneshot::Sender<EngineStatus>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Point-in-time engine state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub discovering: bool,
    /// Identity currently broadcast, if any
    pub advertising: Option<DeviceIdentity>,
    pub device_count: usize,
    pub nearby_count: usize,
}

// ----------------------------------------------------------------------------
// Handle
// ----------------------------------------------------------------------------

/// Cloneable entry point to a running engine
#[derive(Clone)]
pub struct ProximityHandle {
    commands: mpsc::Sender<EngineCommand>,
    devices: watch::Receiver<Vec<DiscoveredDevice>>,
    nearby: watch::Receiver<Vec<NearbyPeer>>,
}

impl ProximityHandle {
    /// Start scanning; a no-op if already scanning
    pub async fn start_discovery(&self) -> Result<()> {
        self.request(|reply| EngineCommand::StartDiscovery { reply })
            .await?
            .map_err(CrowdlinkError::from)
    }

    /// Stop scanning and clear all device state before returning
    pub async fn stop_discovery(&self) -> Result<()> {
        self.request(|reply| EngineCommand::StopDiscovery { reply }).await
    }

    /// Broadcast `identity`, replacing any current broadcast
    pub async fn start_advertising(&self, identity: impl Into<String>) -> Result<()> {
        let identity = identity.into();
        self.request(|reply| EngineCommand::StartAdvertising { identity, reply })
            .await?
            .map_err(CrowdlinkError::from)
    }

    /// Stop broadcasting; safe to call when not advertising
    pub async fn stop_advertising(&self) -> Result<()> {
        self.request(|reply| EngineCommand::StopAdvertising { reply })
            .await?
            .map_err(CrowdlinkError::from)
    }

    pub async fn status(&self) -> Result<EngineStatus> {
        self.request(|reply| EngineCommand::Status { reply }).await
    }

    /// Stop scanning and advertising, then end the engine task
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| EngineCommand::Shutdown { reply }).await
    }

    /// Live view of every observed device
    pub fn devices(&self) -> watch::Receiver<Vec<DiscoveredDevice>> {
        self.devices.clone()
    }

    /// Live view of known peers in range
    pub fn nearby(&self) -> watch::Receiver<Vec<NearbyPeer>> {
        self.nearby.clone()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| CrowdlinkError::channel("proximity engine has shut down"))?;
        response
            .await
            .map_err(|_| CrowdlinkError::channel("proximity engine dropped the request"))
    }
}

// ----------------------------------------------------------------------------
// Engine Task
// ----------------------------------------------------------------------------

/// The task that owns all mutable discovery state
pub struct ProximityEngine<S, A> {
    config: ProximityConfig,
    scanner: S,
    advertiser: AdvertisingController<A>,
    aggregator: ScanAggregator,
    correlator: PeerCorrelator,
    scan_events: Option<mpsc::Receiver<RawObservation>>,
    peers: watch::Receiver<Vec<KnownPeer>>,
    registry_open: bool,
    commands: mpsc::Receiver<EngineCommand>,
    devices_tx: watch::Sender<Vec<DiscoveredDevice>>,
    nearby_tx: watch::Sender<Vec<NearbyPeer>>,
}

impl<S, A> ProximityEngine<S, A>
where
    S: ScanRadio + 'static,
    A: AdvertiseRadio + 'static,
{
    /// Validate `config`, spawn the engine task and return its handle
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        config: ProximityConfig,
        scanner: S,
        advertiser: A,
        registry: &dyn PeerRegistry,
    ) -> Result<ProximityHandle> {
        let (engine, handle) = Self::new(config, scanner, advertiser, registry.subscribe())?;
        tokio::spawn(engine.run());
        Ok(handle)
    }

    /// Build the engine without spawning it
    pub fn new(
        config: ProximityConfig,
        scanner: S,
        advertiser: A,
        peers: watch::Receiver<Vec<KnownPeer>>,
    ) -> Result<(Self, ProximityHandle)> {
        config.validate()?;

        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let (devices_tx, devices_rx) = watch::channel(Vec::new());
        let (nearby_tx, nearby_rx) = watch::channel(Vec::new());

        let mut engine = Self {
            aggregator: ScanAggregator::new(&config),
            advertiser: AdvertisingController::new(advertiser, IdentityCodec::new(config.codec)),
            correlator: PeerCorrelator::new(),
            config,
            scanner,
            scan_events: None,
            peers,
            registry_open: true,
            commands,
            devices_tx,
            nearby_tx,
        };
        let initial = engine.peers.borrow_and_update().clone();
        engine.correlator.update_peers(initial);

        let handle = ProximityHandle {
            commands: command_tx,
            devices: devices_rx,
            nearby: nearby_rx,
        };
        Ok((engine, handle))
    }

    /// Process messages until shut down or every handle is dropped
    pub async fn run(mut self) {
        info!("Proximity engine starting");

        let mut prune = interval(self.config.discovery.prune_interval);
        prune.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let expiry_enabled = self.config.discovery.device_ttl.is_some();

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(EngineCommand::Shutdown { reply }) => {
                            self.stop_discovery().await;
                            if let Err(e) = self.advertiser.stop().await {
                                warn!("Failed to stop advertising during shutdown: {}", e);
                            }
                            let _ = reply.send(());
                            break;
                        }
                        Some(cmd) => self.process_command(cmd).await,
                        None => {
                            info!("All engine handles dropped, shutting down");
                            self.stop_discovery().await;
                            if let Err(e) = self.advertiser.stop().await {
                                warn!("Failed to stop advertising during shutdown: {}", e);
                            }
                            break;
                        }
                    }
                }

                event = next_scan_event(&mut self.scan_events) => {
                    match event {
                        Some(raw) => self.on_scan_event(raw),
                        None => {
                            warn!("Radio closed the scan event stream");
                            self.stop_discovery().await;
                        }
                    }
                }

                changed = self.peers.changed(), if self.registry_open => {
                    match changed {
                        Ok(()) => {
                            let peers = self.peers.borrow_and_update().clone();
                            debug!("Peer registry changed ({} peers)", peers.len());
                            self.correlator.update_peers(peers);
                            self.publish_nearby();
                        }
                        Err(_) => {
                            debug!("Peer registry closed; keeping last known peers");
                            self.registry_open = false;
                        }
                    }
                }

                _ = prune.tick(), if expiry_enabled && self.scan_events.is_some() => {
                    self.expire_stale();
                }
            }
        }

        info!("Proximity engine stopped");
    }

    async fn process_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::StartDiscovery { reply } => {
                let result = self.start_discovery().await;
                let _ = reply.send(result);
            }
            EngineCommand::StopDiscovery { reply } => {
                self.stop_discovery().await;
                let _ = reply.send(());
            }
            EngineCommand::StartAdvertising { identity, reply } => {
                let result = self.advertiser.start(&identity).await;
                let _ = reply.send(result);
            }
            EngineCommand::StopAdvertising { reply } => {
                let result = self.advertiser.stop().await;
                let _ = reply.send(result);
            }
            EngineCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
            EngineCommand::Shutdown { reply } => {
                // Handled by the run loop
                let _ = reply.send(());
            }
        }
    }

    async fn start_discovery(&mut self) -> core::result::Result<(), RadioError> {
        if self.scan_events.is_some() {
            debug!("Discovery already running");
            return Ok(());
        }

        self.aggregator.reset();
        let (events_tx, events_rx) = mpsc::channel(self.config.discovery.scan_event_buffer);
        if let Err(e) = self.scanner.start_scan(events_tx).await {
            error!("Discovery did not start ({}): {}", e.reason_code(), e);
            return Err(e);
        }

        self.scan_events = Some(events_rx);
        self.publish_all();
        info!("Discovery started");
        Ok(())
    }

    /// Stop the radio and clear state; events still queued are discarded
    ///
    /// Also the teardown when the radio ends the event stream on its own.
    async fn stop_discovery(&mut self) {
        if self.scan_events.take().is_some() {
            if let Err(e) = self.scanner.stop_scan().await {
                warn!("Radio reported an error stopping scan: {}", e);
            }
            info!("Discovery stopped");
        }
        self.aggregator.reset();
        self.publish_all();
    }

    fn on_scan_event(&mut self, raw: RawObservation) {
        if self.aggregator.on_scan_event(raw).is_some() {
            self.publish_all();
        }
    }

    fn expire_stale(&mut self) {
        let Some(ttl) = self.config.discovery.device_ttl else {
            return;
        };
        if self.aggregator.expire_stale(Timestamp::now(), ttl) > 0 {
            self.publish_all();
        }
    }

    fn publish_all(&mut self) {
        let snapshot = self.aggregator.snapshot();
        self.devices_tx.send_replace(snapshot.clone());
        self.correlator.update_devices(snapshot);
        self.publish_nearby();
    }

    fn publish_nearby(&mut self) {
        let nearby = self.correlator.nearby().to_vec();
        self.nearby_tx.send_if_modified(|current| {
            if *current == nearby {
                false
            } else {
                *current = nearby;
                true
            }
        });
    }

    fn status(&self) -> EngineStatus {
        EngineStatus {
            discovering: self.scan_events.is_some(),
            advertising: self.advertiser.current().cloned(),
            device_count: self.aggregator.len(),
            nearby_count: self.correlator.nearby().len(),
        }
    }
}

async fn next_scan_event(
    events: &mut Option<mpsc::Receiver<RawObservation>>,
) -> Option<RawObservation> {
    match events {
        Some(rx) => rx.recv().await,
        None => pending().await,
    }
}
