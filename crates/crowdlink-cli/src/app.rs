//! Running CrowdLink engine wired to the host radio

use std::path::Path;

use tracing::info;

use crowdlink_ble::{BleScanner, PlatformAdvertiser};
use crowdlink_core::{InMemoryPeerRegistry, ProximityEngine, ProximityHandle};

use crate::config::AppConfig;
use crate::error::Result;
use crate::peers::PeerStore;

/// Engine, radio adapters and peer registry for one CLI session
pub struct CrowdlinkApp {
    config: AppConfig,
    /// Kept alive so the engine's registry subscription stays open
    registry: InMemoryPeerRegistry,
    handle: ProximityHandle,
}

impl CrowdlinkApp {
    /// Load paired peers and spawn the engine over the platform radio
    pub fn new(config: AppConfig, peers_override: Option<&Path>) -> Result<Self> {
        let store = PeerStore::new(config.peers_path(peers_override));
        let registry = store.registry()?;
        info!(
            "Loaded {} paired peers from {}",
            registry.len(),
            store.path().display()
        );

        let handle = ProximityEngine::spawn(
            config.proximity.clone(),
            BleScanner::new(config.radio.clone()),
            PlatformAdvertiser::new(config.radio.clone()),
            &registry,
        )?;

        Ok(Self {
            config,
            registry,
            handle,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &InMemoryPeerRegistry {
        &self.registry
    }

    pub fn handle(&self) -> &ProximityHandle {
        &self.handle
    }

    /// Stop scanning and advertising and end the engine task
    pub async fn stop(&self) -> Result<()> {
        self.handle.shutdown().await?;
        info!("CrowdLink engine stopped");
        Ok(())
    }
}
