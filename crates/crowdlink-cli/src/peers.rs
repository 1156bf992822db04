//! JSON file holding the paired peer list

use std::path::{Path, PathBuf};

use tracing::debug;

use crowdlink_core::{DeviceIdentity, InMemoryPeerRegistry, KnownPeer, PeerRegistry};

use crate::error::{CliError, Result};

/// Paired peers persisted as a JSON array
pub struct PeerStore {
    path: PathBuf,
}

impl PeerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all peers; a missing file is an empty list
    pub fn load(&self) -> Result<Vec<KnownPeer>> {
        if !self.path.exists() {
            debug!("No peers file at {}", self.path.display());
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&contents).map_err(|e| {
            CliError::PeerStore(format!("{} is not a peer list: {}", self.path.display(), e))
        })
    }

    pub fn save(&self, peers: &[KnownPeer]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(peers)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Record a newly paired peer, replacing any entry with the same identity
    pub fn pair(&self, identity: &str, display_name: &str) -> Result<KnownPeer> {
        let registry = self.registry()?;
        let peer = registry.pair(identity, display_name);
        self.save(&registry.snapshot())?;
        Ok(peer)
    }

    /// Remove a peer, returning it if it was present
    pub fn unpair(&self, identity: &str) -> Result<Option<KnownPeer>> {
        let registry = self.registry()?;
        let removed = registry.remove(&DeviceIdentity::new(identity));
        if removed.is_some() {
            self.save(&registry.snapshot())?;
        }
        Ok(removed)
    }

    /// In-memory registry seeded from the file
    pub fn registry(&self) -> Result<InMemoryPeerRegistry> {
        Ok(InMemoryPeerRegistry::with_peers(self.load()?))
    }
}
