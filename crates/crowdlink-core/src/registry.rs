//! Known peer registry
//!
//! The registry is owned outside the engine. The engine only ever reads it:
//! a point-in-time snapshot at start and every change through a `watch`
//! subscription. [`InMemoryPeerRegistry`] is the observable list used by the
//! CLI and tests; persistent stores implement [`PeerRegistry`] the same way.

use tokio::sync::watch;
use tracing::info;

use crate::types::{DeviceIdentity, KnownPeer};

/// Read side of a live peer list
pub trait PeerRegistry: Send + Sync {
    /// Current peers
    fn snapshot(&self) -> Vec<KnownPeer>;

    /// Receiver that wakes whenever the peer list changes
    fn subscribe(&self) -> watch::Receiver<Vec<KnownPeer>>;
}

/// Observable in-memory peer list
#[derive(Debug)]
pub struct InMemoryPeerRegistry {
    peers: watch::Sender<Vec<KnownPeer>>,
}

impl Default for InMemoryPeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPeerRegistry {
    pub fn new() -> Self {
        Self::with_peers(Vec::new())
    }

    pub fn with_peers(peers: Vec<KnownPeer>) -> Self {
        let (peers, _) = watch::channel(peers);
        Self { peers }
    }

    /// Insert `peer`, replacing any entry with the same identity
    pub fn add(&self, peer: KnownPeer) {
        self.peers.send_modify(|peers| {
            match peers.iter_mut().find(|p| p.identity == peer.identity) {
                Some(existing) => *existing = peer,
                None => peers.push(peer),
            }
        });
    }

    /// Record a newly paired peer stamped with the current time
    pub fn pair(
        &self,
        identity: impl Into<DeviceIdentity>,
        display_name: impl Into<String>,
    ) -> KnownPeer {
        let peer = KnownPeer::new(identity, display_name);
        info!("Paired with {} ({})", peer.display_name, peer.identity);
        self.add(peer.clone());
        peer
    }

    /// Remove by identity, returning the removed peer
    pub fn remove(&self, identity: &DeviceIdentity) -> Option<KnownPeer> {
        let mut removed = None;
        self.peers.send_if_modified(|peers| {
            match peers.iter().position(|p| &p.identity == identity) {
                Some(pos) => {
                    removed = Some(peers.remove(pos));
                    true
                }
                None => false,
            }
        });
        removed
    }

    pub fn is_paired(&self, identity: &DeviceIdentity) -> bool {
        self.peers.borrow().iter().any(|p| &p.identity == identity)
    }

    pub fn len(&self) -> usize {
        self.peers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.borrow().is_empty()
    }
}

impl PeerRegistry for InMemoryPeerRegistry {
    fn snapshot(&self) -> Vec<KnownPeer> {
        self.peers.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Vec<KnownPeer>> {
        self.peers.subscribe()
    }
}
