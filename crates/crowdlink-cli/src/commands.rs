//! Command handlers for the CrowdLink CLI

use std::future::pending;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{info, warn};
use uuid::Uuid;

use crowdlink_core::PeerRegistry;

use crate::app::CrowdlinkApp;
use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::display::{format_devices, format_nearby, format_peers};
use crate::error::{CliError, Result};
use crate::peers::PeerStore;

const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(cli: Cli, config: AppConfig) -> Result<()> {
        let peers_override = cli.peers;
        match cli.command {
            Commands::Scan { duration } => {
                Self::handle_scan_command(config, peers_override, duration).await
            }
            Commands::Nearby { duration } => {
                Self::handle_nearby_command(config, peers_override, duration).await
            }
            Commands::Advertise { identity } => {
                Self::handle_advertise_command(config, peers_override, identity).await
            }
            Commands::Pair { identity, name } => {
                let store = PeerStore::new(config.peers_path(peers_override.as_deref()));
                Self::handle_pair_command(&store, &identity, &name)
            }
            Commands::Unpair { identity } => {
                let store = PeerStore::new(config.peers_path(peers_override.as_deref()));
                Self::handle_unpair_command(&store, &identity)
            }
            Commands::Peers => {
                let store = PeerStore::new(config.peers_path(peers_override.as_deref()));
                Self::handle_peers_command(&store)
            }
        }
    }

    /// Live table of every CrowdLink device in range
    async fn handle_scan_command(
        config: AppConfig,
        peers_override: Option<PathBuf>,
        duration: Option<u64>,
    ) -> Result<()> {
        let app = CrowdlinkApp::new(config, peers_override.as_deref())?;
        Self::start_discovery(&app).await?;

        info!("Scanning for CrowdLink devices... Press Ctrl+C to stop");
        watch_until_done(app.handle().devices(), duration, |devices| {
            println!("{}", format_devices(devices));
        })
        .await;

        app.stop().await
    }

    /// Live table of paired peers in range
    async fn handle_nearby_command(
        config: AppConfig,
        peers_override: Option<PathBuf>,
        duration: Option<u64>,
    ) -> Result<()> {
        let app = CrowdlinkApp::new(config, peers_override.as_deref())?;
        if app.registry().is_empty() {
            warn!("No paired peers; use `crowdlink pair` first");
        }
        Self::start_discovery(&app).await?;

        info!(
            "Looking for {} paired peers... Press Ctrl+C to stop",
            app.registry().len()
        );
        watch_until_done(app.handle().nearby(), duration, |peers| {
            println!("{}", format_nearby(peers));
        })
        .await;

        app.stop().await
    }

    /// Broadcast an identity until interrupted
    async fn handle_advertise_command(
        config: AppConfig,
        peers_override: Option<PathBuf>,
        identity: Option<String>,
    ) -> Result<()> {
        let (identity, generated) = resolve_identity(identity, &config);
        let app = CrowdlinkApp::new(config, peers_override.as_deref())?;

        if let Err(e) = app.handle().start_advertising(identity.clone()).await {
            app.stop().await?;
            return Err(CliError::did_not_start("advertising", &e));
        }

        if generated {
            println!("Generated identity {}", identity);
        }
        println!("Advertising {} (Ctrl+C to stop)", identity);

        note_interrupt(tokio::signal::ctrl_c().await);
        app.handle().stop_advertising().await?;
        app.stop().await
    }

    fn handle_pair_command(store: &PeerStore, identity: &str, name: &str) -> Result<()> {
        if identity.trim().is_empty() {
            return Err(CliError::PeerStore("identity must not be blank".to_string()));
        }
        let peer = store.pair(identity, name)?;
        println!("Paired {} ({})", peer.display_name, peer.identity);
        Ok(())
    }

    fn handle_unpair_command(store: &PeerStore, identity: &str) -> Result<()> {
        match store.unpair(identity)? {
            Some(peer) => println!("Removed {} ({})", peer.display_name, peer.identity),
            None => println!("No paired peer {}", identity),
        }
        Ok(())
    }

    fn handle_peers_command(store: &PeerStore) -> Result<()> {
        let registry = store.registry()?;
        println!("{}", format_peers(&registry.snapshot()));
        Ok(())
    }

    async fn start_discovery(app: &CrowdlinkApp) -> Result<()> {
        if let Err(e) = app.handle().start_discovery().await {
            app.stop().await?;
            return Err(CliError::did_not_start("discovery", &e));
        }
        Ok(())
    }
}

/// Identity to broadcast and whether it was freshly generated
pub fn resolve_identity(requested: Option<String>, config: &AppConfig) -> (String, bool) {
    match requested.or_else(|| config.identity.clone()) {
        Some(identity) => (identity, false),
        None => (Uuid::new_v4().to_string(), true),
    }
}

/// Log how waiting for Ctrl+C ended; true when the user interrupted
fn note_interrupt(result: std::io::Result<()>) -> bool {
    match result {
        Ok(()) => {
            info!("Interrupted");
            true
        }
        Err(e) => {
            warn!("Could not listen for Ctrl+C, stopping: {}", e);
            false
        }
    }
}

/// Render `view` on change, at most once per refresh, until Ctrl+C or `duration` seconds
async fn watch_until_done<T>(
    mut view: watch::Receiver<T>,
    duration: Option<u64>,
    mut render: impl FnMut(&T),
) {
    let deadline = async {
        match duration {
            Some(secs) => sleep(Duration::from_secs(secs)).await,
            None => pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut refresh = interval(REFRESH_INTERVAL);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                note_interrupt(result);
                break;
            }
            _ = &mut deadline => break,
            _ = refresh.tick() => match view.has_changed() {
                Ok(true) => render(&view.borrow_and_update()),
                Ok(false) => {}
                Err(_) => {
                    warn!("Engine stopped publishing");
                    break;
                }
            },
        }
    }
}
