//! Startup orchestration.
//!
//! Config first, then stores and collaborators, then the listener. Any
//! startup error is fatal; nothing is served until everything is ready.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::{resolve_config, AppConfig, ConfigError, ConfigWatcher};
use crate::http::HttpServer;
use crate::infra::{CloudInventory, SnapshotInventory, UnavailableInventory};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{init_logging, metrics};
use crate::voting::{InMemoryPollStore, VoteService};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load polls from {path}: {source}")]
    PollStore { path: PathBuf, source: io::Error },

    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The live-mode inventory source configured for this process.
pub fn build_inventory(config: &AppConfig) -> Arc<dyn CloudInventory> {
    match &config.inventory.snapshot_path {
        Some(path) => {
            tracing::info!(path = %path, "Using inventory snapshot file");
            Arc::new(SnapshotInventory::new(path))
        }
        None => {
            if !config.demo.enabled {
                tracing::warn!("Live mode without an inventory source; resources will be empty");
            }
            Arc::new(UnavailableInventory)
        }
    }
}

/// Poll service over the configured store, seeded when asked to.
pub fn build_vote_service(config: &AppConfig) -> Result<VoteService, StartupError> {
    let store = match &config.votes.persistence_path {
        Some(path) => {
            let path = Path::new(path);
            InMemoryPollStore::load_from_file(path).map_err(|source| StartupError::PollStore {
                path: path.to_path_buf(),
                source,
            })?
        }
        None => InMemoryPollStore::new(None),
    };

    let service = VoteService::new(Arc::new(store));
    if config.votes.seed_demo_polls {
        if let Err(e) = service.seed_demo_polls() {
            tracing::warn!(error = %e, "Failed to seed demo polls");
        }
    }
    Ok(service)
}

/// Load configuration, bring up every subsystem and serve until a
/// termination signal arrives.
pub async fn run(config_path: Option<PathBuf>) -> Result<(), StartupError> {
    let config = resolve_config(config_path.as_deref())?;
    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        demo = config.demo.enabled,
        "iac-dashboard starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match &config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(handle) => (Some(handle), updates),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload disabled");
                    (None, updates)
                }
            }
        }
        None => (None, mpsc::unbounded_channel().1),
    };

    let inventory = build_inventory(&config);
    let votes = build_vote_service(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        trigger.trigger();
    });

    HttpServer::new(config, inventory, votes)
        .run(listener, config_updates, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_follows_config() {
        let mut config = AppConfig::default();
        config.votes.seed_demo_polls = true;
        assert_eq!(build_vote_service(&config).unwrap().list_polls().len(), 2);

        config.votes.seed_demo_polls = false;
        assert!(build_vote_service(&config).unwrap().list_polls().is_empty());
    }

    #[test]
    fn corrupt_poll_file_is_fatal() {
        let path = std::env::temp_dir().join(format!("iac-polls-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[{").unwrap();

        let mut config = AppConfig::default();
        config.votes.persistence_path = Some(path.display().to_string());
        assert!(matches!(
            build_vote_service(&config),
            Err(StartupError::PollStore { .. })
        ));

        std::fs::remove_file(&path).unwrap_or_default();
    }
}
