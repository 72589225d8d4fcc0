//! Hot reload of the dashboard config file.
//!
//! A reload re-runs the full resolution (file, env overrides, validation) so
//! a reloaded config is indistinguishable from one loaded at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::resolve_config;
use crate::config::schema::AppConfig;

pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<AppConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end that `HttpServer::run` drains.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<AppConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. Dropping the returned handle stops the reloads.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if triggers_reload(&event.kind) => {
                    reload(&path, &update_tx);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %watched.display(), "Watching config file for changes");
        Ok(watcher)
    }
}

fn triggers_reload(kind: &EventKind) -> bool {
    kind.is_modify() || kind.is_create()
}

/// Resolve the file again and forward it. Returns whether an update was sent.
fn reload(path: &Path, tx: &mpsc::UnboundedSender<AppConfig>) -> bool {
    match resolve_config(Some(path)) {
        Ok(config) => {
            tracing::info!(
                path = %path.display(),
                demo = config.demo.enabled,
                "Dashboard config reloaded"
            );
            tx.send(config).is_ok()
        }
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Config reload rejected, keeping current configuration"
            );
            false
        }
    }
}
