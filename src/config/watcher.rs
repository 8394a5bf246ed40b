//! Manifest file watcher for rebuild-driven reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ManifestConfig;
use crate::observability::metrics;

/// Monitors a manifest description for changes.
pub struct ManifestWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ManifestConfig>,
}

impl ManifestWatcher {
    /// Create a new ManifestWatcher.
    ///
    /// Returns the watcher and a receiver for validated descriptions.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ManifestConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(
                            path = %path.display(),
                            "Manifest change detected, reloading"
                        );
                        match load_config(&path) {
                            Ok(config) => {
                                let _ = tx.send(config);
                            }
                            Err(e) => {
                                metrics::record_manifest_reload(false);
                                tracing::error!(
                                    error = %e,
                                    "Failed to reload manifest, keeping current one"
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Manifest watcher started");
        Ok(watcher)
    }
}
