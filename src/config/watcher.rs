//! File-mtime polling watcher that keeps a [`ModeFlag`] in sync with the
//! config file.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use chatview_cache::cache::ModeFlag;
//! use chatview_cache::config::watcher::ModeWatcher;
//! use chatview_cache::config::Config;
//!
//! # tokio_test::block_on(async {
//! let config = Config::load().unwrap_or_default();
//! let flag = ModeFlag::new(config.cache.mode);
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let watcher = ModeWatcher::default_path(flag.clone(), Duration::from_secs(2));
//! let handle = tokio::spawn(watcher.watch(shutdown_rx));
//! // ... hand `flag` to the DisplayInfoCache ...
//! let _ = shutdown_tx.send(true);
//! let _ = handle.await;
//! # });
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::{ModeFlag, ModeSource};
use crate::config::Config;

/// Polling-based watcher applying `cache.mode` changes to a [`ModeFlag`].
pub struct ModeWatcher {
    path: PathBuf,
    poll_interval: Duration,
    last_mtime: Option<SystemTime>,
    flag: ModeFlag,
}

impl ModeWatcher {
    pub fn new(path: PathBuf, flag: ModeFlag, poll_interval: Duration) -> Self {
        Self {
            path,
            poll_interval,
            last_mtime: None,
            flag,
        }
    }

    pub fn default_path(flag: ModeFlag, poll_interval: Duration) -> Self {
        Self::new(Config::path(), flag, poll_interval)
    }

    /// Apply the file's current mode, then poll for changes until shutdown.
    ///
    /// Stops when `true` is sent or every shutdown sender is dropped.
    pub async fn watch(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        self.last_mtime = read_mtime(&self.path);
        if self.last_mtime.is_some() {
            self.apply_file_mode();
        }
        loop {
            tokio::select! {
                res = shutdown_rx.changed() => {
                    if res.is_err() || *shutdown_rx.borrow() {
                        info!("Cache mode watcher shutting down");
                        return;
                    }
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            if *shutdown_rx.borrow() {
                return;
            }

            let current = read_mtime(&self.path);
            let changed = match (self.last_mtime, current) {
                (Some(prev), Some(next)) => next != prev,
                (None, Some(_)) => true,
                _ => false,
            };
            if !changed {
                continue;
            }

            self.last_mtime = current;
            debug!(path = %self.path.display(), "Config file changed, reloading");
            self.apply_file_mode();
        }
    }

    fn apply_file_mode(&self) {
        match Config::load_from_path(&self.path) {
            Ok(mut config) => {
                config.apply_overrides(|key| std::env::var(key).ok());
                let previous = self.flag.mode();
                let next = config.cache.mode;
                if previous != next {
                    info!(from = previous.as_str(), to = next.as_str(), "Cache mode switched");
                    self.flag.set_mode(next);
                }
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Config reload rejected; keeping current cache mode"
                );
            }
        }
    }
}

fn read_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok().and_then(|m| m.modified().ok())
}
