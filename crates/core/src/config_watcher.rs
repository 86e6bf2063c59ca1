use crate::config::AppConfig;
use crate::config_loader::ConfigLoader;
use anyhow::Result;
use notify::{Event, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// Sections of a reloaded file that differ from the running configuration.
///
/// Only `supervisor` settings are applied to a running process; accounts,
/// database and paper settings are wired at startup.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReloadDiff {
    pub supervisor: bool,
    pub restart_required: Vec<&'static str>,
}

impl ReloadDiff {
    #[must_use]
    pub fn between(current: &AppConfig, reloaded: &AppConfig) -> Self {
        let mut restart_required = Vec::new();
        if current.database != reloaded.database {
            restart_required.push("database");
        }
        if current.paper != reloaded.paper {
            restart_required.push("paper");
        }
        if current.accounts != reloaded.accounts {
            restart_required.push("accounts");
        }
        Self {
            supervisor: current.supervisor != reloaded.supervisor,
            restart_required,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.supervisor && self.restart_required.is_empty()
    }
}

/// Reloads the configuration file on modification and publishes configs whose
/// supervisor section changed.
pub struct ConfigWatcher {
    tx: watch::Sender<AppConfig>,
}

impl ConfigWatcher {
    /// Creates a new configuration watcher with an initial configuration.
    ///
    /// Returns a tuple of the watcher and a receiver for configuration updates.
    #[must_use]
    pub fn new(initial_config: AppConfig) -> (Self, watch::Receiver<AppConfig>) {
        let (tx, rx) = watch::channel(initial_config);
        (Self { tx }, rx)
    }

    /// Applies a freshly loaded config. Returns whether subscribers were notified.
    pub fn offer(&self, reloaded: AppConfig) -> bool {
        let diff = ReloadDiff::between(&self.tx.borrow(), &reloaded);
        if diff.is_empty() {
            tracing::debug!("Config file touched without changes");
            return false;
        }
        if !diff.restart_required.is_empty() {
            tracing::warn!(
                sections = ?diff.restart_required,
                "Changed config sections take effect after a restart"
            );
        }
        if !diff.supervisor {
            return false;
        }
        self.tx.send_replace(reloaded);
        tracing::info!("Supervisor settings reloaded");
        true
    }

    /// Watches `config_path` until the watcher fails, offering every successful reload.
    ///
    /// # Errors
    ///
    /// Returns an error if file watching cannot be initiated or if the watcher task fails.
    pub async fn watch(self, config_path: impl AsRef<Path>) -> Result<()> {
        let config_path: PathBuf = config_path.as_ref().to_path_buf();

        tokio::task::spawn_blocking(move || {
            let (notify_tx, notify_rx) = std::sync::mpsc::channel();

            let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            })?;

            watcher.watch(&config_path, RecursiveMode::NonRecursive)?;

            for event in notify_rx {
                if !event.kind.is_modify() {
                    continue;
                }
                match ConfigLoader::load_from(&config_path) {
                    Ok(reloaded) => {
                        self.offer(reloaded);
                    }
                    Err(e) => {
                        tracing::error!(path = %config_path.display(), error = %e, "Failed to reload config");
                    }
                }
            }

            Ok::<_, anyhow::Error>(())
        })
        .await??;

        Ok(())
    }
}
