//! Workspace watcher and dispatch loop.
//!
//! Watches the whole workspace recursively, classifies raw filesystem
//! events, and feeds them to the decoration provider and the notification
//! controller. Notification commands arriving over IPC are executed on the
//! same loop, so the notification slot is only ever touched from one task.

use anyhow::{Context, Result};
use notify::{RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};

use badger_cli::config;
use badger_cli::decoration::{DecorationProvider, RefreshEvent};
use badger_cli::host::Host;
use badger_cli::watch::{classify_event, roots, NotifyController, WatchEvent};

use super::server::{ControlAction, ControlRequest, DaemonResponse};
use super::state::DaemonStats;

/// Capacity of the raw filesystem event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Owns the decoration provider and the notification controller.
pub struct TestFolderWatcher<H: Host> {
    controller: NotifyController<H>,
    provider: DecorationProvider,
}

impl<H: Host> TestFolderWatcher<H> {
    /// Creates a watcher for `workspace`. `workspace` should be canonical so
    /// that it prefixes the paths the OS reports.
    pub fn new(workspace: PathBuf, watch_roots: Vec<PathBuf>, host: H) -> Self {
        Self {
            controller: NotifyController::new(workspace, watch_roots, host),
            provider: DecorationProvider::new(),
        }
    }

    pub fn controller(&self) -> &NotifyController<H> {
        &self.controller
    }

    /// Applies one classified filesystem event.
    pub fn handle_event(&mut self, event: &WatchEvent, stats: &mut DaemonStats) {
        match event {
            WatchEvent::MarkerChanged(path) => {
                // The refresh itself is delivered through the subscription.
                self.provider.marker_changed(path);
            }
            WatchEvent::Created(path) => {
                if path.is_dir() {
                    stats.directories_created += 1;
                }
                if self.controller.on_directory_created(path) {
                    stats.notifications_shown += 1;
                }
            }
            WatchEvent::Removed(path) => {
                if self.controller.on_directory_deleted(path) {
                    stats.notifications_cleared += 1;
                }
            }
        }
    }

    /// Re-renders the badges named by a refresh event.
    pub fn handle_refresh(&mut self, refresh: &RefreshEvent, stats: &mut DaemonStats) {
        self.controller.host_mut().refresh_badges(&refresh.paths);
        stats.badge_refreshes += 1;
    }

    /// Executes a notification command forwarded by the IPC server.
    pub fn handle_control(&mut self, action: ControlAction) -> DaemonResponse {
        match action {
            ControlAction::Latest => DaemonResponse::Notification {
                notification: self.controller.active().cloned(),
                visibility: self.controller.visibility(),
            },
            ControlAction::Open => DaemonResponse::Opened {
                path: self.controller.open_target(),
            },
            ControlAction::Dismiss => {
                self.controller.dismiss();
                DaemonResponse::Dismissed
            }
            ControlAction::Reload => {
                let resolved = config::resolve(self.controller.workspace());
                tracing::info!(
                    "Reloaded watch directories from {}: {:?}",
                    resolved.source,
                    resolved.watch_roots
                );
                self.controller.set_roots(resolved.watch_roots);
                DaemonResponse::Reloaded {
                    watch_roots: self.controller.roots().to_vec(),
                }
            }
        }
    }

    /// Watches the workspace until the shutdown signal is received.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS watcher cannot be created or started.
    pub async fn watch(
        &mut self,
        stats: Arc<RwLock<DaemonStats>>,
        mut control_rx: mpsc::Receiver<ControlRequest>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let workspace = self.controller.workspace().to_path_buf();

        for root in self.controller.roots() {
            tracing::info!("Watching for new folders inside {:?}", root);
        }
        if !roots::any_root_exists(&workspace, self.controller.roots()) {
            tracing::info!("No watch directory exists yet under {:?}", workspace);
        }

        let (tx, mut rx) = mpsc::channel::<notify::Result<notify::Event>>(EVENT_CHANNEL_CAPACITY);

        let mut fs_watcher = notify::recommended_watcher(move |res| {
            let _ = tx.blocking_send(res);
        })
        .context("Failed to create file watcher")?;

        fs_watcher
            .watch(&workspace, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to start watching {}", workspace.display()))?;

        tracing::info!("Watching workspace {:?}", workspace);

        let mut refresh_rx = self.provider.subscribe();

        loop {
            tokio::select! {
                Some(result) = rx.recv() => {
                    match result {
                        Ok(event) => {
                            let classified = classify_event(&workspace, &event);
                            if classified.is_empty() {
                                continue;
                            }
                            let mut stats_guard = stats.write().await;
                            for watch_event in &classified {
                                self.handle_event(watch_event, &mut stats_guard);
                            }
                        }
                        Err(e) => {
                            tracing::warn!("File watcher error: {}", e);
                            let mut stats_guard = stats.write().await;
                            stats_guard.errors += 1;
                        }
                    }
                }
                refresh = refresh_rx.recv() => {
                    match refresh {
                        Ok(refresh) => {
                            let mut stats_guard = stats.write().await;
                            self.handle_refresh(&refresh, &mut stats_guard);
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!("Dropped {} badge refreshes", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                Some(request) = control_rx.recv() => {
                    let response = self.handle_control(request.action);
                    let _ = request.reply.send(response);
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Workspace watcher shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
