//! Unix socket IPC server for daemon communication.
//!
//! Provides a simple request/response protocol over Unix domain sockets:
//! one newline-terminated JSON command per connection, answered by one
//! newline-terminated JSON response. Status, stop, stats and ping are
//! answered here; commands that touch the notification are forwarded to the
//! watcher's dispatch loop so that all notification state changes happen
//! on one task.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use badger_cli::watch::{ActiveNotification, Visibility};

use super::state::DaemonStats;

/// Commands that can be sent to the daemon via IPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DaemonCommand {
    /// Request the daemon's current status.
    Status,
    /// Request the daemon to shut down gracefully.
    Stop,
    /// Request runtime statistics from the daemon.
    Stats,
    /// Ping to check if daemon is responsive.
    Ping,
    /// Request the current notification.
    Latest,
    /// Reveal the notification's target.
    Open,
    /// Hide the notification.
    Dismiss,
    /// Re-read the watch directory configuration.
    Reload,
}

/// Responses from the daemon to IPC commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DaemonResponse {
    /// Status response indicating daemon is running.
    Status {
        running: bool,
        pid: u32,
        uptime_seconds: u64,
        workspace: PathBuf,
    },
    /// Acknowledgment that stop command was received.
    Stopping,
    /// Runtime statistics.
    Stats(DaemonStats),
    /// Ping response.
    Pong,
    /// Current notification slot.
    Notification {
        notification: Option<ActiveNotification>,
        visibility: Visibility,
    },
    /// Result of an open request; `path` is `None` when nothing was stored.
    Opened { path: Option<PathBuf> },
    /// The notification is hidden.
    Dismissed,
    /// Watch roots now in effect.
    Reloaded { watch_roots: Vec<PathBuf> },
    /// Error response.
    Error { message: String },
}

/// Notification commands handled by the watcher's dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Latest,
    Open,
    Dismiss,
    Reload,
}

/// A forwarded command together with the channel its response goes back on.
#[derive(Debug)]
pub struct ControlRequest {
    pub action: ControlAction,
    pub reply: oneshot::Sender<DaemonResponse>,
}

/// Shared handles every connection needs.
#[derive(Clone)]
pub struct ServerContext {
    pub workspace: PathBuf,
    pub stats: Arc<RwLock<DaemonStats>>,
    pub control_tx: mpsc::Sender<ControlRequest>,
}

/// Runs the IPC server on the given Unix socket path.
///
/// The server listens for incoming connections and processes commands
/// until a shutdown signal is received or the Stop command is sent.
///
/// # Errors
///
/// Returns an error if the socket cannot be created or bound.
pub async fn run_server(
    socket_path: &Path,
    context: ServerContext,
    shutdown_tx: Option<oneshot::Sender<()>>,
    mut shutdown_rx: tokio::sync::broadcast::Receiver<()>,
) -> Result<()> {
    if socket_path.exists() {
        std::fs::remove_file(socket_path).context("Failed to remove existing socket file")?;
    }

    let listener = UnixListener::bind(socket_path).context("Failed to bind Unix socket")?;

    tracing::info!("IPC server listening on {:?}", socket_path);

    let shutdown_tx = Arc::new(std::sync::Mutex::new(shutdown_tx));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _addr)) => {
                        let context = context.clone();
                        let shutdown_tx = shutdown_tx.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, context, shutdown_tx).await {
                                tracing::warn!("Error handling IPC connection: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!("Failed to accept connection: {}", e);
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                tracing::info!("IPC server shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Handles a single client connection.
async fn handle_connection(
    stream: UnixStream,
    context: ServerContext,
    shutdown_tx: Arc<std::sync::Mutex<Option<oneshot::Sender<()>>>>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    reader
        .read_line(&mut line)
        .await
        .context("Failed to read from socket")?;

    let response = match serde_json::from_str::<DaemonCommand>(line.trim()) {
        Ok(command) => {
            tracing::debug!("Received IPC command: {:?}", command);
            respond(command, &context, &shutdown_tx).await
        }
        Err(e) => DaemonResponse::Error {
            message: format!("Invalid command: {e}"),
        },
    };

    let response_json = serde_json::to_string(&response).context("Failed to serialize response")?;

    writer
        .write_all(response_json.as_bytes())
        .await
        .context("Failed to write response")?;
    writer
        .write_all(b"\n")
        .await
        .context("Failed to write newline")?;
    writer.flush().await.context("Failed to flush writer")?;

    Ok(())
}

async fn respond(
    command: DaemonCommand,
    context: &ServerContext,
    shutdown_tx: &std::sync::Mutex<Option<oneshot::Sender<()>>>,
) -> DaemonResponse {
    match command {
        DaemonCommand::Status => {
            let stats_guard = context.stats.read().await;
            let uptime = chrono::Utc::now()
                .signed_duration_since(stats_guard.started_at)
                .num_seconds()
                .max(0) as u64;
            DaemonResponse::Status {
                running: true,
                pid: std::process::id(),
                uptime_seconds: uptime,
                workspace: context.workspace.clone(),
            }
        }
        DaemonCommand::Stop => {
            if let Ok(mut guard) = shutdown_tx.lock() {
                if let Some(tx) = guard.take() {
                    let _ = tx.send(());
                }
            }
            DaemonResponse::Stopping
        }
        DaemonCommand::Stats => {
            let stats_guard = context.stats.read().await;
            DaemonResponse::Stats(stats_guard.clone())
        }
        DaemonCommand::Ping => DaemonResponse::Pong,
        DaemonCommand::Latest => forward(ControlAction::Latest, context).await,
        DaemonCommand::Open => forward(ControlAction::Open, context).await,
        DaemonCommand::Dismiss => forward(ControlAction::Dismiss, context).await,
        DaemonCommand::Reload => forward(ControlAction::Reload, context).await,
    }
}

/// Hands a notification command to the dispatch loop and waits for its answer.
async fn forward(action: ControlAction, context: &ServerContext) -> DaemonResponse {
    let (reply, reply_rx) = oneshot::channel();

    if context
        .control_tx
        .send(ControlRequest { action, reply })
        .await
        .is_err()
    {
        return DaemonResponse::Error {
            message: "Watcher is not running".to_string(),
        };
    }

    reply_rx.await.unwrap_or_else(|_| DaemonResponse::Error {
        message: "Watcher dropped the request".to_string(),
    })
}

/// Sends a command to the daemon and returns the response.
///
/// # Errors
///
/// Returns an error if the connection fails, the command cannot be sent,
/// or the response cannot be read or parsed.
pub async fn send_command(socket_path: &Path, command: DaemonCommand) -> Result<DaemonResponse> {
    let stream = UnixStream::connect(socket_path)
        .await
        .context("Failed to connect to daemon socket")?;

    let (reader, mut writer) = stream.into_split();

    let command_json = serde_json::to_string(&command).context("Failed to serialize command")?;
    writer
        .write_all(command_json.as_bytes())
        .await
        .context("Failed to write command")?;
    writer
        .write_all(b"\n")
        .await
        .context("Failed to write newline")?;
    writer.flush().await.context("Failed to flush")?;

    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .await
        .context("Failed to read response")?;

    let response: DaemonResponse =
        serde_json::from_str(line.trim()).context("Failed to parse response")?;

    Ok(response)
}

/// Synchronous wrapper for sending a command to the daemon.
///
/// Creates a temporary tokio runtime to send the command.
/// Use this from non-async contexts like CLI commands.
pub fn send_command_sync(socket_path: &Path, command: DaemonCommand) -> Result<DaemonResponse> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(send_command(socket_path, command))
}
