//! Background daemon that watches a workspace for test output.
//!
//! The daemon keeps the notification slot and badge refreshes alive for one
//! workspace. It provides:
//!
//! - Recursive file watching of the workspace
//! - Badge refresh events when `.pass` / `.fail` markers change
//! - The "newest test folder" notification, with open and dismiss actions
//! - Unix socket IPC for CLI communication
//! - Graceful shutdown handling
//!
//! # Architecture
//!
//! - **Watcher**: classifies filesystem events and runs the dispatch loop
//! - **Server**: handles IPC commands from the CLI
//! - **State**: PID file, socket path and log file under `.badger/`

pub mod server;
pub mod state;
pub mod watcher;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing_appender::non_blocking::WorkerGuard;

use badger_cli::config;
use badger_cli::host::TerminalHost;

pub use server::{send_command_sync, DaemonCommand, DaemonResponse};
pub use state::{DaemonState, DaemonStats};
pub use watcher::TestFolderWatcher;

/// Capacity of the IPC-to-watcher command channel.
const CONTROL_CHANNEL_CAPACITY: usize = 16;

/// Options for a daemon run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DaemonOptions {
    /// Print notifications and badges to stdout as well as the log.
    pub echo: bool,
    /// Launch the platform file manager when the notification is opened.
    pub open_with_system: bool,
}

/// Runs the daemon in the foreground.
///
/// This is the main entry point for the daemon. It:
/// 1. Checks that the workspace exists and no other instance watches it
/// 2. Sets up logging to `.badger/daemon.log`
/// 3. Writes the PID file
/// 4. Starts the workspace watcher and IPC server
/// 5. Waits for shutdown signal (SIGINT or stop command)
/// 6. Cleans up state files on exit
///
/// # Errors
///
/// Returns an error if the workspace is not a directory, another daemon
/// instance is already running, or the watcher or server fails to start.
pub async fn run_daemon(workspace: &Path, options: DaemonOptions) -> Result<()> {
    if !workspace.is_dir() {
        anyhow::bail!("Workspace {} is not a directory", workspace.display());
    }
    let workspace = workspace.canonicalize()?;

    let state = DaemonState::for_workspace(&workspace)?;

    if state.is_running() {
        anyhow::bail!(
            "Daemon is already running for this workspace (PID {})",
            state.get_pid().unwrap_or(0)
        );
    }

    let _guard = setup_logging(&state, options.echo)?;

    tracing::info!("Starting Badger daemon for {:?}...", workspace);

    let pid = std::process::id();
    state.write_pid(pid)?;
    tracing::info!("Daemon started with PID {}", pid);

    let resolved = config::resolve(&workspace);
    tracing::info!(
        "Watch directories from {}: {:?}",
        resolved.source,
        resolved.watch_roots
    );

    let stats = Arc::new(RwLock::new(DaemonStats::default()));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let (broadcast_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let (control_tx, control_rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);

    // IPC server
    let context = server::ServerContext {
        workspace: workspace.clone(),
        stats: stats.clone(),
        control_tx,
    };
    let socket_path = state.socket_path.clone();
    let server_broadcast_rx = broadcast_tx.subscribe();
    let server_handle = tokio::spawn(async move {
        if let Err(e) =
            server::run_server(&socket_path, context, Some(stop_tx), server_broadcast_rx).await
        {
            tracing::error!("IPC server error: {}", e);
        }
    });

    // Workspace watcher
    let host = TerminalHost::new(options.echo, options.open_with_system);
    let mut watcher = TestFolderWatcher::new(workspace.clone(), resolved.watch_roots, host);
    let watcher_stats = stats.clone();
    let watcher_broadcast_rx = broadcast_tx.subscribe();
    let watcher_handle = tokio::spawn(async move {
        if let Err(e) = watcher
            .watch(watcher_stats, control_rx, watcher_broadcast_rx)
            .await
        {
            tracing::error!("Watcher error: {}", e);
        }
    });

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = stop_rx => {
            tracing::info!("Received stop command, shutting down...");
        }
    }

    let _ = broadcast_tx.send(());

    // Give components time to clean up
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    server_handle.abort();
    watcher_handle.abort();

    state.cleanup()?;

    tracing::info!("Daemon stopped");

    Ok(())
}

/// Sets up file logging for the daemon.
///
/// Writes logs to `.badger/daemon.log` in the workspace, and to stderr as
/// well when `console` is set. Returns a guard that must be kept alive for
/// the duration of the daemon.
fn setup_logging(state: &DaemonState, console: bool) -> Result<WorkerGuard> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let file_appender = tracing_appender::rolling::never(
        state.log_file.parent().unwrap_or(Path::new(".")),
        state.log_file.file_name().unwrap_or_default(),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "badger=info,badger_cli=info".into()),
        )
        .with(file_layer)
        .with(console.then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .try_init();

    Ok(guard)
}
