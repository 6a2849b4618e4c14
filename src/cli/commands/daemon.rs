//! Daemon management commands.
//!
//! Provides CLI commands for starting, stopping, and monitoring the
//! background daemon that watches a workspace for new test output folders.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use std::process::Command;

use crate::daemon::{send_command_sync, DaemonCommand, DaemonOptions, DaemonResponse, DaemonState};

/// Daemon management subcommands.
#[derive(Subcommand)]
pub enum DaemonSubcommand {
    /// Start the background daemon.
    Start {
        /// Run in foreground (don't daemonize).
        #[arg(long)]
        foreground: bool,

        /// Open the folder in the system file manager on 'badger open'.
        #[arg(long)]
        open: bool,
    },

    /// Stop the running daemon.
    Stop,

    /// Show daemon status.
    Status,

    /// Show daemon logs.
    Logs {
        /// Number of lines to show.
        #[arg(short = 'n', long, default_value = "20")]
        lines: usize,

        /// Follow log output (like tail -f).
        #[arg(short, long)]
        follow: bool,
    },
}

/// Arguments for the daemon command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    badger daemon start              Watch the current directory in the background\n    \
    badger daemon start --foreground Watch in this terminal\n    \
    badger -w ~/proj daemon status   Status of the daemon watching ~/proj\n    \
    badger daemon logs -f            Follow the daemon log")]
pub struct Args {
    #[command(subcommand)]
    pub command: DaemonSubcommand,
}

impl Args {
    /// True when this invocation runs the daemon in the current process.
    pub fn runs_daemon(&self) -> bool {
        matches!(self.command, DaemonSubcommand::Start { foreground: true, .. })
    }
}

/// Executes the daemon command.
pub fn run(args: Args, workspace: &Path) -> Result<()> {
    match args.command {
        DaemonSubcommand::Start { foreground, open } => run_start(workspace, foreground, open),
        DaemonSubcommand::Stop => run_stop(workspace),
        DaemonSubcommand::Status => run_status(workspace),
        DaemonSubcommand::Logs { lines, follow } => run_logs(workspace, lines, follow),
    }
}

/// Resolves the state paths for `workspace`, refusing paths that are not
/// directories. Nothing is created on disk; the daemon creates `.badger/`
/// itself when it starts.
pub fn state_for(workspace: &Path) -> Result<DaemonState> {
    if !workspace.is_dir() {
        anyhow::bail!("Workspace {} is not a directory", workspace.display());
    }
    let workspace = workspace
        .canonicalize()
        .with_context(|| format!("Failed to resolve workspace {}", workspace.display()))?;
    Ok(DaemonState::locate(&workspace))
}

/// Starts the daemon.
fn run_start(workspace: &Path, foreground: bool, open: bool) -> Result<()> {
    let state = state_for(workspace)?;

    if state.is_running() {
        let pid = state.get_pid().unwrap_or(0);
        println!(
            "{} Daemon is already running (PID {})",
            "Warning:".yellow(),
            pid
        );
        return Ok(());
    }

    if foreground {
        println!("{}", "Starting daemon in foreground...".green());
        println!("{}", format!("Watching {}", state.workspace.display()).dimmed());
        println!("{}", "Press Ctrl+C to stop".dimmed());
        println!();

        let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

        let options = DaemonOptions {
            echo: true,
            open_with_system: open,
        };
        rt.block_on(crate::daemon::run_daemon(&state.workspace, options))?;
    } else {
        println!("{}", "Starting daemon in background...".green());

        let current_exe =
            std::env::current_exe().context("Failed to get current executable path")?;

        let mut command = Command::new(&current_exe);
        command
            .arg("--workspace")
            .arg(&state.workspace)
            .arg("daemon")
            .arg("start")
            .arg("--foreground");
        if open {
            command.arg("--open");
        }

        let child = command
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .context("Failed to spawn daemon process")?;

        println!(
            "{} Daemon started with PID {}",
            "Success:".green(),
            child.id()
        );
        println!(
            "{}",
            format!("Logs available at: {:?}", state.log_file).dimmed()
        );
    }

    Ok(())
}

/// Stops the running daemon.
fn run_stop(workspace: &Path) -> Result<()> {
    let state = state_for(workspace)?;

    if !state.is_running() {
        println!("{}", "Daemon is not running".yellow());
        return Ok(());
    }

    let pid = state.get_pid().unwrap_or(0);
    println!("Stopping daemon (PID {pid})...");

    match send_command_sync(&state.socket_path, DaemonCommand::Stop) {
        Ok(DaemonResponse::Stopping) => {
            println!("{}", "Stop command sent".green());

            for i in 0..30 {
                std::thread::sleep(std::time::Duration::from_millis(100));
                if !state.is_running() {
                    println!("{}", "Daemon stopped".green());
                    return Ok(());
                }
                if i == 10 {
                    println!("{}", "Waiting for daemon to stop...".dimmed());
                }
            }

            println!("{}", "Daemon did not stop gracefully, sending SIGTERM...".yellow());
            kill_process(pid)?;
        }
        Ok(resp) => {
            println!("Unexpected response: {resp:?}");
            kill_process(pid)?;
        }
        Err(e) => {
            tracing::debug!("Failed to send stop command: {}", e);
            println!("{}", "Socket not available, sending SIGTERM...".yellow());
            kill_process(pid)?;
        }
    }

    std::thread::sleep(std::time::Duration::from_secs(1));
    if !state.is_running() {
        let _ = state.cleanup();
        println!("{}", "Daemon stopped".green());
    } else {
        println!("{}", "Warning: Daemon may still be running".yellow());
    }

    Ok(())
}

/// Sends SIGTERM to a process.
fn kill_process(pid: u32) -> Result<()> {
    #[cfg(unix)]
    {
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        anyhow::bail!("Killing processes not supported on this platform");
    }

    Ok(())
}

/// Shows the daemon status.
fn run_status(workspace: &Path) -> Result<()> {
    let state = state_for(workspace)?;

    if !state.is_running() {
        println!("{}", "Daemon is not running".yellow());
        return Ok(());
    }

    let pid = state.get_pid().unwrap_or(0);

    match send_command_sync(&state.socket_path, DaemonCommand::Status) {
        Ok(DaemonResponse::Status {
            pid: actual_pid,
            uptime_seconds,
            workspace,
            ..
        }) => {
            println!("{}", "Daemon Status".green().bold());
            println!();
            println!("  {} {}", "Status:".dimmed(), "running".green());
            println!("  {} {}", "PID:".dimmed(), actual_pid);
            println!("  {} {}", "Workspace:".dimmed(), workspace.display());
            println!("  {} {}", "Uptime:".dimmed(), format_duration(uptime_seconds));

            if let Ok(DaemonResponse::Stats(stats)) =
                send_command_sync(&state.socket_path, DaemonCommand::Stats)
            {
                println!();
                println!("{}", "Statistics".green().bold());
                println!();
                println!("  {} {}", "Folders created:".dimmed(), stats.directories_created);
                println!("  {} {}", "Notifications shown:".dimmed(), stats.notifications_shown);
                println!("  {} {}", "Notifications cleared:".dimmed(), stats.notifications_cleared);
                println!("  {} {}", "Badge refreshes:".dimmed(), stats.badge_refreshes);
                if stats.errors > 0 {
                    println!("  {} {}", "Errors:".dimmed(), stats.errors.to_string().red());
                }
            }
        }
        Ok(_) => {
            println!("{}", "Daemon Status".green().bold());
            println!();
            println!("  {} {}", "Status:".dimmed(), "running".green());
            println!("  {} {}", "PID:".dimmed(), pid);
        }
        Err(e) => {
            tracing::debug!("Failed to get status: {}", e);
            println!("{}", "Daemon Status".green().bold());
            println!();
            println!(
                "  {} {} {}",
                "Status:".dimmed(),
                "running".green(),
                "(socket unavailable)".dimmed()
            );
            println!("  {} {}", "PID:".dimmed(), pid);
        }
    }

    Ok(())
}

/// Formats a duration in seconds as a human-readable string.
fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{seconds}s")
    } else if seconds < 3600 {
        let mins = seconds / 60;
        let secs = seconds % 60;
        format!("{mins}m {secs}s")
    } else if seconds < 86400 {
        let hours = seconds / 3600;
        let mins = (seconds % 3600) / 60;
        format!("{hours}h {mins}m")
    } else {
        let days = seconds / 86400;
        let hours = (seconds % 86400) / 3600;
        format!("{days}d {hours}h")
    }
}

/// Shows daemon logs.
fn run_logs(workspace: &Path, lines: usize, follow: bool) -> Result<()> {
    let state = state_for(workspace)?;

    if !state.log_file.exists() {
        println!("{}", "No log file found".yellow());
        println!("{}", format!("Expected at: {:?}", state.log_file).dimmed());
        return Ok(());
    }

    let file = File::open(&state.log_file).context("Failed to open log file")?;

    if follow {
        println!("{}", format!("Following {:?}...", state.log_file).dimmed());
        println!("{}", "Press Ctrl+C to stop".dimmed());
        println!();

        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::End(0))?;

        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => std::thread::sleep(std::time::Duration::from_millis(100)),
                Ok(_) => print!("{line}"),
                Err(e) => {
                    tracing::debug!("Error reading log: {}", e);
                    break;
                }
            }
        }
    } else {
        let all_lines: Vec<String> = BufReader::new(file).lines().map_while(Result::ok).collect();
        let start = all_lines.len().saturating_sub(lines);

        for line in &all_lines[start..] {
            println!("{line}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_format_duration_seconds() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
    }

    #[test]
    fn test_format_duration_minutes() {
        assert_eq!(format_duration(60), "1m 0s");
        assert_eq!(format_duration(3599), "59m 59s");
    }

    #[test]
    fn test_format_duration_hours_and_days() {
        assert_eq!(format_duration(3600), "1h 0m");
        assert_eq!(format_duration(86399), "23h 59m");
        assert_eq!(format_duration(90000), "1d 1h");
    }

    #[test]
    fn test_state_for_rejects_missing_workspace() {
        let dir = tempdir().expect("Failed to create temp directory");
        let missing = dir.path().join("missing");

        assert!(state_for(&missing).is_err());
        assert!(!missing.exists());
    }

    #[test]
    fn test_state_for_canonicalizes_workspace() {
        let dir = tempdir().expect("Failed to create temp directory");
        let state = state_for(dir.path()).expect("State should be created");

        let canonical = dir.path().canonicalize().expect("Failed to canonicalize");
        assert_eq!(state.workspace, canonical);
        assert_eq!(state.pid_file, canonical.join(".badger/daemon.pid"));
    }

    #[test]
    fn test_status_queries_leave_workspace_untouched() {
        let dir = tempdir().expect("Failed to create temp directory");

        run_status(dir.path()).expect("Status should succeed without a daemon");
        run_logs(dir.path(), 10, false).expect("Logs should succeed without a daemon");

        assert!(!dir.path().join(".badger").exists());
    }
}
