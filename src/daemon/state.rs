//! Daemon state management.
//!
//! Manages the daemon's runtime state files inside the workspace's
//! `.badger/` directory: the PID file, the control socket and the log file.
//! Provides methods for checking whether a daemon is already watching the
//! workspace.

use anyhow::{Context, Result};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use badger_cli::config;

/// Paths of the files a daemon uses to coordinate with CLI commands.
pub struct DaemonState {
    /// Workspace the daemon watches.
    pub workspace: PathBuf,
    /// Path to the PID file (`.badger/daemon.pid`).
    pub pid_file: PathBuf,
    /// Path to the Unix socket (`.badger/daemon.sock`).
    pub socket_path: PathBuf,
    /// Path to the log file (`.badger/daemon.log`).
    pub log_file: PathBuf,
}

impl DaemonState {
    /// Resolves the state paths for `workspace` without touching the disk.
    pub fn locate(workspace: &Path) -> Self {
        let state_dir = config::state_dir(workspace);

        Self {
            workspace: workspace.to_path_buf(),
            pid_file: state_dir.join("daemon.pid"),
            socket_path: state_dir.join("daemon.sock"),
            log_file: state_dir.join("daemon.log"),
        }
    }

    /// Creates the state for `workspace`, creating `.badger/` if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be created.
    pub fn for_workspace(workspace: &Path) -> Result<Self> {
        let state_dir = config::state_dir(workspace);

        fs::create_dir_all(&state_dir)
            .with_context(|| format!("Failed to create {}", state_dir.display()))?;

        Ok(Self::locate(workspace))
    }

    /// Checks if the daemon is currently running.
    ///
    /// Returns true if a PID file exists and the process with that PID
    /// is still alive.
    pub fn is_running(&self) -> bool {
        match self.get_pid() {
            Some(pid) => Self::process_exists(pid),
            None => false,
        }
    }

    /// Gets the PID of the running daemon, if available.
    ///
    /// Returns `None` if the PID file does not exist or cannot be parsed.
    pub fn get_pid(&self) -> Option<u32> {
        if !self.pid_file.exists() {
            return None;
        }

        let mut file = fs::File::open(&self.pid_file).ok()?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).ok()?;

        contents.trim().parse().ok()
    }

    /// Writes a process ID to the PID file.
    pub fn write_pid(&self, pid: u32) -> Result<()> {
        let mut file = fs::File::create(&self.pid_file).context("Failed to create PID file")?;
        write!(file, "{pid}").context("Failed to write PID")?;
        Ok(())
    }

    /// Removes the PID file if present.
    pub fn remove_pid(&self) -> Result<()> {
        if self.pid_file.exists() {
            fs::remove_file(&self.pid_file).context("Failed to remove PID file")?;
        }
        Ok(())
    }

    /// Removes the Unix socket file if present.
    pub fn remove_socket(&self) -> Result<()> {
        if self.socket_path.exists() {
            fs::remove_file(&self.socket_path).context("Failed to remove socket file")?;
        }
        Ok(())
    }

    /// Cleans up the PID file and socket. Called during graceful shutdown.
    pub fn cleanup(&self) -> Result<()> {
        self.remove_pid()?;
        self.remove_socket()?;
        Ok(())
    }

    /// Checks if a process with the given PID exists.
    fn process_exists(pid: u32) -> bool {
        #[cfg(unix)]
        {
            // SAFETY: kill(pid, 0) sends no signal; it only checks that the
            // process exists.
            unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
        }

        #[cfg(not(unix))]
        {
            let _ = pid;
            true
        }
    }
}

/// Statistics about the daemon's operation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DaemonStats {
    /// Directory creations observed under the workspace.
    pub directories_created: u64,
    /// Times the notification was shown or replaced.
    pub notifications_shown: u64,
    /// Times the notification was cleared by a deletion.
    pub notifications_cleared: u64,
    /// Badge refresh events delivered.
    pub badge_refreshes: u64,
    /// Timestamp when the daemon started.
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// Number of watcher errors encountered.
    pub errors: u64,
}

impl Default for DaemonStats {
    fn default() -> Self {
        Self {
            directories_created: 0,
            notifications_shown: 0,
            notifications_cleared: 0,
            badge_refreshes: 0,
            started_at: chrono::Utc::now(),
            errors: 0,
        }
    }
}
