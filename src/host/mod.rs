//! Host adapter seam.
//!
//! The controller and decoration provider never draw anything themselves.
//! They hand display requests to a [`Host`]: show or hide the single
//! notification, reveal a path, or re-render badges. [`TerminalHost`] is the
//! adapter used by the `badger` binary.

use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::decoration::{decorate, Badge, Emphasis};
use crate::watch::ActiveNotification;

/// Actions bound to the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    /// Reveal the notification's target directory.
    Open,
    /// Hide the notification.
    Dismiss,
}

impl NotificationAction {
    /// CLI invocation that triggers this action.
    pub fn command(self) -> &'static str {
        match self {
            NotificationAction::Open => "badger open",
            NotificationAction::Dismiss => "badger dismiss",
        }
    }
}

/// Display surface the core logic drives.
pub trait Host {
    /// Shows (or replaces) the notification for `notification`.
    fn show_notification(&mut self, notification: &ActiveNotification);

    /// Hides the notification if it is showing.
    fn hide_notification(&mut self);

    /// Reveals `path` in the host's navigator. Must be a no-op when the path
    /// no longer exists.
    fn reveal(&mut self, path: &Path);

    /// Re-renders the badges of `paths`.
    fn refresh_badges(&mut self, paths: &[PathBuf]);
}

/// Notification text as shown to the user.
pub fn notification_text(notification: &ActiveNotification) -> String {
    format!("New test folder: {}", notification.label)
}

/// Formats a badge as `symbol  LABEL`, colored by emphasis.
pub fn render_badge(badge: &Badge) -> String {
    let text = format!("{}  {}", badge.symbol, badge.label);
    match badge.emphasis {
        Emphasis::Error => text.red().bold().to_string(),
        Emphasis::Normal => text.green().to_string(),
    }
}

/// Host adapter for a terminal.
///
/// Everything is logged through `tracing`; with `echo` enabled lines are
/// also printed to stdout. With `open_with_system` set, revealing a path
/// launches the platform file manager.
pub struct TerminalHost {
    echo: bool,
    open_with_system: bool,
    visible: bool,
}

impl TerminalHost {
    pub fn new(echo: bool, open_with_system: bool) -> Self {
        Self {
            echo,
            open_with_system,
            visible: false,
        }
    }

    fn print(&self, line: impl AsRef<str>) {
        if self.echo {
            println!("{}", line.as_ref());
        }
    }

    fn launch_file_manager(path: &Path) {
        let program = if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(target_os = "windows") {
            "explorer"
        } else {
            "xdg-open"
        };

        let spawned = Command::new(program)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        if let Err(e) = spawned {
            tracing::warn!("Failed to launch {} for {:?}: {}", program, path, e);
        }
    }
}

impl Host for TerminalHost {
    fn show_notification(&mut self, notification: &ActiveNotification) {
        self.visible = true;
        tracing::info!(
            "{} ({})",
            notification_text(notification),
            notification.target_path.display()
        );

        self.print(format!(
            "{} {}",
            "▲".cyan(),
            notification_text(notification).bold()
        ));
        self.print(
            format!(
                "  Run '{}' to open it, '{}' to hide",
                NotificationAction::Open.command(),
                NotificationAction::Dismiss.command()
            )
            .dimmed()
            .to_string(),
        );
    }

    fn hide_notification(&mut self) {
        if !self.visible {
            return;
        }
        self.visible = false;
        tracing::info!("Notification hidden");
        self.print("Notification cleared".dimmed().to_string());
    }

    fn reveal(&mut self, path: &Path) {
        if !path.is_dir() {
            tracing::debug!("Not revealing {:?}: no longer exists", path);
            return;
        }

        tracing::info!("Revealing {:?}", path);
        self.print(path.display().to_string());

        if self.open_with_system {
            Self::launch_file_manager(path);
        }
    }

    fn refresh_badges(&mut self, paths: &[PathBuf]) {
        for path in paths {
            match decorate(path) {
                Some(badge) => {
                    tracing::info!("{} {:?}", badge.label, path);
                    self.print(format!("{}  {}", render_badge(&badge), path.display()));
                }
                None => {
                    tracing::debug!("No badge for {:?}", path);
                }
            }
        }
    }
}
