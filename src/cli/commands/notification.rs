//! Open and dismiss commands - act on the newest test folder notification.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use badger_cli::host::NotificationAction;

use super::daemon::state_for;
use crate::daemon::{send_command_sync, DaemonCommand, DaemonResponse};

/// Asks the daemon to reveal the notification's target.
pub fn run_open(workspace: &Path) -> Result<()> {
    let Some(response) = request(workspace, DaemonCommand::Open)? else {
        return Ok(());
    };

    match response {
        DaemonResponse::Opened { path: Some(path) } => {
            println!("{} {}", "Opened".green(), path.display());
        }
        DaemonResponse::Opened { path: None } => {
            println!("{}", "No test folder to open.".dimmed());
        }
        other => report_unexpected(other)?,
    }

    Ok(())
}

/// Asks the daemon to hide the notification.
pub fn run_dismiss(workspace: &Path) -> Result<()> {
    let Some(response) = request(workspace, DaemonCommand::Dismiss)? else {
        return Ok(());
    };

    match response {
        DaemonResponse::Dismissed => {
            println!("{}", "Notification dismissed.".dimmed());
            println!(
                "{}",
                format!("Run '{}' to reveal the folder anyway.", NotificationAction::Open.command())
                    .dimmed()
            );
        }
        other => report_unexpected(other)?,
    }

    Ok(())
}

/// Sends `command` to the daemon watching `workspace`.
///
/// Returns `Ok(None)` after printing a hint when no daemon is running.
pub fn request(workspace: &Path, command: DaemonCommand) -> Result<Option<DaemonResponse>> {
    let state = state_for(workspace)?;

    if !state.is_running() {
        println!("{}", "Daemon is not running".yellow());
        println!(
            "{}",
            "Start it with 'badger daemon start' to track new test folders.".dimmed()
        );
        return Ok(None);
    }

    let response = send_command_sync(&state.socket_path, command)?;
    Ok(Some(response))
}

/// Turns an error response into an error, and logs anything else.
pub fn report_unexpected(response: DaemonResponse) -> Result<()> {
    if let DaemonResponse::Error { message } = response {
        anyhow::bail!("Daemon error: {message}");
    }
    tracing::debug!("Unexpected daemon response: {:?}", response);
    println!("Unexpected response: {response:?}");
    Ok(())
}
