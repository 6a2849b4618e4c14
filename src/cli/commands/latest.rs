//! Latest command - show the newest test folder notification.

use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use badger_cli::decoration::decorate;
use badger_cli::host::{notification_text, render_badge, NotificationAction};
use badger_cli::watch::{ActiveNotification, Visibility};

use super::notification::{report_unexpected, request};
use crate::cli::OutputFormat;
use crate::daemon::{DaemonCommand, DaemonResponse};

/// Arguments for the latest command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    badger latest                 Show the newest test folder\n    \
    badger latest --format json   Output as JSON")]
pub struct Args {
    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct LatestReport<'a> {
    notification: Option<&'a ActiveNotification>,
    visibility: Visibility,
}

/// Executes the latest command.
pub fn run(args: Args, workspace: &Path) -> Result<()> {
    let Some(response) = request(workspace, DaemonCommand::Latest)? else {
        return Ok(());
    };

    let (notification, visibility) = match response {
        DaemonResponse::Notification {
            notification,
            visibility,
        } => (notification, visibility),
        other => return report_unexpected(other),
    };

    match args.format {
        OutputFormat::Json => {
            let report = LatestReport {
                notification: notification.as_ref(),
                visibility,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => match notification {
            Some(notification) => print_notification(&notification, visibility),
            None => println!("{}", "No new test folder yet.".dimmed()),
        },
    }

    Ok(())
}

fn print_notification(notification: &ActiveNotification, visibility: Visibility) {
    let badge = decorate(&notification.target_path)
        .map(|badge| format!("  {}", render_badge(&badge)))
        .unwrap_or_default();

    println!("{}{}", notification_text(notification).bold(), badge);
    println!(
        "  {} {}",
        "Path:".dimmed(),
        notification.target_path.display()
    );
    println!(
        "  {} {}",
        "Seen:".dimmed(),
        notification
            .observed_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
    );

    if visibility == Visibility::Hidden {
        println!("  {} {}", "State:".dimmed(), "dismissed".dimmed());
    }

    println!();
    println!(
        "{}",
        format!(
            "Run '{}' to reveal it or '{}' to hide it.",
            NotificationAction::Open.command(),
            NotificationAction::Dismiss.command()
        )
        .dimmed()
    );
}
