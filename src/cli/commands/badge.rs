//! Badge command - show the badge for individual folders.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

use badger_cli::decoration::{decorate, Badge};
use badger_cli::host::render_badge;

use crate::cli::OutputFormat;

/// Arguments for the badge command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    badger badge tests/run1               Badge for one folder\n    \
    badger badge tests/*                  Badges for every run\n    \
    badger badge tests/run1 --format json Output as JSON")]
pub struct Args {
    /// Folders to check (relative paths resolve against the workspace)
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct BadgeReport {
    path: PathBuf,
    badge: Option<Badge>,
}

/// Executes the badge command.
pub fn run(args: Args, workspace: &Path) -> Result<()> {
    let reports: Vec<BadgeReport> = args
        .paths
        .iter()
        .map(|path| {
            let resolved = resolve_path(workspace, path);
            BadgeReport {
                badge: decorate(&resolved),
                path: path.clone(),
            }
        })
        .collect();

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        OutputFormat::Text => {
            for report in &reports {
                match &report.badge {
                    Some(badge) => println!("{}  {}", render_badge(badge), report.path.display()),
                    None => println!(
                        "{}  {}",
                        "-  no badge".dimmed(),
                        report.path.display()
                    ),
                }
            }
        }
    }

    Ok(())
}

/// Resolves a user-supplied path against the workspace.
fn resolve_path(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}
