//! Tree command - list decorated folders in the workspace.

use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

use badger_cli::decoration::decorated_dirs;
use badger_cli::host::render_badge;
use badger_cli::watch::roots::relative_label;

use crate::cli::OutputFormat;

/// Arguments for the tree command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    badger tree                 All decorated folders in the workspace\n    \
    badger tree tests           Only folders under tests/\n    \
    badger tree --failed        Only failed runs\n    \
    badger tree --format json   Output as JSON")]
pub struct Args {
    /// Folder to scan (defaults to the workspace root)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Only show failed folders
    #[arg(long)]
    pub failed: bool,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the tree command.
pub fn run(args: Args, workspace: &Path) -> Result<()> {
    let root = match &args.path {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => workspace.join(path),
        None => workspace.to_path_buf(),
    };

    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let mut found = decorated_dirs(&root);
    if args.failed {
        found.retain(|dir| dir.badge.label == "FAILED");
    }

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        OutputFormat::Text => {
            if found.is_empty() {
                println!("{}", "No decorated folders found.".dimmed());
                return Ok(());
            }

            let passed = found.iter().filter(|d| d.badge.label == "PASSED").count();
            let failed = found.len() - passed;

            for dir in &found {
                let label = relative_label(workspace, &dir.path)
                    .unwrap_or_else(|| dir.path.display().to_string());
                println!("{}  {}", render_badge(&dir.badge), label);
            }

            println!();
            println!(
                "{} passed, {} failed",
                passed.to_string().green(),
                failed.to_string().red()
            );
        }
    }

    Ok(())
}
