//! Config command - view watch directory configuration.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::path::Path;

use badger_cli::config::{self, ConfigSource};
use badger_cli::watch::roots::any_root_exists;

use super::daemon::state_for;
use super::notification::report_unexpected;
use crate::daemon::{send_command_sync, DaemonCommand, DaemonResponse};

#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    badger config                 Show the effective watch directories\n    \
    badger config path            Show where config files are read from\n    \
    badger config reload          Make the running daemon re-read its config")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective watch directories
    Show,
    /// Show the config file locations
    Path,
    /// Tell the running daemon to re-read its configuration
    Reload,
}

pub fn run(args: Args, workspace: &Path) -> Result<()> {
    match args.command {
        Some(ConfigCommand::Show) | None => show_config(workspace),
        Some(ConfigCommand::Path) => show_paths(workspace),
        Some(ConfigCommand::Reload) => reload_config(workspace),
    }
}

fn show_config(workspace: &Path) -> Result<()> {
    let resolved = config::resolve(workspace);

    println!("{}", "Badger Configuration".bold());
    println!();
    println!("  {}  {}", "Workspace:".dimmed(), workspace.display());
    println!("  {}  {}", "Source:".dimmed(), resolved.source);
    println!();
    println!("{}", "Watch directories:".bold());
    for root in &resolved.watch_roots {
        let found = any_root_exists(workspace, std::slice::from_ref(root));
        let marker = if found { "✓".green() } else { "○".dimmed() };
        println!("  {} {}", marker, root.display());
    }

    if resolved.source == ConfigSource::Default {
        println!();
        println!(
            "{}",
            format!(
                "Set {} or add watch_directories to {} to change this.",
                config::WATCH_DIRECTORIES_ENV,
                config::workspace_config_path(workspace).display()
            )
            .dimmed()
        );
    }

    Ok(())
}

fn show_paths(workspace: &Path) -> Result<()> {
    let workspace_path = config::workspace_config_path(workspace);
    print_path("Workspace:", &workspace_path);

    match config::user_config_path() {
        Some(user_path) => print_path("User:", &user_path),
        None => println!("  {}  {}", "User:".dimmed(), "(no home directory)".dimmed()),
    }

    Ok(())
}

fn print_path(label: &str, path: &Path) {
    let state = if path.exists() {
        "exists".green()
    } else {
        "not found".dimmed()
    };
    println!("  {}  {} ({})", label.dimmed(), path.display(), state);
}

fn reload_config(workspace: &Path) -> Result<()> {
    let state = state_for(workspace)?;

    if !state.is_running() {
        println!("{}", "Daemon is not running".yellow());
        return Ok(());
    }

    match send_command_sync(&state.socket_path, DaemonCommand::Reload)? {
        DaemonResponse::Reloaded { watch_roots } => {
            println!("{}", "Configuration reloaded".green());
            for root in &watch_roots {
                println!("  {}", root.display());
            }
            Ok(())
        }
        other => report_unexpected(other),
    }
}
