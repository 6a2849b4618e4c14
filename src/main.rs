use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod daemon;

use cli::commands;

/// The main CLI command line interface.
#[derive(Parser)]
#[command(name = "badger")]
#[command(version)]
#[command(about = "Pass/fail badges for test output folders, and a notifier for the newest test run")]
#[command(long_about = "Badger decorates test output folders with pass/fail badges based on\n\
    .pass and .fail marker files, and watches a workspace for newly created\n\
    test output folders so the newest run is always one command away.")]
#[command(after_help = "EXAMPLES:\n    \
    badger badge tests/run1        Show the badge for one folder\n    \
    badger tree                    List decorated folders in the workspace\n    \
    badger daemon start            Start the background watcher\n    \
    badger latest                  Show the newest test folder\n    \
    badger open                    Reveal the newest test folder\n    \
    badger dismiss                 Hide the notification\n\n\
    For more information about a command, run 'badger <command> --help'.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root (defaults to the current directory)
    #[arg(short, long, global = true, value_name = "PATH")]
    workspace: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show the badge for one or more folders
    #[command(long_about = "Checks each path for .fail and .pass markers and prints the\n\
        resulting badge. .fail takes precedence over .pass. Files, missing\n\
        paths and folders without markers have no badge.")]
    Badge(commands::badge::Args),

    /// List decorated folders in the workspace
    #[command(long_about = "Walks the workspace (or the given folder) and prints every\n\
        folder that carries a pass or fail badge.")]
    Tree(commands::tree::Args),

    /// Manage the background watcher daemon
    #[command(long_about = "Controls the background daemon that watches the workspace for new\n\
        test output folders and marker changes.")]
    Daemon(commands::daemon::Args),

    /// Show the newest test folder notification
    Latest(commands::latest::Args),

    /// Reveal the newest test folder
    #[command(long_about = "Asks the running daemon to reveal the folder the notification\n\
        points at. Does nothing if there is no notification or the folder\n\
        has since been removed.")]
    Open,

    /// Hide the newest test folder notification
    #[command(long_about = "Asks the running daemon to hide the notification. The folder is\n\
        still remembered and 'badger open' keeps working until it is\n\
        removed or a newer test folder appears.")]
    Dismiss,

    /// View watch directory configuration
    #[command(long_about = "Shows the effective watch directories and where they come from.\n\
        Configuration is read from $BADGER_WATCH_DIRECTORIES,\n\
        <workspace>/.badger/config.yaml and ~/.badger/config.yaml.")]
    Config(commands::config::Args),

    /// Generate shell completions
    Completions(commands::completions::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The daemon installs its own file logger
    let runs_daemon = matches!(&cli.command, Commands::Daemon(args) if args.runs_daemon());

    let filter = if cli.verbose {
        "badger=debug,badger_cli=debug"
    } else {
        "badger=info,badger_cli=info"
    };

    if cli.verbose && std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", filter);
    }

    if !runs_daemon {
        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
            .with(tracing_subscriber::fmt::layer().without_time())
            .init();
    }

    let workspace = match cli.workspace {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Badge(args) => commands::badge::run(args, &workspace),
        Commands::Tree(args) => commands::tree::run(args, &workspace),
        Commands::Daemon(args) => commands::daemon::run(args, &workspace),
        Commands::Latest(args) => commands::latest::run(args, &workspace),
        Commands::Open => commands::notification::run_open(&workspace),
        Commands::Dismiss => commands::notification::run_dismiss(&workspace),
        Commands::Config(args) => commands::config::run(args, &workspace),
        Commands::Completions(args) => {
            commands::completions::generate_completions(&mut Cli::command(), args.shell);
            Ok(())
        }
    }
}
