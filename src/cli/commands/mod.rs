//! CLI commands for Badger.
//!
//! Each submodule implements a single CLI command with its argument
//! parsing and execution logic.

/// Show the badge for individual folders.
pub mod badge;

/// Shell completion scripts.
pub mod completions;

/// Watch directory configuration.
pub mod config;

/// Background daemon management.
pub mod daemon;

/// Show the current notification.
pub mod latest;

/// Open and dismiss actions on the notification.
pub mod notification;

/// List decorated folders in the workspace.
pub mod tree;
