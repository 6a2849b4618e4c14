//! Command-line interface for Badger.
//!
//! Provides the CLI commands for inspecting badges, managing the watcher
//! daemon and acting on the newest test folder notification.

/// Individual CLI command implementations.
pub mod commands;

/// Output formatting utilities.
pub mod format;

pub use format::OutputFormat;
