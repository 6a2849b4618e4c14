//! Output format selection shared by the listing commands.

use clap::ValueEnum;

/// How `badge`, `tree` and `latest` print their results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored lines for the terminal.
    #[default]
    Text,
    /// Pretty-printed JSON for scripts and editor integrations.
    Json,
}
