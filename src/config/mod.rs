//! Configuration management.
//!
//! Badger has a single setting, `watch_directories`: the relative paths under
//! which newly created folders trigger the "new test folder" notification.
//! Values are resolved from, in order of precedence:
//!
//! 1. the `BADGER_WATCH_DIRECTORIES` environment variable (comma-separated)
//! 2. `<workspace>/.badger/config.yaml`
//! 3. `~/.badger/config.yaml`
//! 4. the built-in default, `["tests"]`
//!
//! A layer that is absent, unreadable, empty, or holds only invalid entries
//! falls through to the next one. Configuration problems never stop Badger;
//! they are logged and the default is used.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Name of the per-workspace (and per-user) state directory.
pub const STATE_DIR_NAME: &str = ".badger";

/// File name of the YAML config inside the state directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Environment variable overriding the watch directories.
pub const WATCH_DIRECTORIES_ENV: &str = "BADGER_WATCH_DIRECTORIES";

/// Watch roots used when nothing else is configured.
pub const DEFAULT_WATCH_DIRECTORIES: &[&str] = &["tests"];

/// Directory names that workspace walks never descend into.
pub const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target", STATE_DIR_NAME];

/// On-disk configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgerConfig {
    /// Directories to watch for test output, relative to the workspace root.
    pub watch_directories: Vec<String>,
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for [`BadgerConfig`].
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A watch directory is empty, absolute, or escapes the workspace.
    #[error("Invalid watch directory '{0}': expected a relative path inside the workspace")]
    InvalidRoot(String),
}

/// Where the effective watch roots came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Environment,
    Workspace(PathBuf),
    User(PathBuf),
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Environment => write!(f, "${WATCH_DIRECTORIES_ENV}"),
            ConfigSource::Workspace(path) | ConfigSource::User(path) => {
                write!(f, "{}", path.display())
            }
            ConfigSource::Default => write!(f, "built-in default"),
        }
    }
}

/// Effective configuration after layering and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Normalized, de-duplicated watch roots. Never empty.
    pub watch_roots: Vec<PathBuf>,
    /// The layer that supplied `watch_roots`.
    pub source: ConfigSource,
}

impl BadgerConfig {
    /// Loads a config file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn load_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if contents.trim().is_empty() {
            return Ok(Some(Self::default()));
        }

        serde_saphyr::from_str::<Self>(&contents)
            .map(Some)
            .map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }
}

/// Returns `<workspace>/.badger`.
pub fn state_dir(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR_NAME)
}

/// Returns `<workspace>/.badger/config.yaml`.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    state_dir(workspace).join(CONFIG_FILE_NAME)
}

/// Returns `~/.badger/config.yaml`, if a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(STATE_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Resolves the effective configuration for a workspace from the process
/// environment and the workspace and user config files.
pub fn resolve(workspace: &Path) -> ResolvedConfig {
    resolve_with(
        workspace,
        env::var(WATCH_DIRECTORIES_ENV).ok(),
        user_config_path(),
    )
}

/// Resolves configuration from explicit inputs.
///
/// `env_value` stands in for `BADGER_WATCH_DIRECTORIES` and `user_config`
/// for `~/.badger/config.yaml`.
pub fn resolve_with(
    workspace: &Path,
    env_value: Option<String>,
    user_config: Option<PathBuf>,
) -> ResolvedConfig {
    if let Some(value) = env_value {
        let raw: Vec<String> = value.split(',').map(str::to_string).collect();
        let roots = normalize_roots(&raw);
        if !roots.is_empty() {
            return ResolvedConfig {
                watch_roots: roots,
                source: ConfigSource::Environment,
            };
        }
        tracing::warn!(
            "{} is set but holds no usable directories, ignoring it",
            WATCH_DIRECTORIES_ENV
        );
    }

    let workspace_path = workspace_config_path(workspace);
    if let Some(roots) = roots_from_file(&workspace_path) {
        return ResolvedConfig {
            watch_roots: roots,
            source: ConfigSource::Workspace(workspace_path),
        };
    }

    if let Some(user_path) = user_config {
        if let Some(roots) = roots_from_file(&user_path) {
            return ResolvedConfig {
                watch_roots: roots,
                source: ConfigSource::User(user_path),
            };
        }
    }

    ResolvedConfig {
        watch_roots: default_roots(),
        source: ConfigSource::Default,
    }
}

/// The default watch roots as paths.
pub fn default_roots() -> Vec<PathBuf> {
    DEFAULT_WATCH_DIRECTORIES.iter().map(PathBuf::from).collect()
}

/// Reads watch roots from one config file, logging and discarding problems.
fn roots_from_file(path: &Path) -> Option<Vec<PathBuf>> {
    match BadgerConfig::load_file(path) {
        Ok(Some(config)) => {
            let roots = normalize_roots(&config.watch_directories);
            if roots.is_empty() {
                tracing::debug!("No usable watch directories in {:?}", path);
                None
            } else {
                Some(roots)
            }
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("{}. Using defaults.", e);
            None
        }
    }
}

/// Normalizes a list of configured roots, dropping invalid entries and
/// duplicates while preserving order.
pub fn normalize_roots(raw: &[String]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut roots = Vec::new();

    for entry in raw {
        match normalize_root(entry) {
            Ok(root) => {
                if seen.insert(root.clone()) {
                    roots.push(root);
                }
            }
            Err(ConfigError::InvalidRoot(ref value)) if value.trim().is_empty() => {}
            Err(e) => tracing::warn!("{}", e),
        }
    }

    roots
}

/// Normalizes a single configured root.
///
/// Strips surrounding whitespace, `./` segments and trailing separators.
/// Rejects empty values, absolute paths and any `..` segment.
pub fn normalize_root(raw: &str) -> Result<PathBuf, ConfigError> {
    let trimmed = raw.trim();
    let mut root = PathBuf::new();

    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => root.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ConfigError::InvalidRoot(raw.to_string()));
            }
        }
    }

    if root.as_os_str().is_empty() {
        return Err(ConfigError::InvalidRoot(raw.to_string()));
    }

    Ok(root)
}
