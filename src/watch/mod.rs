//! New-test-folder notification controller.
//!
//! [`NotifyController`] keeps a single notification slot pointing at the
//! most recently created directory inside a watch root. The slot is
//! overwritten by each qualifying creation and cleared when its target, or
//! every watch root, disappears. Dismissing only hides it.
//!
//! ```text
//! Hidden --qualifying creation--> Visible
//! Visible --dismiss | target deleted | all roots gone--> Hidden
//! ```

pub mod event;
pub mod roots;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::host::Host;

pub use event::{classify_event, WatchEvent};

/// The single in-memory record of the newest qualifying directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveNotification {
    /// Absolute path of the directory.
    pub target_path: PathBuf,
    /// Path relative to the workspace root, `/`-separated.
    pub label: String,
    /// When the directory was observed.
    pub observed_at: DateTime<Utc>,
}

impl ActiveNotification {
    pub fn new(target_path: PathBuf, label: String) -> Self {
        Self {
            target_path,
            label,
            observed_at: Utc::now(),
        }
    }
}

/// Whether the notification is currently displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Hidden,
    Visible,
}

/// Owns the notification slot and drives a [`Host`].
pub struct NotifyController<H: Host> {
    workspace: PathBuf,
    roots: Vec<PathBuf>,
    active: Option<ActiveNotification>,
    visibility: Visibility,
    host: H,
}

impl<H: Host> NotifyController<H> {
    /// Creates a controller for `workspace` watching `roots`.
    ///
    /// `roots` should already be normalized (see
    /// [`crate::config::normalize_roots`]); an empty list falls back to the
    /// default roots.
    pub fn new(workspace: PathBuf, roots: Vec<PathBuf>, host: H) -> Self {
        let roots = if roots.is_empty() {
            crate::config::default_roots()
        } else {
            roots
        };

        Self {
            workspace,
            roots,
            active: None,
            visibility: Visibility::Hidden,
            host,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Replaces the watch roots, e.g. after a config reload.
    ///
    /// The current notification is kept; it is re-validated on the next
    /// deletion event.
    pub fn set_roots(&mut self, roots: Vec<PathBuf>) {
        if roots.is_empty() {
            self.roots = crate::config::default_roots();
        } else {
            self.roots = roots;
        }
    }

    pub fn active(&self) -> Option<&ActiveNotification> {
        self.active.as_ref()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// True if `path` lies strictly inside one of the watch roots.
    pub fn is_watched_test_folder(&self, path: &Path) -> bool {
        roots::is_inside_any(&self.workspace, &self.roots, path)
    }

    /// Handles a newly created path.
    ///
    /// Returns true if the notification now points at `path`.
    pub fn on_directory_created(&mut self, path: &Path) -> bool {
        match fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return false,
            Err(e) => {
                tracing::debug!("Skipping {:?}, gone before it could be handled: {}", path, e);
                return false;
            }
        }

        if !self.is_watched_test_folder(path) {
            return false;
        }

        let Some(label) = roots::relative_label(&self.workspace, path) else {
            return false;
        };

        tracing::debug!("New test folder {:?} ({})", path, label);

        let notification = ActiveNotification::new(path.to_path_buf(), label);
        self.host.show_notification(&notification);
        self.active = Some(notification);
        self.visibility = Visibility::Visible;
        true
    }

    /// Handles a removed path.
    ///
    /// Returns true if the notification was cleared.
    pub fn on_directory_deleted(&mut self, path: &Path) -> bool {
        let Some(active) = &self.active else {
            return false;
        };

        // Event order is not trusted: re-check the target itself as well.
        if active.target_path == path || !active.target_path.is_dir() {
            tracing::debug!("Test folder {:?} removed", active.target_path);
            self.clear();
            return true;
        }

        if !roots::any_root_exists(&self.workspace, &self.roots) {
            tracing::debug!("No watch root left under {:?}", self.workspace);
            self.clear();
            return true;
        }

        false
    }

    /// Reveals the stored target. Safe to call with nothing stored or after
    /// the target is gone.
    ///
    /// Returns the path handed to the host, if any.
    pub fn open_target(&mut self) -> Option<PathBuf> {
        let target = self.active.as_ref()?.target_path.clone();
        self.host.reveal(&target);
        Some(target)
    }

    /// Hides the notification but keeps the stored target.
    pub fn dismiss(&mut self) {
        if self.visibility == Visibility::Hidden {
            return;
        }
        self.visibility = Visibility::Hidden;
        self.host.hide_notification();
    }

    fn clear(&mut self) {
        self.active = None;
        self.visibility = Visibility::Hidden;
        self.host.hide_notification();
    }
}
