//! Pass/fail badges for test output directories.
//!
//! An external test runner drops a zero-byte `.pass` or `.fail` marker
//! directly inside a result directory. [`decorate`] turns the presence of
//! those markers into a [`Badge`]; [`DecorationProvider`] additionally
//! publishes refresh events whenever a marker appears, disappears or is
//! touched, scoped to the directory whose badge changed.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

pub mod tree;

pub use tree::{decorated_dirs, DecoratedDir};

/// Marker file signalling a passed test run.
pub const PASS_MARKER: &str = ".pass";

/// Marker file signalling a failed test run. Takes precedence over `.pass`.
pub const FAIL_MARKER: &str = ".fail";

/// Capacity of the refresh broadcast channel.
const REFRESH_CHANNEL_CAPACITY: usize = 64;

/// Test outcome shown by a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
}

/// How prominently a badge should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    /// Default styling.
    Normal,
    /// Error color.
    Error,
}

/// A badge descriptor for one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub outcome: Outcome,
    /// Single-character badge text.
    pub symbol: &'static str,
    /// Tooltip text.
    pub label: &'static str,
    pub emphasis: Emphasis,
}

impl Badge {
    /// The badge for a directory containing `.fail`.
    pub const fn failed() -> Self {
        Self {
            outcome: Outcome::Failed,
            symbol: "×",
            label: "FAILED",
            emphasis: Emphasis::Error,
        }
    }

    /// The badge for a directory containing `.pass` and no `.fail`.
    pub const fn passed() -> Self {
        Self {
            outcome: Outcome::Passed,
            symbol: "+",
            label: "PASSED",
            emphasis: Emphasis::Normal,
        }
    }
}

/// Computes the badge for `path`.
///
/// Returns `None` when the path cannot be stat'ed, is not a directory, or
/// holds no marker. Filesystem errors are swallowed. Nothing is cached; every
/// call re-reads the filesystem.
pub fn decorate(path: &Path) -> Option<Badge> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!("Cannot stat {:?} for decoration: {}", path, e);
            return None;
        }
    };

    if !metadata.is_dir() {
        return None;
    }

    if marker_exists(path, FAIL_MARKER) {
        return Some(Badge::failed());
    }

    if marker_exists(path, PASS_MARKER) {
        return Some(Badge::passed());
    }

    None
}

fn marker_exists(dir: &Path, marker: &str) -> bool {
    dir.join(marker).try_exists().unwrap_or(false)
}

/// Returns true if `path` names a `.pass` or `.fail` marker file.
pub fn is_marker(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name == PASS_MARKER || name == FAIL_MARKER)
}

/// Request to recompute the badges of the listed directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshEvent {
    pub paths: Vec<PathBuf>,
}

/// Badge provider with a push-based change channel.
///
/// Consumers call [`DecorationProvider::subscribe`] and re-invoke
/// [`DecorationProvider::decorate`] for every path in each received
/// [`RefreshEvent`]. The provider never scans the tree on its own.
pub struct DecorationProvider {
    refresh_tx: broadcast::Sender<RefreshEvent>,
}

impl DecorationProvider {
    pub fn new() -> Self {
        let (refresh_tx, _) = broadcast::channel(REFRESH_CHANNEL_CAPACITY);
        Self { refresh_tx }
    }

    /// Subscribes to refresh events.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.refresh_tx.subscribe()
    }

    /// See [`decorate`].
    pub fn decorate(&self, path: &Path) -> Option<Badge> {
        decorate(path)
    }

    /// Reports that a marker file was created, deleted or modified.
    ///
    /// Emits one refresh event scoped to the marker's parent directory and
    /// returns it. Paths that are not markers are ignored.
    pub fn marker_changed(&self, marker_path: &Path) -> Option<RefreshEvent> {
        if !is_marker(marker_path) {
            return None;
        }

        let parent = marker_path.parent()?;
        let event = RefreshEvent {
            paths: vec![parent.to_path_buf()],
        };

        tracing::debug!("Marker {:?} changed, refreshing {:?}", marker_path, parent);

        // Sending only fails when nobody is subscribed.
        let _ = self.refresh_tx.send(event.clone());

        Some(event)
    }
}

impl Default for DecorationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_decorate_no_markers() {
        let dir = tempdir().expect("Failed to create temp directory");
        assert_eq!(decorate(dir.path()), None);
    }

    #[test]
    fn test_decorate_pass_marker() {
        let dir = tempdir().expect("Failed to create temp directory");
        fs::write(dir.path().join(PASS_MARKER), "").expect("Failed to write marker");

        let badge = decorate(dir.path()).expect("Expected a badge");
        assert_eq!(badge, Badge::passed());
        assert_eq!(badge.symbol, "+");
        assert_eq!(badge.label, "PASSED");
        assert_eq!(badge.emphasis, Emphasis::Normal);
    }

    #[test]
    fn test_decorate_fail_marker() {
        let dir = tempdir().expect("Failed to create temp directory");
        fs::write(dir.path().join(FAIL_MARKER), "").expect("Failed to write marker");

        let badge = decorate(dir.path()).expect("Expected a badge");
        assert_eq!(badge.outcome, Outcome::Failed);
        assert_eq!(badge.symbol, "×");
        assert_eq!(badge.label, "FAILED");
        assert_eq!(badge.emphasis, Emphasis::Error);
    }

    #[test]
    fn test_decorate_fail_takes_precedence() {
        let dir = tempdir().expect("Failed to create temp directory");
        fs::write(dir.path().join(PASS_MARKER), "").expect("Failed to write marker");
        fs::write(dir.path().join(FAIL_MARKER), "").expect("Failed to write marker");

        assert_eq!(decorate(dir.path()), Some(Badge::failed()));
    }

    #[test]
    fn test_decorate_file_is_not_decorated() {
        let dir = tempdir().expect("Failed to create temp directory");
        let file = dir.path().join("report.txt");
        fs::write(&file, "ok").expect("Failed to write file");

        assert_eq!(decorate(&file), None);
    }

    #[test]
    fn test_decorate_missing_path() {
        let dir = tempdir().expect("Failed to create temp directory");
        assert_eq!(decorate(&dir.path().join("gone")), None);
    }

    #[test]
    fn test_decorate_markers_only_count_directly_inside() {
        let dir = tempdir().expect("Failed to create temp directory");
        let nested = dir.path().join("child");
        fs::create_dir(&nested).expect("Failed to create dir");
        fs::write(nested.join(FAIL_MARKER), "").expect("Failed to write marker");

        assert_eq!(decorate(dir.path()), None);
        assert_eq!(decorate(&nested), Some(Badge::failed()));
    }

    #[test]
    fn test_is_marker() {
        assert!(is_marker(Path::new("/ws/tests/run1/.pass")));
        assert!(is_marker(Path::new("/ws/tests/run1/.fail")));
        assert!(!is_marker(Path::new("/ws/tests/run1/.passed")));
        assert!(!is_marker(Path::new("/ws/tests/run1")));
    }

    #[test]
    fn test_marker_change_refreshes_parent_once() {
        let provider = DecorationProvider::new();
        let mut rx = provider.subscribe();

        let event = provider
            .marker_changed(Path::new("/ws/tests/A/.fail"))
            .expect("Marker change should emit");
        assert_eq!(event.paths, vec![PathBuf::from("/ws/tests/A")]);

        let received = rx.try_recv().expect("Subscriber should see the event");
        assert_eq!(received, event);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_non_marker_change_is_ignored() {
        let provider = DecorationProvider::new();
        let mut rx = provider.subscribe();

        assert!(provider.marker_changed(Path::new("/ws/tests/A/log.txt")).is_none());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_marker_change_without_subscribers() {
        let provider = DecorationProvider::default();
        assert!(provider.marker_changed(Path::new("/ws/A/.pass")).is_some());
    }
}
