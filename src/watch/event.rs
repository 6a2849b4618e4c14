//! Classification of raw notify events.
//!
//! The OS watcher reports low-level create/remove/modify events. Badger only
//! cares about three things: a marker file changing, a path appearing, and a
//! path disappearing.

use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;
use std::path::{Path, PathBuf};

use crate::config::STATE_DIR_NAME;
use crate::decoration::is_marker;

/// Path components whose subtrees never produce events.
const IGNORED_COMPONENTS: &[&str] = &[".git", "node_modules", STATE_DIR_NAME];

/// Filesystem events after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A `.pass` or `.fail` marker was created, deleted or modified.
    MarkerChanged(PathBuf),
    /// A path appeared (created, or renamed into place).
    Created(PathBuf),
    /// A path disappeared (deleted, or renamed away).
    Removed(PathBuf),
}

/// Classifies a raw notify event into zero or more [`WatchEvent`]s.
///
/// Renames count as a removal of the old path and a creation of the new
/// one. Access and metadata-only events are dropped. A marker counts as
/// changed when it is created, removed, renamed or written; `touch` on a new
/// marker therefore yields one change, not two.
///
/// Paths under `.git`, `node_modules` or `.badger` inside `workspace` are
/// ignored. Only the part of the path below `workspace` is inspected.
pub fn classify_event(workspace: &Path, event: &notify::Event) -> Vec<WatchEvent> {
    let mut classified = Vec::new();

    for (index, path) in event.paths.iter().enumerate() {
        if is_ignored(workspace, path) {
            continue;
        }

        if is_marker(path) {
            if changes_marker(&event.kind) {
                classified.push(WatchEvent::MarkerChanged(path.clone()));
            }
            continue;
        }

        let watch_event = match event.kind {
            EventKind::Create(_) => WatchEvent::Created(path.clone()),
            EventKind::Remove(_) => WatchEvent::Removed(path.clone()),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                WatchEvent::Removed(path.clone())
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                WatchEvent::Created(path.clone())
            }
            // Both: paths are [from, to].
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if index == 0 {
                    WatchEvent::Removed(path.clone())
                } else {
                    WatchEvent::Created(path.clone())
                }
            }
            EventKind::Modify(ModifyKind::Name(_)) => {
                if path.exists() {
                    WatchEvent::Created(path.clone())
                } else {
                    WatchEvent::Removed(path.clone())
                }
            }
            _ => continue,
        };

        classified.push(watch_event);
    }

    classified
}

fn changes_marker(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Remove(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Modify(ModifyKind::Any)
    )
}

fn is_ignored(workspace: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(workspace).unwrap_or(path);
    relative.components().any(|component| {
        IGNORED_COMPONENTS
            .iter()
            .any(|ignored| component.as_os_str() == *ignored)
    })
}
