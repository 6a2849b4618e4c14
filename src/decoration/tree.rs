//! Workspace scan for decorated folders.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{decorate, Badge};
use crate::config::SKIPPED_DIRS;

/// A folder carrying a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecoratedDir {
    pub path: PathBuf,
    pub badge: Badge,
}

/// Walks `root` and returns every decorated folder, sorted by path.
///
/// Ignore files are deliberately not honored: test output folders are
/// usually git-ignored. Unreadable entries are skipped.
pub fn decorated_dirs(root: &Path) -> Vec<DecoratedDir> {
    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name))
        })
        .build();

    let mut found = Vec::new();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
            continue;
        }

        if let Some(badge) = decorate(entry.path()) {
            found.push(DecoratedDir {
                path: entry.path().to_path_buf(),
                badge,
            });
        }
    }

    found.sort_by(|a, b| a.path.cmp(&b.path));
    found
}
