//! Watch-root containment.
//!
//! A root such as `tests` matches any directory in the workspace whose
//! workspace-relative path ends with the root's components, at any depth.
//! A path is inside the root when it is a strict descendant of such a
//! directory. Matching is done component by component, so `attested` or
//! `tests-old` never match `tests`.

use std::path::{Component, Path, PathBuf};

use crate::config::SKIPPED_DIRS;

/// Returns the first root that strictly contains `path`, if any.
pub fn containing_root<'a>(workspace: &Path, roots: &'a [PathBuf], path: &Path) -> Option<&'a Path> {
    let relative = path.strip_prefix(workspace).ok()?;
    if !is_descendant(relative) {
        return None;
    }

    // `ancestors()` starts with `relative` itself and ends with "".
    for ancestor in relative.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        for root in roots {
            if !ancestor.ends_with(root) {
                continue;
            }
            if let Ok(inner) = relative.strip_prefix(ancestor) {
                if is_descendant(inner) {
                    return Some(root.as_path());
                }
            }
        }
    }

    None
}

/// True if `path` lies strictly inside one of `roots`.
pub fn is_inside_any(workspace: &Path, roots: &[PathBuf], path: &Path) -> bool {
    containing_root(workspace, roots, path).is_some()
}

/// A relative path is a descendant when it is non-empty, not absolute and
/// made only of normal segments (so it cannot start with `..`).
fn is_descendant(relative: &Path) -> bool {
    !relative.as_os_str().is_empty()
        && !relative.is_absolute()
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

/// Workspace-relative display label for `path`, using `/` separators.
///
/// Returns `None` if `path` is not inside the workspace.
pub fn relative_label(workspace: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(workspace).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// True if at least one root exists as a directory anywhere under the
/// workspace.
///
/// `workspace/<root>` is checked first. Otherwise the workspace is walked
/// without following symlinks, pruning [`SKIPPED_DIRS`] before descent, and
/// the walk stops at the first directory whose relative path ends with a
/// root.
pub fn any_root_exists(workspace: &Path, roots: &[PathBuf]) -> bool {
    if roots.iter().any(|root| workspace.join(root).is_dir()) {
        return true;
    }

    let walker = ignore::WalkBuilder::new(workspace)
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name))
        })
        .build();

    walker
        .filter_map(|result| match result {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.depth() > 0 && entry.file_type().is_some_and(|ft| ft.is_dir()))
        .any(|entry| {
            entry
                .path()
                .strip_prefix(workspace)
                .is_ok_and(|relative| roots.iter().any(|root| relative.ends_with(root)))
        })
}
