//! Integration tests for Badger
//!
//! The first half exercises the library the CLI and daemon are built on,
//! using temporary workspaces for isolation. The second half runs the
//! `badger` binary for commands that do not need a daemon.

use assert_cmd::Command;
use badger_cli::config::{self, ConfigSource};
use badger_cli::decoration::{decorate, decorated_dirs, Badge, DecorationProvider};
use badger_cli::host::Host;
use badger_cli::watch::{classify_event, ActiveNotification, NotifyController, Visibility, WatchEvent};
use notify::event::{CreateKind, EventKind, RemoveKind};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

// =============================================================================
// Test Helpers
// =============================================================================

/// Host that records every call for later assertions.
#[derive(Default)]
struct RecordingHost {
    shown: Vec<String>,
    hidden: usize,
    revealed: Vec<PathBuf>,
}

impl Host for RecordingHost {
    fn show_notification(&mut self, notification: &ActiveNotification) {
        self.shown.push(notification.label.clone());
    }

    fn hide_notification(&mut self) {
        self.hidden += 1;
    }

    fn reveal(&mut self, path: &Path) {
        if path.is_dir() {
            self.revealed.push(path.to_path_buf());
        }
    }

    fn refresh_badges(&mut self, _paths: &[PathBuf]) {}
}

/// Creates a workspace with an empty `tests/` folder.
fn create_workspace() -> TempDir {
    let dir = tempdir().expect("Failed to create temp directory");
    fs::create_dir(dir.path().join("tests")).expect("Failed to create tests dir");
    dir
}

fn mkdir(path: &Path) -> PathBuf {
    fs::create_dir_all(path).expect("Failed to create directory");
    path.to_path_buf()
}

fn touch(path: &Path) {
    fs::write(path, "").expect("Failed to write marker");
}

fn badger(workspace: &Path) -> Command {
    let mut cmd = Command::cargo_bin("badger").expect("Binary should be built");
    cmd.arg("--workspace")
        .arg(workspace)
        .env_remove(config::WATCH_DIRECTORIES_ENV)
        .env("HOME", workspace)
        .env("NO_COLOR", "1");
    cmd
}

// =============================================================================
// Decoration Tests
// =============================================================================

mod decoration_tests {
    use super::*;

    #[test]
    fn test_badge_follows_marker_lifecycle() {
        let ws = create_workspace();
        let run = mkdir(&ws.path().join("tests/run1"));

        assert_eq!(decorate(&run), None);

        touch(&run.join(".pass"));
        assert_eq!(decorate(&run), Some(Badge::passed()));

        touch(&run.join(".fail"));
        assert_eq!(decorate(&run), Some(Badge::failed()));

        fs::remove_file(run.join(".fail")).expect("Failed to remove marker");
        assert_eq!(decorate(&run), Some(Badge::passed()));
    }

    #[test]
    fn test_marker_event_refreshes_parent_only() {
        let provider = DecorationProvider::new();
        let mut rx = provider.subscribe();

        let marker = Path::new("/ws/tests/run1/.fail");
        let event = notify::Event::new(EventKind::Create(CreateKind::File)).add_path(marker.into());

        for classified in classify_event(Path::new("/ws"), &event) {
            if let WatchEvent::MarkerChanged(path) = classified {
                provider.marker_changed(&path);
            }
        }

        let refresh = rx.try_recv().expect("Refresh should be delivered");
        assert_eq!(refresh.paths, vec![PathBuf::from("/ws/tests/run1")]);
        assert!(rx.try_recv().is_err(), "Exactly one refresh expected");
    }

    #[test]
    fn test_decorated_dirs_reports_nested_runs() {
        let ws = create_workspace();
        let passed = mkdir(&ws.path().join("tests/unit/run1"));
        let failed = mkdir(&ws.path().join("tests/e2e/run7"));
        touch(&passed.join(".pass"));
        touch(&failed.join(".fail"));

        let found = decorated_dirs(ws.path());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, failed);
        assert_eq!(found[0].badge, Badge::failed());
        assert_eq!(found[1].path, passed);
        assert_eq!(found[1].badge, Badge::passed());
    }
}

// =============================================================================
// Notification Tests
// =============================================================================

mod notification_tests {
    use super::*;

    fn controller(workspace: &Path, roots: &[&str]) -> NotifyController<RecordingHost> {
        NotifyController::new(
            workspace.to_path_buf(),
            roots.iter().map(PathBuf::from).collect(),
            RecordingHost::default(),
        )
    }

    #[test]
    fn test_newest_folder_wins() {
        let ws = create_workspace();
        let mut ctl = controller(ws.path(), &["tests"]);

        let first = mkdir(&ws.path().join("tests/a"));
        let second = mkdir(&ws.path().join("tests/b"));
        assert!(ctl.on_directory_created(&first));
        assert!(ctl.on_directory_created(&second));

        let active = ctl.active().expect("Notification expected");
        assert_eq!(active.target_path, second);
        assert_eq!(active.label, "tests/b");
        assert_eq!(ctl.host().shown, vec!["tests/a", "tests/b"]);
    }

    #[test]
    fn test_dismiss_then_open_still_reveals() {
        let ws = create_workspace();
        let mut ctl = controller(ws.path(), &["tests"]);
        let run = mkdir(&ws.path().join("tests/run1"));
        ctl.on_directory_created(&run);

        ctl.dismiss();
        assert_eq!(ctl.visibility(), Visibility::Hidden);

        assert_eq!(ctl.open_target(), Some(run.clone()));
        assert_eq!(ctl.host().revealed, vec![run]);
    }

    #[test]
    fn test_deleting_target_clears_notification() {
        let ws = create_workspace();
        let mut ctl = controller(ws.path(), &["tests"]);
        let run = mkdir(&ws.path().join("tests/run1"));
        ctl.on_directory_created(&run);

        fs::remove_dir(&run).expect("Failed to remove run");
        assert!(ctl.on_directory_deleted(&run));
        assert!(ctl.active().is_none());

        // Opening afterwards is a no-op.
        assert_eq!(ctl.open_target(), None);
        assert!(ctl.host().revealed.is_empty());
    }

    #[test]
    fn test_deleting_whole_root_clears_notification() {
        let ws = create_workspace();
        let mut ctl = controller(ws.path(), &["tests"]);
        let run = mkdir(&ws.path().join("tests/run1"));
        ctl.on_directory_created(&run);

        let tests = ws.path().join("tests");
        fs::remove_dir_all(&tests).expect("Failed to remove tests");
        assert!(ctl.on_directory_deleted(&tests));
        assert_eq!(ctl.visibility(), Visibility::Hidden);
    }

    #[test]
    fn test_unrelated_deletion_keeps_notification() {
        let ws = create_workspace();
        let mut ctl = controller(ws.path(), &["tests"]);
        let run = mkdir(&ws.path().join("tests/run1"));
        let other = mkdir(&ws.path().join("tests/run0"));
        ctl.on_directory_created(&run);

        fs::remove_dir(&other).expect("Failed to remove run0");
        assert!(!ctl.on_directory_deleted(&other));
        assert_eq!(ctl.visibility(), Visibility::Visible);
    }

    #[test]
    fn test_configured_roots_match_at_any_depth() {
        let ws = create_workspace();
        let mut ctl = controller(ws.path(), &["results"]);

        let outside = mkdir(&ws.path().join("tests/run1"));
        assert!(!ctl.on_directory_created(&outside));

        let nested = mkdir(&ws.path().join("pkg/results/run1"));
        assert!(ctl.on_directory_created(&nested));
        assert_eq!(ctl.active().map(|a| a.label.as_str()), Some("pkg/results/run1"));
    }

    #[test]
    fn test_similar_names_do_not_match() {
        let ws = create_workspace();
        let mut ctl = controller(ws.path(), &["tests"]);

        let attested = mkdir(&ws.path().join("attested/run1"));
        let old = mkdir(&ws.path().join("tests-old/run1"));
        assert!(!ctl.on_directory_created(&attested));
        assert!(!ctl.on_directory_created(&old));
        assert!(ctl.active().is_none());
    }

    #[test]
    fn test_remove_event_classification_feeds_controller() {
        let ws = create_workspace();
        let mut ctl = controller(ws.path(), &["tests"]);
        let run = mkdir(&ws.path().join("tests/run1"));
        ctl.on_directory_created(&run);
        fs::remove_dir(&run).expect("Failed to remove run");

        let event = notify::Event::new(EventKind::Remove(RemoveKind::Folder)).add_path(run.clone());
        for classified in classify_event(ws.path(), &event) {
            if let WatchEvent::Removed(path) = classified {
                ctl.on_directory_deleted(&path);
            }
        }

        assert!(ctl.active().is_none());
        assert_eq!(ctl.host().hidden, 1);
    }
}

// =============================================================================
// Config Tests
// =============================================================================

mod config_tests {
    use super::*;

    #[test]
    fn test_workspace_file_overrides_user_file() {
        let ws = create_workspace();
        let home = tempdir().expect("Failed to create temp directory");

        let user_file = home.path().join("config.yaml");
        fs::write(&user_file, "watch_directories:\n  - from-user\n").expect("Failed to write");

        let ws_file = config::workspace_config_path(ws.path());
        mkdir(ws_file.parent().expect("Config path has a parent"));
        fs::write(&ws_file, "watch_directories:\n  - results\n  - ./out/\n")
            .expect("Failed to write");

        let resolved = config::resolve_with(ws.path(), None, Some(user_file));
        assert_eq!(
            resolved.watch_roots,
            vec![PathBuf::from("results"), PathBuf::from("out")]
        );
        assert_eq!(resolved.source, ConfigSource::Workspace(ws_file));
    }

    #[test]
    fn test_broken_config_falls_back_to_default() {
        let ws = create_workspace();
        let ws_file = config::workspace_config_path(ws.path());
        mkdir(ws_file.parent().expect("Config path has a parent"));
        fs::write(&ws_file, "watch_directories: [unterminated").expect("Failed to write");

        let resolved = config::resolve_with(ws.path(), None, None);
        assert_eq!(resolved.watch_roots, vec![PathBuf::from("tests")]);
        assert_eq!(resolved.source, ConfigSource::Default);
    }
}

// =============================================================================
// Binary Tests
// =============================================================================

mod binary_tests {
    use super::*;

    #[test]
    fn test_badge_command_prints_badges() {
        let ws = create_workspace();
        let failed = mkdir(&ws.path().join("tests/run1"));
        mkdir(&ws.path().join("tests/run2"));
        touch(&failed.join(".pass"));
        touch(&failed.join(".fail"));

        badger(ws.path())
            .args(["badge", "tests/run1", "tests/run2"])
            .assert()
            .success()
            .stdout(predicate::str::contains("×  FAILED  tests/run1"))
            .stdout(predicate::str::contains("no badge  tests/run2"));
    }

    #[test]
    fn test_tree_command_json() {
        let ws = create_workspace();
        let run = mkdir(&ws.path().join("tests/run1"));
        touch(&run.join(".pass"));

        let output = badger(ws.path())
            .args(["tree", "--format", "json"])
            .output()
            .expect("Failed to run badger");
        assert!(output.status.success());

        let parsed: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("Output should be JSON");
        let entries = parsed.as_array().expect("Expected an array");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["badge"]["label"], "PASSED");
        assert_eq!(entries[0]["badge"]["outcome"], "passed");
    }

    #[test]
    fn test_config_command_shows_env_roots() {
        let ws = create_workspace();

        badger(ws.path())
            .env(config::WATCH_DIRECTORIES_ENV, "results, out")
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("$BADGER_WATCH_DIRECTORIES"))
            .stdout(predicate::str::contains("results"))
            .stdout(predicate::str::contains("out"));
    }

    #[test]
    fn test_config_command_default_roots() {
        let ws = create_workspace();

        badger(ws.path())
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("built-in default"))
            .stdout(predicate::str::contains("tests"));
    }

    #[test]
    fn test_latest_without_daemon() {
        let ws = create_workspace();

        badger(ws.path())
            .arg("latest")
            .assert()
            .success()
            .stdout(predicate::str::contains("Daemon is not running"));

        assert!(!ws.path().join(".badger").exists());
    }

    #[test]
    fn test_open_and_dismiss_without_daemon_leave_workspace_untouched() {
        let ws = create_workspace();

        for command in ["open", "dismiss"] {
            badger(ws.path())
                .arg(command)
                .assert()
                .success()
                .stdout(predicate::str::contains("Daemon is not running"));
        }

        assert!(!ws.path().join(".badger").exists());
    }

    #[test]
    fn test_daemon_status_rejects_missing_workspace() {
        let ws = create_workspace();
        let missing = ws.path().join("missing");

        badger(&missing)
            .args(["daemon", "status"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("is not a directory"));
    }
}
