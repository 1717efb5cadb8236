use std::fs;

use seedbed_backup::{BackupKind, BackupManager};
use seedbed_core::WorkspaceLayout;
use serde_json::json;

use crate::{CheckpointStatus, StateTracker};

fn test_layout() -> WorkspaceLayout {
    let mut path = std::env::temp_dir();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    path.push(format!(
        "seedbed-state-tests-{}-{}",
        std::process::id(),
        nanos
    ));
    WorkspaceLayout::new(path)
}

#[test]
fn checkpoint_round_trip() {
    let layout = test_layout();
    let tracker = StateTracker::new(layout.clone());

    let id = tracker
        .create_checkpoint("memory-setup", json!({"step": 3}))
        .expect("must create checkpoint");

    let checkpoint = tracker
        .checkpoint(&id)
        .expect("must read checkpoint")
        .expect("checkpoint must exist");
    assert_eq!(checkpoint.phase, "memory-setup");
    assert_eq!(checkpoint.status, CheckpointStatus::Pending);
    assert_eq!(checkpoint.data["step"], 3);

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn update_checkpoint_merges_patch_and_sets_status() {
    let layout = test_layout();
    let tracker = StateTracker::new(layout.clone());

    let id = tracker
        .create_checkpoint("mode-scaffold", json!({"files": 2}))
        .expect("must create checkpoint");
    tracker
        .update_checkpoint(
            &id,
            Some(CheckpointStatus::Committed),
            Some(json!({"finished": true})),
        )
        .expect("must update checkpoint");

    let checkpoint = tracker
        .checkpoint(&id)
        .expect("must read checkpoint")
        .expect("checkpoint must exist");
    assert_eq!(checkpoint.status, CheckpointStatus::Committed);
    assert_eq!(checkpoint.data["files"], 2);
    assert_eq!(checkpoint.data["finished"], true);

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn update_unknown_checkpoint_fails() {
    let layout = test_layout();
    let tracker = StateTracker::new(layout.clone());

    let err = tracker
        .update_checkpoint("cp-missing", Some(CheckpointStatus::Committed), None)
        .expect_err("must reject unknown checkpoint");
    assert!(err.to_string().contains("checkpoint not found"));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn latest_checkpoint_for_phase_picks_the_most_recent() {
    let layout = test_layout();
    let tracker = StateTracker::new(layout.clone());

    tracker
        .create_checkpoint("memory-setup", json!({}))
        .expect("must create first");
    let second = tracker
        .create_checkpoint("memory-setup", json!({}))
        .expect("must create second");
    tracker
        .create_checkpoint("wrapper-creation", json!({}))
        .expect("must create other phase");

    let latest = tracker
        .latest_checkpoint_for_phase("memory-setup")
        .expect("must read")
        .expect("must exist");
    assert_eq!(latest.id, second);

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn rollback_point_requires_an_existing_backup() {
    let layout = test_layout();
    fs::create_dir_all(layout.project_root()).expect("must create project root");
    let tracker = StateTracker::new(layout.clone());

    let err = tracker
        .record_rollback_point(BackupKind::PreInit, "no-such-backup", json!({}))
        .expect_err("must reject missing backup");
    assert!(err.to_string().contains("missing backup"));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn rollback_points_are_append_only_history() {
    let layout = test_layout();
    fs::create_dir_all(layout.project_root()).expect("must create project root");
    let manager = BackupManager::new(layout.clone());
    let tracker = StateTracker::new(layout.clone());

    let first = manager
        .create_backup(BackupKind::PreInit, None)
        .expect("must create backup")
        .id;
    let second = manager
        .create_backup(BackupKind::PreInit, None)
        .expect("must create backup")
        .id;

    tracker
        .record_rollback_point(BackupKind::PreInit, &first, json!({}))
        .expect("must record first point");
    tracker
        .record_rollback_point(BackupKind::PreInit, &second, json!({}))
        .expect("must record second point");

    let points = tracker.rollback_points().expect("must read points");
    assert_eq!(points.len(), 2);

    let latest = tracker
        .latest_rollback_point(BackupKind::PreInit)
        .expect("must read latest")
        .expect("latest must exist");
    assert_eq!(latest.backup_id, second);
    assert!(tracker
        .latest_rollback_point(BackupKind::PreRollback)
        .expect("must read")
        .is_none());

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn validate_state_tracking_reports_corrupt_log() {
    let layout = test_layout();
    layout.ensure_state_dirs().expect("must create state dirs");
    fs::write(layout.checkpoints_path(), "not json").expect("must corrupt checkpoint log");

    let tracker = StateTracker::new(layout.clone());
    let report = tracker.validate_state_tracking();
    assert!(!report.success);
    assert!(report
        .errors
        .iter()
        .any(|error| error.contains("checkpoint log is unreadable")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn validate_state_tracking_passes_on_fresh_tree() {
    let layout = test_layout();
    let tracker = StateTracker::new(layout.clone());

    let report = tracker.validate_state_tracking();
    assert!(report.success, "unexpected errors: {:?}", report.errors);

    let _ = fs::remove_dir_all(layout.project_root());
}
