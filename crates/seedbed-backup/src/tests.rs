use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use seedbed_core::WorkspaceLayout;
use seedbed_integrity::sha256_hex;

use crate::{BackupKind, BackupManager};

fn test_layout() -> WorkspaceLayout {
    let mut path = std::env::temp_dir();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    path.push(format!(
        "seedbed-backup-tests-{}-{}",
        std::process::id(),
        nanos
    ));
    WorkspaceLayout::new(path)
}

fn seed_workspace(layout: &WorkspaceLayout) {
    fs::create_dir_all(layout.project_root()).expect("must create project root");
    fs::write(layout.playbook_path(), "# Project Playbook\n").expect("must write playbook");
    fs::write(layout.mode_config_path(), "{\"version\":\"1.0.0\",\"modes\":[]}")
        .expect("must write mode config");
    fs::create_dir_all(layout.commands_dir()).expect("must create commands dir");
    fs::write(layout.command_file_path("build"), "# build\n").expect("must write command file");
    fs::create_dir_all(layout.memory_agents_dir()).expect("must create memory tree");
    fs::write(layout.memory_store_path(), "{\"version\":1}").expect("must write memory store");
}

#[test]
fn create_backup_records_checksummed_content() {
    let layout = test_layout();
    seed_workspace(&layout);
    let manager = BackupManager::new(layout.clone());

    let created = manager
        .create_backup(BackupKind::PreInit, Some("before init"))
        .expect("must create backup");
    assert!(created.file_count >= 4);

    let manifest = manager
        .find_backup(&created.id)
        .expect("must read manifest")
        .expect("manifest must exist");
    assert_eq!(manifest.id, created.id);
    assert_eq!(manifest.metadata.kind, BackupKind::PreInit);
    assert_eq!(manifest.metadata.description.as_deref(), Some("before init"));
    assert!(!manifest.files.is_empty());
    for record in &manifest.files {
        assert_eq!(record.checksum, sha256_hex(record.content.as_bytes()));
    }
    assert!(manifest
        .files
        .iter()
        .any(|record| record.path == "commands/build.md"));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn create_backup_skips_missing_targets() {
    let layout = test_layout();
    fs::create_dir_all(layout.project_root()).expect("must create project root");
    let manager = BackupManager::new(layout.clone());

    let created = manager
        .create_backup(BackupKind::Manual, None)
        .expect("must create empty backup");
    assert_eq!(created.file_count, 0);

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn create_backup_writes_mirror_copies() {
    let layout = test_layout();
    seed_workspace(&layout);
    let manager = BackupManager::new(layout.clone());

    let created = manager
        .create_backup(BackupKind::PreInit, None)
        .expect("must create backup");
    let mirror = layout
        .backup_files_dir(&created.id)
        .join("commands")
        .join("build.md");
    assert!(mirror.is_file());
    assert_eq!(
        fs::read_to_string(mirror).expect("must read mirror"),
        "# build\n"
    );

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn find_backup_returns_none_when_absent() {
    let layout = test_layout();
    fs::create_dir_all(layout.project_root()).expect("must create project root");
    let manager = BackupManager::new(layout.clone());

    let found = manager.find_backup("no-such-id").expect("must not error");
    assert!(found.is_none());

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn list_backups_skips_unparsable_manifest_with_warning() {
    let layout = test_layout();
    seed_workspace(&layout);
    let manager = BackupManager::new(layout.clone());

    manager
        .create_backup(BackupKind::PreInit, None)
        .expect("must create good backup");

    let broken_dir = layout.backup_dir("broken-backup");
    fs::create_dir_all(&broken_dir).expect("must create broken backup dir");
    fs::write(broken_dir.join("backup.json"), "not json").expect("must write broken manifest");

    let bare_dir = layout.backup_dir("bare-backup");
    fs::create_dir_all(&bare_dir).expect("must create bare backup dir");

    let listing = manager.list_backups().expect("listing must not abort");
    assert_eq!(listing.backups.len(), 1);
    assert_eq!(listing.warnings.len(), 2);
    assert!(listing
        .warnings
        .iter()
        .any(|warning| warning.contains("broken-backup")));
    assert!(listing
        .warnings
        .iter()
        .any(|warning| warning.contains("bare-backup")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn cleanup_keeps_the_newest_backups() {
    let layout = test_layout();
    seed_workspace(&layout);
    let manager = BackupManager::new(layout.clone());

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(
            manager
                .create_backup(BackupKind::Manual, None)
                .expect("must create backup")
                .id,
        );
    }

    let outcome = manager
        .cleanup_old_backups(2, &BTreeSet::new())
        .expect("must clean up");
    assert_eq!(outcome.removed.len(), 3);
    assert_eq!(outcome.kept.len(), 2);
    assert!(outcome.kept.contains(&ids[3]));
    assert!(outcome.kept.contains(&ids[4]));

    let remaining = manager.list_backups().expect("must list");
    assert_eq!(remaining.backups.len(), 2);

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn cleanup_with_larger_keep_count_removes_nothing() {
    let layout = test_layout();
    seed_workspace(&layout);
    let manager = BackupManager::new(layout.clone());

    for _ in 0..2 {
        manager
            .create_backup(BackupKind::Manual, None)
            .expect("must create backup");
    }

    let outcome = manager
        .cleanup_old_backups(10, &BTreeSet::new())
        .expect("must clean up");
    assert!(outcome.removed.is_empty());
    assert_eq!(outcome.kept.len(), 2);

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn cleanup_never_removes_protected_backups() {
    let layout = test_layout();
    seed_workspace(&layout);
    let manager = BackupManager::new(layout.clone());

    let oldest = manager
        .create_backup(BackupKind::PreInit, None)
        .expect("must create backup")
        .id;
    for _ in 0..3 {
        manager
            .create_backup(BackupKind::Manual, None)
            .expect("must create backup");
    }

    let protected: BTreeSet<String> = [oldest.clone()].into_iter().collect();
    let outcome = manager
        .cleanup_old_backups(1, &protected)
        .expect("must clean up");
    assert!(outcome.kept.contains(&oldest));
    assert!(manager
        .find_backup(&oldest)
        .expect("must read")
        .is_some());

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn delete_backup_reports_absence() {
    let layout = test_layout();
    fs::create_dir_all(layout.project_root()).expect("must create project root");
    let manager = BackupManager::new(layout.clone());

    assert!(!manager.delete_backup("missing").expect("must not error"));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn validate_backup_system_passes_on_writable_root() {
    let layout = test_layout();
    fs::create_dir_all(layout.project_root()).expect("must create project root");
    let manager = BackupManager::new(layout.clone());

    let report = manager.validate_backup_system();
    assert!(report.success, "unexpected errors: {:?}", report.errors);
    assert!(!layout.backups_dir().join(".write-probe").exists());

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn backup_ids_sort_chronologically() {
    let layout = test_layout();
    seed_workspace(&layout);
    let manager = BackupManager::new(layout.clone());

    let first = manager
        .create_backup(BackupKind::Manual, None)
        .expect("must create backup")
        .id;
    let second = manager
        .create_backup(BackupKind::Manual, None)
        .expect("must create backup")
        .id;
    assert!(second > first);

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn relative_record_paths_round_trip() {
    let path: PathBuf = crate::manager::relative_path_from_record("commands/build.md");
    assert_eq!(path, PathBuf::from("commands").join("build.md"));
}
