use std::fs;

use seedbed_core::{InitConfig, WorkspaceLayout};

use crate::{RecoveryContext, RecoveryManager};

fn test_layout() -> WorkspaceLayout {
    let mut path = std::env::temp_dir();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    path.push(format!(
        "seedbed-recovery-tests-{}-{}",
        std::process::id(),
        nanos
    ));
    WorkspaceLayout::new(path)
}

fn manager_for(layout: &WorkspaceLayout) -> RecoveryManager {
    fs::create_dir_all(layout.project_root()).expect("must create project root");
    RecoveryManager::new(layout.clone(), InitConfig::default())
}

#[test]
fn unknown_failure_routes_to_generic_recovery() {
    let layout = test_layout();
    let manager = manager_for(&layout);

    let report = manager.perform_recovery("no-such-type", &RecoveryContext::default());
    assert!(report.success);
    assert!(report
        .warnings
        .iter()
        .any(|warning| warning.contains("may not fully resolve")));
    assert!(!report.actions.is_empty());

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn permission_recovery_succeeds_when_probe_passes() {
    let layout = test_layout();
    let manager = manager_for(&layout);

    let ctx = RecoveryContext {
        target_dir: Some(layout.project_root().to_path_buf()),
        ..RecoveryContext::default()
    };
    let report = manager.perform_recovery("permission-denied", &ctx);
    assert!(report.success, "unexpected errors: {:?}", report.errors);
    assert!(report
        .actions
        .iter()
        .any(|action| action.contains("verified write access")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn permission_recovery_fails_when_target_cannot_be_written() {
    let layout = test_layout();
    let manager = manager_for(&layout);

    let ctx = RecoveryContext {
        target_dir: Some(layout.project_root().join("does-not-exist")),
        ..RecoveryContext::default()
    };
    let report = manager.perform_recovery("permission-denied", &ctx);
    assert!(!report.success);
    assert!(report
        .errors
        .iter()
        .any(|error| error.contains("write access still denied")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn memory_recovery_recreates_the_state_tree() {
    let layout = test_layout();
    let manager = manager_for(&layout);

    let report = manager.perform_recovery("memory-setup-failure", &RecoveryContext::default());
    assert!(report.success, "unexpected errors: {:?}", report.errors);
    assert!(layout.memory_agents_dir().is_dir());
    assert!(layout.memory_sessions_dir().is_dir());
    assert!(layout.memory_store_path().is_file());

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn wrapper_recovery_regenerates_the_wrapper() {
    let layout = test_layout();
    let manager = manager_for(&layout);
    fs::write(layout.wrapper_path(), b"garbage").expect("must write corrupted wrapper");

    let report =
        manager.perform_recovery("wrapper-creation-failure", &RecoveryContext::default());
    assert!(report.success, "unexpected errors: {:?}", report.errors);

    let content = fs::read_to_string(layout.wrapper_path()).expect("must read wrapper");
    assert!(content.contains("seedbed run"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(layout.wrapper_path())
            .expect("must stat wrapper")
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn corrupted_config_recovery_rewrites_parseable_mode_catalog() {
    let layout = test_layout();
    let manager = manager_for(&layout);
    fs::write(layout.mode_config_path(), b"{{{not json").expect("must corrupt config");

    let ctx = RecoveryContext {
        corrupted_files: vec![layout.mode_config_path()],
        ..RecoveryContext::default()
    };
    let report = manager.perform_recovery("corrupted-config", &ctx);
    assert!(report.success, "unexpected errors: {:?}", report.errors);

    let raw = fs::read_to_string(layout.mode_config_path()).expect("must read config");
    let parsed: serde_json::Value = serde_json::from_str(&raw).expect("config must parse");
    assert!(parsed["modes"].is_array());

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn corrupted_config_recovery_warns_on_unknown_file() {
    let layout = test_layout();
    let manager = manager_for(&layout);

    let ctx = RecoveryContext {
        corrupted_files: vec![layout.project_root().join("unrelated.cfg")],
        ..RecoveryContext::default()
    };
    let report = manager.perform_recovery("corrupted-config", &ctx);
    assert!(report.success);
    assert!(report
        .warnings
        .iter()
        .any(|warning| warning.contains("no built-in template")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn partial_initialization_recovery_materializes_missing_artifacts() {
    let layout = test_layout();
    let manager = manager_for(&layout);

    let report =
        manager.perform_recovery("partial-initialization", &RecoveryContext::default());
    assert!(report.success, "unexpected errors: {:?}", report.errors);
    assert!(layout.playbook_path().is_file());
    assert!(layout.mode_config_path().is_file());
    assert!(layout.commands_dir().is_dir());
    assert!(layout.coordination_dir().is_dir());

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn mode_scaffold_recovery_rebuilds_catalog_templates_and_commands() {
    let layout = test_layout();
    let manager = manager_for(&layout);

    let report =
        manager.perform_recovery("mode-scaffold-failure", &RecoveryContext::default());
    assert!(report.success);
    assert!(layout.mode_config_path().is_file());
    assert!(layout.mode_template_path("build").is_file());
    assert!(layout.command_file_path("build").is_file());

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn missing_dependency_without_install_command_fails() {
    let layout = test_layout();
    let manager = manager_for(&layout);

    let ctx = RecoveryContext {
        missing_tools: vec!["definitely-not-a-real-tool-xyz".to_string()],
        ..RecoveryContext::default()
    };
    let report = manager.perform_recovery("missing-dependencies", &ctx);
    assert!(!report.success);
    assert!(report
        .errors
        .iter()
        .any(|error| error.contains("still missing")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[cfg(unix)]
#[test]
fn missing_dependency_that_is_present_succeeds() {
    let layout = test_layout();
    let manager = manager_for(&layout);

    let ctx = RecoveryContext {
        missing_tools: vec!["true".to_string()],
        ..RecoveryContext::default()
    };
    let report = manager.perform_recovery("missing-dependencies", &ctx);
    assert!(report.success, "unexpected errors: {:?}", report.errors);
    assert!(report
        .actions
        .iter()
        .any(|action| action.contains("already present")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn generic_recovery_clears_temporary_files() {
    let layout = test_layout();
    let manager = manager_for(&layout);
    layout.ensure_state_dirs().expect("must create state dirs");
    fs::write(layout.tmp_dir().join("stale.part"), b"x").expect("must write tmp file");
    fs::write(layout.project_root().join("leftover.tmp"), b"x").expect("must write tmp file");

    let report = manager.perform_recovery("something-else", &RecoveryContext::default());
    assert!(report.success);
    assert!(!layout.tmp_dir().join("stale.part").exists());
    assert!(!layout.project_root().join("leftover.tmp").exists());

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn validate_recovery_system_passes_on_writable_workspace() {
    let layout = test_layout();
    let manager = manager_for(&layout);

    let report = manager.validate_recovery_system();
    assert!(report.success, "unexpected errors: {:?}", report.errors);

    let _ = fs::remove_dir_all(layout.project_root());
}
