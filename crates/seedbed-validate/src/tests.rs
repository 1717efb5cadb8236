use std::fs;

use seedbed_core::{
    command_file_template, coordination_doc_template, memory_bank_template, memory_store_seed,
    mode_config_template, mode_template_file, playbook_template, wrapper_script, InitConfig,
    WorkspaceLayout,
};

use crate::health::extract_command_references;
use crate::preinit::evaluate_free_space;
use crate::{generate_report, PreInitOptions, ValidationSystem};

fn test_layout() -> WorkspaceLayout {
    let mut path = std::env::temp_dir();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    path.push(format!(
        "seedbed-validate-tests-{}-{}",
        std::process::id(),
        nanos
    ));
    WorkspaceLayout::new(path)
}

fn hermetic_config() -> InitConfig {
    InitConfig {
        required_tools: Vec::new(),
        optional_tools: Vec::new(),
        ..InitConfig::default()
    }
}

fn provision(layout: &WorkspaceLayout, config: &InitConfig) {
    fs::create_dir_all(layout.project_root()).expect("must create project root");
    fs::write(
        layout.playbook_path(),
        playbook_template(&config.expected_modes),
    )
    .expect("must write playbook");
    fs::write(layout.memory_bank_path(), memory_bank_template())
        .expect("must write memory bank");
    fs::write(layout.coordination_doc_path(), coordination_doc_template())
        .expect("must write coordination doc");
    fs::write(
        layout.mode_config_path(),
        mode_config_template(&config.expected_modes),
    )
    .expect("must write mode config");
    fs::write(layout.wrapper_path(), wrapper_script()).expect("must write wrapper");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(layout.wrapper_path(), fs::Permissions::from_mode(0o755))
            .expect("must mark wrapper executable");
    }

    fs::create_dir_all(layout.commands_dir()).expect("must create commands dir");
    fs::create_dir_all(layout.mode_templates_dir()).expect("must create templates dir");
    for mode in &config.expected_modes {
        fs::write(layout.command_file_path(mode), command_file_template(mode))
            .expect("must write command file");
        fs::write(layout.mode_template_path(mode), mode_template_file(mode))
            .expect("must write mode template");
    }

    fs::create_dir_all(layout.memory_agents_dir()).expect("must create memory agents dir");
    fs::create_dir_all(layout.memory_sessions_dir()).expect("must create memory sessions dir");
    fs::write(layout.memory_store_path(), memory_store_seed()).expect("must write memory store");
    fs::create_dir_all(layout.coordination_orchestration_dir())
        .expect("must create orchestration dir");
    fs::create_dir_all(layout.coordination_subtasks_dir()).expect("must create subtasks dir");
}

#[test]
fn conflicts_are_errors_without_force_and_warnings_with_force() {
    let layout = test_layout();
    fs::create_dir_all(layout.project_root()).expect("must create project root");
    fs::write(layout.playbook_path(), "existing").expect("must write playbook");
    let system = ValidationSystem::new(layout.clone(), hermetic_config());

    let strict = system.validate_pre_init(PreInitOptions { force: false });
    let conflicts = strict.checks.get("conflicts").expect("check must exist");
    assert!(!conflicts.success);
    assert!(conflicts
        .errors
        .iter()
        .any(|error| error.contains("PLAYBOOK.md")));

    let forced = system.validate_pre_init(PreInitOptions { force: true });
    let conflicts = forced.checks.get("conflicts").expect("check must exist");
    assert!(conflicts.success);
    assert!(conflicts
        .warnings
        .iter()
        .any(|warning| warning.contains("PLAYBOOK.md")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn non_empty_directories_count_as_conflicts() {
    let layout = test_layout();
    fs::create_dir_all(layout.commands_dir()).expect("must create commands dir");
    fs::write(layout.command_file_path("old"), "# old").expect("must write command");
    let system = ValidationSystem::new(layout.clone(), hermetic_config());

    let report = system.validate_pre_init(PreInitOptions { force: false });
    let conflicts = report.checks.get("conflicts").expect("check must exist");
    assert!(!conflicts.success);
    assert!(conflicts
        .errors
        .iter()
        .any(|error| error.contains("commands")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn empty_directories_are_not_conflicts() {
    let layout = test_layout();
    fs::create_dir_all(layout.commands_dir()).expect("must create commands dir");
    let system = ValidationSystem::new(layout.clone(), hermetic_config());

    let report = system.validate_pre_init(PreInitOptions { force: false });
    let conflicts = report.checks.get("conflicts").expect("check must exist");
    assert!(conflicts.success, "unexpected errors: {:?}", conflicts.errors);

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn disk_gating_names_both_the_reading_and_the_threshold() {
    let report = evaluate_free_space(50.0, &InitConfig::default());
    assert!(!report.success);
    let message = &report.errors[0];
    assert!(message.contains("50.00"), "message: {message}");
    assert!(message.contains("100"), "message: {message}");
}

#[test]
fn disk_gating_warns_between_thresholds() {
    let report = evaluate_free_space(250.0, &InitConfig::default());
    assert!(report.success);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("250.00"));
}

#[test]
fn disk_gating_passes_with_ample_space() {
    let report = evaluate_free_space(10_000.0, &InitConfig::default());
    assert!(report.success);
    assert!(report.warnings.is_empty());
}

#[test]
fn missing_required_tool_is_an_error_and_optional_is_a_warning() {
    let layout = test_layout();
    fs::create_dir_all(layout.project_root()).expect("must create project root");
    let mut config = hermetic_config();
    config
        .required_tools
        .push(seedbed_core::ToolRequirement::new("definitely-not-a-real-tool-xyz"));
    config
        .optional_tools
        .push(seedbed_core::ToolRequirement::new("also-not-a-real-tool-xyz"));
    let system = ValidationSystem::new(layout.clone(), config);

    let report = system.validate_pre_init(PreInitOptions::default());
    let dependencies = report.checks.get("dependencies").expect("check must exist");
    assert!(!dependencies.success);
    assert!(dependencies
        .errors
        .iter()
        .any(|error| error.contains("definitely-not-a-real-tool-xyz")));
    assert!(dependencies
        .warnings
        .iter()
        .any(|warning| warning.contains("also-not-a-real-tool-xyz")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn missing_required_env_var_is_an_error() {
    let layout = test_layout();
    fs::create_dir_all(layout.project_root()).expect("must create project root");
    let mut config = hermetic_config();
    config
        .required_env_vars
        .push("SEEDBED_TEST_UNSET_VARIABLE".to_string());
    let system = ValidationSystem::new(layout.clone(), config);

    let report = system.validate_pre_init(PreInitOptions::default());
    let environment = report.checks.get("environment").expect("check must exist");
    assert!(environment
        .errors
        .iter()
        .any(|error| error.contains("SEEDBED_TEST_UNSET_VARIABLE")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn post_init_validation_passes_on_a_provisioned_tree() {
    let layout = test_layout();
    let config = hermetic_config();
    provision(&layout, &config);
    let system = ValidationSystem::new(layout.clone(), config);

    let report = system.validate_post_init();
    assert!(report.success, "unexpected errors: {:?}", report.errors);

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn post_init_validation_flags_a_missing_command_file() {
    let layout = test_layout();
    let config = hermetic_config();
    provision(&layout, &config);
    fs::remove_file(layout.command_file_path("build")).expect("must remove command file");
    let system = ValidationSystem::new(layout.clone(), config);

    let report = system.validate_post_init();
    assert!(!report.success);
    assert!(report
        .errors
        .iter()
        .any(|error| error.contains("build")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn post_init_validation_flags_an_empty_playbook() {
    let layout = test_layout();
    let config = hermetic_config();
    provision(&layout, &config);
    fs::write(layout.playbook_path(), "").expect("must truncate playbook");
    let system = ValidationSystem::new(layout.clone(), config);

    let report = system.validate_post_init();
    assert!(!report.success);
    assert!(report.errors.iter().any(|error| error.contains("empty")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn configuration_validation_passes_on_a_provisioned_tree() {
    let layout = test_layout();
    let config = hermetic_config();
    provision(&layout, &config);
    fs::write(layout.workspace_manifest_path(), "[workspace]\nname = \"demo\"\n")
        .expect("must write manifest");
    let system = ValidationSystem::new(layout.clone(), config);

    let report = system.validate_configuration();
    assert!(report.success, "unexpected errors: {:?}", report.errors);

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn configuration_validation_rejects_a_bad_semver_version() {
    let layout = test_layout();
    let config = hermetic_config();
    provision(&layout, &config);
    fs::write(
        layout.mode_config_path(),
        "{\"version\":\"not-a-version\",\"modes\":[]}",
    )
    .expect("must write bad config");
    let system = ValidationSystem::new(layout.clone(), config);

    let report = system.validate_configuration();
    assert!(!report.success);
    assert!(report
        .errors
        .iter()
        .any(|error| error.contains("not a semver version")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn configuration_validation_rejects_duplicate_modes() {
    let layout = test_layout();
    let config = hermetic_config();
    provision(&layout, &config);
    fs::write(
        layout.mode_config_path(),
        "{\"version\":\"1.0.0\",\"modes\":[{\"name\":\"build\"},{\"name\":\"build\"}]}",
    )
    .expect("must write duplicate config");
    let system = ValidationSystem::new(layout.clone(), config);

    let report = system.validate_configuration();
    assert!(!report.success);
    assert!(report
        .errors
        .iter()
        .any(|error| error.contains("duplicate mode")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn configuration_validation_rejects_invalid_workspace_manifest() {
    let layout = test_layout();
    let config = hermetic_config();
    provision(&layout, &config);
    fs::write(layout.workspace_manifest_path(), "not = = toml")
        .expect("must write bad manifest");
    let system = ValidationSystem::new(layout.clone(), config);

    let report = system.validate_configuration();
    assert!(!report.success);
    assert!(report
        .errors
        .iter()
        .any(|error| error.contains("not valid toml")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn mode_validation_passes_on_a_provisioned_tree() {
    let layout = test_layout();
    let config = hermetic_config();
    provision(&layout, &config);
    let system = ValidationSystem::new(layout.clone(), config);

    let report = system.test_mode_functionality();
    assert!(report.success, "unexpected errors: {:?}", report.errors);
    assert!(report.checks.contains_key("mode:build"));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn mode_validation_flags_an_unreachable_mode() {
    let layout = test_layout();
    let config = hermetic_config();
    provision(&layout, &config);
    fs::remove_file(layout.command_file_path("research")).expect("must remove command file");
    let system = ValidationSystem::new(layout.clone(), config);

    let report = system.test_mode_functionality();
    assert!(!report.success);
    let mode_check = report.checks.get("mode:research").expect("check must exist");
    assert!(!mode_check.success);

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn health_checks_pass_on_a_provisioned_tree() {
    let layout = test_layout();
    let config = hermetic_config();
    provision(&layout, &config);
    let system = ValidationSystem::new(layout.clone(), config);

    let report = system.run_health_checks();
    assert!(report.success, "unexpected errors: {:?}", report.errors);

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn health_checks_flag_a_dangling_playbook_reference() {
    let layout = test_layout();
    let config = hermetic_config();
    provision(&layout, &config);
    let mut playbook = fs::read_to_string(layout.playbook_path()).expect("must read playbook");
    playbook.push_str("\nSee `commands/ghost.md` for details.\n");
    fs::write(layout.playbook_path(), playbook).expect("must write playbook");
    let system = ValidationSystem::new(layout.clone(), config);

    let report = system.run_health_checks();
    assert!(!report.success);
    assert!(report
        .errors
        .iter()
        .any(|error| error.contains("ghost.md")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn health_checks_flag_a_missing_expected_mode() {
    let layout = test_layout();
    let config = hermetic_config();
    provision(&layout, &config);
    fs::write(
        layout.mode_config_path(),
        "{\"version\":\"1.0.0\",\"modes\":[{\"name\":\"build\"}]}",
    )
    .expect("must shrink mode config");
    let system = ValidationSystem::new(layout.clone(), config);

    let report = system.run_health_checks();
    assert!(!report.success);
    assert!(report
        .errors
        .iter()
        .any(|error| error.contains("'architect' is not configured")));

    let _ = fs::remove_dir_all(layout.project_root());
}

#[test]
fn command_reference_extraction_finds_unique_names() {
    let text = "see commands/build.md and commands/test.md, then commands/build.md again";
    assert_eq!(
        extract_command_references(text),
        vec!["build.md".to_string(), "test.md".to_string()]
    );
}

#[test]
fn generated_report_lists_checks_and_errors() {
    let layout = test_layout();
    fs::create_dir_all(layout.project_root()).expect("must create project root");
    fs::write(layout.playbook_path(), "existing").expect("must write playbook");
    let system = ValidationSystem::new(layout.clone(), hermetic_config());

    let report = system.validate_pre_init(PreInitOptions { force: false });
    let lines = generate_report(&report);
    assert_eq!(lines[0], "overall: fail");
    assert!(lines.iter().any(|line| line.starts_with("[fail] conflicts")));
    assert!(lines.iter().any(|line| line == "errors:"));

    let _ = fs::remove_dir_all(layout.project_root());
}
