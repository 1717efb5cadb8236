use anyhow::{Context, Result};
use seedbed_core::{
    command_file_template, coordination_doc_template, memory_bank_template, memory_store_seed,
    mode_config_template, mode_template_file, playbook_template, wrapper_script, InitConfig,
    InitPhase, WorkspaceLayout,
};
use seedbed_recovery::RecoveryContext;
use seedbed_rollback::{AtomicOperation, RollbackSystem};
use seedbed_validate::{generate_report, PreInitOptions, ValidationSystem};
use serde_json::json;

use crate::render;

pub fn run_init(
    layout: &WorkspaceLayout,
    config: &InitConfig,
    force: bool,
    skip_backup: bool,
) -> Result<bool> {
    let validation = ValidationSystem::new(layout.clone(), config.clone());
    let system = RollbackSystem::new(layout.clone(), config.clone());

    render::section("pre-init validation");
    let pre = validation.validate_pre_init(PreInitOptions { force });
    render::print_lines(&generate_report(&pre));
    if !pre.success {
        render::status("error", "pre-init validation failed, nothing was changed");
        return Ok(false);
    }

    if skip_backup {
        render::status("warn", "skipping the pre-init backup");
    } else {
        let created = system
            .create_pre_init_backup()
            .context("failed to create the pre-init backup")?;
        render::status(
            "ok",
            &format!("pre-init backup {} ({} file(s))", created.id, created.file_count),
        );
    }

    render::section("initialization");
    let phases = InitPhase::all();
    let mut progress = render::start_progress("initializing", phases.len() as u64);
    for phase in phases {
        match run_phase(&system, layout, config, phase) {
            Ok(()) => progress.step(phase.summary()),
            Err(err) => {
                progress.abandon(&format!("{} failed", phase.as_str()));
                render::status("error", &format!("{err:#}"));

                if skip_backup {
                    let report = system.perform_partial_rollback(phase.as_str(), None);
                    render::status(
                        if report.success { "warn" } else { "error" },
                        &format!(
                            "rolled back the {} phase ({} action(s))",
                            phase.as_str(),
                            report.actions.len()
                        ),
                    );
                } else {
                    let report = system.perform_full_rollback(None);
                    render::status(
                        if report.success { "warn" } else { "error" },
                        &format!("full rollback ran with {} action(s)", report.actions.len()),
                    );
                    for error in &report.errors {
                        render::status("error", error);
                    }
                }
                return Ok(false);
            }
        }
    }
    progress.finish("initialization complete");

    render::section("post-init validation");
    let post = validation.validate_post_init();
    render::print_lines(&generate_report(&post));

    render::section("health checks");
    let health = validation.run_health_checks();
    render::print_lines(&generate_report(&health));

    Ok(post.success && health.success)
}

fn run_phase(
    system: &RollbackSystem,
    layout: &WorkspaceLayout,
    config: &InitConfig,
    phase: InitPhase,
) -> Result<()> {
    let mut operation = system.begin_operation(phase, json!({}))?;
    match apply_phase(&mut operation, layout, config, phase) {
        Ok(()) => operation.commit(),
        Err(err) => {
            let report = operation.rollback();
            for warning in &report.warnings {
                render::status("warn", warning);
            }
            Err(err).with_context(|| format!("phase {} failed", phase.as_str()))
        }
    }
}

fn apply_phase(
    operation: &mut AtomicOperation,
    layout: &WorkspaceLayout,
    config: &InitConfig,
    phase: InitPhase,
) -> Result<()> {
    match phase {
        InitPhase::ModeScaffold => {
            operation.write_file(
                &layout.mode_config_path(),
                &mode_config_template(&config.expected_modes),
            )?;
            operation.create_dir(&layout.mode_templates_dir())?;
            for mode in &config.expected_modes {
                operation.write_file(&layout.mode_template_path(mode), &mode_template_file(mode))?;
            }
            operation.write_file(
                &layout.playbook_path(),
                &playbook_template(&config.expected_modes),
            )
        }
        InitPhase::CommandSurface => {
            operation.create_dir(&layout.commands_dir())?;
            for mode in &config.expected_modes {
                operation.write_file(&layout.command_file_path(mode), &command_file_template(mode))?;
            }
            Ok(())
        }
        InitPhase::MemorySetup => {
            operation.create_dir(&layout.memory_dir())?;
            operation.create_dir(&layout.memory_agents_dir())?;
            operation.create_dir(&layout.memory_sessions_dir())?;
            operation.write_file(&layout.memory_store_path(), &memory_store_seed())?;
            operation.write_file(&layout.memory_bank_path(), &memory_bank_template())
        }
        InitPhase::CoordinationSetup => {
            operation.create_dir(&layout.coordination_dir())?;
            operation.create_dir(&layout.coordination_orchestration_dir())?;
            operation.create_dir(&layout.coordination_subtasks_dir())?;
            operation.write_file(&layout.coordination_doc_path(), &coordination_doc_template())
        }
        InitPhase::WrapperCreation => {
            let wrapper_path = layout.wrapper_path();
            operation.write_file(&wrapper_path, &wrapper_script())?;
            mark_executable(layout)
        }
    }
}

fn mark_executable(layout: &WorkspaceLayout) -> Result<()> {
    #[cfg(unix)]
    {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        let wrapper_path = layout.wrapper_path();
        fs::set_permissions(&wrapper_path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("failed to mark {} executable", wrapper_path.display()))?;
    }

    #[cfg(not(unix))]
    let _ = layout;

    Ok(())
}

pub fn run_validate(
    layout: &WorkspaceLayout,
    config: &InitConfig,
    post: bool,
    configuration: bool,
    modes: bool,
) -> Result<bool> {
    let validation = ValidationSystem::new(layout.clone(), config.clone());
    let mut clean = true;

    if post {
        render::section("post-init validation");
        let report = validation.validate_post_init();
        render::print_lines(&generate_report(&report));
        clean &= report.success;
    }
    if configuration {
        render::section("configuration validation");
        let report = validation.validate_configuration();
        render::print_lines(&generate_report(&report));
        clean &= report.success;
    }
    if modes {
        render::section("mode functionality");
        let report = validation.test_mode_functionality();
        render::print_lines(&generate_report(&report));
        clean &= report.success;
    }
    if !post && !configuration && !modes {
        render::section("pre-init validation");
        let report = validation.validate_pre_init(PreInitOptions::default());
        render::print_lines(&generate_report(&report));
        clean &= report.success;
    }
    Ok(clean)
}

pub fn run_health(layout: &WorkspaceLayout, config: &InitConfig) -> Result<bool> {
    let validation = ValidationSystem::new(layout.clone(), config.clone());
    render::section("health checks");
    let report = validation.run_health_checks();
    render::print_lines(&generate_report(&report));
    Ok(report.success)
}

pub fn run_backups(layout: &WorkspaceLayout, config: &InitConfig) -> Result<bool> {
    let system = RollbackSystem::new(layout.clone(), config.clone());
    let listing = system.backups().list_backups()?;

    if listing.backups.is_empty() {
        render::status("ok", "no backups recorded");
    }
    for manifest in &listing.backups {
        println!(
            "{}  {}  {} file(s)  {}",
            manifest.id,
            manifest.metadata.kind.as_str(),
            manifest.files.len(),
            manifest.metadata.description.as_deref().unwrap_or("-")
        );
    }
    for warning in &listing.warnings {
        render::status("warn", warning);
    }

    let points = system.list_rollback_points()?;
    if !points.is_empty() {
        render::section("rollback points");
        for point in points {
            println!("{}  {}", point.kind.as_str(), point.backup_id);
        }
    }
    Ok(true)
}

pub fn run_cleanup(layout: &WorkspaceLayout, config: &InitConfig, keep: usize) -> Result<bool> {
    let system = RollbackSystem::new(layout.clone(), config.clone());
    let outcome = system.cleanup_old_backups(keep)?;
    render::status(
        "ok",
        &format!(
            "removed {} backup(s), kept {}",
            outcome.removed.len(),
            outcome.kept.len()
        ),
    );
    Ok(true)
}

pub fn run_rollback(
    layout: &WorkspaceLayout,
    config: &InitConfig,
    backup: Option<&str>,
    phase: Option<&str>,
    checkpoint: Option<&str>,
) -> Result<bool> {
    let system = RollbackSystem::new(layout.clone(), config.clone());
    let report = match phase {
        Some(phase) => system.perform_partial_rollback(phase, checkpoint),
        None => system.perform_full_rollback(backup),
    };

    for action in &report.actions {
        render::status("ok", action);
    }
    for warning in &report.warnings {
        render::status("warn", warning);
    }
    for error in &report.errors {
        render::status("error", error);
    }
    render::status(
        if report.success { "ok" } else { "error" },
        if report.success {
            "rollback complete"
        } else {
            "rollback failed"
        },
    );
    Ok(report.success)
}

pub fn run_recover(layout: &WorkspaceLayout, config: &InitConfig, failure: &str) -> Result<bool> {
    let system = RollbackSystem::new(layout.clone(), config.clone());
    let report = system.perform_auto_recovery(failure, &RecoveryContext::default());

    for action in &report.actions {
        render::status("ok", action);
    }
    for warning in &report.warnings {
        render::status("warn", warning);
    }
    for error in &report.errors {
        render::status("error", error);
    }
    render::status(
        if report.success { "ok" } else { "error" },
        if report.success {
            "recovery complete"
        } else {
            "recovery did not resolve the failure"
        },
    );
    Ok(report.success)
}

pub fn run_doctor(layout: &WorkspaceLayout, config: &InitConfig) -> Result<bool> {
    println!("project root: {}", layout.project_root().display());
    println!("backups: {}", layout.backups_dir().display());
    println!("state: {}", layout.state_dir().display());

    let system = RollbackSystem::new(layout.clone(), config.clone());
    let report = system.validate_rollback_system();
    render::print_lines(&generate_report(&report));
    Ok(report.success)
}
