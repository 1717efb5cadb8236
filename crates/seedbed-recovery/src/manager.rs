use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use seedbed_backup::{BackupKind, BackupManager};
use seedbed_core::{
    available_space_mb, command_file_template, coordination_doc_template, memory_bank_template,
    memory_store_seed, mode_config_template, mode_template_file, playbook_template,
    wrapper_script, ArtifactKind, CheckReport, DiskSpace, FailureKind, InitConfig,
    RecoveryReport, ToolRequirement, WorkspaceLayout,
};
use seedbed_state::StateTracker;

use crate::probes::{probe_tool, run_shell_command, write_delete_probe};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecoveryContext {
    pub target_dir: Option<PathBuf>,
    pub missing_tools: Vec<String>,
    pub corrupted_files: Vec<PathBuf>,
    pub expected_files: Vec<PathBuf>,
    pub detail: Option<String>,
}

/// Recovery optimizes for forward progress over strict correctness: degraded
/// sub-steps surface as warnings, and the generic fallback always reports
/// success so an unknown failure never hard-stops the caller.
#[derive(Debug, Clone)]
pub struct RecoveryManager {
    layout: WorkspaceLayout,
    config: InitConfig,
}

impl RecoveryManager {
    pub fn new(layout: WorkspaceLayout, config: InitConfig) -> Self {
        Self { layout, config }
    }

    pub fn perform_recovery(&self, failure: &str, ctx: &RecoveryContext) -> RecoveryReport {
        match FailureKind::parse(failure) {
            Some(FailureKind::PermissionDenied) => self.recover_permission_denied(ctx),
            Some(FailureKind::DiskSpace) => self.recover_disk_space(),
            Some(FailureKind::MissingDependencies) => self.recover_missing_dependencies(ctx),
            Some(FailureKind::CorruptedConfig) => self.recover_corrupted_config(ctx),
            Some(FailureKind::PartialInitialization) => self.recover_partial_initialization(ctx),
            Some(FailureKind::ModeScaffoldFailure) => self.recover_mode_scaffold(),
            Some(FailureKind::WrapperCreationFailure) => self.recover_wrapper_creation(),
            Some(FailureKind::MemorySetupFailure) => self.recover_memory_setup(),
            None => self.generic_recovery(failure),
        }
    }

    fn recover_permission_denied(&self, ctx: &RecoveryContext) -> RecoveryReport {
        let mut report = RecoveryReport::default();
        let target = ctx
            .target_dir
            .clone()
            .unwrap_or_else(|| self.layout.project_root().to_path_buf());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            match fs::metadata(&target) {
                Ok(metadata) if metadata.is_dir() => {
                    let mut permissions = metadata.permissions();
                    permissions.set_mode(0o755);
                    match fs::set_permissions(&target, permissions) {
                        Ok(()) => {
                            report.acted(format!("widened permissions on {}", target.display()));
                        }
                        Err(err) => {
                            report.warn(format!(
                                "could not adjust permissions on {}: {err}",
                                target.display()
                            ));
                        }
                    }
                }
                Ok(_) => report.warn(format!("{} is not a directory", target.display())),
                Err(err) => {
                    report.warn(format!("could not stat {}: {err}", target.display()));
                }
            }
        }

        #[cfg(not(unix))]
        report.warn("permission bits are not adjustable on this platform");

        match write_delete_probe(&target) {
            Ok(()) => report.acted(format!("verified write access to {}", target.display())),
            Err(err) => report.error(format!("write access still denied: {err:#}")),
        }
        report
    }

    fn recover_disk_space(&self) -> RecoveryReport {
        let mut report = RecoveryReport::default();

        match self.cleanup_temp_files() {
            Ok(removed) => report.acted(format!("removed {removed} temporary file(s)")),
            Err(err) => report.warn(format!("temporary file cleanup failed: {err:#}")),
        }

        let backups = BackupManager::new(self.layout.clone());
        match backups.cleanup_old_backups(self.config.backup_keep_count, &self.protected_backup_ids())
        {
            Ok(outcome) => {
                report.acted(format!(
                    "removed {} superseded backup(s)",
                    outcome.removed.len()
                ));
            }
            Err(err) => report.warn(format!("backup cleanup failed: {err:#}")),
        }

        match available_space_mb(self.layout.project_root()) {
            DiskSpace::Available { free_mb } => {
                if free_mb >= self.config.min_free_space_mb {
                    report.acted(format!("{free_mb:.2} MB free after cleanup"));
                } else {
                    report.error(format!(
                        "only {free_mb:.2} MB free after cleanup, {} MB required",
                        self.config.min_free_space_mb
                    ));
                }
            }
            DiskSpace::Unavailable { reason } => {
                report.error(format!("free space could not be measured: {reason}"));
            }
        }
        report
    }

    fn recover_missing_dependencies(&self, ctx: &RecoveryContext) -> RecoveryReport {
        let mut report = RecoveryReport::default();
        if ctx.missing_tools.is_empty() {
            report.warn("no missing tools were named");
            return report;
        }

        for tool_name in &ctx.missing_tools {
            let requirement = self.tool_requirement(tool_name);
            if probe_tool(&requirement.name, &requirement.version_flag) {
                report.acted(format!("{tool_name} is already present"));
                continue;
            }

            if let Some(install_command) = &requirement.install_command {
                match run_shell_command(install_command) {
                    Ok(()) => report.acted(format!("ran install command for {tool_name}")),
                    Err(err) => {
                        report.warn(format!("install command for {tool_name} failed: {err:#}"));
                    }
                }
            } else {
                report.warn(format!("no install command configured for {tool_name}"));
            }

            if probe_tool(&requirement.name, &requirement.version_flag) {
                report.acted(format!("{tool_name} now answers its version probe"));
            } else {
                report.error(format!("{tool_name} is still missing"));
            }
        }
        report
    }

    fn recover_corrupted_config(&self, ctx: &RecoveryContext) -> RecoveryReport {
        let mut report = RecoveryReport::default();
        let targets = if ctx.corrupted_files.is_empty() {
            vec![self.layout.mode_config_path(), self.layout.playbook_path()]
        } else {
            ctx.corrupted_files.clone()
        };

        for path in targets {
            let Some(content) = self.builtin_template_for(&path) else {
                report.warn(format!(
                    "no built-in template for {}, leaving it untouched",
                    path.display()
                ));
                continue;
            };

            if let Some(parent) = path.parent() {
                if let Err(err) = fs::create_dir_all(parent) {
                    report.error(format!("failed to create {}: {err}", parent.display()));
                    continue;
                }
            }
            match fs::write(&path, content) {
                Ok(()) => report.acted(format!("rewrote {} from template", path.display())),
                Err(err) => {
                    report.error(format!("failed to rewrite {}: {err}", path.display()));
                    continue;
                }
            }

            if path.extension().and_then(|v| v.to_str()) == Some("json") {
                let reread = fs::read_to_string(&path).unwrap_or_default();
                if serde_json::from_str::<serde_json::Value>(&reread).is_err() {
                    report.warn(format!(
                        "{} is still not valid json after rewrite",
                        path.display()
                    ));
                }
            }
        }
        report
    }

    fn recover_partial_initialization(&self, ctx: &RecoveryContext) -> RecoveryReport {
        let mut report = RecoveryReport::default();
        let expected = self.expected_artifacts(ctx);

        let missing: Vec<PathBuf> = expected
            .iter()
            .filter(|path| !path.exists())
            .cloned()
            .collect();
        if missing.is_empty() {
            report.acted("all expected artifacts are present");
            return report;
        }

        for path in &missing {
            match self.materialize_artifact(path) {
                Ok(()) => report.acted(format!("materialized {}", path.display())),
                Err(err) => {
                    report.warn(format!("could not materialize {}: {err:#}", path.display()));
                }
            }
        }

        let still_missing: Vec<&PathBuf> =
            missing.iter().filter(|path| !path.exists()).collect();
        for path in &still_missing {
            report.error(format!("{} is still missing", path.display()));
        }
        report
    }

    fn recover_mode_scaffold(&self) -> RecoveryReport {
        let mut report = RecoveryReport::default();

        match fs::write(
            self.layout.mode_config_path(),
            mode_config_template(&self.config.expected_modes),
        ) {
            Ok(()) => report.acted("rebuilt the mode catalog"),
            Err(err) => report.warn(format!("could not rebuild the mode catalog: {err}")),
        }

        for mode in &self.config.expected_modes {
            let template_path = self.layout.mode_template_path(mode);
            if let Err(err) = write_with_parents(&template_path, &mode_template_file(mode)) {
                report.warn(format!("could not rebuild the {mode} template: {err:#}"));
                continue;
            }
            report.acted(format!("rebuilt the {mode} template"));
        }

        for mode in &self.config.expected_modes {
            let command_path = self.layout.command_file_path(mode);
            if let Err(err) = write_with_parents(&command_path, &command_file_template(mode)) {
                report.warn(format!("could not rebuild the {mode} command file: {err:#}"));
                continue;
            }
            report.acted(format!("rebuilt the {mode} command file"));
        }
        report
    }

    fn recover_wrapper_creation(&self) -> RecoveryReport {
        let mut report = RecoveryReport::default();
        let wrapper_path = self.layout.wrapper_path();

        match fs::remove_file(&wrapper_path) {
            Ok(()) => report.acted(format!("removed corrupted {}", wrapper_path.display())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                report.error(format!(
                    "could not remove {}: {err}",
                    wrapper_path.display()
                ));
                return report;
            }
        }

        if let Err(err) = fs::write(&wrapper_path, wrapper_script()) {
            report.error(format!(
                "could not regenerate {}: {err}",
                wrapper_path.display()
            ));
            return report;
        }
        report.acted(format!("regenerated {}", wrapper_path.display()));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            match fs::set_permissions(&wrapper_path, fs::Permissions::from_mode(0o755)) {
                Ok(()) => report.acted("marked the wrapper executable"),
                Err(err) => {
                    report.error(format!("could not mark the wrapper executable: {err}"));
                }
            }
        }
        report
    }

    fn recover_memory_setup(&self) -> RecoveryReport {
        let mut report = RecoveryReport::default();
        for dir in [
            self.layout.memory_dir(),
            self.layout.memory_agents_dir(),
            self.layout.memory_sessions_dir(),
        ] {
            match fs::create_dir_all(&dir) {
                Ok(()) => report.acted(format!("ensured {}", dir.display())),
                Err(err) => report.error(format!("could not create {}: {err}", dir.display())),
            }
        }

        let store_path = self.layout.memory_store_path();
        if !store_path.exists() {
            match fs::write(&store_path, memory_store_seed()) {
                Ok(()) => report.acted(format!("seeded {}", store_path.display())),
                Err(err) => {
                    report.error(format!("could not seed {}: {err}", store_path.display()));
                }
            }
        }
        report
    }

    fn generic_recovery(&self, failure: &str) -> RecoveryReport {
        let mut report = RecoveryReport::default();
        match self.cleanup_temp_files() {
            Ok(removed) => report.acted(format!("removed {removed} temporary file(s)")),
            Err(err) => report.warn(format!("temporary file cleanup failed: {err:#}")),
        }

        match write_delete_probe(self.layout.project_root()) {
            Ok(()) => report.acted("verified write access to the project root"),
            Err(err) => report.warn(format!("write probe failed: {err:#}")),
        }

        report.warn(format!(
            "generic recovery ran for unrecognized failure '{failure}' and may not fully resolve the issue"
        ));
        report.success = true;
        report
    }

    pub fn validate_recovery_system(&self) -> CheckReport {
        let mut report = CheckReport::passing();

        if let Err(err) = self.layout.ensure_state_dirs() {
            report.error(format!("recovery workspace is not creatable: {err:#}"));
            return report;
        }
        if let Err(err) = write_delete_probe(self.layout.project_root()) {
            report.error(format!("permission strategy dry-run failed: {err:#}"));
        }
        if let DiskSpace::Unavailable { reason } =
            available_space_mb(self.layout.project_root())
        {
            report.warn(format!("disk-space strategy cannot measure: {reason}"));
        }
        if mode_config_template(&self.config.expected_modes).is_empty() {
            report.error("mode catalog template rendered empty");
        }
        if wrapper_script().is_empty() {
            report.error("wrapper template rendered empty");
        }
        report
    }

    fn cleanup_temp_files(&self) -> Result<usize> {
        let mut removed = 0_usize;

        let tmp_dir = self.layout.tmp_dir();
        match fs::read_dir(&tmp_dir) {
            Ok(entries) => {
                for entry in entries {
                    let entry = entry
                        .with_context(|| format!("failed to read {}", tmp_dir.display()))?;
                    let path = entry.path();
                    let result = if entry.file_type()?.is_dir() {
                        fs::remove_dir_all(&path)
                    } else {
                        fs::remove_file(&path)
                    };
                    result.with_context(|| format!("failed to remove {}", path.display()))?;
                    removed += 1;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", tmp_dir.display()));
            }
        }

        let project_root = self.layout.project_root();
        match fs::read_dir(project_root) {
            Ok(entries) => {
                for entry in entries {
                    let entry = entry
                        .with_context(|| format!("failed to read {}", project_root.display()))?;
                    let path = entry.path();
                    if entry.file_type()?.is_file()
                        && path.extension().and_then(|v| v.to_str()) == Some("tmp")
                    {
                        fs::remove_file(&path)
                            .with_context(|| format!("failed to remove {}", path.display()))?;
                        removed += 1;
                    }
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", project_root.display()));
            }
        }

        Ok(removed)
    }

    fn protected_backup_ids(&self) -> BTreeSet<String> {
        let tracker = StateTracker::new(self.layout.clone());
        let mut protected = BTreeSet::new();
        for kind in [BackupKind::PreInit, BackupKind::PreRollback, BackupKind::Manual] {
            if let Ok(Some(point)) = tracker.latest_rollback_point(kind) {
                protected.insert(point.backup_id);
            }
        }
        protected
    }

    fn tool_requirement(&self, name: &str) -> ToolRequirement {
        self.config
            .required_tools
            .iter()
            .chain(self.config.optional_tools.iter())
            .find(|tool| tool.name == name)
            .cloned()
            .unwrap_or_else(|| ToolRequirement::new(name))
    }

    fn expected_artifacts(&self, ctx: &RecoveryContext) -> Vec<PathBuf> {
        if !ctx.expected_files.is_empty() {
            return ctx.expected_files.clone();
        }
        self.layout
            .canonical_artifacts()
            .into_iter()
            .map(|artifact| artifact.path)
            .collect()
    }

    fn materialize_artifact(&self, path: &Path) -> Result<()> {
        let kind = self
            .layout
            .canonical_artifacts()
            .into_iter()
            .find(|artifact| artifact.path == path)
            .map(|artifact| artifact.kind);

        if kind == Some(ArtifactKind::Directory) {
            return fs::create_dir_all(path)
                .with_context(|| format!("failed to create {}", path.display()));
        }

        let content = self
            .builtin_template_for(path)
            .unwrap_or_default();
        write_with_parents(path, &content)?;

        #[cfg(unix)]
        if *path == self.layout.wrapper_path() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o755))
                .with_context(|| format!("failed to mark {} executable", path.display()))?;
        }
        Ok(())
    }

    fn builtin_template_for(&self, path: &Path) -> Option<String> {
        if *path == self.layout.mode_config_path() {
            return Some(mode_config_template(&self.config.expected_modes));
        }
        if *path == self.layout.playbook_path() {
            return Some(playbook_template(&self.config.expected_modes));
        }
        if *path == self.layout.memory_bank_path() {
            return Some(memory_bank_template());
        }
        if *path == self.layout.coordination_doc_path() {
            return Some(coordination_doc_template());
        }
        if *path == self.layout.wrapper_path() {
            return Some(wrapper_script());
        }
        if *path == self.layout.memory_store_path() {
            return Some(memory_store_seed());
        }

        let parent = path.parent()?;
        let stem = path.file_stem()?.to_str()?;
        if parent == self.layout.commands_dir() {
            return Some(command_file_template(stem));
        }
        if parent == self.layout.mode_templates_dir() {
            return Some(mode_template_file(stem));
        }
        None
    }
}

fn write_with_parents(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}
