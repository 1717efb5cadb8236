use std::fs;
use std::io;
use std::process::Command;

use seedbed_core::{
    available_space_mb, ArtifactKind, CheckReport, DiskSpace, InitConfig, ToolRequirement,
    ValidationReport, WorkspaceLayout,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreInitOptions {
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct PreInitValidator {
    layout: WorkspaceLayout,
    config: InitConfig,
}

impl PreInitValidator {
    pub fn new(layout: WorkspaceLayout, config: InitConfig) -> Self {
        Self { layout, config }
    }

    pub fn validate(&self, options: PreInitOptions) -> ValidationReport {
        let mut report = ValidationReport::default();
        report.insert_check("permissions", self.check_permissions());
        report.insert_check("disk-space", self.check_disk_space());
        report.insert_check("conflicts", self.check_conflicts(options.force));
        report.insert_check("dependencies", self.check_dependencies());
        report.insert_check("environment", self.check_environment());
        report
    }

    pub fn check_permissions(&self) -> CheckReport {
        let mut report = CheckReport::passing();
        let project_root = self.layout.project_root();
        if !project_root.is_dir() {
            report.error(format!(
                "project root does not exist: {}",
                project_root.display()
            ));
            return report;
        }

        let probe_file = project_root.join(".seedbed-write-probe");
        match fs::write(&probe_file, b"probe") {
            Ok(()) => {
                if let Err(err) = fs::remove_file(&probe_file) {
                    report.error(format!(
                        "probe file could not be removed ({}): {err}",
                        probe_file.display()
                    ));
                }
            }
            Err(err) => {
                report.error(format!(
                    "project root is not writable ({}): {err}",
                    project_root.display()
                ));
                return report;
            }
        }

        let probe_dir = project_root.join(".seedbed-dir-probe");
        match fs::create_dir(&probe_dir) {
            Ok(()) => {
                if let Err(err) = fs::remove_dir(&probe_dir) {
                    report.error(format!(
                        "probe directory could not be removed ({}): {err}",
                        probe_dir.display()
                    ));
                }
            }
            Err(err) => {
                report.error(format!(
                    "directories cannot be created in the project root: {err}"
                ));
            }
        }
        report
    }

    pub fn check_disk_space(&self) -> CheckReport {
        match available_space_mb(self.layout.project_root()) {
            DiskSpace::Available { free_mb } => evaluate_free_space(free_mb, &self.config),
            DiskSpace::Unavailable { reason } => {
                let mut report = CheckReport::passing();
                report.warn(format!("free space could not be measured: {reason}"));
                report
            }
        }
    }

    pub fn check_conflicts(&self, force: bool) -> CheckReport {
        let mut report = CheckReport::passing();
        for artifact in self.layout.canonical_artifacts() {
            let conflict = match artifact.kind {
                ArtifactKind::File => {
                    if artifact.path.exists() {
                        Some(format!("file already exists: {}", artifact.path.display()))
                    } else {
                        None
                    }
                }
                ArtifactKind::Directory => match fs::read_dir(&artifact.path) {
                    Ok(mut entries) => {
                        if entries.next().is_some() {
                            Some(format!(
                                "directory is not empty: {}",
                                artifact.path.display()
                            ))
                        } else {
                            None
                        }
                    }
                    Err(err) if err.kind() == io::ErrorKind::NotFound => None,
                    Err(err) => Some(format!(
                        "directory could not be inspected: {} ({err})",
                        artifact.path.display()
                    )),
                },
            };

            if let Some(message) = conflict {
                if force {
                    report.warn(format!("{message} (force: will overwrite)"));
                } else {
                    report.error(message);
                }
            }
        }
        report
    }

    pub fn check_dependencies(&self) -> CheckReport {
        let mut report = CheckReport::passing();
        for tool in &self.config.required_tools {
            if !probe_version(tool) {
                report.error(format!(
                    "required tool '{}' did not answer '{} {}'",
                    tool.name, tool.name, tool.version_flag
                ));
            }
        }
        for tool in &self.config.optional_tools {
            if !probe_version(tool) {
                report.warn(format!("optional tool '{}' is not available", tool.name));
            }
        }
        report
    }

    pub fn check_environment(&self) -> CheckReport {
        let mut report = CheckReport::passing();
        for name in &self.config.required_env_vars {
            if std::env::var(name).is_err() {
                report.error(format!("required environment variable {name} is not set"));
            }
        }

        let under_vcs = Command::new("git")
            .arg("rev-parse")
            .arg("--is-inside-work-tree")
            .current_dir(self.layout.project_root())
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false);
        if !under_vcs {
            report.warn("project is not under version control");
        }
        report
    }
}

pub fn evaluate_free_space(free_mb: f64, config: &InitConfig) -> CheckReport {
    let mut report = CheckReport::passing();
    if free_mb < config.min_free_space_mb {
        report.error(format!(
            "{free_mb:.2} MB available is below the required {} MB",
            config.min_free_space_mb
        ));
    } else if free_mb < config.low_free_space_mb {
        report.warn(format!(
            "{free_mb:.2} MB available is below the recommended {} MB",
            config.low_free_space_mb
        ));
    }
    report
}

fn probe_version(tool: &ToolRequirement) -> bool {
    Command::new(&tool.name)
        .arg(&tool.version_flag)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
