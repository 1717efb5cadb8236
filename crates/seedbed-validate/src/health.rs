use std::collections::BTreeSet;
use std::fs;
use std::io;

use seedbed_core::{
    available_space_mb, CheckReport, DiskSpace, InitConfig, ValidationReport, WorkspaceLayout,
};

use crate::config_check::load_mode_config;

#[derive(Debug, Clone)]
pub struct HealthChecker {
    layout: WorkspaceLayout,
    config: InitConfig,
}

impl HealthChecker {
    pub fn new(layout: WorkspaceLayout, config: InitConfig) -> Self {
        Self { layout, config }
    }

    pub fn run(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        report.insert_check("mode-availability", self.check_mode_availability());
        report.insert_check("template-integrity", self.check_template_integrity());
        report.insert_check("config-consistency", self.check_config_consistency());
        report.insert_check("system-resources", self.check_system_resources());
        report
    }

    fn check_mode_availability(&self) -> CheckReport {
        let mut report = CheckReport::passing();
        let configured: BTreeSet<String> = match load_mode_config(&self.layout) {
            Ok(Some(config_file)) => config_file
                .modes
                .into_iter()
                .map(|mode| mode.name)
                .collect(),
            Ok(None) => {
                report.error("mode config is missing");
                return report;
            }
            Err(err) => {
                report.error(format!("{err:#}"));
                return report;
            }
        };

        for expected in &self.config.expected_modes {
            if !configured.contains(expected) {
                report.error(format!("expected mode '{expected}' is not configured"));
            }
        }
        for configured_mode in &configured {
            if !self.config.expected_modes.contains(configured_mode) {
                report.warn(format!(
                    "mode '{configured_mode}' is configured but not expected"
                ));
            }
        }
        report
    }

    fn check_template_integrity(&self) -> CheckReport {
        let mut report = CheckReport::passing();

        let templates_dir = self.layout.mode_templates_dir();
        match fs::read_dir(&templates_dir) {
            Ok(entries) => {
                if entries.count() == 0 {
                    report.error(format!("{} is empty", templates_dir.display()));
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                report.error(format!(
                    "template directory is missing: {}",
                    templates_dir.display()
                ));
            }
            Err(err) => {
                report.error(format!("{} is unreadable: {err}", templates_dir.display()));
            }
        }

        for path in [
            self.layout.playbook_path(),
            self.layout.memory_bank_path(),
            self.layout.coordination_doc_path(),
        ] {
            match fs::read_to_string(&path) {
                Ok(raw) if raw.trim().is_empty() => {
                    report.error(format!("{} is empty", path.display()));
                }
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    report.error(format!("core document is missing: {}", path.display()));
                }
                Err(err) => {
                    report.error(format!("{} is unreadable: {err}", path.display()));
                }
            }
        }
        report
    }

    fn check_config_consistency(&self) -> CheckReport {
        let mut report = CheckReport::passing();

        if let Ok(Some(config_file)) = load_mode_config(&self.layout) {
            for mode in &config_file.modes {
                if !self.layout.command_file_path(&mode.name).is_file() {
                    report.error(format!(
                        "mode '{}' has no command file on disk",
                        mode.name
                    ));
                }
            }
        }

        if let Ok(playbook) = fs::read_to_string(self.layout.playbook_path()) {
            for reference in extract_command_references(&playbook) {
                let path = self.layout.commands_dir().join(&reference);
                if !path.is_file() {
                    report.error(format!(
                        "playbook references commands/{reference} which does not exist"
                    ));
                }
            }
        }
        report
    }

    fn check_system_resources(&self) -> CheckReport {
        let mut report = CheckReport::passing();

        match available_space_mb(self.layout.project_root()) {
            DiskSpace::Available { free_mb } => {
                if free_mb < self.config.low_free_space_mb {
                    report.warn(format!(
                        "{free_mb:.2} MB free is below the recommended {} MB",
                        self.config.low_free_space_mb
                    ));
                }
            }
            DiskSpace::Unavailable { reason } => {
                report.warn(format!("free space could not be measured: {reason}"));
            }
        }

        if let Some(available_kb) = linux_available_memory_kb() {
            if available_kb < 256 * 1024 {
                report.warn(format!(
                    "only {} MB of memory available",
                    available_kb / 1024
                ));
            }
        }

        if let Some(limit) = file_descriptor_limit() {
            if limit < 256 {
                report.warn(format!("file descriptor limit is low: {limit}"));
            }
        }

        if let Some(limit) = process_limit() {
            if limit < 64 {
                report.warn(format!("process limit is low: {limit}"));
            }
        }
        report
    }
}

pub(crate) fn extract_command_references(text: &str) -> Vec<String> {
    let mut references = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("commands/") {
        let after = &rest[start + "commands/".len()..];
        match after.find(".md") {
            Some(end) => {
                let name = &after[..end];
                if !name.is_empty()
                    && name
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
                {
                    references.push(format!("{name}.md"));
                }
                rest = &after[end + ".md".len()..];
            }
            None => break,
        }
    }
    references.sort();
    references.dedup();
    references
}

fn linux_available_memory_kb() -> Option<u64> {
    if !cfg!(target_os = "linux") {
        return None;
    }
    let meminfo = fs::read_to_string("/proc/meminfo").ok()?;
    for line in meminfo.lines() {
        if let Some(rest) = line.strip_prefix("MemAvailable:") {
            return rest
                .trim()
                .trim_end_matches("kB")
                .trim()
                .parse::<u64>()
                .ok();
        }
    }
    None
}

#[cfg(unix)]
fn file_descriptor_limit() -> Option<u64> {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) };
    if rc != 0 {
        return None;
    }
    Some(limit.rlim_cur as u64)
}

#[cfg(unix)]
fn process_limit() -> Option<u64> {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_NPROC, &mut limit) };
    if rc != 0 {
        return None;
    }
    Some(limit.rlim_cur as u64)
}

#[cfg(not(unix))]
fn file_descriptor_limit() -> Option<u64> {
    None
}

#[cfg(not(unix))]
fn process_limit() -> Option<u64> {
    None
}
