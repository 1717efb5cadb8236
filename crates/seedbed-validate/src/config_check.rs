use std::collections::HashSet;
use std::fs;
use std::io;

use anyhow::{Context, Result};
use seedbed_core::{CheckReport, InitConfig, ValidationReport, WorkspaceLayout};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeConfigFile {
    pub version: String,
    #[serde(default)]
    pub modes: Vec<ModeEntry>,
}

pub(crate) fn load_mode_config(layout: &WorkspaceLayout) -> Result<Option<ModeConfigFile>> {
    let path = layout.mode_config_path();
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    let config = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(config))
}

#[derive(Debug, Clone)]
pub struct ConfigValidator {
    layout: WorkspaceLayout,
    config: InitConfig,
}

impl ConfigValidator {
    pub fn new(layout: WorkspaceLayout, config: InitConfig) -> Self {
        Self { layout, config }
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        report.insert_check("mode-config", self.check_mode_config());
        report.insert_check("playbook", self.check_playbook());
        report.insert_check("memory-config", self.check_memory_config());
        report.insert_check("coordination-config", self.check_coordination_config());
        report.insert_check("workspace-manifest", self.check_workspace_manifest());
        report
    }

    fn check_mode_config(&self) -> CheckReport {
        let mut report = CheckReport::passing();
        let config_file = match load_mode_config(&self.layout) {
            Ok(Some(config_file)) => config_file,
            Ok(None) => {
                report.error(format!(
                    "mode config is missing: {}",
                    self.layout.mode_config_path().display()
                ));
                return report;
            }
            Err(err) => {
                report.error(format!("{err:#}"));
                return report;
            }
        };

        if let Err(err) = semver::Version::parse(&config_file.version) {
            report.error(format!(
                "mode config version '{}' is not a semver version: {err}",
                config_file.version
            ));
        }
        if config_file.modes.is_empty() {
            report.warn("mode config declares no modes");
        }

        let mut seen = HashSet::new();
        for mode in &config_file.modes {
            if mode.name.trim().is_empty() {
                report.error("mode config contains a mode with an empty name");
                continue;
            }
            if !seen.insert(mode.name.clone()) {
                report.error(format!("duplicate mode declaration: {}", mode.name));
            }
            if mode.description.as_deref().unwrap_or("").trim().is_empty() {
                report.warn(format!("mode '{}' has no description", mode.name));
            }
        }
        report
    }

    fn check_playbook(&self) -> CheckReport {
        let mut report = CheckReport::passing();
        let path = self.layout.playbook_path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                report.error(format!("{} is unreadable: {err}", path.display()));
                return report;
            }
        };

        if raw.trim().is_empty() {
            report.error(format!("{} is empty", path.display()));
            return report;
        }
        if !raw.lines().next().unwrap_or("").starts_with("# ") {
            report.error(format!(
                "{} does not start with a title heading",
                path.display()
            ));
        }
        for mode in &self.config.expected_modes {
            if !raw.contains(mode.as_str()) {
                report.warn(format!("playbook does not mention mode '{mode}'"));
            }
        }
        report
    }

    fn check_memory_config(&self) -> CheckReport {
        let mut report = CheckReport::passing();
        let store_path = self.layout.memory_store_path();
        let raw = match fs::read_to_string(&store_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                report.error(format!("memory store is missing: {}", store_path.display()));
                return report;
            }
            Err(err) => {
                report.error(format!("{} is unreadable: {err}", store_path.display()));
                return report;
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                report.error(format!("{} is not valid json: {err}", store_path.display()));
                return report;
            }
        };
        if !value["version"].is_u64() {
            report.error(format!(
                "{} has no numeric version field",
                store_path.display()
            ));
        }
        for field in ["agents", "sessions"] {
            if !value[field].is_array() {
                report.warn(format!(
                    "{} has no '{field}' array",
                    store_path.display()
                ));
            }
        }
        report
    }

    fn check_coordination_config(&self) -> CheckReport {
        let mut report = CheckReport::passing();
        let path = self.layout.coordination_doc_path();
        match fs::read_to_string(&path) {
            Ok(raw) => {
                if raw.trim().is_empty() {
                    report.error(format!("{} is empty", path.display()));
                } else if !raw.contains("coordination/") {
                    report.warn(format!(
                        "{} does not describe the coordination tree",
                        path.display()
                    ));
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                report.error(format!(
                    "coordination document is missing: {}",
                    path.display()
                ));
            }
            Err(err) => {
                report.error(format!("{} is unreadable: {err}", path.display()));
            }
        }
        report
    }

    fn check_workspace_manifest(&self) -> CheckReport {
        let mut report = CheckReport::passing();
        let path = self.layout.workspace_manifest_path();
        match fs::read_to_string(&path) {
            Ok(raw) => {
                if let Err(err) = toml::from_str::<toml::Value>(&raw) {
                    report.error(format!("{} is not valid toml: {err}", path.display()));
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                report.warn(format!("workspace manifest not found: {}", path.display()));
            }
            Err(err) => {
                report.error(format!("{} is unreadable: {err}", path.display()));
            }
        }
        report
    }
}
