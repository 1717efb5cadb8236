use std::fs;

use seedbed_core::{CheckReport, InitConfig, ValidationReport, WorkspaceLayout};

use crate::config_check::load_mode_config;

#[derive(Debug, Clone)]
pub struct ModeValidator {
    layout: WorkspaceLayout,
    config: InitConfig,
}

impl ModeValidator {
    pub fn new(layout: WorkspaceLayout, config: InitConfig) -> Self {
        Self { layout, config }
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        let configured_modes = match load_mode_config(&self.layout) {
            Ok(Some(config_file)) => config_file
                .modes
                .into_iter()
                .map(|mode| mode.name)
                .collect(),
            Ok(None) => {
                report.error("mode config is missing, no modes can be exercised");
                self.config.expected_modes.clone()
            }
            Err(err) => {
                report.error(format!("{err:#}"));
                self.config.expected_modes.clone()
            }
        };

        if !self.layout.wrapper_path().is_file() {
            report.error(format!(
                "wrapper is missing, modes cannot be launched: {}",
                self.layout.wrapper_path().display()
            ));
        }

        for mode in &configured_modes {
            report.insert_check(&format!("mode:{mode}"), self.exercise_mode(mode));
        }
        report
    }

    fn exercise_mode(&self, mode: &str) -> CheckReport {
        let mut report = CheckReport::passing();

        let command_path = self.layout.command_file_path(mode);
        match fs::read_to_string(&command_path) {
            Ok(raw) => {
                if raw.trim().is_empty() {
                    report.error(format!("{} is empty", command_path.display()));
                } else if !raw.lines().next().unwrap_or("").starts_with('#') {
                    report.warn(format!(
                        "{} does not start with a heading",
                        command_path.display()
                    ));
                }
            }
            Err(err) => {
                report.error(format!(
                    "command file is unavailable ({}): {err}",
                    command_path.display()
                ));
            }
        }

        let template_path = self.layout.mode_template_path(mode);
        match fs::read_to_string(&template_path) {
            Ok(raw) => {
                if serde_json::from_str::<serde_json::Value>(&raw).is_err() {
                    report.error(format!("{} is not valid json", template_path.display()));
                }
            }
            Err(err) => {
                report.error(format!(
                    "mode template is unavailable ({}): {err}",
                    template_path.display()
                ));
            }
        }
        report
    }
}
