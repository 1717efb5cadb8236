mod config_check;
mod health;
mod modes;
mod postinit;
mod preinit;
mod report;

pub use config_check::{ConfigValidator, ModeConfigFile, ModeEntry};
pub use health::HealthChecker;
pub use modes::ModeValidator;
pub use postinit::PostInitValidator;
pub use preinit::{PreInitOptions, PreInitValidator};
pub use report::generate_report;

use seedbed_core::{InitConfig, ValidationReport, WorkspaceLayout};

#[derive(Debug, Clone)]
pub struct ValidationSystem {
    layout: WorkspaceLayout,
    config: InitConfig,
}

impl ValidationSystem {
    pub fn new(layout: WorkspaceLayout, config: InitConfig) -> Self {
        Self { layout, config }
    }

    pub fn validate_pre_init(&self, options: PreInitOptions) -> ValidationReport {
        PreInitValidator::new(self.layout.clone(), self.config.clone()).validate(options)
    }

    pub fn validate_post_init(&self) -> ValidationReport {
        PostInitValidator::new(self.layout.clone(), self.config.clone()).validate()
    }

    pub fn validate_configuration(&self) -> ValidationReport {
        ConfigValidator::new(self.layout.clone(), self.config.clone()).validate()
    }

    pub fn test_mode_functionality(&self) -> ValidationReport {
        ModeValidator::new(self.layout.clone(), self.config.clone()).validate()
    }

    pub fn run_health_checks(&self) -> ValidationReport {
        HealthChecker::new(self.layout.clone(), self.config.clone()).run()
    }

    pub fn generate_report(&self, report: &ValidationReport) -> Vec<String> {
        generate_report(report)
    }
}

#[cfg(test)]
mod tests;
