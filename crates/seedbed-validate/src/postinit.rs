use std::fs;

use seedbed_core::{
    ArtifactKind, CheckReport, InitConfig, ValidationReport, WorkspaceLayout,
};

#[derive(Debug, Clone)]
pub struct PostInitValidator {
    layout: WorkspaceLayout,
    config: InitConfig,
}

impl PostInitValidator {
    pub fn new(layout: WorkspaceLayout, config: InitConfig) -> Self {
        Self { layout, config }
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        report.insert_check("completeness", self.check_completeness());
        report.insert_check("integrity", self.check_integrity());
        report.insert_check("structure", self.check_structure());
        report.insert_check("permissions", self.check_permissions());
        report
    }

    fn check_completeness(&self) -> CheckReport {
        let mut report = CheckReport::passing();
        for artifact in self.layout.canonical_artifacts() {
            let present = match artifact.kind {
                ArtifactKind::File => artifact.path.is_file(),
                ArtifactKind::Directory => artifact.path.is_dir(),
            };
            if !present {
                report.error(format!("expected artifact is missing: {}", artifact.path.display()));
            }
        }

        for mode in &self.config.expected_modes {
            if !self.layout.command_file_path(mode).is_file() {
                report.error(format!("command file for mode '{mode}' is missing"));
            }
        }
        report
    }

    fn check_integrity(&self) -> CheckReport {
        let mut report = CheckReport::passing();
        let documents = [
            self.layout.playbook_path(),
            self.layout.memory_bank_path(),
            self.layout.coordination_doc_path(),
            self.layout.mode_config_path(),
            self.layout.wrapper_path(),
        ];
        for path in documents {
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    report.error(format!("{} is unreadable: {err}", path.display()));
                    continue;
                }
            };
            if bytes.is_empty() {
                report.error(format!("{} is empty", path.display()));
                continue;
            }
            if bytes.contains(&0) {
                report.error(format!(
                    "{} contains NUL bytes and looks corrupted",
                    path.display()
                ));
            }
        }
        report
    }

    fn check_structure(&self) -> CheckReport {
        let mut report = CheckReport::passing();
        for dir in [
            self.layout.memory_agents_dir(),
            self.layout.memory_sessions_dir(),
            self.layout.coordination_orchestration_dir(),
            self.layout.coordination_subtasks_dir(),
        ] {
            if !dir.is_dir() {
                report.error(format!("expected directory is missing: {}", dir.display()));
            }
        }

        let store_path = self.layout.memory_store_path();
        match fs::read_to_string(&store_path) {
            Ok(raw) => {
                if serde_json::from_str::<serde_json::Value>(&raw).is_err() {
                    report.error(format!("{} is not valid json", store_path.display()));
                }
            }
            Err(err) => {
                report.error(format!("{} is unreadable: {err}", store_path.display()));
            }
        }
        report
    }

    fn check_permissions(&self) -> CheckReport {
        let mut report = CheckReport::passing();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let wrapper_path = self.layout.wrapper_path();
            match fs::metadata(&wrapper_path) {
                Ok(metadata) => {
                    if metadata.permissions().mode() & 0o111 == 0 {
                        report.error(format!(
                            "{} is not executable",
                            wrapper_path.display()
                        ));
                    }
                }
                Err(err) => {
                    report.error(format!("{} is unreadable: {err}", wrapper_path.display()));
                }
            }
        }

        #[cfg(not(unix))]
        report.warn("executable bits are not checked on this platform");

        report
    }
}
