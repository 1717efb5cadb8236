use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for CheckReport {
    fn default() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl CheckReport {
    pub fn passing() -> Self {
        Self::default()
    }

    pub fn failed(message: impl Into<String>) -> Self {
        let mut report = Self::default();
        report.error(message);
        report
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.success = false;
        self.errors.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn absorb(&mut self, other: CheckReport) {
        if !other.success {
            self.success = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub success: bool,
    pub checks: BTreeMap<String, CheckReport>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            success: true,
            checks: BTreeMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationReport {
    pub fn insert_check(&mut self, name: &str, report: CheckReport) {
        if !report.success {
            self.success = false;
        }
        for error in &report.errors {
            self.errors.push(format!("{name}: {error}"));
        }
        for warning in &report.warnings {
            self.warnings.push(format!("{name}: {warning}"));
        }
        self.checks.insert(name.to_string(), report);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.success = false;
        self.errors.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackReport {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub actions: Vec<String>,
}

impl Default for RollbackReport {
    fn default() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            actions: Vec::new(),
        }
    }
}

impl RollbackReport {
    pub fn error(&mut self, message: impl Into<String>) {
        self.success = false;
        self.errors.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn acted(&mut self, description: impl Into<String>) {
        self.actions.push(description.into());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub actions: Vec<String>,
}

impl Default for RecoveryReport {
    fn default() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            actions: Vec::new(),
        }
    }
}

impl RecoveryReport {
    pub fn error(&mut self, message: impl Into<String>) {
        self.success = false;
        self.errors.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn acted(&mut self, description: impl Into<String>) {
        self.actions.push(description.into());
    }
}
