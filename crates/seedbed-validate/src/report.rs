use seedbed_core::ValidationReport;

pub fn generate_report(report: &ValidationReport) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "overall: {}",
        if report.success { "pass" } else { "fail" }
    ));

    for (name, check) in &report.checks {
        let mut line = format!(
            "[{}] {name}",
            if check.success { "pass" } else { "fail" }
        );
        let mut counts = Vec::new();
        if !check.errors.is_empty() {
            counts.push(format!("{} error(s)", check.errors.len()));
        }
        if !check.warnings.is_empty() {
            counts.push(format!("{} warning(s)", check.warnings.len()));
        }
        if !counts.is_empty() {
            line.push_str(&format!(" ({})", counts.join(", ")));
        }
        lines.push(line);
    }

    if !report.errors.is_empty() {
        lines.push("errors:".to_string());
        for error in &report.errors {
            lines.push(format!("  - {error}"));
        }
    }
    if !report.warnings.is_empty() {
        lines.push("warnings:".to_string());
        for warning in &report.warnings {
            lines.push(format!("  - {warning}"));
        }
    }
    lines
}
