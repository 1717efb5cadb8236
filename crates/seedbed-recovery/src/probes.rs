use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};

pub fn write_delete_probe(dir: &Path) -> Result<()> {
    let probe_path = dir.join(".recovery-probe");
    fs::write(&probe_path, b"probe")
        .with_context(|| format!("write probe failed in {}", dir.display()))?;
    fs::remove_file(&probe_path)
        .with_context(|| format!("delete probe failed in {}", dir.display()))?;
    Ok(())
}

pub fn probe_tool(name: &str, version_flag: &str) -> bool {
    Command::new(name)
        .arg(version_flag)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

pub fn run_shell_command(command: &str) -> Result<()> {
    let output = if cfg!(windows) {
        Command::new("cmd").arg("/C").arg(command).output()
    } else {
        Command::new("sh").arg("-c").arg(command).output()
    }
    .with_context(|| format!("command failed to start: {command}"))?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(anyhow!(
        "command failed: {command} (status={} stderr='{}')",
        output.status,
        stderr.trim()
    ))
}
