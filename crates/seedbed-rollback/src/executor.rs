use std::collections::{BTreeSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use seedbed_backup::{BackupFileRecord, BackupManifest};
use seedbed_core::{
    ArtifactKind, CanonicalArtifact, InitPhase, RollbackReport, TrackedAction, WorkspaceLayout,
};
use seedbed_integrity::verify_sha256;
use seedbed_state::Checkpoint;

#[derive(Debug, Clone)]
pub struct RollbackExecutor {
    layout: WorkspaceLayout,
}

impl RollbackExecutor {
    pub fn new(layout: WorkspaceLayout) -> Self {
        Self { layout }
    }

    pub fn execute_full_rollback(&self, manifest: &BackupManifest) -> RollbackReport {
        let mut report = RollbackReport::default();

        for artifact in self.layout.canonical_artifacts() {
            match remove_artifact(&artifact) {
                Ok(true) => report.acted(format!("removed {}", artifact.path.display())),
                Ok(false) => {}
                Err(err) => report.error(format!("{err:#}")),
            }
        }

        for record in &manifest.files {
            match self.restore_record(record) {
                Ok(destination) => {
                    report.acted(format!("restored {}", destination.display()));
                }
                Err(err) => report.error(format!("{err:#}")),
            }
        }

        self.verify_full_rollback(manifest, &mut report);
        report
    }

    fn restore_record(&self, record: &BackupFileRecord) -> Result<PathBuf> {
        verify_sha256(record.content.as_bytes(), &record.checksum).with_context(|| {
            format!("backup record for {} failed its checksum", record.path)
        })?;

        let destination = self.record_destination(record);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&destination, record.content.as_bytes())
            .with_context(|| format!("failed to restore {}", destination.display()))?;

        #[cfg(unix)]
        if let Some(mode) = record.permissions {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&destination, fs::Permissions::from_mode(mode)).with_context(
                || format!("failed to restore permissions on {}", destination.display()),
            )?;
        }

        Ok(destination)
    }

    fn record_destination(&self, record: &BackupFileRecord) -> PathBuf {
        let mut destination = self.layout.project_root().to_path_buf();
        for segment in record.path.split('/').filter(|s| !s.is_empty()) {
            destination.push(segment);
        }
        destination
    }

    fn verify_full_rollback(&self, manifest: &BackupManifest, report: &mut RollbackReport) {
        let restored: BTreeSet<PathBuf> = manifest
            .files
            .iter()
            .map(|record| self.record_destination(record))
            .collect();

        for artifact in self.layout.canonical_artifacts() {
            if !artifact.path.exists() {
                continue;
            }

            match artifact.kind {
                ArtifactKind::File => {
                    if !restored.contains(&artifact.path) {
                        report.error(format!(
                            "{} is still present after rollback",
                            artifact.path.display()
                        ));
                    }
                }
                ArtifactKind::Directory => match collect_files_recursive(&artifact.path) {
                    Ok(files) => {
                        if files.is_empty()
                            && !restored
                                .iter()
                                .any(|path| path.starts_with(&artifact.path))
                        {
                            report.error(format!(
                                "empty directory {} is still present after rollback",
                                artifact.path.display()
                            ));
                            continue;
                        }
                        for file in files {
                            if !restored.contains(&file) {
                                report.error(format!(
                                    "{} is still present after rollback",
                                    file.display()
                                ));
                            }
                        }
                    }
                    Err(err) => report.error(format!("{err:#}")),
                },
            }
        }
    }

    pub fn execute_partial_rollback(&self, phase: &str, checkpoint: &Checkpoint) -> RollbackReport {
        match InitPhase::parse(phase) {
            Some(InitPhase::ModeScaffold) => self.remove_phase_artifacts(
                "mode-scaffold",
                &[
                    file_artifact(self.layout.mode_config_path()),
                    file_artifact(self.layout.playbook_path()),
                    dir_artifact(self.layout.mode_templates_dir()),
                ],
            ),
            Some(InitPhase::CommandSurface) => self.remove_phase_artifacts(
                "command-surface",
                &[dir_artifact(self.layout.commands_dir())],
            ),
            Some(InitPhase::MemorySetup) => self.remove_phase_artifacts(
                "memory-setup",
                &[
                    dir_artifact(self.layout.memory_dir()),
                    file_artifact(self.layout.memory_bank_path()),
                ],
            ),
            Some(InitPhase::CoordinationSetup) => self.remove_phase_artifacts(
                "coordination-setup",
                &[
                    dir_artifact(self.layout.coordination_dir()),
                    file_artifact(self.layout.coordination_doc_path()),
                ],
            ),
            Some(InitPhase::WrapperCreation) => self.remove_phase_artifacts(
                "wrapper-creation",
                &[file_artifact(self.layout.wrapper_path())],
            ),
            None => self.replay_action_log(checkpoint),
        }
    }

    fn remove_phase_artifacts(
        &self,
        phase: &str,
        artifacts: &[CanonicalArtifact],
    ) -> RollbackReport {
        let mut report = RollbackReport::default();
        for artifact in artifacts {
            match remove_artifact(artifact) {
                Ok(true) => report.acted(format!(
                    "removed {} ({phase})",
                    artifact.path.display()
                )),
                Ok(false) => {}
                Err(err) => report.error(format!("{err:#}")),
            }
        }
        report
    }

    fn replay_action_log(&self, checkpoint: &Checkpoint) -> RollbackReport {
        let mut report = RollbackReport::default();
        let actions = match checkpoint.data.get("actions") {
            Some(value) => match serde_json::from_value::<Vec<TrackedAction>>(value.clone()) {
                Ok(actions) => actions,
                Err(err) => {
                    report.warn(format!(
                        "checkpoint {} has an unreadable action log ({err}), nothing to replay",
                        checkpoint.id
                    ));
                    return report;
                }
            },
            None => {
                report.warn(format!(
                    "checkpoint {} has no action log, nothing to replay",
                    checkpoint.id
                ));
                return report;
            }
        };

        for action in actions.iter().rev() {
            match action.undo() {
                Ok(()) => report.acted(action.describe_undo()),
                Err(err) => report.warn(format!("{err:#}")),
            }
        }
        report
    }
}

fn file_artifact(path: PathBuf) -> CanonicalArtifact {
    CanonicalArtifact {
        path,
        kind: ArtifactKind::File,
    }
}

fn dir_artifact(path: PathBuf) -> CanonicalArtifact {
    CanonicalArtifact {
        path,
        kind: ArtifactKind::Directory,
    }
}

fn remove_artifact(artifact: &CanonicalArtifact) -> Result<bool> {
    let result = match artifact.kind {
        ArtifactKind::File => fs::remove_file(&artifact.path),
        ArtifactKind::Directory => fs::remove_dir_all(&artifact.path),
    };
    match result {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => {
            Err(err).with_context(|| format!("failed to remove {}", artifact.path.display()))
        }
    }
}

fn collect_files_recursive(root: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    queue.push_back(root.to_path_buf());

    while let Some(dir) = queue.pop_front() {
        for entry in
            fs::read_dir(&dir).with_context(|| format!("failed to read {}", dir.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                queue.push_back(path);
            } else {
                paths.push(path);
            }
        }
    }

    Ok(paths)
}
