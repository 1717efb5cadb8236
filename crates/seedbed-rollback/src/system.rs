use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use seedbed_backup::{BackupKind, BackupManager, CleanupOutcome, CreatedBackup};
use seedbed_core::{
    InitConfig, InitPhase, RecoveryReport, RollbackReport, ValidationReport, WorkspaceLayout,
};
use seedbed_recovery::{RecoveryContext, RecoveryManager};
use seedbed_state::{Checkpoint, CheckpointStatus, RollbackPoint, StateTracker};
use serde_json::{json, Value};

use crate::atomic::AtomicOperation;
use crate::executor::RollbackExecutor;

#[derive(Debug, Clone)]
pub struct RollbackSystem {
    layout: WorkspaceLayout,
    backups: BackupManager,
    tracker: StateTracker,
    executor: RollbackExecutor,
    recovery: RecoveryManager,
}

impl RollbackSystem {
    pub fn new(layout: WorkspaceLayout, config: InitConfig) -> Self {
        Self {
            backups: BackupManager::new(layout.clone()),
            tracker: StateTracker::new(layout.clone()),
            executor: RollbackExecutor::new(layout.clone()),
            recovery: RecoveryManager::new(layout.clone(), config),
            layout,
        }
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub fn tracker(&self) -> &StateTracker {
        &self.tracker
    }

    pub fn create_pre_init_backup(&self) -> Result<CreatedBackup> {
        let created = self
            .backups
            .create_backup(BackupKind::PreInit, Some("before initialization"))?;
        self.tracker
            .record_rollback_point(
                BackupKind::PreInit,
                &created.id,
                json!({
                    "file_count": created.file_count,
                    "recorded_at_unix": current_unix_timestamp()?,
                }),
            )
            .with_context(|| format!("failed to anchor pre-init backup {}", created.id))?;
        Ok(created)
    }

    pub fn create_checkpoint(&self, phase: &str, data: Value) -> Result<String> {
        self.tracker.create_checkpoint(phase, data)
    }

    pub fn begin_operation(&self, phase: InitPhase, data: Value) -> Result<AtomicOperation> {
        AtomicOperation::begin(self.tracker.clone(), phase.as_str(), data)
    }

    pub fn perform_full_rollback(&self, backup_id: Option<&str>) -> RollbackReport {
        let mut report = RollbackReport::default();

        let target_id = match backup_id {
            Some(id) => id.to_string(),
            None => match self.tracker.latest_rollback_point(BackupKind::PreInit) {
                Ok(Some(point)) => point.backup_id,
                Ok(None) => {
                    report.error("no pre-init rollback point is recorded");
                    return report;
                }
                Err(err) => {
                    report.error(format!("could not read rollback points: {err:#}"));
                    return report;
                }
            },
        };

        let manifest = match self.backups.find_backup(&target_id) {
            Ok(Some(manifest)) => manifest,
            Ok(None) => {
                report.error(format!("backup not found: {target_id}"));
                return report;
            }
            Err(err) => {
                report.error(format!("could not read backup {target_id}: {err:#}"));
                return report;
            }
        };

        let safety = match self
            .backups
            .create_backup(BackupKind::PreRollback, Some("before full rollback"))
        {
            Ok(created) => {
                if let Err(err) = self.tracker.record_rollback_point(
                    BackupKind::PreRollback,
                    &created.id,
                    json!({ "target_backup": target_id }),
                ) {
                    report.warn(format!(
                        "pre-rollback backup {} could not be anchored: {err:#}",
                        created.id
                    ));
                }
                Some(created)
            }
            Err(err) => {
                report.warn(format!("could not take a pre-rollback backup: {err:#}"));
                None
            }
        };

        let mut outcome = self.executor.execute_full_rollback(&manifest);
        report.actions.append(&mut outcome.actions);
        report.warnings.append(&mut outcome.warnings);
        if !outcome.success {
            report.success = false;
            report.errors.append(&mut outcome.errors);

            if let Some(safety) = safety {
                match self.backups.find_backup(&safety.id) {
                    Ok(Some(safety_manifest)) => {
                        let mut restore = self.executor.execute_full_rollback(&safety_manifest);
                        report.actions.append(&mut restore.actions);
                        if restore.success {
                            report.warn(format!(
                                "restored pre-rollback backup {} after the failed rollback",
                                safety.id
                            ));
                        } else {
                            report.errors.append(&mut restore.errors);
                            report.error(format!(
                                "restoring pre-rollback backup {} also failed",
                                safety.id
                            ));
                        }
                    }
                    Ok(None) => {
                        report.error(format!(
                            "pre-rollback backup {} disappeared before restore",
                            safety.id
                        ));
                    }
                    Err(err) => {
                        report.error(format!(
                            "could not read pre-rollback backup {}: {err:#}",
                            safety.id
                        ));
                    }
                }
            }
        }
        report
    }

    pub fn perform_partial_rollback(
        &self,
        phase: &str,
        checkpoint_id: Option<&str>,
    ) -> RollbackReport {
        let mut report = RollbackReport::default();

        let found = match checkpoint_id {
            Some(id) => self.tracker.checkpoint(id),
            None => self.tracker.latest_checkpoint_for_phase(phase),
        };
        let checkpoint = match found {
            Ok(Some(checkpoint)) => Some(checkpoint),
            Ok(None) => None,
            Err(err) => {
                report.error(format!("could not read checkpoints: {err:#}"));
                return report;
            }
        };

        let checkpoint = match checkpoint {
            Some(checkpoint) => checkpoint,
            None if InitPhase::parse(phase).is_some() => synthetic_checkpoint(phase),
            None => {
                report.error(format!(
                    "no checkpoint is recorded for unrecognized phase '{phase}'"
                ));
                return report;
            }
        };

        let mut outcome = self.executor.execute_partial_rollback(phase, &checkpoint);
        report.actions.append(&mut outcome.actions);
        report.warnings.append(&mut outcome.warnings);
        if !outcome.success {
            report.success = false;
            report.errors.append(&mut outcome.errors);
        }

        if !checkpoint.id.is_empty() {
            if let Err(err) = self.tracker.update_checkpoint(
                &checkpoint.id,
                Some(CheckpointStatus::RolledBack),
                None,
            ) {
                report.warn(format!(
                    "could not mark checkpoint {} rolled back: {err:#}",
                    checkpoint.id
                ));
            }
        }
        report
    }

    pub fn perform_auto_recovery(&self, failure: &str, ctx: &RecoveryContext) -> RecoveryReport {
        self.recovery.perform_recovery(failure, ctx)
    }

    pub fn list_rollback_points(&self) -> Result<Vec<RollbackPoint>> {
        self.tracker.rollback_points()
    }

    pub fn cleanup_old_backups(&self, keep_count: usize) -> Result<CleanupOutcome> {
        self.backups
            .cleanup_old_backups(keep_count, &self.protected_backup_ids())
    }

    pub fn validate_rollback_system(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        report.insert_check("backup-system", self.backups.validate_backup_system());
        report.insert_check("state-tracking", self.tracker.validate_state_tracking());
        report.insert_check("recovery-system", self.recovery.validate_recovery_system());
        report
    }

    fn protected_backup_ids(&self) -> BTreeSet<String> {
        let mut protected = BTreeSet::new();
        for kind in [
            BackupKind::PreInit,
            BackupKind::PreRollback,
            BackupKind::Manual,
        ] {
            if let Ok(Some(point)) = self.tracker.latest_rollback_point(kind) {
                protected.insert(point.backup_id);
            }
        }
        protected
    }
}

fn synthetic_checkpoint(phase: &str) -> Checkpoint {
    Checkpoint {
        id: String::new(),
        phase: phase.to_string(),
        data: json!({}),
        status: CheckpointStatus::Pending,
        created_at_unix: 0,
    }
}

fn current_unix_timestamp() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system time is before unix epoch")?
        .as_secs())
}
