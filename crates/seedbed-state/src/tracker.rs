use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use seedbed_backup::{BackupKind, BackupManager};
use seedbed_core::{CheckReport, WorkspaceLayout};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const STATE_FILE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckpointStatus {
    Pending,
    Committed,
    RolledBack,
}

impl CheckpointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Committed => "committed",
            Self::RolledBack => "rolled-back",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub phase: String,
    pub data: Value,
    pub status: CheckpointStatus,
    pub created_at_unix: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackPoint {
    pub kind: BackupKind,
    pub backup_id: String,
    pub created_at_unix: u64,
    pub state: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CheckpointStateFile {
    version: u32,
    checkpoints: Vec<Checkpoint>,
}

impl Default for CheckpointStateFile {
    fn default() -> Self {
        Self {
            version: STATE_FILE_VERSION,
            checkpoints: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RollbackPointStateFile {
    version: u32,
    points: Vec<RollbackPoint>,
}

impl Default for RollbackPointStateFile {
    fn default() -> Self {
        Self {
            version: STATE_FILE_VERSION,
            points: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateTracker {
    layout: WorkspaceLayout,
}

impl StateTracker {
    pub fn new(layout: WorkspaceLayout) -> Self {
        Self { layout }
    }

    pub fn create_checkpoint(&self, phase: &str, data: Value) -> Result<String> {
        let checkpoint = Checkpoint {
            id: next_checkpoint_id()?,
            phase: phase.to_string(),
            data,
            status: CheckpointStatus::Pending,
            created_at_unix: current_unix_timestamp()?,
        };

        let mut state = self.load_checkpoints()?;
        let id = checkpoint.id.clone();
        state.checkpoints.push(checkpoint);
        self.save_checkpoints(&state)?;
        Ok(id)
    }

    pub fn update_checkpoint(
        &self,
        id: &str,
        status: Option<CheckpointStatus>,
        patch: Option<Value>,
    ) -> Result<()> {
        let mut state = self.load_checkpoints()?;
        let checkpoint = state
            .checkpoints
            .iter_mut()
            .find(|checkpoint| checkpoint.id == id)
            .ok_or_else(|| anyhow!("checkpoint not found: {id}"))?;

        if let Some(status) = status {
            checkpoint.status = status;
        }
        if let Some(patch) = patch {
            merge_patch(&mut checkpoint.data, patch);
        }
        self.save_checkpoints(&state)
    }

    pub fn checkpoint(&self, id: &str) -> Result<Option<Checkpoint>> {
        let state = self.load_checkpoints()?;
        Ok(state
            .checkpoints
            .into_iter()
            .find(|checkpoint| checkpoint.id == id))
    }

    pub fn checkpoints(&self) -> Result<Vec<Checkpoint>> {
        Ok(self.load_checkpoints()?.checkpoints)
    }

    pub fn latest_checkpoint_for_phase(&self, phase: &str) -> Result<Option<Checkpoint>> {
        let mut checkpoints = self.checkpoints()?;
        checkpoints.retain(|checkpoint| checkpoint.phase == phase);
        checkpoints.sort_by(|a, b| {
            (a.created_at_unix, a.id.as_str()).cmp(&(b.created_at_unix, b.id.as_str()))
        });
        Ok(checkpoints.pop())
    }

    pub fn record_rollback_point(
        &self,
        kind: BackupKind,
        backup_id: &str,
        state_data: Value,
    ) -> Result<()> {
        let backups = BackupManager::new(self.layout.clone());
        if backups.find_backup(backup_id)?.is_none() {
            return Err(anyhow!(
                "rollback point refers to a missing backup: {backup_id}"
            ));
        }

        let mut state = self.load_rollback_points()?;
        state.points.push(RollbackPoint {
            kind,
            backup_id: backup_id.to_string(),
            created_at_unix: current_unix_timestamp()?,
            state: state_data,
        });
        self.save_rollback_points(&state)
    }

    pub fn rollback_points(&self) -> Result<Vec<RollbackPoint>> {
        Ok(self.load_rollback_points()?.points)
    }

    pub fn latest_rollback_point(&self, kind: BackupKind) -> Result<Option<RollbackPoint>> {
        let mut points = self.rollback_points()?;
        points.retain(|point| point.kind == kind);
        points.sort_by(|a, b| {
            (a.created_at_unix, a.backup_id.as_str())
                .cmp(&(b.created_at_unix, b.backup_id.as_str()))
        });
        Ok(points.pop())
    }

    pub fn validate_state_tracking(&self) -> CheckReport {
        let mut report = CheckReport::passing();
        if let Err(err) = self.layout.ensure_state_dirs() {
            report.error(format!("state directory is not creatable: {err:#}"));
            return report;
        }

        if let Err(err) = self.load_checkpoints() {
            report.error(format!("checkpoint log is unreadable: {err:#}"));
        }
        if let Err(err) = self.load_rollback_points() {
            report.error(format!("rollback point log is unreadable: {err:#}"));
        }

        let probe_path = self.layout.state_dir().join(".write-probe");
        if let Err(err) = fs::write(&probe_path, b"probe") {
            report.error(format!(
                "state directory is not writable ({}): {err}",
                probe_path.display()
            ));
            return report;
        }
        if let Err(err) = fs::remove_file(&probe_path) {
            report.error(format!(
                "state directory probe could not be removed ({}): {err}",
                probe_path.display()
            ));
        }
        report
    }

    fn load_checkpoints(&self) -> Result<CheckpointStateFile> {
        load_state_file(&self.layout.checkpoints_path())
    }

    fn save_checkpoints(&self, state: &CheckpointStateFile) -> Result<()> {
        self.layout.ensure_state_dirs()?;
        save_state_file(&self.layout.checkpoints_path(), state)
    }

    fn load_rollback_points(&self) -> Result<RollbackPointStateFile> {
        load_state_file(&self.layout.rollback_points_path())
    }

    fn save_rollback_points(&self, state: &RollbackPointStateFile) -> Result<()> {
        self.layout.ensure_state_dirs()?;
        save_state_file(&self.layout.rollback_points_path(), state)
    }
}

fn load_state_file<T>(path: &Path) -> Result<T>
where
    T: Default + for<'de> Deserialize<'de>,
{
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn save_state_file<T: Serialize>(path: &Path, state: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(state)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    fs::write(path, payload).with_context(|| format!("failed to write {}", path.display()))
}

fn merge_patch(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                target_map.insert(key, value);
            }
        }
        (target, patch) => *target = patch,
    }
}

fn next_checkpoint_id() -> Result<String> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system time is before unix epoch")?
        .as_nanos();
    Ok(format!("cp-{nanos}-{}", std::process::id()))
}

fn current_unix_timestamp() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system time is before unix epoch")?
        .as_secs())
}
