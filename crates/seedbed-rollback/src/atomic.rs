use std::fs;
use std::io;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use seedbed_core::{RollbackReport, TrackedAction};
use seedbed_state::{CheckpointStatus, StateTracker};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperationState {
    Open,
    Committed,
    RolledBack,
}

#[derive(Debug)]
pub struct AtomicOperation {
    tracker: StateTracker,
    checkpoint_id: String,
    phase: String,
    actions: Vec<TrackedAction>,
    state: OperationState,
}

impl AtomicOperation {
    pub fn begin(tracker: StateTracker, phase: &str, data: Value) -> Result<Self> {
        let mut data = match data {
            Value::Object(map) => Value::Object(map),
            Value::Null => json!({}),
            other => json!({ "context": other }),
        };
        data["actions"] = json!([]);

        let checkpoint_id = tracker.create_checkpoint(phase, data)?;
        Ok(Self {
            tracker,
            checkpoint_id,
            phase: phase.to_string(),
            actions: Vec::new(),
            state: OperationState::Open,
        })
    }

    pub fn checkpoint_id(&self) -> &str {
        &self.checkpoint_id
    }

    pub fn phase(&self) -> &str {
        &self.phase
    }

    pub fn is_open(&self) -> bool {
        self.state == OperationState::Open
    }

    pub fn record(&mut self, action: TrackedAction) -> Result<()> {
        if self.state != OperationState::Open {
            return Err(anyhow!(
                "operation for phase '{}' is already closed",
                self.phase
            ));
        }

        self.actions.push(action);
        self.tracker.update_checkpoint(
            &self.checkpoint_id,
            None,
            Some(json!({ "actions": self.actions })),
        )
    }

    pub fn write_file(&mut self, path: &Path, content: &str) -> Result<()> {
        let previous = match fs::read_to_string(path) {
            Ok(previous) => Some(previous),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", path.display()));
            }
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;

        match previous {
            Some(previous) => self.record(TrackedAction::FileModified {
                path: path.to_path_buf(),
                previous,
            }),
            None => self.record(TrackedAction::FileCreated {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn create_dir(&mut self, path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        self.record(TrackedAction::DirectoryCreated {
            path: path.to_path_buf(),
        })
    }

    pub fn commit(&mut self) -> Result<()> {
        if self.state != OperationState::Open {
            return Ok(());
        }

        self.tracker.update_checkpoint(
            &self.checkpoint_id,
            Some(CheckpointStatus::Committed),
            None,
        )?;
        self.state = OperationState::Committed;
        Ok(())
    }

    pub fn rollback(&mut self) -> RollbackReport {
        let mut report = RollbackReport::default();
        if self.state != OperationState::Open {
            return report;
        }

        for action in self.actions.iter().rev() {
            match action.undo() {
                Ok(()) => report.acted(action.describe_undo()),
                Err(err) => report.warn(format!("{err:#}")),
            }
        }

        if let Err(err) = self.tracker.update_checkpoint(
            &self.checkpoint_id,
            Some(CheckpointStatus::RolledBack),
            None,
        ) {
            report.error(format!(
                "failed to mark checkpoint {} rolled back: {err:#}",
                self.checkpoint_id
            ));
        }
        self.state = OperationState::RolledBack;
        report
    }
}

impl Drop for AtomicOperation {
    fn drop(&mut self) {
        if self.state == OperationState::Open {
            let _ = self.tracker.update_checkpoint(
                &self.checkpoint_id,
                Some(CheckpointStatus::RolledBack),
                None,
            );
        }
    }
}
