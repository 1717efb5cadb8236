use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    project_root: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl WorkspaceLayout {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn playbook_path(&self) -> PathBuf {
        self.project_root.join("PLAYBOOK.md")
    }

    pub fn memory_bank_path(&self) -> PathBuf {
        self.project_root.join("memory-bank.md")
    }

    pub fn coordination_doc_path(&self) -> PathBuf {
        self.project_root.join("coordination.md")
    }

    pub fn wrapper_path(&self) -> PathBuf {
        let mut file_name = String::from("seedbed-run");
        if cfg!(windows) {
            file_name.push_str(".cmd");
        }
        self.project_root.join(file_name)
    }

    pub fn mode_config_path(&self) -> PathBuf {
        self.project_root.join("modes.json")
    }

    pub fn mode_templates_dir(&self) -> PathBuf {
        self.project_root.join("mode-templates")
    }

    pub fn mode_template_path(&self, mode: &str) -> PathBuf {
        self.mode_templates_dir().join(format!("{mode}.json"))
    }

    pub fn commands_dir(&self) -> PathBuf {
        self.project_root.join("commands")
    }

    pub fn command_file_path(&self, mode: &str) -> PathBuf {
        self.commands_dir().join(format!("{mode}.md"))
    }

    pub fn workspace_manifest_path(&self) -> PathBuf {
        self.project_root.join("workspace.toml")
    }

    pub fn memory_dir(&self) -> PathBuf {
        self.project_root.join("memory")
    }

    pub fn memory_agents_dir(&self) -> PathBuf {
        self.memory_dir().join("agents")
    }

    pub fn memory_sessions_dir(&self) -> PathBuf {
        self.memory_dir().join("sessions")
    }

    pub fn memory_store_path(&self) -> PathBuf {
        self.memory_dir().join("store.json")
    }

    pub fn coordination_dir(&self) -> PathBuf {
        self.project_root.join("coordination")
    }

    pub fn coordination_orchestration_dir(&self) -> PathBuf {
        self.coordination_dir().join("orchestration")
    }

    pub fn coordination_subtasks_dir(&self) -> PathBuf {
        self.coordination_dir().join("subtasks")
    }

    pub fn seedbed_dir(&self) -> PathBuf {
        self.project_root.join(".seedbed")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.seedbed_dir().join("backups")
    }

    pub fn backup_dir(&self, backup_id: &str) -> PathBuf {
        self.backups_dir().join(backup_id)
    }

    pub fn backup_manifest_path(&self, backup_id: &str) -> PathBuf {
        self.backup_dir(backup_id).join("backup.json")
    }

    pub fn backup_files_dir(&self, backup_id: &str) -> PathBuf {
        self.backup_dir(backup_id).join("files")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.seedbed_dir().join("state")
    }

    pub fn checkpoints_path(&self) -> PathBuf {
        self.state_dir().join("checkpoints.json")
    }

    pub fn rollback_points_path(&self) -> PathBuf {
        self.state_dir().join("rollback-points.json")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.seedbed_dir().join("tmp")
    }

    pub fn ensure_state_dirs(&self) -> Result<()> {
        for dir in [
            self.seedbed_dir(),
            self.backups_dir(),
            self.state_dir(),
            self.tmp_dir(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn canonical_artifacts(&self) -> Vec<CanonicalArtifact> {
        vec![
            CanonicalArtifact {
                path: self.playbook_path(),
                kind: ArtifactKind::File,
            },
            CanonicalArtifact {
                path: self.memory_bank_path(),
                kind: ArtifactKind::File,
            },
            CanonicalArtifact {
                path: self.coordination_doc_path(),
                kind: ArtifactKind::File,
            },
            CanonicalArtifact {
                path: self.wrapper_path(),
                kind: ArtifactKind::File,
            },
            CanonicalArtifact {
                path: self.mode_config_path(),
                kind: ArtifactKind::File,
            },
            CanonicalArtifact {
                path: self.mode_templates_dir(),
                kind: ArtifactKind::Directory,
            },
            CanonicalArtifact {
                path: self.commands_dir(),
                kind: ArtifactKind::Directory,
            },
            CanonicalArtifact {
                path: self.memory_dir(),
                kind: ArtifactKind::Directory,
            },
            CanonicalArtifact {
                path: self.coordination_dir(),
                kind: ArtifactKind::Directory,
            },
        ]
    }

    pub fn backup_targets(&self) -> Vec<PathBuf> {
        vec![
            self.commands_dir(),
            self.playbook_path(),
            self.mode_config_path(),
            self.workspace_manifest_path(),
            self.memory_dir(),
            self.coordination_dir(),
        ]
    }

    pub fn relative_to_root(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.project_root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
