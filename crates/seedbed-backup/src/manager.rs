use std::collections::{BTreeSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use seedbed_core::{CheckReport, WorkspaceLayout};
use seedbed_integrity::sha256_hex;

use crate::manifest::{
    BackupFileRecord, BackupKind, BackupManifest, BackupMetadata, MANIFEST_VERSION,
};

#[derive(Debug, Clone)]
pub struct BackupManager {
    layout: WorkspaceLayout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedBackup {
    pub id: String,
    pub location: PathBuf,
    pub file_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupListing {
    pub backups: Vec<BackupManifest>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub removed: Vec<String>,
    pub kept: Vec<String>,
}

impl BackupManager {
    pub fn new(layout: WorkspaceLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    pub fn create_backup(
        &self,
        kind: BackupKind,
        description: Option<&str>,
    ) -> Result<CreatedBackup> {
        self.layout.ensure_state_dirs()?;

        let id = next_backup_id();
        let backup_dir = self.layout.backup_dir(&id);
        if backup_dir.exists() {
            return Err(anyhow!("backup id collision: {id}"));
        }
        fs::create_dir_all(&backup_dir)
            .with_context(|| format!("failed to create {}", backup_dir.display()))?;

        let files = self.collect_backup_files()?;
        let manifest = BackupManifest {
            id: id.clone(),
            created_at_unix: current_unix_timestamp()?,
            version: MANIFEST_VERSION,
            files,
            metadata: BackupMetadata {
                kind,
                description: description.map(ToOwned::to_owned),
                project_root: self.layout.project_root().display().to_string(),
            },
        };

        let manifest_path = self.layout.backup_manifest_path(&id);
        let payload = serde_json::to_string_pretty(&manifest)
            .with_context(|| format!("failed to serialize backup manifest {id}"))?;
        fs::write(&manifest_path, payload)
            .with_context(|| format!("failed to write {}", manifest_path.display()))?;

        self.write_mirror_copies(&manifest)?;

        Ok(CreatedBackup {
            id,
            location: backup_dir,
            file_count: manifest.files.len(),
        })
    }

    fn collect_backup_files(&self) -> Result<Vec<BackupFileRecord>> {
        let mut records = Vec::new();
        for target in self.layout.backup_targets() {
            let metadata = match fs::metadata(&target) {
                Ok(metadata) => metadata,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to stat {}", target.display()));
                }
            };

            if metadata.is_file() {
                records.push(self.read_file_record(&target)?);
            } else if metadata.is_dir() {
                for file_path in collect_files_recursive(&target)? {
                    records.push(self.read_file_record(&file_path)?);
                }
            }
        }

        records.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(records)
    }

    fn read_file_record(&self, path: &Path) -> Result<BackupFileRecord> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        let checksum = sha256_hex(content.as_bytes());
        let relative = self.layout.relative_to_root(path);

        Ok(BackupFileRecord {
            path: normalize_relative_path(&relative),
            content,
            checksum,
            permissions: file_mode(path),
        })
    }

    fn write_mirror_copies(&self, manifest: &BackupManifest) -> Result<()> {
        let files_dir = self.layout.backup_files_dir(&manifest.id);
        for record in &manifest.files {
            let mirror_path = files_dir.join(relative_path_from_record(&record.path));
            if let Some(parent) = mirror_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(&mirror_path, record.content.as_bytes())
                .with_context(|| format!("failed to write {}", mirror_path.display()))?;
        }
        Ok(())
    }

    pub fn find_backup(&self, id: &str) -> Result<Option<BackupManifest>> {
        let manifest_path = self.layout.backup_manifest_path(id);
        let raw = match fs::read_to_string(&manifest_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", manifest_path.display()));
            }
        };

        let manifest = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", manifest_path.display()))?;
        Ok(Some(manifest))
    }

    pub fn list_backups(&self) -> Result<BackupListing> {
        let backups_dir = self.layout.backups_dir();
        let entries = match fs::read_dir(&backups_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(BackupListing {
                    backups: Vec::new(),
                    warnings: Vec::new(),
                });
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", backups_dir.display()));
            }
        };

        let mut backups = Vec::new();
        let mut warnings = Vec::new();
        for entry in entries {
            let entry =
                entry.with_context(|| format!("failed to read {}", backups_dir.display()))?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let id = entry.file_name().to_string_lossy().into_owned();
            let manifest_path = self.layout.backup_manifest_path(&id);
            let raw = match fs::read_to_string(&manifest_path) {
                Ok(raw) => raw,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    warnings.push(format!("backup {id} has no manifest, skipping"));
                    continue;
                }
                Err(err) => {
                    warnings.push(format!("backup {id} manifest is unreadable ({err}), skipping"));
                    continue;
                }
            };

            match serde_json::from_str::<BackupManifest>(&raw) {
                Ok(manifest) => backups.push(manifest),
                Err(err) => {
                    warnings.push(format!("backup {id} manifest is unparsable ({err}), skipping"));
                }
            }
        }

        backups.sort_by(|a, b| {
            (a.created_at_unix, a.id.as_str()).cmp(&(b.created_at_unix, b.id.as_str()))
        });
        Ok(BackupListing { backups, warnings })
    }

    pub fn delete_backup(&self, id: &str) -> Result<bool> {
        let backup_dir = self.layout.backup_dir(id);
        match fs::remove_dir_all(&backup_dir) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove {}", backup_dir.display()))
            }
        }
    }

    pub fn cleanup_old_backups(
        &self,
        keep_count: usize,
        protected_ids: &BTreeSet<String>,
    ) -> Result<CleanupOutcome> {
        let listing = self.list_backups()?;
        let mut backups = listing.backups;
        backups.sort_by(|a, b| {
            (b.created_at_unix, b.id.as_str()).cmp(&(a.created_at_unix, a.id.as_str()))
        });

        let mut kept = Vec::new();
        let mut removed = Vec::new();
        for (index, manifest) in backups.into_iter().enumerate() {
            if index < keep_count || protected_ids.contains(&manifest.id) {
                kept.push(manifest.id);
                continue;
            }
            self.delete_backup(&manifest.id)?;
            removed.push(manifest.id);
        }

        Ok(CleanupOutcome { removed, kept })
    }

    pub fn validate_backup_system(&self) -> CheckReport {
        let mut report = CheckReport::passing();
        if let Err(err) = self.layout.ensure_state_dirs() {
            report.error(format!("backup root is not creatable: {err:#}"));
            return report;
        }

        let probe_path = self.layout.backups_dir().join(".write-probe");
        if let Err(err) = fs::write(&probe_path, b"probe") {
            report.error(format!(
                "backup root is not writable ({}): {err}",
                probe_path.display()
            ));
            return report;
        }
        if let Err(err) = fs::remove_file(&probe_path) {
            report.error(format!(
                "backup root probe could not be removed ({}): {err}",
                probe_path.display()
            ));
        }
        report
    }
}

pub(crate) fn relative_path_from_record(record_path: &str) -> PathBuf {
    let mut path = PathBuf::new();
    for segment in record_path.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path
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
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                queue.push_back(path);
            } else if file_type.is_file() {
                paths.push(path);
            }
        }
    }

    Ok(paths)
}

fn normalize_relative_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn file_mode(path: &Path) -> Option<u32> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path)
            .ok()
            .map(|metadata| metadata.permissions().mode() & 0o7777)
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        None
    }
}

fn next_backup_id() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.9fZ")
        .to_string()
        .replace([':', '.'], "-")
}

fn current_unix_timestamp() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system time is before unix epoch")?
        .as_secs())
}
