use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackedAction {
    FileCreated { path: PathBuf },
    DirectoryCreated { path: PathBuf },
    FileModified { path: PathBuf, previous: String },
}

impl TrackedAction {
    pub fn path(&self) -> &Path {
        match self {
            Self::FileCreated { path }
            | Self::DirectoryCreated { path }
            | Self::FileModified { path, .. } => path,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::FileCreated { path } => format!("created file {}", path.display()),
            Self::DirectoryCreated { path } => format!("created directory {}", path.display()),
            Self::FileModified { path, .. } => format!("modified file {}", path.display()),
        }
    }

    pub fn describe_undo(&self) -> String {
        match self {
            Self::FileCreated { path } => format!("removed file {}", path.display()),
            Self::DirectoryCreated { path } => format!("removed directory {}", path.display()),
            Self::FileModified { path, .. } => {
                format!("restored previous content of {}", path.display())
            }
        }
    }

    pub fn undo(&self) -> Result<()> {
        match self {
            Self::FileCreated { path } => match fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err)
                    .with_context(|| format!("failed to remove created file {}", path.display())),
            },
            Self::DirectoryCreated { path } => match fs::remove_dir_all(path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err).with_context(|| {
                    format!("failed to remove created directory {}", path.display())
                }),
            },
            Self::FileModified { path, previous } => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                fs::write(path, previous).with_context(|| {
                    format!("failed to restore previous content of {}", path.display())
                })
            }
        }
    }
}
