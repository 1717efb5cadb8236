use serde::{Deserialize, Serialize};

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupKind {
    PreInit,
    PreRollback,
    Manual,
}

impl BackupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreInit => "pre-init",
            Self::PreRollback => "pre-rollback",
            Self::Manual => "manual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pre-init" => Some(Self::PreInit),
            "pre-rollback" => Some(Self::PreRollback),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupFileRecord {
    pub path: String,
    pub content: String,
    pub checksum: String,
    #[serde(default)]
    pub permissions: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub kind: BackupKind,
    #[serde(default)]
    pub description: Option<String>,
    pub project_root: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupManifest {
    pub id: String,
    pub created_at_unix: u64,
    pub version: u32,
    pub files: Vec<BackupFileRecord>,
    pub metadata: BackupMetadata,
}
