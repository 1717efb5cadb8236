mod action;
mod config;
mod disk;
mod failure;
mod layout;
mod phase;
mod report;
mod templates;

pub use action::TrackedAction;
pub use config::{InitConfig, ToolRequirement};
pub use disk::{available_space_mb, DiskSpace};
pub use failure::FailureKind;
pub use layout::{ArtifactKind, CanonicalArtifact, WorkspaceLayout};
pub use phase::InitPhase;
pub use report::{CheckReport, RecoveryReport, RollbackReport, ValidationReport};
pub use templates::{
    command_file_template, coordination_doc_template, memory_bank_template, memory_store_seed,
    mode_config_template, mode_template_file, playbook_template, wrapper_script,
};
