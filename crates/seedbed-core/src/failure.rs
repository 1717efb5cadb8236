#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    PermissionDenied,
    DiskSpace,
    MissingDependencies,
    CorruptedConfig,
    PartialInitialization,
    ModeScaffoldFailure,
    WrapperCreationFailure,
    MemorySetupFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission-denied",
            Self::DiskSpace => "disk-space",
            Self::MissingDependencies => "missing-dependencies",
            Self::CorruptedConfig => "corrupted-config",
            Self::PartialInitialization => "partial-initialization",
            Self::ModeScaffoldFailure => "mode-scaffold-failure",
            Self::WrapperCreationFailure => "wrapper-creation-failure",
            Self::MemorySetupFailure => "memory-setup-failure",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "permission-denied" => Some(Self::PermissionDenied),
            "disk-space" => Some(Self::DiskSpace),
            "missing-dependencies" => Some(Self::MissingDependencies),
            "corrupted-config" => Some(Self::CorruptedConfig),
            "partial-initialization" => Some(Self::PartialInitialization),
            "mode-scaffold-failure" => Some(Self::ModeScaffoldFailure),
            "wrapper-creation-failure" => Some(Self::WrapperCreationFailure),
            "memory-setup-failure" => Some(Self::MemorySetupFailure),
            _ => None,
        }
    }

    pub fn all() -> [Self; 8] {
        [
            Self::PermissionDenied,
            Self::DiskSpace,
            Self::MissingDependencies,
            Self::CorruptedConfig,
            Self::PartialInitialization,
            Self::ModeScaffoldFailure,
            Self::WrapperCreationFailure,
            Self::MemorySetupFailure,
        ]
    }
}
