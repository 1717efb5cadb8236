#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitPhase {
    ModeScaffold,
    CommandSurface,
    MemorySetup,
    CoordinationSetup,
    WrapperCreation,
}

impl InitPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModeScaffold => "mode-scaffold",
            Self::CommandSurface => "command-surface",
            Self::MemorySetup => "memory-setup",
            Self::CoordinationSetup => "coordination-setup",
            Self::WrapperCreation => "wrapper-creation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mode-scaffold" => Some(Self::ModeScaffold),
            "command-surface" => Some(Self::CommandSurface),
            "memory-setup" => Some(Self::MemorySetup),
            "coordination-setup" => Some(Self::CoordinationSetup),
            "wrapper-creation" => Some(Self::WrapperCreation),
            _ => None,
        }
    }

    pub fn all() -> [Self; 5] {
        [
            Self::ModeScaffold,
            Self::CommandSurface,
            Self::MemorySetup,
            Self::CoordinationSetup,
            Self::WrapperCreation,
        ]
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Self::ModeScaffold => "mode catalog and templates",
            Self::CommandSurface => "per-mode command files",
            Self::MemorySetup => "memory state tree",
            Self::CoordinationSetup => "coordination state tree",
            Self::WrapperCreation => "executable wrapper",
        }
    }
}
