#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequirement {
    pub name: String,
    pub version_flag: String,
    pub install_command: Option<String>,
}

impl ToolRequirement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version_flag: "--version".to_string(),
            install_command: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitConfig {
    pub expected_modes: Vec<String>,
    pub required_tools: Vec<ToolRequirement>,
    pub optional_tools: Vec<ToolRequirement>,
    pub required_env_vars: Vec<String>,
    pub min_free_space_mb: f64,
    pub low_free_space_mb: f64,
    pub backup_keep_count: usize,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            expected_modes: [
                "architect",
                "build",
                "debug",
                "document",
                "orchestrate",
                "research",
                "test",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            required_tools: vec![ToolRequirement::new("git")],
            optional_tools: vec![ToolRequirement::new("rg"), ToolRequirement::new("tar")],
            required_env_vars: Vec::new(),
            min_free_space_mb: 100.0,
            low_free_space_mb: 500.0,
            backup_keep_count: 5,
        }
    }
}
