use clap::ValueEnum;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    /// Workspace server configuration
    Serve,
    /// Workspace sync configuration
    Sync,
}

fn default_api_port() -> u16 {
    3000
}

/// Workspace configuration file structure
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Configuration type ("serve" or "sync")
    pub config_type: ConfigType,
    /// Workspace name - one plant/team's isolated dataset (required)
    pub workspace: String,
    /// Directory holding the workspace database (default: data)
    pub output_dir: Option<PathBuf>,
    /// API server port (default: 3000)
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Remote sync configuration (maps to [sync] section in TOML)
    pub sync: Option<SyncSection>,
}

/// Remote sync configuration (maps to [sync] section in TOML)
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSection {
    /// URL of the remote workspace server (e.g., http://remote:3000)
    pub remote_url: String,
    /// Chunk size for batch fetching (default: 200)
    pub chunk_size: Option<u64>,
}

impl AppConfig {
    /// Path of the workspace database file
    pub fn database_path(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("data"))
            .join(format!("{}.sqlite", self.workspace))
    }

    /// Validate the configuration for the requested mode
    pub fn validate(&self) -> Result<(), String> {
        if self.workspace.trim().is_empty() {
            return Err("workspace must not be empty".to_string());
        }

        if self.config_type == ConfigType::Sync && self.sync.is_none() {
            return Err(
                "config_type is 'sync' but the [sync] section is missing in config".to_string(),
            );
        }

        Ok(())
    }
}

/// Load and validate a configuration file
pub fn load_config(path: &std::path::Path) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;
    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;
    config.validate()?;
    Ok(config)
}
