// TOML config adapter - Configuration files in TOML format

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::AppConfig;
use crate::error::{ReelError, ReelResult};

/// Locations searched when no config file is given explicitly
const CANDIDATE_PATHS: &[&str] = &["reelmash.toml", "config/reelmash.toml"];

/// TOML configuration adapter
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    pub fn new() -> Self {
        Self
    }

    /// First existing candidate config file, relative to `base`
    pub fn discover(&self, base: &Path) -> Option<PathBuf> {
        CANDIDATE_PATHS
            .iter()
            .map(|candidate| base.join(candidate))
            .find(|path| path.is_file())
    }

    /// Load a config file; keys absent from the file keep their defaults
    pub fn load_config(&self, file_path: &Path) -> ReelResult<AppConfig> {
        if !file_path.exists() {
            return Err(ReelError::ConfigError {
                message: format!("Config file does not exist: {}", file_path.display()),
            });
        }

        let content = std::fs::read_to_string(file_path)?;
        let config =
            AppConfig::from_toml_str(&content).map_err(|source| ReelError::ConfigParseError {
                path: file_path.display().to_string(),
                source,
            })?;

        info!("Loaded configuration from {}", file_path.display());
        Ok(config)
    }

    /// Write `config` as TOML, creating parent directories
    pub fn save_config(&self, config: &AppConfig, file_path: &Path) -> ReelResult<()> {
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| ReelError::ConfigError {
            message: format!("Failed to serialize configuration: {}", e),
        })?;
        std::fs::write(file_path, content)?;
        Ok(())
    }
}
