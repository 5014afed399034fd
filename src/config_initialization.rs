//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::adapters::TomlConfigAdapter;
use crate::config::AppConfig;
use crate::error::{ReelError, ReelResult};

/// Values supplied on the command line, highest precedence
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
}

/// Resolve the effective configuration for this process:
/// CLI > environment (including `.env`) > TOML file > defaults
pub fn initialize_configuration(overrides: &ConfigOverrides) -> ReelResult<AppConfig> {
    match dotenv::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(_) => debug!("No .env file found"),
    }

    let base = std::env::current_dir()?;
    resolve_configuration(overrides, &base, |key| std::env::var(key).ok())
}

/// Same hierarchy with an explicit working directory and environment lookup
pub fn resolve_configuration<F>(
    overrides: &ConfigOverrides,
    base: &Path,
    env_lookup: F,
) -> ReelResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let adapter = TomlConfigAdapter::new();

    let mut config = match &overrides.config_file {
        Some(path) => {
            if !path.is_file() {
                return Err(ReelError::ConfigError {
                    message: format!("Configuration file not found: {}", path.display()),
                });
            }
            adapter.load_config(path)?
        }
        None => match adapter.discover(base) {
            Some(path) => adapter.load_config(&path)?,
            None => {
                debug!("No configuration file, using defaults");
                AppConfig::default()
            }
        },
    };

    let env_overrides = config.apply_overrides(env_lookup)?;
    if env_overrides > 0 {
        info!("Applied {} environment variable override(s)", env_overrides);
    }

    if let Some(dir) = &overrides.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(dir) = &overrides.temp_dir {
        config.temp_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::tempdir;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let dir = tempdir().unwrap();
        let config = resolve_configuration(&ConfigOverrides::default(), dir.path(), env(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("reelmash.toml"),
            "output_dir = \"from-file\"\nclips_per_video = 5\nmax_video_length = 40\n",
        )
        .unwrap();

        let overrides = ConfigOverrides {
            output_dir: Some(PathBuf::from("from-cli")),
            ..Default::default()
        };
        let config = resolve_configuration(
            &overrides,
            dir.path(),
            env(&[("OUTPUT_DIR", "from-env"), ("CLIPS_PER_VIDEO", "4")]),
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("from-cli"));
        assert_eq!(config.clips_per_video, 4);
        assert_eq!(config.max_video_length, 40);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let overrides = ConfigOverrides {
            config_file: Some(dir.path().join("absent.toml")),
            ..Default::default()
        };
        let err = resolve_configuration(&overrides, dir.path(), env(&[])).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_result_is_rejected() {
        let dir = tempdir().unwrap();
        let err = resolve_configuration(
            &ConfigOverrides::default(),
            dir.path(),
            env(&[("MIN_VIDEO_LENGTH", "90"), ("MAX_VIDEO_LENGTH", "30")]),
        )
        .unwrap_err();
        assert!(matches!(err, ReelError::Domain(_)));
    }
}
