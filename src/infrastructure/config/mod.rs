use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use tracing_subscriber::EnvFilter;

use crate::domain::error::{AppError, Result};
use crate::domain::export::PostProcessConfig;

pub const DEFAULT_CONFIG_FILE: &str = "scribe_export.toml";
pub const ENV_PREFIX: &str = "SCRIBE_EXPORT_";

/// Layered configuration: defaults, then an optional TOML file, then
/// `SCRIBE_EXPORT_*` environment variables
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::with_file(DEFAULT_CONFIG_FILE)
    }

    pub fn with_file(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn figment(&self) -> Figment {
        Figment::from(Serialized::defaults(PostProcessConfig::default()))
            .merge(Toml::file(&self.path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(&self) -> Result<PostProcessConfig> {
        let config: PostProcessConfig = self.figment().extract().map_err(|e| {
            AppError::ConfigError(format!(
                "Failed to load config from {}: {}",
                self.path.display(),
                e
            ))
        })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigError(format!("Invalid post-processing config: {}", e)))?;

        EnvFilter::try_new(&config.log_filter).map_err(|e| {
            AppError::ConfigError(format!("Invalid log_filter {:?}: {}", config.log_filter, e))
        })?;

        tracing::debug!(path = %self.path.display(), "Loaded post-processing config");
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
