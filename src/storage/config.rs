//! JSON Configuration Management
//!
//! Loads the application configuration file, writing defaults on first run,
//! and overlays secrets from the environment.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::models::settings::AppConfig;
use crate::utils::error::AppResult;
use crate::utils::paths::{config_path, ensure_dir};

/// Configuration service for managing app settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Load `~/.citerag/config.json`, creating it with defaults if missing.
    pub fn new() -> AppResult<Self> {
        Self::load(&config_path()?)
    }

    /// Load `path`, creating it with defaults if missing, then apply the
    /// process environment.
    pub fn load(path: &Path) -> AppResult<Self> {
        let mut service = Self::load_without_env(path)?;
        service.config.apply_env(|key| std::env::var(key).ok());
        service.config.apply_shared_proxy();
        Ok(service)
    }

    fn load_without_env(path: &Path) -> AppResult<Self> {
        let config = if path.exists() {
            debug!(path = %path.display(), "loading config");
            Self::load_from_file(path)?
        } else {
            let default_config = AppConfig::default();
            if let Some(parent) = path.parent() {
                ensure_dir(parent)?;
            }
            Self::save_to_file(path, &default_config)?;
            info!(path = %path.display(), "wrote default config");
            default_config
        };

        Ok(Self {
            config_path: path.to_path_buf(),
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &AppConfig) -> AppResult<()> {
        config.validate()?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Save the current configuration to disk. Secrets are not written.
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.config)
    }
}
