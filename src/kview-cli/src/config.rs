//! Configuration management for kview CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{ConfigKey, TargetArgs};
use kview::TargetPaths;

/// Default target paths, stored as `~/.config/kview/config.toml`
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub core: Option<PathBuf>,
    pub kallsyms: Option<PathBuf>,
    pub btf: Option<PathBuf>,
    pub release: Option<String>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("kview");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    pub fn get(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::Core => self.core.as_ref().map(|p| p.display().to_string()),
            ConfigKey::Kallsyms => self.kallsyms.as_ref().map(|p| p.display().to_string()),
            ConfigKey::Btf => self.btf.as_ref().map(|p| p.display().to_string()),
            ConfigKey::Release => self.release.clone(),
        }
    }

    /// Set or (with `None`) clear one setting
    pub fn set(&mut self, key: ConfigKey, value: Option<String>) {
        match key {
            ConfigKey::Core => self.core = value.map(PathBuf::from),
            ConfigKey::Kallsyms => self.kallsyms = value.map(PathBuf::from),
            ConfigKey::Btf => self.btf = value.map(PathBuf::from),
            ConfigKey::Release => self.release = value,
        }
    }

    /// Target paths with command-line and environment values taking
    /// precedence over this config, and the live system as the fallback
    pub fn target_paths(&self, args: &TargetArgs) -> TargetPaths {
        let defaults = TargetPaths::default();
        TargetPaths {
            core: args
                .core
                .clone()
                .or_else(|| self.core.clone())
                .unwrap_or(defaults.core),
            kallsyms: args
                .kallsyms
                .clone()
                .or_else(|| self.kallsyms.clone())
                .unwrap_or(defaults.kallsyms),
            btf: args
                .btf
                .clone()
                .or_else(|| self.btf.clone())
                .unwrap_or(defaults.btf),
            release: args.release.clone().or_else(|| self.release.clone()),
        }
    }
}
