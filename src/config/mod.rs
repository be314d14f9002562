//! Configuration Management
//!
//! This module handles loading and saving the shelter database configuration.
//!
//! # Configuration Locations
//! - Local: `.getpet/config.json` (per-project, in the current directory)
//! - Global: `~/.config/getpet/config.json` (per-user)
//!
//! # Resolution Precedence
//! 1. Explicit overrides from CLI flags or `GETPET_DATABASE` (highest priority)
//! 2. Local config file (`.getpet/config.json`)
//! 3. Global config file (`~/.config/getpet/config.json`)
//! 4. Built-in defaults: in-memory database with sample data
//!
//! Each file may set any subset of the fields; unset fields fall through to the
//! next layer. A missing file is an empty layer, a malformed one is an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ShelterError};

/// Database path that opens a private in-memory store
pub const IN_MEMORY: &str = ":memory:";

/// Fully resolved configuration used to open the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelterConfig {
    /// Database file path, or `:memory:`
    pub database: PathBuf,

    /// Load the bundled sample animals into an empty store
    pub sample_data: bool,

    /// How long to wait on a locked database before failing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busy_timeout_ms: Option<u64>,
}

impl Default for ShelterConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(IN_MEMORY),
            sample_data: true,
            busy_timeout_ms: None,
        }
    }
}

impl ShelterConfig {
    /// Whether the configured database lives only in memory
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.database.as_os_str() == IN_MEMORY
    }

    /// Resolve configuration from the standard file locations
    pub fn resolve(overrides: ConfigLayer) -> Result<Self> {
        resolve_from(overrides, &local_config_path()?, &global_config_path()?)
    }
}

/// One partial layer of configuration, as stored in a config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_data: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub busy_timeout_ms: Option<u64>,
}

impl ConfigLayer {
    /// Fill fields unset in `self` from `lower`
    #[must_use]
    pub fn or(self, lower: Self) -> Self {
        Self {
            database: self.database.or(lower.database),
            sample_data: self.sample_data.or(lower.sample_data),
            busy_timeout_ms: self.busy_timeout_ms.or(lower.busy_timeout_ms),
        }
    }

    /// Complete the layer with built-in defaults
    #[must_use]
    pub fn finish(self) -> ShelterConfig {
        let defaults = ShelterConfig::default();
        ShelterConfig {
            database: self.database.unwrap_or(defaults.database),
            sample_data: self.sample_data.unwrap_or(defaults.sample_data),
            busy_timeout_ms: self.busy_timeout_ms.or(defaults.busy_timeout_ms),
        }
    }
}

impl From<&ShelterConfig> for ConfigLayer {
    fn from(config: &ShelterConfig) -> Self {
        Self {
            database: Some(config.database.clone()),
            sample_data: Some(config.sample_data),
            busy_timeout_ms: config.busy_timeout_ms,
        }
    }
}

/// Configuration file location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Local config: `.getpet/config.json`
    Local,
    /// Global config: `~/.config/getpet/config.json`
    Global,
}

impl ConfigLocation {
    /// Path of the config file for this location
    pub fn path(self) -> Result<PathBuf> {
        match self {
            Self::Local => local_config_path(),
            Self::Global => global_config_path(),
        }
    }
}

/// Get path to local config file (`.getpet/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        ShelterError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(".getpet").join("config.json"))
}

/// Get path to global config file (`~/.config/getpet/config.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ShelterError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("getpet").join("config.json"))
}

/// Load one configuration layer; a missing file yields an empty layer
pub fn load_layer(path: &Path) -> Result<ConfigLayer> {
    if !path.exists() {
        return Ok(ConfigLayer::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| ShelterError::config_error(format!("Could not read config file: {e}")))?;

    serde_json::from_str(&contents).map_err(|e| {
        ShelterError::config_error(format!(
            "Invalid config file format in '{}': {e}",
            path.display()
        ))
    })
}

/// Save one configuration layer, creating the parent directory if needed
pub fn save_layer(path: &Path, layer: &ConfigLayer) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            ShelterError::config_error(format!("Could not create config directory: {e}"))
        })?;
    }

    let contents = serde_json::to_string_pretty(layer)
        .map_err(|e| ShelterError::config_error(format!("Could not serialize config: {e}")))?;

    fs::write(path, contents)
        .map_err(|e| ShelterError::config_error(format!("Could not write config file: {e}")))
}

/// Resolve configuration from explicit file paths
pub fn resolve_from(overrides: ConfigLayer, local: &Path, global: &Path) -> Result<ShelterConfig> {
    let local_layer = load_layer(local)?;
    let global_layer = load_layer(global)?;

    tracing::debug!(
        local = %local.display(),
        global = %global.display(),
        "Resolved configuration layers"
    );

    Ok(overrides.or(local_layer).or(global_layer).finish())
}

/// Persist a resolved configuration to a config file location
///
/// Returns the path written.
pub fn save_config(config: &ShelterConfig, location: ConfigLocation) -> Result<PathBuf> {
    let path = location.path()?;
    save_layer(&path, &ConfigLayer::from(config))?;
    Ok(path)
}
