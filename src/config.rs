//! Application configuration.
//!
//! Settings that belong to the installation rather than to any one
//! profile: where the profile store lives and how runs are rendered.
//!
//! Configuration is TOML and is looked up in this order:
//! 1. An explicitly provided path
//! 2. `.datetidyrc.toml` in the current directory
//! 3. `~/.config/datetidy/config.toml`
//! 4. Built-in defaults
//!
//! ```toml
//! [store]
//! path = "/backup/datetidy/profiles.json"
//!
//! [output]
//! progress = false
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Profile store location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Overrides the default store path under the user's config directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Render a progress bar during runs. Defaults to true.
    #[serde(default = "default_progress")]
    pub progress: bool,
}

fn default_progress() -> bool {
    true
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            progress: default_progress(),
        }
    }
}

impl AppConfig {
    /// Load configuration with the standard lookup cascade.
    ///
    /// # Errors
    ///
    /// Returns an error only when an explicitly provided file cannot be
    /// read; the implicit locations fall through to defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".datetidyrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("datetidy")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Resolves the profile store location: the configured override, or
    /// `~/.config/datetidy/profiles.json`, or a local fallback when no
    /// home directory is known.
    pub fn profile_store_path(&self) -> PathBuf {
        if let Some(path) = &self.store.path {
            return path.clone();
        }
        match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home)
                .join(".config")
                .join("datetidy")
                .join("profiles.json"),
            Err(_) => PathBuf::from(".datetidy_profiles.json"),
        }
    }
}
