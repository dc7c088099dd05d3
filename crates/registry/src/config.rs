//! Registry configuration file.
//!
//! A JSON file naming the command libraries to register at startup, for
//! installs where setting environment variables is inconvenient. The env
//! variable path override follows the usual precedence: explicit path env
//! var, then the platform config directory.

use std::{env, io::Error, path::PathBuf};

use dirs_next::config_dir;
use serde::{Deserialize, Serialize};

use opdeck_types::RegistryError;

use crate::{CommandRegistry, LibraryCatalog};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "OPDECK_CONFIG_PATH";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Names of the libraries to register, resolved against the
    /// [`LibraryCatalog`] at startup.
    #[serde(default)]
    pub libraries: Vec<String>,
}

impl RegistryConfig {
    /// Loads the config file, falling back to the default (no libraries)
    /// when the file is absent or unreadable.
    pub fn load() -> Self {
        let path = default_config_path();
        if let Ok(content) = std::fs::read_to_string(&path)
            && let Ok(config) = serde_json::from_str(&content)
        {
            return config;
        }
        RegistryConfig::default()
    }

    /// Writes the config file, creating the parent directory when needed.
    pub fn save(&self) -> Result<(), Error> {
        let path = default_config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

impl CommandRegistry {
    /// Registers the libraries a config file selects. Same atomicity as
    /// [`CommandRegistry::register_selection`].
    pub fn register_from_config(&mut self, config: &RegistryConfig, catalog: &LibraryCatalog) -> Result<usize, RegistryError> {
        self.register_selection(config.libraries.iter().map(String::as_str), catalog)
    }
}

/// The config file location: `$OPDECK_CONFIG_PATH` when set, otherwise
/// `<config dir>/opdeck/registry.json`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return PathBuf::from(path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("opdeck")
        .join("registry.json")
}
