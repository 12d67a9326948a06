//! Configuration loading for brevityd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.brevity/config.toml` (user)
//! 3. `/etc/brevity/config.toml` (system)
//! 4. built-in defaults
//!
//! Everything outside `[server]` is the core [`BrevityConfig`]:
//!
//! ```toml
//! [server]
//! address = "127.0.0.1:5000"
//!
//! [device]
//! preference = "auto"
//!
//! [models.summarizer]
//! source = "local"
//! path = "/srv/models/t5-small"
//!
//! [policy]
//! summary_min_chars = 10
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::BrevityConfig;
use crate::{BrevityError, Result};

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(flatten)]
    pub core: BrevityConfig,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:5000).
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> String {
    "0.0.0.0:5000".to_string()
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist. Without one, the first existing file
    /// among the user and system locations is used, else the defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                info!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BrevityError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        let config = toml::from_str(&content).map_err(|e| {
            BrevityError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(BrevityError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".brevity").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/brevity/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}
