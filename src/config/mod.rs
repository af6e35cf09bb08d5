//! Configuration module for comfy-panel
//!
//! Loads config from `$XDG_CONFIG_HOME/comfy-panel/config.toml` or `~/.config/comfy-panel/config.toml`.
//! Falls back to embedded defaults if file doesn't exist.
//! Partial configs are merged with defaults using serde's default attributes.
//!
//! # Example
//!
//! ```no_run
//! use comfy_panel::config::Config;
//!
//! let config = Config::load().expect("Failed to load config");
//! println!("Server: {}", config.server.base_url);
//! println!("Status refresh: {}s", config.polling.status_secs);
//! ```

pub mod schema;

pub use schema::Config;

use crate::error::{PanelError, Result};
use std::path::{Path, PathBuf};

impl Config {
    /// Load config from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load config from a specific file, or defaults if absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PanelError::Config(format!("Failed to parse {}: {e}", path.display())))?;

        config.validate()?;
        Ok(config)
    }
}

/// Get config file path
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| PanelError::Config("Could not determine config directory".to_string()))?;
    Ok(config_dir.join("comfy-panel/config.toml"))
}

/// Get path of the persisted UI state file
pub fn state_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| PanelError::Config("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("comfy-panel/state.json"))
}
