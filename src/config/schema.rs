use crate::error::{PanelError, Result};
use crate::view::tabs::Tab;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_comfy_port")]
    pub comfy_port: u16,
    #[serde(default = "default_jupyter_port")]
    pub jupyter_port: u16,
    /// No timeout when unset
    pub request_timeout_secs: Option<u64>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct PollingConfig {
    #[serde(default = "default_status_secs")]
    pub status_secs: u64,
    #[serde(default = "default_logs_secs")]
    pub logs_secs: u64,
    #[serde(default = "default_task_secs")]
    pub task_secs: u64,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct UiConfig {
    /// Used until the user toggles auto-scroll once
    #[serde(default = "default_true")]
    pub auto_scroll: bool,
    #[serde(default = "default_initial_tab")]
    pub initial_tab: Tab,
    #[serde(default = "default_log_rows")]
    pub log_rows: usize,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub enable: bool,
}

// Default value functions
fn default_base_url() -> String {
    "http://127.0.0.1:8189".to_string()
}
const fn default_comfy_port() -> u16 {
    8188
}
const fn default_jupyter_port() -> u16 {
    8888
}
const fn default_status_secs() -> u64 {
    15
}
const fn default_logs_secs() -> u64 {
    4
}
const fn default_task_secs() -> u64 {
    2
}
const fn default_true() -> bool {
    true
}
const fn default_initial_tab() -> Tab {
    Tab::Civitai
}
const fn default_log_rows() -> usize {
    20
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            comfy_port: default_comfy_port(),
            jupyter_port: default_jupyter_port(),
            request_timeout_secs: None,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            status_secs: default_status_secs(),
            logs_secs: default_logs_secs(),
            task_secs: default_task_secs(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            auto_scroll: default_true(),
            initial_tab: default_initial_tab(),
            log_rows: default_log_rows(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enable: default_true(),
        }
    }
}

impl PollingConfig {
    #[must_use]
    pub const fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_secs)
    }

    #[must_use]
    pub const fn logs_interval(&self) -> Duration {
        Duration::from_secs(self.logs_secs)
    }

    #[must_use]
    pub const fn task_interval(&self) -> Duration {
        Duration::from_secs(self.task_secs)
    }
}

impl Config {
    /// Check values serde cannot express
    pub fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("polling.status_secs", self.polling.status_secs),
            ("polling.logs_secs", self.polling.logs_secs),
            ("polling.task_secs", self.polling.task_secs),
        ] {
            if secs == 0 {
                return Err(PanelError::Config(format!("{name} must be at least 1")));
            }
        }

        if self.ui.log_rows == 0 {
            return Err(PanelError::Config("ui.log_rows must be at least 1".to_string()));
        }

        reqwest::Url::parse(&self.server.base_url).map_err(|e| {
            PanelError::Config(format!("Invalid server.base_url '{}': {e}", self.server.base_url))
        })?;

        Ok(())
    }
}
