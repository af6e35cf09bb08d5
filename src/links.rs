use crate::config::schema::ServerConfig;
use crate::error::{PanelError, Result};
use reqwest::Url;

/// Links to the services running next to the helper server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLinks {
    pub comfy: String,
    pub jupyter: String,
}

impl ServiceLinks {
    /// Same scheme and host as the helper server, fixed service ports
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            PanelError::Config(format!("Invalid server.base_url '{}': {e}", config.base_url))
        })?;
        let host = base
            .host_str()
            .ok_or_else(|| PanelError::Config(format!("{} has no host", config.base_url)))?;
        let origin = format!("{}://{host}", base.scheme());

        Ok(Self {
            comfy: format!(
                "{origin}:{}/?__theme=dark&__8080redirect=true",
                config.comfy_port
            ),
            jupyter: format!("{origin}:{}", config.jupyter_port),
        })
    }
}
