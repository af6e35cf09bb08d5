use crate::download::DownloadSource;
use thiserror::Error;

/// Main error type for comfy-panel
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Config error: {0}\n\nTroubleshooting:\n- Check config file: ~/.config/comfy-panel/config.toml\n- Intervals must be at least 1 second\n- Run with RUST_LOG=debug for more details")]
    Config(String),

    #[error("Network error: {0}\n\nTroubleshooting:\n- Is the helper server running? (default port 8189)\n- Check server.base_url in config or pass --base-url\n- Verify firewall settings")]
    Network(String),

    /// Non-OK HTTP response; `detail` is the server message when one was sent
    #[error("{detail}")]
    Api { status: u16, detail: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Unknown tab: {0}. Must be one of: civitai, huggingface, gdrive")]
    UnknownTab(String),

    #[error("A {0} download is already in progress")]
    DownloadInProgress(DownloadSource),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl PanelError {
    /// True for a non-OK HTTP response, as opposed to a transport failure
    #[must_use]
    pub const fn is_http_status(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// First line of the message, without the troubleshooting block
    #[must_use]
    pub fn summary(&self) -> String {
        let msg = self.to_string();
        msg.lines().next().unwrap_or_default().to_string()
    }
}

impl From<reqwest::Error> for PanelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, PanelError>;
