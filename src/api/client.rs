use crate::api::{Backend, ErrorBody, LogSnapshot, StatusSnapshot, SubmitResponse, TaskStatus};
use crate::config::schema::ServerConfig;
use crate::download::DownloadRequest;
use crate::error::{PanelError, Result};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

const STATUS_PATH: &str = "/api/status";
const LOGS_PATH: &str = "/logs";
const TASK_STATUS_PATH: &str = "/download/status";

/// Helper server client over HTTP
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("client", &"Client { ... }")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl HttpBackend {
    /// Create new backend from config
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            PanelError::Config(format!("Invalid server.base_url '{}': {e}", config.base_url))
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| PanelError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| PanelError::Config(format!("Invalid endpoint {path}: {e}")))
    }

    /// GET that bypasses intermediate caches
    async fn get_fresh<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        tracing::trace!("GET {url}");

        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        decode(response, "Request failed").await
    }
}

/// Turn a response into `T`, or into `PanelError::Api` for non-OK statuses
async fn decode<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| fallback.to_string());

        return Err(PanelError::Api {
            status: status.as_u16(),
            detail,
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| PanelError::Decode(e.to_string()))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_status(&self) -> Result<StatusSnapshot> {
        self.get_fresh(STATUS_PATH).await
    }

    async fn fetch_logs(&self) -> Result<LogSnapshot> {
        self.get_fresh(LOGS_PATH).await
    }

    async fn submit_download(&self, request: &DownloadRequest) -> Result<SubmitResponse> {
        let url = self.endpoint(request.source().endpoint())?;
        tracing::debug!("POST {url}");

        let response = self.client.post(url).json(request).send().await?;
        decode(response, "Request failed").await
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatus> {
        let mut url = self.endpoint(TASK_STATUS_PATH)?;
        url.query_pairs_mut().append_pair("id", task_id);
        tracing::trace!("GET {url}");

        let response = self.client.get(url).send().await?;
        decode(response, "Request failed").await
    }
}
