//! Helper server API: wire types and the backend seam the dashboard talks through.

pub mod client;

use crate::download::DownloadRequest;
use crate::error::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use client::HttpBackend;

/// Category name to file names, in the order the server listed them
pub type ModelMap = IndexMap<String, Vec<String>>;

/// `GET /api/status` response
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub custom_nodes: Vec<String>,
    #[serde(default)]
    pub models: ModelMap,
}

/// `GET /logs` response
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSnapshot {
    #[serde(default)]
    pub logs: String,
}

/// `POST /download/*` success body
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitResponse {
    pub task_id: Option<String>,
}

/// `GET /download/status` response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    pub status: String,
    pub detail: Option<String>,
}

/// Interpreted task status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Success,
    Failed(Option<String>),
    /// Anything else, including the server's `downloading`
    Pending(String),
}

impl TaskStatus {
    #[must_use]
    pub fn state(&self) -> TaskState {
        match self.status.as_str() {
            "success" => TaskState::Success,
            "failed" => TaskState::Failed(self.detail.clone()),
            other => TaskState::Pending(other.to_string()),
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self.state(), TaskState::Pending(_))
    }
}

/// Error body the server sends with non-OK responses
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ErrorBody {
    pub detail: Option<String>,
}

/// Everything the dashboard needs from the helper server
///
/// Non-OK HTTP responses come back as [`crate::PanelError::Api`] so callers can
/// tell them apart from transport failures.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch custom nodes and installed models
    async fn fetch_status(&self) -> Result<StatusSnapshot>;

    /// Fetch the tail of the server log
    async fn fetch_logs(&self) -> Result<LogSnapshot>;

    /// Submit a download to the endpoint of its source
    async fn submit_download(&self, request: &DownloadRequest) -> Result<SubmitResponse>;

    /// Look up a download task by id
    async fn task_status(&self, task_id: &str) -> Result<TaskStatus>;
}
