#![allow(dead_code)]

use async_trait::async_trait;
use comfy_panel::api::{Backend, LogSnapshot, ModelMap, StatusSnapshot, SubmitResponse, TaskStatus};
use comfy_panel::download::DownloadRequest;
use comfy_panel::{PanelError, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Backend that replays queued responses and records what it was asked
///
/// Empty queues fall back to: empty status, empty logs, a `downloading` task,
/// and a rejected submission.
#[derive(Default)]
pub struct ScriptedBackend {
    status: Mutex<VecDeque<Result<StatusSnapshot>>>,
    logs: Mutex<VecDeque<Result<LogSnapshot>>>,
    submits: Mutex<VecDeque<Result<SubmitResponse>>>,
    tasks: Mutex<VecDeque<Result<TaskStatus>>>,
    pub submitted: Mutex<Vec<DownloadRequest>>,
    pub polled_ids: Mutex<Vec<String>>,
    pub status_calls: AtomicUsize,
    pub log_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&self, result: Result<StatusSnapshot>) {
        self.status.lock().unwrap().push_back(result);
    }

    pub fn push_logs(&self, result: Result<LogSnapshot>) {
        self.logs.lock().unwrap().push_back(result);
    }

    pub fn push_submit(&self, result: Result<SubmitResponse>) {
        self.submits.lock().unwrap().push_back(result);
    }

    pub fn push_task(&self, result: Result<TaskStatus>) {
        self.tasks.lock().unwrap().push_back(result);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> usize {
        self.polled_ids.lock().unwrap().len()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn fetch_status(&self) -> Result<StatusSnapshot> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StatusSnapshot::default()))
    }

    async fn fetch_logs(&self) -> Result<LogSnapshot> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        self.logs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(LogSnapshot::default()))
    }

    async fn submit_download(&self, request: &DownloadRequest) -> Result<SubmitResponse> {
        self.submitted.lock().unwrap().push(request.clone());
        self.submits.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(PanelError::Api {
                status: 500,
                detail: "no scripted response".to_string(),
            })
        })
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatus> {
        self.polled_ids.lock().unwrap().push(task_id.to_string());
        self.tasks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(task("downloading", Some(""))))
    }
}

pub fn task(status: &str, detail: Option<&str>) -> TaskStatus {
    TaskStatus {
        status: status.to_string(),
        detail: detail.map(str::to_string),
    }
}

pub fn snapshot(nodes: &[&str], models: &[(&str, &[&str])]) -> StatusSnapshot {
    StatusSnapshot {
        custom_nodes: nodes.iter().map(|s| (*s).to_string()).collect(),
        models: models
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.iter().map(|s| (*s).to_string()).collect()))
            .collect::<ModelMap>(),
    }
}

pub fn logs(text: &str) -> LogSnapshot {
    LogSnapshot {
        logs: text.to_string(),
    }
}
