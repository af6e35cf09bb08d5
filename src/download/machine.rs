use crate::api::{SubmitResponse, TaskState, TaskStatus};
use crate::download::DownloadSource;
use crate::error::{PanelError, Result};

/// Lifecycle of one source's download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Submitting,
    Polling { task_id: String },
    Done,
    Error,
}

/// Styling of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Text shown in a source's status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusMessage {
    fn new(text: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    /// CSS-style class the host page uses for this status
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        match self.kind {
            StatusKind::Info => "status-message",
            StatusKind::Success => "status-message status-success",
            StatusKind::Error => "status-message status-error",
        }
    }
}

/// What a poll result means for the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Keep polling
    Continue,
    /// Terminal success; the caller refreshes the status view
    Completed,
    Failed,
    /// Result arrived while not polling (stale) and was dropped
    Ignored,
}

/// Per-source download state machine
///
/// Driven by results rather than timers: the caller submits and polls, then
/// feeds each result back through [`on_submitted`](Self::on_submitted) and
/// [`on_polled`](Self::on_polled).
#[derive(Debug, Clone)]
pub struct DownloadMachine {
    source: DownloadSource,
    phase: DownloadPhase,
    status: Option<StatusMessage>,
}

impl DownloadMachine {
    #[must_use]
    pub const fn new(source: DownloadSource) -> Self {
        Self {
            source,
            phase: DownloadPhase::Idle,
            status: None,
        }
    }

    #[must_use]
    pub const fn source(&self) -> DownloadSource {
        self.source
    }

    #[must_use]
    pub const fn phase(&self) -> &DownloadPhase {
        &self.phase
    }

    /// Last status line, `None` until the first submission
    #[must_use]
    pub const fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Trigger button state; disabled while submitting or polling
    #[must_use]
    pub const fn button_enabled(&self) -> bool {
        !matches!(
            self.phase,
            DownloadPhase::Submitting | DownloadPhase::Polling { .. }
        )
    }

    /// Task id while polling
    #[must_use]
    pub fn task_id(&self) -> Option<&str> {
        match &self.phase {
            DownloadPhase::Polling { task_id } => Some(task_id),
            _ => None,
        }
    }

    /// Enter `Submitting`; refused while a download is in flight
    pub fn begin(&mut self) -> Result<()> {
        if !self.button_enabled() {
            return Err(PanelError::DownloadInProgress(self.source));
        }

        self.phase = DownloadPhase::Submitting;
        self.status = Some(StatusMessage::new("Starting download...", StatusKind::Info));
        Ok(())
    }

    /// Apply the submission result; returns the task id to poll, if any
    pub fn on_submitted(&mut self, result: Result<SubmitResponse>) -> Option<String> {
        if self.phase != DownloadPhase::Submitting {
            tracing::debug!("{} submit result ignored in {:?}", self.source, self.phase);
            return None;
        }

        match result {
            Ok(SubmitResponse {
                task_id: Some(task_id),
            }) => {
                tracing::info!("{} download accepted as {task_id}", self.source);
                self.status = Some(StatusMessage::new("Downloading...", StatusKind::Info));
                self.phase = DownloadPhase::Polling {
                    task_id: task_id.clone(),
                };
                Some(task_id)
            }
            Ok(SubmitResponse { task_id: None }) => {
                tracing::warn!("{} download response had no task_id", self.source);
                self.fail("Unexpected response");
                None
            }
            Err(e) => {
                tracing::warn!("{} download submission failed: {}", self.source, e.summary());
                self.fail(e.summary());
                None
            }
        }
    }

    /// Apply one poll result
    pub fn on_polled(&mut self, result: Result<TaskStatus>) -> PollOutcome {
        if !matches!(self.phase, DownloadPhase::Polling { .. }) {
            return PollOutcome::Ignored;
        }

        let status = match result {
            Ok(status) => status,
            Err(e) => {
                // Non-OK responses and transport errors alike: try again next tick
                tracing::debug!("{} task poll failed: {}", self.source, e.summary());
                return PollOutcome::Continue;
            }
        };

        match status.state() {
            TaskState::Success => {
                tracing::info!("{} download completed", self.source);
                self.status = Some(StatusMessage::new("Download completed", StatusKind::Success));
                self.phase = DownloadPhase::Done;
                PollOutcome::Completed
            }
            TaskState::Failed(detail) => {
                // Server text as-is, even when empty
                let detail = detail.unwrap_or_default();
                tracing::warn!("{} download failed: {detail}", self.source);
                self.fail(format!("Download failed: {detail}"));
                PollOutcome::Failed
            }
            TaskState::Pending(state) => {
                tracing::trace!("{} task still {state}", self.source);
                PollOutcome::Continue
            }
        }
    }

    fn fail(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage::new(text, StatusKind::Error));
        self.phase = DownloadPhase::Error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: &str, detail: Option<&str>) -> Result<TaskStatus> {
        Ok(TaskStatus {
            status: status.to_string(),
            detail: detail.map(str::to_string),
        })
    }

    fn polling_machine() -> DownloadMachine {
        let mut machine = DownloadMachine::new(DownloadSource::Civitai);
        machine.begin().unwrap();
        machine.on_submitted(Ok(SubmitResponse {
            task_id: Some("abc".to_string()),
        }));
        machine
    }

    #[test]
    fn test_initial_state() {
        let machine = DownloadMachine::new(DownloadSource::HuggingFace);
        assert_eq!(machine.phase(), &DownloadPhase::Idle);
        assert!(machine.button_enabled());
        assert!(machine.status().is_none());
    }

    #[test]
    fn test_begin_disables_button() {
        let mut machine = DownloadMachine::new(DownloadSource::Civitai);
        machine.begin().unwrap();
        assert_eq!(machine.phase(), &DownloadPhase::Submitting);
        assert!(!machine.button_enabled());
        assert_eq!(machine.status().unwrap().text, "Starting download...");
        assert_eq!(machine.status().unwrap().class_name(), "status-message");
    }

    #[test]
    fn test_begin_refused_while_in_flight() {
        let mut machine = polling_machine();
        assert!(matches!(
            machine.begin(),
            Err(PanelError::DownloadInProgress(DownloadSource::Civitai))
        ));
        assert_eq!(machine.task_id(), Some("abc"));
    }

    #[test]
    fn test_submit_with_task_id_starts_polling() {
        let machine = polling_machine();
        assert_eq!(
            machine.phase(),
            &DownloadPhase::Polling {
                task_id: "abc".to_string()
            }
        );
        assert!(!machine.button_enabled());
        assert_eq!(machine.status().unwrap().text, "Downloading...");
    }

    #[test]
    fn test_submit_http_error_surfaces_detail() {
        let mut machine = DownloadMachine::new(DownloadSource::HuggingFace);
        machine.begin().unwrap();
        let task = machine.on_submitted(Err(PanelError::Api {
            status: 400,
            detail: "bad url".to_string(),
        }));

        assert!(task.is_none());
        assert_eq!(machine.phase(), &DownloadPhase::Error);
        assert!(machine.button_enabled());
        let status = machine.status().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.contains("bad url"));
    }

    #[test]
    fn test_submit_network_error_is_single_line() {
        let mut machine = DownloadMachine::new(DownloadSource::GoogleDrive);
        machine.begin().unwrap();
        machine.on_submitted(Err(PanelError::Network("connection refused".to_string())));

        let status = machine.status().unwrap();
        assert_eq!(status.text, "Network error: connection refused");
        assert!(machine.button_enabled());
    }

    #[test]
    fn test_submit_without_task_id() {
        let mut machine = DownloadMachine::new(DownloadSource::Civitai);
        machine.begin().unwrap();
        machine.on_submitted(Ok(SubmitResponse::default()));

        assert_eq!(machine.phase(), &DownloadPhase::Error);
        assert_eq!(machine.status().unwrap().text, "Unexpected response");
        assert!(machine.button_enabled());
    }

    #[test]
    fn test_poll_pending_and_errors_continue() {
        let mut machine = polling_machine();
        assert_eq!(machine.on_polled(task("downloading", Some(""))), PollOutcome::Continue);
        assert_eq!(machine.on_polled(task("pending", None)), PollOutcome::Continue);
        assert_eq!(
            machine.on_polled(Err(PanelError::Api {
                status: 404,
                detail: "Request failed".to_string()
            })),
            PollOutcome::Continue
        );
        assert_eq!(
            machine.on_polled(Err(PanelError::Network("reset".to_string()))),
            PollOutcome::Continue
        );
        assert_eq!(machine.status().unwrap().text, "Downloading...");
        assert!(!machine.button_enabled());
    }

    #[test]
    fn test_poll_success() {
        let mut machine = polling_machine();
        assert_eq!(
            machine.on_polled(task("success", Some("/models/x.safetensors"))),
            PollOutcome::Completed
        );
        assert_eq!(machine.phase(), &DownloadPhase::Done);
        assert!(machine.button_enabled());
        let status = machine.status().unwrap();
        assert_eq!(status.text, "Download completed");
        assert_eq!(status.class_name(), "status-message status-success");
    }

    #[test]
    fn test_poll_failed_shows_detail() {
        let mut machine = polling_machine();
        assert_eq!(
            machine.on_polled(task("failed", Some("HTTP Error 401: Unauthorized"))),
            PollOutcome::Failed
        );
        assert_eq!(machine.phase(), &DownloadPhase::Error);
        assert!(machine.button_enabled());
        assert_eq!(
            machine.status().unwrap().text,
            "Download failed: HTTP Error 401: Unauthorized"
        );
    }

    #[test]
    fn test_poll_failed_with_empty_detail() {
        let mut machine = polling_machine();
        machine.on_polled(task("failed", Some("")));
        assert_eq!(machine.status().unwrap().text, "Download failed: ");

        let mut machine = polling_machine();
        machine.on_polled(task("failed", None));
        assert_eq!(machine.status().unwrap().text, "Download failed: ");
        assert_eq!(machine.status().unwrap().kind, StatusKind::Error);
    }

    #[test]
    fn test_stale_results_ignored() {
        let mut machine = polling_machine();
        machine.on_polled(task("success", None));
        assert_eq!(machine.on_polled(task("failed", Some("late"))), PollOutcome::Ignored);
        assert_eq!(machine.status().unwrap().text, "Download completed");

        assert!(machine
            .on_submitted(Ok(SubmitResponse {
                task_id: Some("other".to_string())
            }))
            .is_none());
        assert_eq!(machine.phase(), &DownloadPhase::Done);
    }

    #[test]
    fn test_can_retry_after_terminal_state() {
        let mut machine = polling_machine();
        machine.on_polled(task("failed", Some("boom")));
        assert!(machine.begin().is_ok());
        assert_eq!(machine.phase(), &DownloadPhase::Submitting);
    }
}
