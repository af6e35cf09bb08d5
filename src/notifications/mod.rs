use crate::config::schema::NotificationConfig;
use crate::download::{DownloadMachine, PollOutcome};
use notify_rust::Notification;

const APP_NAME: &str = "comfy-panel";

/// Desktop notification manager
pub struct NotificationManager {
    config: NotificationConfig,
}

impl NotificationManager {
    #[must_use]
    pub const fn new(config: NotificationConfig) -> Self {
        Self { config }
    }

    /// Announce a terminal poll outcome; other outcomes are ignored
    pub fn download_finished(&self, machine: &DownloadMachine, outcome: &PollOutcome) {
        let summary = match outcome {
            PollOutcome::Completed => format!("{} download completed", machine.source()),
            PollOutcome::Failed => format!("{} download failed", machine.source()),
            PollOutcome::Continue | PollOutcome::Ignored => return,
        };
        let body = machine
            .status()
            .map(|s| s.text.clone())
            .unwrap_or_default();

        self.send(&summary, &body);
    }

    fn send(&self, summary: &str, body: &str) {
        if !self.config.enable {
            return;
        }

        if let Err(e) = Notification::new()
            .appname(APP_NAME)
            .summary(summary)
            .body(body)
            .show()
        {
            tracing::warn!("Failed to show notification: {e}");
        }
    }
}
