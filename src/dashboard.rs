//! The UI controller: owns every piece of dashboard state and applies fetch
//! results to it.
//!
//! Each refresh comes in two halves. `refresh_*` / `start_download` /
//! `poll_download` fetch and apply in one call; the `apply_*` methods take an
//! already-fetched result so the watch runner can fetch on spawned tasks and
//! apply on its own loop.

use crate::api::{Backend, LogSnapshot, StatusSnapshot, SubmitResponse, TaskStatus};
use crate::config::Config;
use crate::download::{
    is_known_model_type, DownloadMachine, DownloadRequest, DownloadSource, ModelType, PollOutcome,
};
use crate::error::Result;
use crate::links::ServiceLinks;
use crate::storage::{self, Storage};
use crate::view::{CustomNodesView, LogPanel, ModelsView, Tab, TabBar};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct Dashboard<B: Backend> {
    backend: Arc<B>,
    storage: Arc<dyn Storage>,
    links: ServiceLinks,
    nodes: CustomNodesView,
    models: ModelsView,
    logs: LogPanel,
    tabs: TabBar,
    downloads: BTreeMap<DownloadSource, DownloadMachine>,
    status_refreshed_at: Option<DateTime<Local>>,
}

impl<B: Backend> Dashboard<B> {
    /// Build the controller; the saved auto-scroll choice wins over config
    pub fn new(config: &Config, backend: Arc<B>, storage: Arc<dyn Storage>) -> Result<Self> {
        let auto_scroll = match storage::load_auto_scroll(storage.as_ref()) {
            Ok(Some(saved)) => saved,
            Ok(None) => config.ui.auto_scroll,
            Err(e) => {
                tracing::warn!("Could not read saved auto-scroll preference: {e}");
                config.ui.auto_scroll
            }
        };

        let downloads = DownloadSource::ALL
            .into_iter()
            .map(|s| (s, DownloadMachine::new(s)))
            .collect();

        Ok(Self {
            backend,
            storage,
            links: ServiceLinks::from_config(&config.server)?,
            nodes: CustomNodesView::default(),
            models: ModelsView::default(),
            logs: LogPanel::new(config.ui.log_rows, auto_scroll),
            tabs: TabBar::new(config.ui.initial_tab),
            downloads,
            status_refreshed_at: None,
        })
    }

    #[must_use]
    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }

    #[must_use]
    pub const fn links(&self) -> &ServiceLinks {
        &self.links
    }

    #[must_use]
    pub const fn nodes(&self) -> &CustomNodesView {
        &self.nodes
    }

    #[must_use]
    pub const fn models(&self) -> &ModelsView {
        &self.models
    }

    #[must_use]
    pub const fn logs(&self) -> &LogPanel {
        &self.logs
    }

    #[must_use]
    pub const fn tabs(&self) -> &TabBar {
        &self.tabs
    }

    /// When the status view was last replaced
    #[must_use]
    pub const fn status_refreshed_at(&self) -> Option<DateTime<Local>> {
        self.status_refreshed_at
    }

    #[must_use]
    pub fn download(&self, source: DownloadSource) -> &DownloadMachine {
        &self.downloads[&source]
    }

    fn machine_mut(&mut self, source: DownloadSource) -> &mut DownloadMachine {
        self.downloads
            .entry(source)
            .or_insert_with(|| DownloadMachine::new(source))
    }

    // --- Status ---

    /// Fetch and render status; returns whether the view changed
    pub async fn refresh_status(&mut self) -> bool {
        let result = self.backend.fetch_status().await;
        self.apply_status(result)
    }

    /// Replace both status views, or log and keep the old ones on failure
    pub fn apply_status(&mut self, result: Result<StatusSnapshot>) -> bool {
        match result {
            Ok(snapshot) => {
                self.nodes = CustomNodesView::from_nodes(Some(snapshot.custom_nodes.as_slice()));
                self.models = ModelsView::from_models(Some(&snapshot.models));
                self.status_refreshed_at = Some(Local::now());
                tracing::debug!(
                    nodes = self.nodes.count,
                    models = self.models.total,
                    "Status refreshed"
                );
                true
            }
            Err(e) => {
                tracing::error!("Failed to load status: {}", e.summary());
                false
            }
        }
    }

    // --- Logs ---

    /// Fetch and render logs; returns whether the view changed
    pub async fn refresh_logs(&mut self) -> bool {
        let result = self.backend.fetch_logs().await;
        self.apply_logs(result)
    }

    /// Non-OK responses are skipped quietly; transport errors are logged
    pub fn apply_logs(&mut self, result: Result<LogSnapshot>) -> bool {
        match result {
            Ok(snapshot) => {
                self.logs.update(&snapshot.logs);
                true
            }
            Err(e) if e.is_http_status() => {
                tracing::debug!("Skipping log refresh: {e}");
                false
            }
            Err(e) => {
                tracing::error!("Failed to fetch logs: {}", e.summary());
                false
            }
        }
    }

    /// Flip auto-scroll and persist the choice; returns the new value
    pub fn toggle_auto_scroll(&mut self) -> Result<bool> {
        let enabled = self.logs.toggle_auto_scroll();
        storage::save_auto_scroll(self.storage.as_ref(), enabled)?;
        tracing::info!("Auto-scroll {}", if enabled { "enabled" } else { "disabled" });
        Ok(enabled)
    }

    /// User scroll of the log box
    pub fn scroll_logs_to(&mut self, top: usize) {
        self.logs.scroll_to(top);
    }

    pub fn scroll_logs_by(&mut self, rows: isize) {
        self.logs.scroll_by(rows);
    }

    // --- Tabs ---

    pub fn switch_tab(&mut self, name: &str) -> Result<Tab> {
        self.tabs.switch(name)
    }

    pub fn activate_tab(&mut self, tab: Tab) {
        self.tabs.activate(tab);
    }

    // --- Downloads ---

    /// Move the request's machine to `Submitting`
    pub fn begin_download(&mut self, request: &DownloadRequest) -> Result<()> {
        let model_type = request.model_type();
        if !is_known_model_type(model_type) {
            match ModelType::suggest(model_type) {
                Some(suggestion) => tracing::warn!(
                    "Unknown model type '{model_type}', did you mean '{suggestion}'?"
                ),
                None => tracing::warn!(
                    "Unknown model type '{model_type}'. Known types: {}",
                    ModelType::all_names().join(", ")
                ),
            }
        }

        self.machine_mut(request.source()).begin()
    }

    /// Apply a submission result; returns the task id to start polling
    pub fn apply_submit(
        &mut self,
        source: DownloadSource,
        result: Result<SubmitResponse>,
    ) -> Option<String> {
        self.machine_mut(source).on_submitted(result)
    }

    /// Submit a download; returns the task id when the server accepted it
    pub async fn start_download(&mut self, request: DownloadRequest) -> Result<Option<String>> {
        self.begin_download(&request)?;
        tracing::info!("Submitting {} download of {}", request.source(), request.url());

        let result = self.backend.submit_download(&request).await;
        Ok(self.apply_submit(request.source(), result))
    }

    /// Apply one poll result
    pub fn apply_poll(&mut self, source: DownloadSource, result: Result<TaskStatus>) -> PollOutcome {
        self.machine_mut(source).on_polled(result)
    }

    /// Poll the source's task once; a completed download refreshes status
    pub async fn poll_download(&mut self, source: DownloadSource) -> PollOutcome {
        let Some(task_id) = self.download(source).task_id().map(str::to_string) else {
            return PollOutcome::Ignored;
        };

        let result = self.backend.task_status(&task_id).await;
        let outcome = self.apply_poll(source, result);
        if outcome == PollOutcome::Completed {
            self.refresh_status().await;
        }
        outcome
    }

    /// Sources with a task currently being polled
    #[must_use]
    pub fn polling_tasks(&self) -> Vec<(DownloadSource, String)> {
        self.downloads
            .values()
            .filter_map(|m| m.task_id().map(|id| (m.source(), id.to_string())))
            .collect()
    }
}

impl<B: Backend> std::fmt::Debug for Dashboard<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("links", &self.links)
            .field("nodes", &self.nodes.count)
            .field("models", &self.models.total)
            .field("active_tab", &self.tabs.active())
            .field("downloads", &self.downloads)
            .finish_non_exhaustive()
    }
}

