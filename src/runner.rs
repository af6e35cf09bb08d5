//! Live dashboard loop.
//!
//! One `select!` loop owns the [`Dashboard`]. Timers spawn fetches, fetches
//! report back over channels, and every state change happens on the loop, so
//! a slow request never holds up the other timers.

use crate::api::{Backend, LogSnapshot, StatusSnapshot, SubmitResponse};
use crate::config::schema::PollingConfig;
use crate::dashboard::Dashboard;
use crate::download::{DownloadRequest, DownloadSource, PollOutcome};
use crate::error::{PanelError, Result};
use crate::notifications::NotificationManager;
use crate::render;
use crate::schedule::{spawn_task_poller, Repeating, TaskPoll};
use crate::view::Tab;
use std::collections::HashMap;
use std::io::Write;
use std::str::FromStr;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Usage text for interactive commands
pub const COMMAND_HELP: &str = "\
Commands:
  tab <civitai|huggingface|gdrive>      switch downloader tab
  autoscroll                            toggle log auto-scroll
  scroll <row> | up [n] | down [n]      scroll the log box
  bottom                                jump to the newest log line
  refresh                               refresh status and logs now
  civitai <url> <model_type> [api_key]  download from Civitai
  hf <url> <model_type>                 download from HuggingFace
  gdrive <url|id> <model_type> [file]   download from Google Drive
  quit";

/// Interactive command for the watch loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tab(String),
    ToggleAutoScroll,
    ScrollTo(usize),
    ScrollBy(isize),
    Bottom,
    Refresh,
    Download(DownloadRequest),
    Quit,
}

fn usage(msg: &str) -> PanelError {
    PanelError::Other(format!("{msg}\n\n{COMMAND_HELP}"))
}

/// Row count for `up`/`down`; a magnitude that always fits in `isize`
fn parse_rows(arg: Option<&str>) -> Result<isize> {
    let Some(a) = arg else {
        return Ok(1);
    };
    a.parse::<usize>()
        .ok()
        .and_then(|n| isize::try_from(n).ok())
        .ok_or_else(|| usage(&format!("Invalid row count: {a}")))
}

impl FromStr for Command {
    type Err = PanelError;

    fn from_str(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (&name, args) = parts.split_first().ok_or_else(|| usage("Empty command"))?;

        match (name, args) {
            ("tab", [tab]) => Ok(Self::Tab((*tab).to_string())),
            ("autoscroll", []) => Ok(Self::ToggleAutoScroll),
            ("scroll", [row]) => row
                .parse()
                .map(Self::ScrollTo)
                .map_err(|_| usage(&format!("Invalid row: {row}"))),
            ("up", [] | [_]) => Ok(Self::ScrollBy(-parse_rows(args.first().copied())?)),
            ("down", [] | [_]) => Ok(Self::ScrollBy(parse_rows(args.first().copied())?)),
            ("bottom", []) => Ok(Self::Bottom),
            ("refresh", []) => Ok(Self::Refresh),
            ("civitai", [url, model_type]) => {
                Ok(Self::Download(DownloadRequest::civitai(url, "", model_type)))
            }
            ("civitai", [url, model_type, api_key]) => Ok(Self::Download(
                DownloadRequest::civitai(url, api_key, model_type),
            )),
            ("hf", [url, model_type]) => {
                Ok(Self::Download(DownloadRequest::huggingface(url, model_type)))
            }
            ("gdrive", [url, model_type]) => Ok(Self::Download(DownloadRequest::google_drive(
                url, model_type, "",
            ))),
            ("gdrive", [url, model_type, filename]) => Ok(Self::Download(
                DownloadRequest::google_drive(url, model_type, filename),
            )),
            ("quit" | "q" | "exit", []) => Ok(Self::Quit),
            _ => Err(usage(&format!("Unrecognized command: {line}"))),
        }
    }
}

/// Fetch results coming back to the loop
#[derive(Debug)]
enum Event {
    Status(Result<StatusSnapshot>),
    Logs(Result<LogSnapshot>),
    Submitted(DownloadSource, Result<SubmitResponse>),
}

/// Watch loop state
pub struct Runner<B: Backend + 'static> {
    dashboard: Dashboard<B>,
    polling: PollingConfig,
    notifier: NotificationManager,
    pollers: HashMap<DownloadSource, JoinHandle<()>>,
}

impl<B: Backend + 'static> Runner<B> {
    #[must_use]
    pub fn new(
        dashboard: Dashboard<B>,
        polling: PollingConfig,
        notifier: NotificationManager,
    ) -> Self {
        Self {
            dashboard,
            polling,
            notifier,
            pollers: HashMap::new(),
        }
    }

    /// Run until `Quit`; returns the final dashboard state
    ///
    /// A closed command channel leaves the dashboard running without input.
    pub async fn run<W: Write>(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut out: W,
    ) -> Result<Dashboard<B>> {
        let (event_tx, mut event_rx) = mpsc::channel::<Event>(32);
        let (poll_tx, mut poll_rx) = mpsc::channel::<TaskPoll>(32);

        let mut status_timer = Repeating::immediate(self.polling.status_interval());
        let mut logs_timer = Repeating::immediate(self.polling.logs_interval());
        let mut commands_open = true;

        tracing::info!(
            "Watching {}s status / {}s logs",
            self.polling.status_secs,
            self.polling.logs_secs
        );

        loop {
            tokio::select! {
                () = status_timer.tick() => self.spawn_status(&event_tx),
                () = logs_timer.tick() => self.spawn_logs(&event_tx),
                Some(event) = event_rx.recv() => {
                    self.handle_event(event, &poll_tx);
                    self.draw(&mut out)?;
                }
                Some(poll) = poll_rx.recv() => {
                    self.handle_poll(poll, &event_tx);
                    self.draw(&mut out)?;
                }
                cmd = commands.recv(), if commands_open => match cmd {
                    Some(Command::Quit) => break,
                    Some(cmd) => {
                        self.handle_command(cmd, &event_tx);
                        self.draw(&mut out)?;
                    }
                    None => {
                        tracing::debug!("Command input closed");
                        commands_open = false;
                    }
                },
            }
        }

        status_timer.cancel();
        logs_timer.cancel();
        for (source, handle) in self.pollers.drain() {
            tracing::debug!("Stopping {source} poller");
            handle.abort();
        }

        Ok(self.dashboard)
    }

    fn draw<W: Write>(&self, out: &mut W) -> Result<()> {
        write!(
            out,
            "{}{}",
            render::CLEAR_SCREEN,
            render::render_dashboard(&self.dashboard)
        )?;
        out.flush()?;
        Ok(())
    }

    fn spawn_status(&self, tx: &mpsc::Sender<Event>) {
        let backend = self.dashboard.backend();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = backend.fetch_status().await;
            tx.send(Event::Status(result)).await.ok();
        });
    }

    fn spawn_logs(&self, tx: &mpsc::Sender<Event>) {
        let backend = self.dashboard.backend();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = backend.fetch_logs().await;
            tx.send(Event::Logs(result)).await.ok();
        });
    }

    fn spawn_submit(&self, request: DownloadRequest, tx: &mpsc::Sender<Event>) {
        let backend = self.dashboard.backend();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = backend.submit_download(&request).await;
            tx.send(Event::Submitted(request.source(), result)).await.ok();
        });
    }

    fn handle_event(&mut self, event: Event, poll_tx: &mpsc::Sender<TaskPoll>) {
        match event {
            Event::Status(result) => {
                self.dashboard.apply_status(result);
            }
            Event::Logs(result) => {
                self.dashboard.apply_logs(result);
            }
            Event::Submitted(source, result) => {
                if let Some(task_id) = self.dashboard.apply_submit(source, result) {
                    let handle = spawn_task_poller(
                        self.dashboard.backend(),
                        source,
                        task_id,
                        self.polling.task_interval(),
                        poll_tx.clone(),
                    );
                    if let Some(old) = self.pollers.insert(source, handle) {
                        old.abort();
                    }
                }
            }
        }
    }

    fn handle_poll(&mut self, poll: TaskPoll, event_tx: &mpsc::Sender<Event>) {
        let current = self.dashboard.download(poll.source).task_id();
        if current != Some(poll.task_id.as_str()) {
            tracing::debug!("Dropping stale poll for {}", poll.task_id);
            return;
        }

        let outcome = self.dashboard.apply_poll(poll.source, poll.result);
        match outcome {
            PollOutcome::Completed | PollOutcome::Failed => {
                self.pollers.remove(&poll.source);
                self.notifier
                    .download_finished(self.dashboard.download(poll.source), &outcome);
                if outcome == PollOutcome::Completed {
                    self.spawn_status(event_tx);
                }
            }
            PollOutcome::Continue | PollOutcome::Ignored => {}
        }
    }

    fn handle_command(&mut self, cmd: Command, event_tx: &mpsc::Sender<Event>) {
        match cmd {
            Command::Tab(name) => {
                if let Err(e) = self.dashboard.switch_tab(&name) {
                    tracing::warn!("{e}");
                }
            }
            Command::ToggleAutoScroll => {
                if let Err(e) = self.dashboard.toggle_auto_scroll() {
                    tracing::warn!("Could not save auto-scroll preference: {e}");
                }
            }
            Command::ScrollTo(row) => self.dashboard.scroll_logs_to(row),
            Command::ScrollBy(rows) => self.dashboard.scroll_logs_by(rows),
            Command::Bottom => {
                let bottom = self.dashboard.logs().viewport().scroll_height;
                self.dashboard.scroll_logs_to(bottom);
            }
            Command::Refresh => {
                self.spawn_status(event_tx);
                self.spawn_logs(event_tx);
            }
            Command::Download(request) => {
                self.dashboard.activate_tab(Tab::from(request.source()));
                match self.dashboard.begin_download(&request) {
                    Ok(()) => {
                        tracing::info!(
                            "Submitting {} download of {}",
                            request.source(),
                            request.url()
                        );
                        self.spawn_submit(request, event_tx);
                    }
                    Err(e) => tracing::warn!("{e}"),
                }
            }
            Command::Quit => {}
        }
    }
}
