//! Repeating timers for the watch runner.

use crate::api::{Backend, TaskStatus};
use crate::download::DownloadSource;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// A repeating timer that can be stopped and restarted
///
/// `tick` on a stopped timer never completes, so a stopped `Repeating` can sit
/// in a `select!` arm without firing.
#[derive(Debug)]
pub struct Repeating {
    period: Duration,
    interval: Option<Interval>,
}

impl Repeating {
    /// Started timer whose first tick fires immediately
    #[must_use]
    pub fn immediate(period: Duration) -> Self {
        let mut timer = Self::stopped(period);
        timer.start_at(Instant::now());
        timer
    }

    /// Started timer whose first tick fires after one period
    #[must_use]
    pub fn delayed(period: Duration) -> Self {
        let mut timer = Self::stopped(period);
        timer.start_at(Instant::now() + period);
        timer
    }

    #[must_use]
    pub const fn stopped(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    fn start_at(&mut self, start: Instant) {
        let mut interval = time::interval_at(start, self.period);
        // A slow cycle delays the next one instead of bursting to catch up
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.interval.is_some()
    }

    pub fn cancel(&mut self) {
        self.interval = None;
    }

    /// Wait for the next tick
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

/// One poll result for a source's task
#[derive(Debug)]
pub struct TaskPoll {
    pub source: DownloadSource,
    pub task_id: String,
    pub result: Result<TaskStatus>,
}

/// Poll `task_id` every `period` until it reaches a terminal status
///
/// Every result is forwarded on `tx`; the task also ends when the receiver is
/// dropped. Abort the handle to cancel early.
pub fn spawn_task_poller<B: Backend + 'static>(
    backend: Arc<B>,
    source: DownloadSource,
    task_id: String,
    period: Duration,
    tx: mpsc::Sender<TaskPoll>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = Repeating::delayed(period);
        loop {
            timer.tick().await;

            let result = backend.task_status(&task_id).await;
            let terminal = matches!(&result, Ok(status) if status.is_terminal());

            let poll = TaskPoll {
                source,
                task_id: task_id.clone(),
                result,
            };
            if tx.send(poll).await.is_err() {
                tracing::debug!("Poll receiver gone, stopping {task_id}");
                break;
            }
            if terminal {
                timer.cancel();
                break;
            }
        }
    })
}
