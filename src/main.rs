#![allow(clippy::multiple_crate_versions)]

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_panel::api::HttpBackend;
use comfy_panel::config::Config;
use comfy_panel::dashboard::Dashboard;
use comfy_panel::download::{DownloadRequest, PollOutcome, MODEL_TYPES};
use comfy_panel::links::ServiceLinks;
use comfy_panel::notifications::NotificationManager;
use comfy_panel::render;
use comfy_panel::runner::{Command, Runner, COMMAND_HELP};
use comfy_panel::schedule::Repeating;
use comfy_panel::storage::{self, FileStorage, Storage};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "comfy-panel")]
#[command(about = "Status dashboard and model downloader for the ComfyUI helper server", long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/comfy-panel/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Helper server URL, overrides server.base_url
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Live dashboard (default)
    Watch,
    /// Show custom nodes and installed models
    Status,
    /// Print the server log tail
    Logs,
    /// Print Comfy UI and Jupyter links
    Links,
    /// List model types the server accepts
    ModelTypes,
    /// Show or change the log auto-scroll preference
    Autoscroll {
        #[arg(value_enum)]
        mode: Option<AutoScrollMode>,
    },
    /// Download a model and wait for it to finish
    Download {
        #[command(subcommand)]
        source: DownloadCommand,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AutoScrollMode {
    On,
    Off,
    Toggle,
}

#[derive(Subcommand)]
enum DownloadCommand {
    /// Download from Civitai
    Civitai {
        url: String,
        #[arg(long, default_value = "models/checkpoints")]
        model_type: String,
        /// Civitai API key (falls back to CIVITAI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Download from HuggingFace
    Huggingface {
        url: String,
        #[arg(long, default_value = "models/checkpoints")]
        model_type: String,
    },
    /// Download from Google Drive (URL or bare file id)
    Gdrive {
        url: String,
        #[arg(long, default_value = "models/checkpoints")]
        model_type: String,
        /// Target file name; derived from the URL when empty
        #[arg(long, default_value = "")]
        filename: String,
    },
}

impl DownloadCommand {
    fn into_request(self) -> DownloadRequest {
        match self {
            Self::Civitai {
                url,
                model_type,
                api_key,
            } => {
                let api_key = api_key
                    .or_else(|| std::env::var("CIVITAI_API_KEY").ok())
                    .unwrap_or_default();
                DownloadRequest::civitai(&url, &api_key, &model_type)
            }
            Self::Huggingface { url, model_type } => DownloadRequest::huggingface(&url, &model_type),
            Self::Gdrive {
                url,
                model_type,
                filename,
            } => DownloadRequest::google_drive(&url, &model_type, &filename),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so the dashboard owns stdout
    let default_filter = if cli.verbose {
        "comfy_panel=debug"
    } else {
        "comfy_panel=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    match cli.command {
        None | Some(Commands::Watch) => run_watch(config).await,
        Some(Commands::Status) => run_status(config).await,
        Some(Commands::Logs) => run_logs(config).await,
        Some(Commands::Links) => {
            let links = ServiceLinks::from_config(&config.server)?;
            print!("{}", render::render_links(&links));
            Ok(())
        }
        Some(Commands::ModelTypes) => {
            for model_type in MODEL_TYPES {
                println!("{:<24} {}", model_type.name, model_type.description);
            }
            Ok(())
        }
        Some(Commands::Autoscroll { mode }) => run_autoscroll(config, mode),
        Some(Commands::Download { source }) => run_download(config, source.into_request()).await,
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    if let Some(base_url) = &cli.base_url {
        config.server.base_url.clone_from(base_url);
    }
    config.validate()?;

    tracing::debug!("Using helper server at {}", config.server.base_url);
    Ok(config)
}

fn open_storage() -> anyhow::Result<Arc<dyn Storage>> {
    let storage = FileStorage::open_default()?;
    tracing::debug!("UI state at {}", storage.path().display());
    Ok(Arc::new(storage))
}

fn build_dashboard(config: &Config) -> anyhow::Result<Dashboard<HttpBackend>> {
    let backend = Arc::new(HttpBackend::new(&config.server)?);
    Ok(Dashboard::new(config, backend, open_storage()?)?)
}

async fn run_watch(config: Config) -> anyhow::Result<()> {
    let dashboard = build_dashboard(&config)?;
    let (command_tx, command_rx) = mpsc::channel::<Command>(32);

    // stdin commands
    let stdin_tx = command_tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(cmd) => {
                    if stdin_tx.send(cmd).await.is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("{e}"),
            }
        }
    });

    // Ctrl+C quits cleanly
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            command_tx.send(Command::Quit).await.ok();
        }
    });

    eprintln!("{COMMAND_HELP}");
    let runner = Runner::new(
        dashboard,
        config.polling.clone(),
        NotificationManager::new(config.notifications.clone()),
    );
    runner.run(command_rx, std::io::stdout()).await?;
    Ok(())
}

async fn run_status(config: Config) -> anyhow::Result<()> {
    let mut dashboard = build_dashboard(&config)?;
    if !dashboard.refresh_status().await {
        bail!("Could not load status from {}", config.server.base_url);
    }

    print!("{}", render::render_custom_nodes(dashboard.nodes()));
    println!();
    print!("{}", render::render_models(dashboard.models()));
    Ok(())
}

async fn run_logs(config: Config) -> anyhow::Result<()> {
    let mut dashboard = build_dashboard(&config)?;
    if !dashboard.refresh_logs().await {
        bail!("Could not load logs from {}", config.server.base_url);
    }

    for line in dashboard.logs().lines() {
        println!("{line}");
    }
    Ok(())
}

fn run_autoscroll(config: Config, mode: Option<AutoScrollMode>) -> anyhow::Result<()> {
    let storage = open_storage()?;
    let current = storage::load_auto_scroll(storage.as_ref())?.unwrap_or(config.ui.auto_scroll);

    let enabled = match mode {
        None => current,
        Some(AutoScrollMode::On) => true,
        Some(AutoScrollMode::Off) => false,
        Some(AutoScrollMode::Toggle) => !current,
    };
    if mode.is_some() {
        storage::save_auto_scroll(storage.as_ref(), enabled)?;
    }

    println!("Auto-scroll: {}", if enabled { "on" } else { "off" });
    Ok(())
}

async fn run_download(config: Config, request: DownloadRequest) -> anyhow::Result<()> {
    let source = request.source();
    let mut dashboard = build_dashboard(&config)?;
    let notifier = NotificationManager::new(config.notifications.clone());

    let task_id = dashboard.start_download(request).await?;
    let status_text = |dashboard: &Dashboard<HttpBackend>| {
        dashboard
            .download(source)
            .status()
            .map(|s| s.text.clone())
            .unwrap_or_default()
    };

    let Some(task_id) = task_id else {
        bail!("{source} download not started: {}", status_text(&dashboard));
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {prefix}: {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_prefix(format!("{source} {task_id}"));
    spinner.set_message(status_text(&dashboard));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let mut timer = Repeating::delayed(config.polling.task_interval());
    loop {
        timer.tick().await;

        let outcome = dashboard.poll_download(source).await;
        match outcome {
            PollOutcome::Continue => continue,
            PollOutcome::Completed => {
                spinner.finish_with_message(status_text(&dashboard));
                notifier.download_finished(dashboard.download(source), &outcome);
                print!("{}", render::render_models(dashboard.models()));
                return Ok(());
            }
            PollOutcome::Failed => {
                spinner.abandon_with_message(status_text(&dashboard));
                notifier.download_finished(dashboard.download(source), &outcome);
                bail!("{}", status_text(&dashboard));
            }
            PollOutcome::Ignored => {
                spinner.abandon();
                bail!("{source} download is no longer being tracked");
            }
        }
    }
}
