//! Plain-text surface for the view models.

use crate::api::Backend;
use crate::dashboard::Dashboard;
use crate::download::{DownloadMachine, StatusKind};
use crate::links::ServiceLinks;
use crate::view::{CustomNodesView, LogPanel, ModelsView, TabBar};
use std::fmt::Write;

/// ANSI clear-screen + cursor-home, written before each watch frame
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[must_use]
pub fn render_links(links: &ServiceLinks) -> String {
    format!("Comfy UI: {}\nJupyter:  {}\n", links.comfy, links.jupyter)
}

#[must_use]
pub fn render_custom_nodes(view: &CustomNodesView) -> String {
    let mut out = format!("Custom nodes ({})\n", view.count);
    for item in &view.items {
        let _ = writeln!(out, "  • {item}");
    }
    out
}

#[must_use]
pub fn render_models(view: &ModelsView) -> String {
    let mut out = format!("Models ({})\n", view.total);
    if let Some(message) = &view.message {
        let _ = writeln!(out, "  {message}");
    }
    for category in &view.categories {
        let _ = writeln!(out, "  {}", category.heading);
        for file in &category.files {
            let _ = writeln!(out, "    • {file}");
        }
    }
    out
}

#[must_use]
pub fn render_logs(panel: &LogPanel) -> String {
    let viewport = panel.viewport();
    let total = panel.lines().len();
    let first = if total == 0 { 0 } else { viewport.scroll_top + 1 };
    let last = (viewport.scroll_top + viewport.client_height).min(total);

    let mut out = format!(
        "Logs [auto-scroll: {}] lines {first}-{last} of {total}\n",
        if panel.auto_scroll() { "on" } else { "off" }
    );
    for line in panel.visible_lines() {
        let _ = writeln!(out, "  {line}");
    }
    out
}

#[must_use]
pub fn render_tabs(tabs: &TabBar) -> String {
    let labels: Vec<String> = tabs
        .tabs()
        .into_iter()
        .map(|(tab, active)| {
            if active {
                format!("[{tab}]")
            } else {
                format!(" {tab} ")
            }
        })
        .collect();
    format!("{}\n", labels.join(" "))
}

#[must_use]
pub fn render_download(machine: &DownloadMachine) -> String {
    let button = if machine.button_enabled() {
        "ready"
    } else {
        "busy"
    };
    match machine.status() {
        Some(status) => {
            let marker = match status.kind {
                StatusKind::Info => "…",
                StatusKind::Success => "✓",
                StatusKind::Error => "✗",
            };
            format!("{} ({button}): {marker} {}\n", machine.source(), status.text)
        }
        None => format!("{} ({button})\n", machine.source()),
    }
}

/// Whole dashboard frame
#[must_use]
pub fn render_dashboard<B: Backend>(dashboard: &Dashboard<B>) -> String {
    let mut out = render_links(dashboard.links());

    match dashboard.status_refreshed_at() {
        Some(at) => {
            let _ = writeln!(out, "\nStatus as of {}", at.format("%H:%M:%S"));
            out.push_str(&render_custom_nodes(dashboard.nodes()));
            out.push_str(&render_models(dashboard.models()));
        }
        None => out.push_str("\nLoading status...\n"),
    }

    out.push('\n');
    out.push_str(&render_logs(dashboard.logs()));

    out.push_str("\nDownloads ");
    out.push_str(&render_tabs(dashboard.tabs()));
    let active = dashboard.tabs().active().source();
    out.push_str(&render_download(dashboard.download(active)));
    for (source, task_id) in dashboard.polling_tasks() {
        if source != active {
            let _ = writeln!(out, "{source}: downloading ({task_id})");
        }
    }
    out
}
