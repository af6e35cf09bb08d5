#![allow(clippy::multiple_crate_versions)]

pub mod api;
pub mod config;
pub mod dashboard;
pub mod download;
pub mod error;
pub mod links;
pub mod notifications;
pub mod render;
pub mod runner;
pub mod schedule;
pub mod storage;
pub mod view;

pub use dashboard::Dashboard;
pub use error::{PanelError, Result};
