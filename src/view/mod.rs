//! View models: the data-shaping half of the dashboard, free of any surface.

pub mod logs;
pub mod status;
pub mod tabs;

pub use logs::{log_lines, LogPanel, Viewport};
pub use status::{CategoryView, CustomNodesView, ModelsView};
pub use tabs::{Tab, TabBar};
