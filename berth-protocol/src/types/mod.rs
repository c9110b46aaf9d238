//! Shared data types

mod files;
mod telemetry;

pub use files::{
    file_name, is_within, join_path, parent_path, rebase_path, sibling_path, FileNode, ProjectId,
};
pub use telemetry::{TelemetryPoint, TelemetrySample};
