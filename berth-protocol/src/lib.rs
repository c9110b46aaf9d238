//! berth-protocol: Wire definitions shared with the container host
//!
//! This crate defines the records exchanged with the host: telemetry frames
//! pushed over the stats WebSocket, file tree listings and the request and
//! response bodies of the filesystem API.

pub mod codec;
pub mod messages;
pub mod types;

// Re-export main types at crate root
pub use codec::{decode_telemetry, CodecError};
pub use messages::{CreateFileRequest, ErrorResponse, ReadFileResponse, RenameRequest};
pub use types::{
    file_name, is_within, join_path, parent_path, rebase_path, sibling_path, FileNode, ProjectId,
    TelemetryPoint, TelemetrySample,
};
