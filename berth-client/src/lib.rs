//! berth-client: live sessions and workspace synchronization
//!
//! - [`connection`]: one WebSocket per endpoint, ordered single-consumer events
//! - [`session`]: shell and telemetry controllers that own those channels
//! - [`tree`]: path-addressed model of a project's files with optimistic edits
//! - [`upload`]: sequential multi-file uploads into the tree
//! - [`filesystem`]: the host's file API, behind the [`filesystem::FileSystem`] seam

pub mod config;
pub mod connection;
pub mod filesystem;
pub mod input;
pub mod session;
pub mod tree;
pub mod upload;
pub mod view;

pub use config::ClientConfig;
pub use view::ViewScope;
