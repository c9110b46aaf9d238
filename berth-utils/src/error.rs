//! Error types for berth
//!
//! Provides a unified error type used across all berth crates. Every variant
//! belongs to exactly one [`ErrorKind`], which decides how the failure is
//! surfaced: connection errors end one channel, parse errors are dropped,
//! operation and validation errors are shown to the user.

use std::path::PathBuf;

/// Main error type for berth operations
#[derive(Debug, thiserror::Error)]
pub enum BerthError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Connection Errors ===

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Connection timeout after {seconds}s")]
    ConnectionTimeout { seconds: u64 },

    // === Protocol Errors ===

    #[error("Protocol error: {0}")]
    Protocol(String),

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    // === Workspace Errors ===

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Failed to {op} {path}: {detail}")]
    Operation {
        op: String,
        path: String,
        detail: String,
    },

    #[error("Operation already in progress for {path}")]
    Busy { path: String },

    #[error("Not found: {0}")]
    NotFound(String),

    // === Lifecycle Errors ===

    #[error("View was disposed before the response arrived")]
    Stale,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used to decide how an error is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Channel failed to open or dropped; terminal for that channel
    Connection,
    /// Malformed inbound record; dropped, stream continues
    Parse,
    /// Rejected by a collaborator; shown to the user
    Operation,
    /// Rejected locally before any remote call
    Validation,
    /// Bad or unreadable configuration
    Config,
    /// Local IO failure
    Io,
    /// Response arrived after its view was disposed
    Stale,
    /// Bug or broken invariant
    Internal,
}

impl BerthError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an operation error for a rejected remote call
    pub fn operation(
        op: impl Into<String>,
        path: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Operation {
            op: op.into(),
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) | Self::ConnectionTimeout { .. } => ErrorKind::Connection,
            Self::Protocol(_) => ErrorKind::Parse,
            Self::Operation { .. } | Self::Busy { .. } | Self::NotFound(_) => ErrorKind::Operation,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Config(_) | Self::ConfigInvalid { .. } => ErrorKind::Config,
            Self::Io(_) | Self::FileRead { .. } | Self::FileWrite { .. } => ErrorKind::Io,
            Self::Stale => ErrorKind::Stale,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Human-readable detail suitable for a blocking notification
    ///
    /// For collaborator rejections this is the detail string the collaborator
    /// sent; for everything else the full display text.
    pub fn detail(&self) -> String {
        match self {
            Self::Operation { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias using BerthError
pub type Result<T> = std::result::Result<T, BerthError>;
