//! Request and response bodies of the host's filesystem API

use serde::{Deserialize, Serialize};

/// Body of `GET .../read`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadFileResponse {
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Body of `POST .../create`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateFileRequest {
    pub path: String,
    #[serde(default)]
    pub content: String,
}

/// Body of `POST .../rename`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenameRequest {
    pub old_path: String,
    pub new_path: String,
}

/// Error body returned with any non-success status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    /// Extract the detail from a raw error body
    ///
    /// Falls back to the trimmed body text (or `fallback` when empty) if the
    /// body is not the expected JSON shape.
    pub fn detail_from_body(body: &str, fallback: &str) -> String {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(err) => err.detail,
            Err(_) if body.trim().is_empty() => fallback.to_string(),
            Err(_) => body.trim().to_string(),
        }
    }
}
