//! Remote filesystem collaborator
//!
//! The tree store and upload coordinator only see the [`FileSystem`] trait;
//! [`HttpFileSystem`] implements it against the host's project file API.

#[cfg(test)]
pub(crate) mod fake;
mod http;

use async_trait::async_trait;
use berth_protocol::{FileNode, ProjectId};
use berth_utils::Result;

pub use http::HttpFileSystem;

/// Primitive operations on a project's files
///
/// Paths are root-relative and '/'-separated. Rejections surface as
/// `BerthError::Operation` carrying the host's detail message.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// List the tree under `subpath`, or the whole project
    async fn list_tree(&self, project: ProjectId, subpath: Option<&str>) -> Result<Vec<FileNode>>;

    async fn read_file(&self, project: ProjectId, path: &str) -> Result<String>;

    async fn write_file(&self, project: ProjectId, path: &str, content: &str) -> Result<()>;

    /// Create a file with `content`, or an empty directory
    async fn create_entry(
        &self,
        project: ProjectId,
        path: &str,
        is_directory: bool,
        content: &str,
    ) -> Result<()>;

    async fn rename_entry(&self, project: ProjectId, old_path: &str, new_path: &str) -> Result<()>;

    /// Delete a file or a directory with everything beneath it
    async fn delete_entry(&self, project: ProjectId, path: &str) -> Result<()>;

    async fn upload_file(&self, project: ProjectId, path: &str, bytes: Vec<u8>) -> Result<()>;
}
