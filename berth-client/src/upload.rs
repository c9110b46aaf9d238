//! Batch uploads into a project directory

use std::path::Path;
use std::sync::Arc;

use berth_protocol::{join_path, FileNode};
use berth_utils::{BerthError, Result};

use crate::tree::{OperationKind, TreeStore};

/// One file to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadItem {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a local file, naming the item after its final path component
    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| BerthError::validation(format!("{} has no file name", path.display())))?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BerthError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(Self { name, bytes })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Uploaded,
    Failed { detail: String },
}

/// Result for one item, in input order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub name: String,
    /// Destination path; empty when the name was unusable
    pub path: String,
    pub status: UploadStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub target: Option<String>,
    pub outcomes: Vec<UploadOutcome>,
    /// Set when the reload after the batch failed
    pub refresh_error: Option<String>,
}

impl UploadReport {
    pub fn uploaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == UploadStatus::Uploaded)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, UploadStatus::Failed { .. }))
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures().next().is_none() && self.refresh_error.is_none()
    }
}

/// Sequences uploads into a tree store's project
pub struct UploadCoordinator {
    tree: Arc<TreeStore>,
}

impl UploadCoordinator {
    pub fn new(tree: Arc<TreeStore>) -> Self {
        Self { tree }
    }

    /// Upload `items` one after another into `target` (root if `None`)
    ///
    /// A failing item is recorded and the batch continues. The tree is
    /// reloaded once at the end and the target directory expanded. Only a
    /// disposed view aborts the batch.
    pub async fn upload(
        &self,
        target: Option<&str>,
        items: Vec<UploadItem>,
    ) -> Result<UploadReport> {
        let target = target.map(|t| t.trim_end_matches('/')).filter(|t| !t.is_empty());
        let mut report = UploadReport {
            target: target.map(str::to_string),
            ..UploadReport::default()
        };

        tracing::info!(target = ?target, items = items.len(), "starting upload batch");
        for item in items {
            let outcome = self.upload_one(target, item).await?;
            report.outcomes.push(outcome);
        }

        if let Err(e) = self.tree.load().await {
            if matches!(e, BerthError::Stale) {
                return Err(e);
            }
            tracing::warn!(error = %e, "reload after upload failed");
            report.refresh_error = Some(e.to_string());
        }
        if let Some(target) = target {
            self.tree.expand(target);
        }

        tracing::info!(
            uploaded = report.uploaded(),
            failed = report.outcomes.len() - report.uploaded(),
            "upload batch finished"
        );
        Ok(report)
    }

    async fn upload_one(&self, target: Option<&str>, item: UploadItem) -> Result<UploadOutcome> {
        let name = item.name.trim().to_string();
        if name.is_empty() || name.contains('/') {
            return Ok(UploadOutcome {
                name: item.name,
                path: String::new(),
                status: UploadStatus::Failed {
                    detail: "invalid file name".to_string(),
                },
            });
        }

        let path = join_path(target, &name);
        let result = match self.tree.claim(&path, OperationKind::Upload) {
            Ok(_pending) => {
                self.tree
                    .scope()
                    .guard(self.tree.filesystem().upload_file(
                        self.tree.project(),
                        &path,
                        item.bytes,
                    ))
                    .await
            }
            Err(e) => Err(e),
        };

        let status = match result {
            Ok(()) => {
                self.tree.insert_local(FileNode::file(target, name.as_str()));
                UploadStatus::Uploaded
            }
            Err(BerthError::Stale) => return Err(BerthError::Stale),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "upload failed");
                UploadStatus::Failed { detail: e.detail() }
            }
        };
        Ok(UploadOutcome { name, path, status })
    }
}
