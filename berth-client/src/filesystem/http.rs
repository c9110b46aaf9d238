use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use url::Url;

use berth_protocol::{
    CreateFileRequest, ErrorResponse, FileNode, ProjectId, ReadFileResponse, RenameRequest,
};
use berth_utils::{BerthError, Result};

use super::FileSystem;

/// [`FileSystem`] over the host's `/api/files/project/{id}` routes
#[derive(Debug, Clone)]
pub struct HttpFileSystem {
    client: Client,
    base: Url,
    timeout: Option<Duration>,
}

impl HttpFileSystem {
    pub fn new(base: Url, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BerthError::internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base,
            timeout,
        })
    }

    fn endpoint(&self, project: ProjectId, action: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| BerthError::config(format!("server url {} cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(["api", "files", "project", &project.to_string(), action]);
        Ok(url)
    }

    /// Send a request, mapping transport failures and error statuses
    async fn execute(&self, op: &str, path: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = ErrorResponse::detail_from_body(&body, &format!("HTTP {}", status));
        tracing::debug!(op, path, %status, detail = %detail, "filesystem request rejected");
        Err(BerthError::operation(op, path, detail))
    }

    fn transport_error(&self, e: reqwest::Error) -> BerthError {
        if e.is_timeout() {
            BerthError::ConnectionTimeout {
                seconds: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
            }
        } else {
            BerthError::connection(format!("filesystem request failed: {}", e))
        }
    }
}

#[async_trait]
impl FileSystem for HttpFileSystem {
    async fn list_tree(&self, project: ProjectId, subpath: Option<&str>) -> Result<Vec<FileNode>> {
        let mut request = self.client.get(self.endpoint(project, "tree")?);
        if let Some(subpath) = subpath {
            request = request.query(&[("subpath", subpath)]);
        }
        let response = self.execute("list", subpath.unwrap_or("/"), request).await?;
        response
            .json::<Vec<FileNode>>()
            .await
            .map_err(|e| BerthError::protocol(format!("invalid tree listing: {}", e)))
    }

    async fn read_file(&self, project: ProjectId, path: &str) -> Result<String> {
        let request = self
            .client
            .get(self.endpoint(project, "read")?)
            .query(&[("file_path", path)]);
        let response = self.execute("read", path, request).await?;
        let body: ReadFileResponse = response
            .json()
            .await
            .map_err(|e| BerthError::protocol(format!("invalid read response: {}", e)))?;
        if body.is_directory {
            return Err(BerthError::operation("read", path, "path is a directory"));
        }
        Ok(body.content)
    }

    async fn write_file(&self, project: ProjectId, path: &str, content: &str) -> Result<()> {
        let request = self
            .client
            .post(self.endpoint(project, "write")?)
            .query(&[("file_path", path), ("content", content)]);
        self.execute("write", path, request).await?;
        Ok(())
    }

    async fn create_entry(
        &self,
        project: ProjectId,
        path: &str,
        is_directory: bool,
        content: &str,
    ) -> Result<()> {
        let request = if is_directory {
            self.client
                .post(self.endpoint(project, "mkdir")?)
                .query(&[("dir_path", path)])
        } else {
            self.client
                .post(self.endpoint(project, "create")?)
                .json(&CreateFileRequest {
                    path: path.to_string(),
                    content: content.to_string(),
                })
        };
        self.execute("create", path, request).await?;
        Ok(())
    }

    async fn rename_entry(&self, project: ProjectId, old_path: &str, new_path: &str) -> Result<()> {
        let request = self
            .client
            .post(self.endpoint(project, "rename")?)
            .json(&RenameRequest {
                old_path: old_path.to_string(),
                new_path: new_path.to_string(),
            });
        self.execute("rename", old_path, request).await?;
        Ok(())
    }

    async fn delete_entry(&self, project: ProjectId, path: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.endpoint(project, "delete")?)
            .query(&[("file_path", path)]);
        self.execute("delete", path, request).await?;
        Ok(())
    }

    async fn upload_file(&self, project: ProjectId, path: &str, bytes: Vec<u8>) -> Result<()> {
        let request = self
            .client
            .post(self.endpoint(project, "upload")?)
            .query(&[("file_path", path)])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes);
        self.execute("upload", path, request).await?;
        Ok(())
    }
}
