//! In-memory filesystem for tree store and upload tests

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use berth_protocol::{file_name, is_within, parent_path, FileNode, ProjectId};
use berth_utils::{BerthError, Result};

use super::FileSystem;

#[derive(Debug, Clone)]
enum Entry {
    File(Vec<u8>),
    Directory,
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub op: &'static str,
    pub path: String,
    pub ok: bool,
}

#[derive(Default)]
pub(crate) struct FakeFileSystem {
    entries: Mutex<BTreeMap<String, Entry>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<(&'static str, String), String>>,
    latency: Mutex<Option<Duration>>,
}

impl FakeFileSystem {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_file(self, path: &str, content: &str) -> Self {
        self.insert_parents(path);
        self.entries
            .lock()
            .insert(path.to_string(), Entry::File(content.as_bytes().to_vec()));
        self
    }

    pub(crate) fn with_dir(self, path: &str) -> Self {
        self.insert_parents(path);
        self.entries.lock().insert(path.to_string(), Entry::Directory);
        self
    }

    fn insert_parents(&self, path: &str) {
        let mut entries = self.entries.lock();
        let mut current = parent_path(path);
        while let Some(dir) = current {
            entries.insert(dir.to_string(), Entry::Directory);
            current = parent_path(dir);
        }
    }

    /// Reject the next and every later `op` on `path` with `detail`
    pub(crate) fn fail_on(&self, op: &'static str, path: &str, detail: &str) {
        self.failures
            .lock()
            .insert((op, path.to_string()), detail.to_string());
    }

    /// Delay every call, so tests can interleave operations
    pub(crate) fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Paths of successful calls of `op`, in order
    pub(crate) fn successful(&self, op: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.op == op && c.ok)
            .map(|c| c.path.clone())
            .collect()
    }

    pub(crate) fn count(&self, op: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.op == op).count()
    }

    pub(crate) fn exists(&self, path: &str) -> bool {
        self.entries.lock().contains_key(path)
    }

    pub(crate) fn content(&self, path: &str) -> Option<String> {
        match self.entries.lock().get(path) {
            Some(Entry::File(bytes)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    /// Wait out the latency, then apply the injected failure if any
    async fn begin(&self, op: &'static str, path: &str) -> Result<()> {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let failure = self.failures.lock().get(&(op, path.to_string())).cloned();
        match failure {
            Some(detail) => {
                self.record(op, path, false);
                Err(BerthError::operation(op, path, detail))
            }
            None => Ok(()),
        }
    }

    fn record(&self, op: &'static str, path: &str, ok: bool) {
        self.calls.lock().push(Call {
            op,
            path: path.to_string(),
            ok,
        });
    }

    fn finish<T>(&self, op: &'static str, path: &str, result: Result<T>) -> Result<T> {
        self.record(op, path, result.is_ok());
        result
    }

    fn check_parent(entries: &BTreeMap<String, Entry>, op: &'static str, path: &str) -> Result<()> {
        match parent_path(path) {
            Some(parent) if !matches!(entries.get(parent), Some(Entry::Directory)) => Err(
                BerthError::operation(op, path, "Parent directory does not exist"),
            ),
            _ => Ok(()),
        }
    }

    fn build(entries: &BTreeMap<String, Entry>, parent: Option<&str>) -> Vec<FileNode> {
        entries
            .iter()
            .filter(|(path, _)| parent_path(path) == parent)
            .map(|(path, entry)| FileNode {
                name: file_name(path).to_string(),
                path: path.clone(),
                is_directory: matches!(entry, Entry::Directory),
                children: match entry {
                    Entry::Directory => Some(Self::build(entries, Some(path.as_str()))),
                    Entry::File(_) => None,
                },
            })
            .collect()
    }
}

#[async_trait]
impl FileSystem for FakeFileSystem {
    async fn list_tree(&self, _project: ProjectId, subpath: Option<&str>) -> Result<Vec<FileNode>> {
        let path = subpath.unwrap_or("/");
        self.begin("list", path).await?;
        let entries = self.entries.lock();
        let result = match subpath {
            Some(dir) if !matches!(entries.get(dir), Some(Entry::Directory)) => {
                Err(BerthError::operation("list", dir, "Directory not found"))
            }
            _ => Ok(Self::build(&entries, subpath)),
        };
        drop(entries);
        self.finish("list", path, result)
    }

    async fn read_file(&self, _project: ProjectId, path: &str) -> Result<String> {
        self.begin("read", path).await?;
        let result = match self.entries.lock().get(path) {
            Some(Entry::File(bytes)) => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Some(Entry::Directory) => {
                Err(BerthError::operation("read", path, "Path is a directory"))
            }
            None => Err(BerthError::operation("read", path, "File not found")),
        };
        self.finish("read", path, result)
    }

    async fn write_file(&self, _project: ProjectId, path: &str, content: &str) -> Result<()> {
        self.begin("write", path).await?;
        let result = {
            let mut entries = self.entries.lock();
            Self::check_parent(&entries, "write", path).map(|()| {
                entries.insert(path.to_string(), Entry::File(content.as_bytes().to_vec()));
            })
        };
        self.finish("write", path, result)
    }

    async fn create_entry(
        &self,
        _project: ProjectId,
        path: &str,
        is_directory: bool,
        content: &str,
    ) -> Result<()> {
        self.begin("create", path).await?;
        let result = {
            let mut entries = self.entries.lock();
            if entries.contains_key(path) {
                Err(BerthError::operation("create", path, "File already exists"))
            } else {
                Self::check_parent(&entries, "create", path).map(|()| {
                    let entry = if is_directory {
                        Entry::Directory
                    } else {
                        Entry::File(content.as_bytes().to_vec())
                    };
                    entries.insert(path.to_string(), entry);
                })
            }
        };
        self.finish("create", path, result)
    }

    async fn rename_entry(
        &self,
        _project: ProjectId,
        old_path: &str,
        new_path: &str,
    ) -> Result<()> {
        self.begin("rename", old_path).await?;
        let result = {
            let mut entries = self.entries.lock();
            if !entries.contains_key(old_path) {
                Err(BerthError::operation("rename", old_path, "File not found"))
            } else if entries.contains_key(new_path) {
                Err(BerthError::operation("rename", old_path, "Target already exists"))
            } else {
                let moved: Vec<String> = entries
                    .keys()
                    .filter(|p| is_within(p, old_path))
                    .cloned()
                    .collect();
                for path in moved {
                    if let Some(entry) = entries.remove(&path) {
                        let suffix = &path[old_path.len()..];
                        entries.insert(format!("{}{}", new_path, suffix), entry);
                    }
                }
                Ok(())
            }
        };
        self.finish("rename", old_path, result)
    }

    async fn delete_entry(&self, _project: ProjectId, path: &str) -> Result<()> {
        self.begin("delete", path).await?;
        let result = {
            let mut entries = self.entries.lock();
            if entries.contains_key(path) {
                entries.retain(|p, _| !is_within(p, path));
                Ok(())
            } else {
                Err(BerthError::operation("delete", path, "File not found"))
            }
        };
        self.finish("delete", path, result)
    }

    async fn upload_file(&self, _project: ProjectId, path: &str, bytes: Vec<u8>) -> Result<()> {
        self.begin("upload", path).await?;
        let result = {
            let mut entries = self.entries.lock();
            Self::check_parent(&entries, "upload", path).map(|()| {
                entries.insert(path.to_string(), Entry::File(bytes));
            })
        };
        self.finish("upload", path, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_protocol::join_path;

    #[tokio::test]
    async fn test_listing_is_nested_and_consistent() {
        let fs = FakeFileSystem::new()
            .with_file("src/app.py", "print()")
            .with_file("README.md", "# hi");
        let tree = fs.list_tree(ProjectId(1), None).await.unwrap();

        assert_eq!(tree.len(), 2);
        assert!(tree.iter().all(FileNode::is_consistent));
        let src = tree.iter().find(|n| n.path == "src").unwrap();
        assert_eq!(src.children.as_ref().unwrap()[0].path, "src/app.py");
        assert_eq!(join_path(Some("src"), "app.py"), "src/app.py");
    }

    #[tokio::test]
    async fn test_rename_moves_descendants() {
        let fs = FakeFileSystem::new().with_file("src/app.py", "");
        fs.rename_entry(ProjectId(1), "src", "lib").await.unwrap();
        assert!(fs.exists("lib/app.py"));
        assert!(!fs.exists("src"));
    }

    #[tokio::test]
    async fn test_injected_failure_is_recorded() {
        let fs = FakeFileSystem::new();
        fs.fail_on("upload", "b.bin", "disk full");
        let err = fs
            .upload_file(ProjectId(1), "b.bin", vec![1])
            .await
            .unwrap_err();
        assert_eq!(err.detail(), "disk full");
        assert_eq!(
            fs.calls(),
            vec![Call {
                op: "upload",
                path: "b.bin".into(),
                ok: false
            }]
        );
    }
}
