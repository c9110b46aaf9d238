use std::sync::Arc;

use parking_lot::Mutex;

use berth_protocol::{
    file_name, is_within, join_path, parent_path, rebase_path, sibling_path, FileNode, ProjectId,
};
use berth_utils::{BerthError, Result};

use super::expansion::ExpansionSet;
use super::nodes;
use super::pending::{OperationKind, PendingGuard, PendingSet};
use crate::filesystem::FileSystem;
use crate::view::ViewScope;

/// The file open in the editor pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub path: String,
    pub content: String,
    /// Edited since it was read or last saved
    pub dirty: bool,
}

/// One line of the file browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: usize,
    pub name: String,
    pub path: String,
    pub is_directory: bool,
    pub expanded: bool,
    pub selected: bool,
}

/// Asks the user to confirm a destructive action
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user said no; nothing was sent
    Declined,
}

#[derive(Debug, Default)]
struct TreeState {
    roots: Vec<FileNode>,
    expanded: ExpansionSet,
    selection: Option<Selection>,
    loaded: bool,
    /// Why the last reload after a mutation failed, if it did
    reconcile_error: Option<String>,
}

/// File tree of one project, shared by the views that show it
///
/// State sits behind a short-held lock that is never kept across a remote
/// call, so independent operations may interleave; whichever listing
/// arrives last wins.
pub struct TreeStore {
    project: ProjectId,
    fs: Arc<dyn FileSystem>,
    scope: ViewScope,
    state: Mutex<TreeState>,
    pending: PendingSet,
}

impl TreeStore {
    pub fn new(project: ProjectId, fs: Arc<dyn FileSystem>, scope: ViewScope) -> Self {
        Self {
            project,
            fs,
            scope,
            state: Mutex::new(TreeState::default()),
            pending: PendingSet::default(),
        }
    }

    pub fn project(&self) -> ProjectId {
        self.project
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub(crate) fn filesystem(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    // ==================== Queries ====================

    pub fn is_loaded(&self) -> bool {
        self.state.lock().loaded
    }

    /// Set while the tree shows local patches the host has not confirmed
    ///
    /// A mutation that succeeded remotely still succeeds when the reload
    /// after it fails; the failure is kept here until the next good load.
    pub fn reconcile_error(&self) -> Option<String> {
        self.state.lock().reconcile_error.clone()
    }

    /// Snapshot of the root nodes
    pub fn roots(&self) -> Vec<FileNode> {
        self.state.lock().roots.clone()
    }

    pub fn node(&self, path: &str) -> Option<FileNode> {
        nodes::find(&self.state.lock().roots, path).cloned()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.state.lock().selection.clone()
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.state.lock().expanded.contains(path)
    }

    pub fn is_pending(&self, path: &str) -> bool {
        self.pending.lock().contains_key(path)
    }

    pub fn visible_rows(&self) -> Vec<TreeRow> {
        let state = self.state.lock();
        let selected = state.selection.as_ref().map(|s| s.path.as_str());
        nodes::visible_rows(&state.roots, &state.expanded, selected)
    }

    // ==================== Loading ====================

    /// Replace the whole tree with a fresh listing
    pub async fn load(&self) -> Result<()> {
        let roots = self
            .scope
            .guard(self.fs.list_tree(self.project, None))
            .await?;

        let mut state = self.state.lock();
        let count: usize = roots.iter().map(FileNode::count).sum();
        tracing::debug!(project = %self.project, nodes = count, "tree loaded");
        state.roots = roots;
        state.loaded = true;
        state.reconcile_error = None;
        Ok(())
    }

    /// Reload after a mutation
    ///
    /// Only `Stale` is returned; any other failure is logged and recorded in
    /// [`reconcile_error`](Self::reconcile_error), leaving the local patch.
    async fn reconcile(&self) -> Result<()> {
        match self.load().await {
            Ok(()) => Ok(()),
            Err(BerthError::Stale) => Err(BerthError::Stale),
            Err(e) => {
                tracing::warn!(project = %self.project, error = %e, "reload after mutation failed");
                self.state.lock().reconcile_error = Some(e.to_string());
                Ok(())
            }
        }
    }

    /// Reload after a failed mutation; the mutation's error wins
    async fn reconcile_after_failure(&self) {
        let _ = self.reconcile().await;
    }

    /// Fetch one directory and replace only its children
    pub async fn refresh_directory(&self, path: &str) -> Result<()> {
        let children = self
            .scope
            .guard(self.fs.list_tree(self.project, Some(path)))
            .await?;

        let mut state = self.state.lock();
        match nodes::find_mut(&mut state.roots, path) {
            Some(node) if node.is_directory => {
                node.children = Some(children);
                Ok(())
            }
            _ => Err(BerthError::NotFound(path.to_string())),
        }
    }

    // ==================== Expansion ====================

    /// Flip a directory open or closed; purely local
    pub fn toggle_expanded(&self, path: &str) -> bool {
        self.state.lock().expanded.toggle(path)
    }

    /// Expand `path` and every directory above it
    pub fn expand(&self, path: &str) {
        let mut state = self.state.lock();
        let mut current = Some(path);
        while let Some(dir) = current {
            if !dir.is_empty() {
                state.expanded.insert(dir);
            }
            current = parent_path(dir);
        }
    }

    // ==================== Mutations ====================

    /// Create a file or directory named `name` under `parent` (root if `None`)
    ///
    /// Returns the new entry's path. Its parent is expanded and a new file
    /// becomes the selection.
    pub async fn create(
        &self,
        parent: Option<&str>,
        name: &str,
        is_directory: bool,
        content: Option<&str>,
    ) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BerthError::validation("name must not be empty"));
        }
        let path = join_path(parent, name);
        let _pending = PendingGuard::acquire(&self.pending, &path, OperationKind::Create)?;

        let inserted = {
            let mut state = self.state.lock();
            nodes::insert(
                &mut state.roots,
                FileNode {
                    name: file_name(&path).to_string(),
                    path: path.clone(),
                    is_directory,
                    children: is_directory.then(Vec::new),
                },
            )
        };

        let result = self
            .scope
            .guard(self.fs.create_entry(
                self.project,
                &path,
                is_directory,
                content.unwrap_or_default(),
            ))
            .await;

        match result {
            Ok(()) => {}
            Err(BerthError::Stale) => return Err(BerthError::Stale),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "create rejected, rolling back");
                if inserted {
                    nodes::remove(&mut self.state.lock().roots, &path);
                }
                self.reconcile_after_failure().await;
                return Err(e);
            }
        }

        tracing::info!(path = %path, is_directory, "created");
        self.reconcile().await?;
        if let Some(parent) = parent_path(&path) {
            self.expand(parent);
        }
        if !is_directory {
            match self.select(&path).await {
                Ok(()) => {}
                Err(BerthError::Stale) => return Err(BerthError::Stale),
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "created file could not be opened");
                }
            }
        }
        Ok(path)
    }

    /// Rename the entry at `old_path` to `new_name` within the same directory
    ///
    /// A selection at or beneath `old_path` follows the entry, with its
    /// content read again from the new path. Returns the new path.
    pub async fn rename(&self, old_path: &str, new_name: &str) -> Result<String> {
        let new_name = new_name.trim();
        if old_path.is_empty() {
            return Err(BerthError::validation("path must not be empty"));
        }
        validate_name(new_name)?;
        let new_path = sibling_path(old_path, new_name);
        if new_path == old_path {
            return Ok(new_path);
        }
        let _pending = PendingGuard::acquire(&self.pending, old_path, OperationKind::Rename)?;

        let (moved, expanded_before) = {
            let mut state = self.state.lock();
            let expanded_before = state.expanded.clone();
            state.expanded.rebase(old_path, &new_path);
            (nodes::rename(&mut state.roots, old_path, &new_path), expanded_before)
        };

        let result = self
            .scope
            .guard(self.fs.rename_entry(self.project, old_path, &new_path))
            .await;

        match result {
            Ok(()) => {}
            Err(BerthError::Stale) => return Err(BerthError::Stale),
            Err(e) => {
                tracing::warn!(
                    old = old_path,
                    new = %new_path,
                    error = %e,
                    "rename rejected, rolling back"
                );
                {
                    let mut state = self.state.lock();
                    state.expanded = expanded_before;
                    if moved {
                        nodes::rename(&mut state.roots, &new_path, old_path);
                    }
                }
                self.reconcile_after_failure().await;
                return Err(e);
            }
        }

        tracing::info!(old = old_path, new = %new_path, "renamed");

        // The selection moves with the entry whether or not anything after
        // this point succeeds
        let followed = {
            let mut state = self.state.lock();
            match state.selection.as_mut() {
                Some(selection) => {
                    rebase_path(&selection.path, old_path, &new_path).map(|path| {
                        selection.path = path.clone();
                        path
                    })
                }
                None => None,
            }
        };

        self.reconcile().await?;

        if let Some(current) = followed {
            match self
                .scope
                .guard(self.fs.read_file(self.project, &current))
                .await
            {
                Ok(content) => {
                    let mut state = self.state.lock();
                    let selection = state.selection.as_mut().filter(|s| s.path == current);
                    if let Some(selection) = selection {
                        selection.content = content;
                        selection.dirty = false;
                    }
                }
                Err(BerthError::Stale) => return Err(BerthError::Stale),
                Err(e) => {
                    tracing::warn!(
                        path = %current,
                        error = %e,
                        "renamed selection could not be re-read"
                    );
                }
            }
        }

        Ok(new_path)
    }

    /// Delete the entry at `path` after the user confirms
    ///
    /// A declined prompt sends nothing. A selection at or beneath `path` is
    /// cleared.
    pub async fn delete(&self, path: &str, confirm: &dyn Confirm) -> Result<DeleteOutcome> {
        if path.is_empty() {
            return Err(BerthError::validation("path must not be empty"));
        }
        if !confirm.confirm(&format!("Are you sure you want to delete {}?", path)) {
            tracing::debug!(path, "delete declined");
            return Ok(DeleteOutcome::Declined);
        }
        let _pending = PendingGuard::acquire(&self.pending, path, OperationKind::Delete)?;

        let removed = nodes::remove(&mut self.state.lock().roots, path);

        let result = self
            .scope
            .guard(self.fs.delete_entry(self.project, path))
            .await;

        match result {
            Ok(()) => {}
            Err(BerthError::Stale) => return Err(BerthError::Stale),
            Err(e) => {
                tracing::warn!(path, error = %e, "delete rejected, rolling back");
                if let Some(node) = removed {
                    nodes::insert(&mut self.state.lock().roots, node);
                }
                self.reconcile_after_failure().await;
                return Err(e);
            }
        }

        tracing::info!(path, "deleted");
        {
            let mut state = self.state.lock();
            if state
                .selection
                .as_ref()
                .is_some_and(|s| is_within(&s.path, path))
            {
                state.selection = None;
            }
            state.expanded.prune_within(path);
        }
        self.reconcile().await?;
        Ok(DeleteOutcome::Deleted)
    }

    /// Put a node into the local tree ahead of the next listing
    pub(crate) fn insert_local(&self, node: FileNode) -> bool {
        nodes::insert(&mut self.state.lock().roots, node)
    }

    pub(crate) fn claim(&self, path: &str, kind: OperationKind) -> Result<PendingGuard> {
        PendingGuard::acquire(&self.pending, path, kind)
    }

    // ==================== Editing ====================

    /// Open `path`: directories toggle, files are read into the selection
    pub async fn select(&self, path: &str) -> Result<()> {
        let is_directory = self.node(path).map(|n| n.is_directory);
        if is_directory == Some(true) {
            self.toggle_expanded(path);
            return Ok(());
        }

        let content = self
            .scope
            .guard(self.fs.read_file(self.project, path))
            .await?;
        self.state.lock().selection = Some(Selection {
            path: path.to_string(),
            content,
            dirty: false,
        });
        Ok(())
    }

    /// Replace the selected file's buffer
    pub fn edit(&self, content: impl Into<String>) -> Result<()> {
        let mut state = self.state.lock();
        let selection = state
            .selection
            .as_mut()
            .ok_or_else(|| BerthError::validation("no file selected"))?;
        selection.content = content.into();
        selection.dirty = true;
        Ok(())
    }

    /// Write the selected file's buffer back
    pub async fn save(&self) -> Result<()> {
        let (path, content) = {
            let state = self.state.lock();
            let selection = state
                .selection
                .as_ref()
                .ok_or_else(|| BerthError::validation("no file selected"))?;
            (selection.path.clone(), selection.content.clone())
        };
        let _pending = PendingGuard::acquire(&self.pending, &path, OperationKind::Save)?;

        self.scope
            .guard(self.fs.write_file(self.project, &path, &content))
            .await?;
        tracing::info!(path = %path, bytes = content.len(), "saved");

        let mut state = self.state.lock();
        if let Some(selection) = state.selection.as_mut() {
            // Edits made while the write was in flight stay dirty
            if selection.path == path && selection.content == content {
                selection.dirty = false;
            }
        }
        Ok(())
    }
}

/// A single path segment
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BerthError::validation("name must not be empty"));
    }
    if name.contains('/') || name == "." || name == ".." {
        return Err(BerthError::validation(format!("invalid name '{}'", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::fake::FakeFileSystem;
    use std::time::Duration;

    fn store(fs: FakeFileSystem) -> (Arc<TreeStore>, Arc<FakeFileSystem>) {
        let fs = Arc::new(fs);
        let store = TreeStore::new(ProjectId(1), fs.clone(), ViewScope::new());
        (Arc::new(store), fs)
    }

    fn yes(_: &str) -> bool {
        true
    }

    #[tokio::test]
    async fn test_load_replaces_tree() {
        let (tree, _fs) = store(
            FakeFileSystem::new()
                .with_file("README.md", "# demo")
                .with_file("src/app.py", ""),
        );
        assert!(!tree.is_loaded());
        tree.load().await.unwrap();

        assert!(tree.is_loaded());
        let paths: Vec<_> = tree.roots().into_iter().map(|n| n.path).collect();
        assert_eq!(paths, vec!["README.md", "src"]);
        assert!(tree.node("src/app.py").is_some());
    }

    #[tokio::test]
    async fn test_create_directory_then_file_and_select() {
        let (tree, fs) = store(FakeFileSystem::new());
        tree.load().await.unwrap();

        let dir = tree.create(None, "src", true, None).await.unwrap();
        assert_eq!(dir, "src");
        let src = tree.node("src").unwrap();
        assert_eq!((src.name.as_str(), src.path.as_str(), src.is_directory), ("src", "src", true));

        let file = tree.create(None, "src/app.py", false, Some("")).await.unwrap();
        assert_eq!(file, "src/app.py");
        assert!(tree.is_expanded("src"));

        let selection = tree.selection().unwrap();
        assert_eq!(selection.path, "src/app.py");
        assert_eq!(selection.content, "");
        assert!(!selection.dirty);
        assert_eq!(fs.successful("read"), vec!["src/app.py"]);
    }

    #[tokio::test]
    async fn test_create_under_parent() {
        let (tree, fs) = store(FakeFileSystem::new().with_dir("src"));
        tree.load().await.unwrap();

        let path = tree
            .create(Some("src"), " main.rs ", false, Some("fn main() {}"))
            .await
            .unwrap();
        assert_eq!(path, "src/main.rs");
        assert_eq!(fs.content("src/main.rs").as_deref(), Some("fn main() {}"));
        assert_eq!(tree.selection().unwrap().content, "fn main() {}");
    }

    #[tokio::test]
    async fn test_create_blank_name_is_rejected_locally() {
        let (tree, fs) = store(FakeFileSystem::new());

        for name in ["", "   "] {
            let err = tree.create(None, name, false, None).await.unwrap_err();
            assert!(matches!(err, BerthError::Validation(_)), "{name:?}");
        }
        assert!(fs.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_leaves_other_names_to_the_host() {
        let (tree, fs) = store(FakeFileSystem::new());
        tree.load().await.unwrap();

        let err = tree.create(None, "a//b", false, None).await.unwrap_err();
        assert!(matches!(err, BerthError::Operation { .. }));
        assert_eq!(err.detail(), "Parent directory does not exist");
        assert_eq!(fs.count("create"), 1);
        assert!(tree.roots().is_empty());
    }

    #[tokio::test]
    async fn test_create_stands_when_reload_fails() {
        let (tree, fs) = store(FakeFileSystem::new().with_dir("src"));
        tree.load().await.unwrap();
        fs.fail_on("list", "/", "backend unavailable");

        let path = tree
            .create(Some("src"), "app.py", false, Some("x = 1"))
            .await
            .unwrap();
        assert_eq!(path, "src/app.py");
        assert!(fs.exists("src/app.py"));
        assert!(tree.node("src/app.py").is_some());
        assert!(tree.is_expanded("src"));

        let selection = tree.selection().unwrap();
        assert_eq!(selection.path, "src/app.py");
        assert_eq!(selection.content, "x = 1");
        assert!(tree
            .reconcile_error()
            .unwrap()
            .contains("backend unavailable"));
    }

    #[tokio::test]
    async fn test_create_failure_rolls_back_and_reloads() {
        let (tree, fs) = store(FakeFileSystem::new().with_dir("src"));
        tree.load().await.unwrap();
        fs.fail_on("create", "src/app.py", "Permission denied");

        let err = tree
            .create(Some("src"), "app.py", false, None)
            .await
            .unwrap_err();
        assert_eq!(err.detail(), "Permission denied");
        assert!(tree.node("src/app.py").is_none());
        assert!(tree.selection().is_none());
        assert_eq!(fs.count("list"), 2);
        assert!(!tree.is_pending("src/app.py"));
    }

    #[tokio::test]
    async fn test_create_is_visible_before_confirmation() {
        let (tree, fs) = store(FakeFileSystem::new().with_dir("src"));
        tree.load().await.unwrap();
        fs.set_latency(Duration::from_millis(100));

        let task = {
            let tree = Arc::clone(&tree);
            tokio::spawn(async move { tree.create(Some("src"), "new.txt", false, None).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(tree.node("src/new.txt").is_some());
        assert!(tree.is_pending("src/new.txt"));

        task.await.unwrap().unwrap();
        assert!(!tree.is_pending("src/new.txt"));
    }

    #[tokio::test]
    async fn test_duplicate_submission_is_busy() {
        let (tree, fs) = store(FakeFileSystem::new());
        fs.set_latency(Duration::from_millis(50));

        let (first, second) = tokio::join!(
            tree.create(None, "notes.md", false, None),
            tree.create(None, "notes.md", false, None),
        );
        assert!(first.is_ok());
        assert!(matches!(second, Err(BerthError::Busy { .. })));
        assert_eq!(fs.count("create"), 1);
    }

    #[tokio::test]
    async fn test_rename_selected_file_follows_selection() {
        let (tree, fs) = store(FakeFileSystem::new().with_file("src/old.py", "print('hi')"));
        tree.load().await.unwrap();
        tree.select("src/old.py").await.unwrap();

        let new_path = tree.rename("src/old.py", "new.py").await.unwrap();
        assert_eq!(new_path, "src/new.py");

        let selection = tree.selection().unwrap();
        assert_eq!(selection.path, "src/new.py");
        assert_eq!(selection.content, fs.content("src/new.py").unwrap());
        assert_eq!(fs.successful("read"), vec!["src/old.py", "src/new.py"]);
        assert!(tree.node("src/old.py").is_none());
    }

    #[tokio::test]
    async fn test_rename_directory_moves_nested_selection() {
        let (tree, _fs) = store(FakeFileSystem::new().with_file("src/lib/util.py", "x = 1"));
        tree.load().await.unwrap();
        tree.expand("src/lib");
        tree.select("src/lib/util.py").await.unwrap();

        tree.rename("src/lib", "core").await.unwrap();
        assert_eq!(tree.selection().unwrap().path, "src/core/util.py");
        assert!(tree.is_expanded("src/core"));
        assert!(!tree.is_expanded("src/lib"));
    }

    #[tokio::test]
    async fn test_rename_failure_restores_tree() {
        let (tree, fs) = store(FakeFileSystem::new().with_file("a.txt", ""));
        tree.load().await.unwrap();
        fs.fail_on("rename", "a.txt", "Target already exists");

        let err = tree.rename("a.txt", "b.txt").await.unwrap_err();
        assert!(matches!(err, BerthError::Operation { .. }));
        assert!(tree.node("a.txt").is_some());
        assert!(tree.node("b.txt").is_none());
    }

    #[tokio::test]
    async fn test_rename_rejection_keeps_expansion() {
        let (tree, fs) = store(FakeFileSystem::new().with_dir("a").with_dir("b"));
        tree.load().await.unwrap();
        tree.toggle_expanded("b");
        fs.fail_on("rename", "a", "Target already exists");

        let err = tree.rename("a", "b").await.unwrap_err();
        assert_eq!(err.detail(), "Target already exists");
        assert!(tree.is_expanded("b"));
        assert!(!tree.is_expanded("a"));
        assert!(tree.node("a").is_some());
        assert!(tree.node("b").is_some());
    }

    #[tokio::test]
    async fn test_rename_selection_follows_when_reload_fails() {
        let (tree, fs) = store(FakeFileSystem::new().with_file("old.py", "print('hi')"));
        tree.load().await.unwrap();
        tree.select("old.py").await.unwrap();
        fs.fail_on("list", "/", "backend unavailable");

        let new_path = tree.rename("old.py", "new.py").await.unwrap();
        assert_eq!(new_path, "new.py");
        assert!(fs.exists("new.py"));

        let selection = tree.selection().unwrap();
        assert_eq!(selection.path, "new.py");
        assert_eq!(selection.content, "print('hi')");
        assert_eq!(fs.successful("read"), vec!["old.py", "new.py"]);
        assert!(tree.node("new.py").is_some());
        assert!(tree.node("old.py").is_none());
        assert!(tree.reconcile_error().is_some());
    }

    #[tokio::test]
    async fn test_rename_rejects_path_in_name() {
        let (tree, fs) = store(FakeFileSystem::new().with_file("a.txt", ""));
        let err = tree.rename("a.txt", "dir/b.txt").await.unwrap_err();
        assert!(matches!(err, BerthError::Validation(_)));
        assert!(fs.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_declined_sends_nothing() {
        let (tree, fs) = store(FakeFileSystem::new().with_file("a.txt", ""));
        tree.load().await.unwrap();

        let prompts = Mutex::new(Vec::new());
        let decline = |prompt: &str| {
            prompts.lock().push(prompt.to_string());
            false
        };
        let outcome = tree.delete("a.txt", &decline).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Declined);
        assert_eq!(fs.count("delete"), 0);
        assert!(tree.node("a.txt").is_some());
        assert_eq!(
            *prompts.lock(),
            vec!["Are you sure you want to delete a.txt?"]
        );
    }

    #[tokio::test]
    async fn test_delete_clears_selection_beneath() {
        let (tree, fs) = store(FakeFileSystem::new().with_file("src/app.py", "x"));
        tree.load().await.unwrap();
        tree.expand("src");
        tree.select("src/app.py").await.unwrap();

        let outcome = tree.delete("src", &yes).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert!(tree.selection().is_none());
        assert!(!tree.is_expanded("src"));
        assert!(!fs.exists("src/app.py"));
        assert!(tree.roots().is_empty());
    }

    #[tokio::test]
    async fn test_delete_stands_when_reload_fails() {
        let (tree, fs) = store(FakeFileSystem::new().with_file("a.txt", "x"));
        tree.load().await.unwrap();
        tree.select("a.txt").await.unwrap();
        fs.fail_on("list", "/", "backend unavailable");

        let outcome = tree.delete("a.txt", &yes).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert!(!fs.exists("a.txt"));
        assert!(tree.node("a.txt").is_none());
        assert!(tree.selection().is_none());
        assert!(tree.reconcile_error().is_some());
    }

    #[tokio::test]
    async fn test_delete_failure_restores_node() {
        let (tree, fs) = store(FakeFileSystem::new().with_file("keep.txt", ""));
        tree.load().await.unwrap();
        fs.fail_on("delete", "keep.txt", "Permission denied");

        assert!(tree.delete("keep.txt", &yes).await.is_err());
        assert!(tree.node("keep.txt").is_some());
    }

    #[tokio::test]
    async fn test_select_directory_toggles() {
        let (tree, fs) = store(FakeFileSystem::new().with_dir("docs"));
        tree.load().await.unwrap();

        tree.select("docs").await.unwrap();
        assert!(tree.is_expanded("docs"));
        tree.select("docs").await.unwrap();
        assert!(!tree.is_expanded("docs"));
        assert_eq!(fs.count("read"), 0);
    }

    #[tokio::test]
    async fn test_edit_and_save() {
        let (tree, fs) = store(FakeFileSystem::new().with_file("app.py", "old"));
        tree.load().await.unwrap();
        assert!(matches!(tree.edit("x"), Err(BerthError::Validation(_))));

        tree.select("app.py").await.unwrap();
        tree.edit("new").unwrap();
        assert!(tree.selection().unwrap().dirty);

        tree.save().await.unwrap();
        assert!(!tree.selection().unwrap().dirty);
        assert_eq!(fs.content("app.py").as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_refresh_directory_replaces_children() {
        let (tree, fs) = store(FakeFileSystem::new().with_dir("src"));
        tree.load().await.unwrap();
        fs.upload_file(ProjectId(1), "src/late.txt", b"x".to_vec())
            .await
            .unwrap();

        tree.refresh_directory("src").await.unwrap();
        assert!(tree.node("src/late.txt").is_some());
        assert!(matches!(
            tree.refresh_directory("nope").await,
            Err(BerthError::Operation { .. })
        ));
    }

    #[tokio::test]
    async fn test_toggle_never_calls_filesystem() {
        let (tree, fs) = store(FakeFileSystem::new());
        assert!(tree.toggle_expanded("src"));
        assert!(!tree.toggle_expanded("src"));
        assert!(fs.calls().is_empty());
    }

    #[tokio::test]
    async fn test_disposed_view_ignores_response() {
        let (tree, fs) = store(FakeFileSystem::new().with_file("a.txt", ""));
        fs.set_latency(Duration::from_millis(50));

        let disposer = tree.scope().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            disposer.dispose();
        });

        assert!(matches!(tree.load().await, Err(BerthError::Stale)));
        assert!(!tree.is_loaded());
        assert!(tree.roots().is_empty());
    }

    #[tokio::test]
    async fn test_visible_rows_mark_selection() {
        let (tree, _fs) = store(FakeFileSystem::new().with_file("src/app.py", ""));
        tree.load().await.unwrap();
        tree.toggle_expanded("src");
        tree.select("src/app.py").await.unwrap();

        let rows = tree.visible_rows();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].selected);
        assert_eq!(rows[1].depth, 1);
    }
}
