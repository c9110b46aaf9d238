use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use berth_utils::{BerthError, Result};
use parking_lot::Mutex;

/// Kind of an in-flight remote mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    Rename,
    Delete,
    Upload,
    Save,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Create => "create",
            OperationKind::Rename => "rename",
            OperationKind::Delete => "delete",
            OperationKind::Upload => "upload",
            OperationKind::Save => "save",
        };
        f.write_str(name)
    }
}

pub(crate) type PendingSet = Arc<Mutex<HashMap<String, OperationKind>>>;

/// Marks a path as having an operation in flight until dropped
#[derive(Debug)]
pub(crate) struct PendingGuard {
    set: PendingSet,
    path: String,
}

impl PendingGuard {
    /// Claim `path`, failing with `Busy` if another operation holds it
    pub(crate) fn acquire(set: &PendingSet, path: &str, kind: OperationKind) -> Result<Self> {
        let mut pending = set.lock();
        if let Some(current) = pending.get(path) {
            tracing::debug!(path, %current, requested = %kind, "path busy");
            return Err(BerthError::Busy {
                path: path.to_string(),
            });
        }
        pending.insert(path.to_string(), kind);
        Ok(Self {
            set: Arc::clone(set),
            path: path.to_string(),
        })
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.path);
    }
}
