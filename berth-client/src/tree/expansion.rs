use std::collections::BTreeSet;

use berth_protocol::{is_within, rebase_path};

/// Directory paths currently shown expanded
///
/// Pure view state: entries for paths that no longer exist are harmless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionSet {
    paths: BTreeSet<String>,
}

impl ExpansionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip `path`, returning whether it is now expanded
    pub fn toggle(&mut self, path: &str) -> bool {
        if self.paths.remove(path) {
            false
        } else {
            self.paths.insert(path.to_string());
            true
        }
    }

    pub fn insert(&mut self, path: &str) {
        self.paths.insert(path.to_string());
    }

    pub fn remove(&mut self, path: &str) -> bool {
        self.paths.remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Drop `path` and everything beneath it
    pub fn prune_within(&mut self, path: &str) {
        self.paths.retain(|p| !is_within(p, path));
    }

    /// Move entries under `old` to live under `new`
    pub fn rebase(&mut self, old: &str, new: &str) {
        let moved: Vec<String> = self
            .paths
            .iter()
            .filter(|p| is_within(p, old))
            .cloned()
            .collect();
        for path in moved {
            self.paths.remove(&path);
            if let Some(rebased) = rebase_path(&path, old, new) {
                self.paths.insert(rebased);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}
