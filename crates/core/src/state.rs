//! Per-adapter record of where each function's project lives

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Function id → absolute project root, as of the last successful build.
///
/// Entries are overwritten by later builds and never removed. Nothing is
/// persisted, so a fresh adapter knows no roots until it builds again.
#[derive(Debug, Default)]
pub struct ProjectDirectories {
    roots: RwLock<HashMap<String, PathBuf>>,
}

impl ProjectDirectories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, function_id: &str, root: &Path) {
        let mut roots = self.roots.write().unwrap_or_else(|e| e.into_inner());
        roots.insert(function_id.to_string(), root.to_path_buf());
    }

    pub fn get(&self, function_id: &str) -> Option<PathBuf> {
        let roots = self.roots.read().unwrap_or_else(|e| e.into_inner());
        roots.get(function_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.roots.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
