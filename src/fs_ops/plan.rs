//! Pending-directory collection for one deletion pass.
//! Workers push concurrently; the owning invocation drains it deepest-first.

use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct DeletionPlan {
    dirs: Mutex<Vec<PathBuf>>,
}

impl DeletionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a directory to remove once the parallel phase is over.
    pub fn push(&self, dir: PathBuf) {
        // Poisoning leaves the Vec intact.
        let mut dirs = self.dirs.lock().unwrap_or_else(|p| p.into_inner());
        dirs.push(dir);
    }

    pub fn len(&self) -> usize {
        self.dirs.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the plan, longest path first. A descendant's path is always
    /// longer than its ancestor's, so children come before their parents.
    pub fn into_removal_order(self) -> Vec<PathBuf> {
        let mut dirs = self.dirs.into_inner().unwrap_or_else(|p| p.into_inner());
        dirs.sort_by(|a, b| b.as_os_str().len().cmp(&a.as_os_str().len()));
        dirs
    }
}
