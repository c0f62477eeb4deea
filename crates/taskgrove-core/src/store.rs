//! Whole-snapshot persistence. Every engine operation loads a fresh tree,
//! mutates it in memory, and writes the complete snapshot back.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use thiserror::Error;

use crate::task::TaskTree;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse snapshot: {0}")]
    Serde(#[from] serde_json::Error),
}

pub trait SnapshotStore {
    fn load(&self) -> Result<TaskTree, StoreError>;
    fn save(&self, tree: &TaskTree) -> Result<(), StoreError>;
}

/// JSON snapshot on disk. Saves go through a sibling lock file and a
/// temp-file rename, so a crashed writer never leaves a torn snapshot.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<TaskTree, StoreError> {
        if !self.path.exists() {
            return Ok(TaskTree::default());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(TaskTree::default());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn save(&self, tree: &TaskTree) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let lock = File::options()
            .create(true)
            .write(true)
            .open(self.lock_path())?;
        lock.lock_exclusive()?;
        let result = self.write_snapshot(tree);
        let _ = FileExt::unlock(&lock);
        result
    }
}

impl FileStore {
    fn write_snapshot(&self, tree: &TaskTree) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(tree)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory snapshot for tests and `--in-memory` serving. Starts empty and
/// discards its contents on drop.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<TaskTree>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<TaskTree, StoreError> {
        Ok(self.inner.lock().expect("task tree lock poisoned").clone())
    }

    fn save(&self, tree: &TaskTree) -> Result<(), StoreError> {
        *self.inner.lock().expect("task tree lock poisoned") = tree.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use tempfile::TempDir;

    #[test]
    fn file_store_loads_empty_tree_when_missing() {
        let temp = TempDir::new().expect("tempdir");
        let store = FileStore::new(temp.path().join("tasks.json"));
        let tree = store.load().expect("load");
        assert!(tree.tasks.is_empty());
    }

    #[test]
    fn file_store_round_trips_snapshot() {
        let temp = TempDir::new().expect("tempdir");
        let store = FileStore::new(temp.path().join("nested").join("tasks.json"));
        let mut tree = TaskTree::default();
        tree.tasks.push(Task::new("Persisted", "survives reload"));
        store.save(&tree).expect("save");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.tasks.len(), 1);
        assert_eq!(loaded.tasks[0].name, "Persisted");
    }

    #[test]
    fn file_store_overwrites_whole_snapshot() {
        let temp = TempDir::new().expect("tempdir");
        let store = FileStore::new(temp.path().join("tasks.json"));
        let mut tree = TaskTree::default();
        tree.tasks.push(Task::new("One", ""));
        tree.tasks.push(Task::new("Two", ""));
        store.save(&tree).expect("save");

        tree.tasks.pop();
        store.save(&tree).expect("save again");
        let loaded = store.load().expect("load");
        assert_eq!(loaded.tasks.len(), 1);
    }

    #[test]
    fn memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert!(store.load().expect("load").tasks.is_empty());

        let mut tree = TaskTree::default();
        tree.tasks.push(Task::new("Ephemeral", ""));
        store.save(&tree).expect("save");
        assert_eq!(store.load().expect("load").tasks.len(), 1);
    }
}
