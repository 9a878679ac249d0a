// src/fs/mock.rs

use super::{normalize_path, FileSystem};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: Vec<u8>, modified: u64 },
    Dir,
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    /// Logical clock in seconds since the epoch; every write ticks it.
    clock: u64,
}

/// In-memory filesystem with a logical clock.
///
/// Each write stamps the file with a strictly increasing modification time,
/// so "written later" always means "newer" without sleeping in tests.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add (or overwrite) a file, stamped with the next clock tick.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut state = self.lock();
        state.clock += 1;
        let modified = state.clock;
        insert_file(&mut state, path.as_ref(), content.into(), modified);
    }

    /// Add a file with an explicit modification time (seconds since epoch).
    pub fn add_file_at(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>, modified: u64) {
        let mut state = self.lock();
        state.clock = state.clock.max(modified);
        insert_file(&mut state, path.as_ref(), content.into(), modified);
    }

    /// Bump the modification time of an existing file to the next tick.
    pub fn touch(&self, path: impl AsRef<Path>) -> Result<()> {
        let key = normalize_path(path.as_ref());
        let mut state = self.lock();
        state.clock += 1;
        let now = state.clock;
        match state.entries.get_mut(&key) {
            Some(MockEntry::File { modified, .. }) => {
                *modified = now;
                Ok(())
            }
            _ => Err(anyhow!("File not found: {:?}", key)),
        }
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let key = normalize_path(path.as_ref());
        self.lock().entries.remove(&key);
    }

    /// Logical modification time of a file, if present.
    pub fn modified_secs(&self, path: impl AsRef<Path>) -> Option<u64> {
        let key = normalize_path(path.as_ref());
        match self.lock().entries.get(&key) {
            Some(MockEntry::File { modified, .. }) => Some(*modified),
            _ => None,
        }
    }
}

fn insert_file(state: &mut MockState, path: &Path, content: Vec<u8>, modified: u64) {
    let key = normalize_path(path);
    let mut parent = key.parent();
    while let Some(dir) = parent {
        if dir.as_os_str().is_empty() {
            break;
        }
        state
            .entries
            .entry(dir.to_path_buf())
            .or_insert(MockEntry::Dir);
        parent = dir.parent();
    }
    state.entries.insert(key, MockEntry::File { content, modified });
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.lock().entries.contains_key(&normalize_path(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(
            self.lock().entries.get(&normalize_path(path)),
            Some(MockEntry::File { .. })
        )
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        match self.lock().entries.get(&normalize_path(path)) {
            Some(MockEntry::File { modified, .. }) => {
                Ok(UNIX_EPOCH + Duration::from_secs(*modified))
            }
            Some(MockEntry::Dir) => Ok(UNIX_EPOCH),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.lock().entries.get(&normalize_path(path)) {
            Some(MockEntry::File { content, .. }) => String::from_utf8(content.clone())
                .map_err(|e| anyhow!("Invalid UTF-8: {}", e)),
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let key = normalize_path(path);
        let mut state = self.lock();
        let mut current = Some(key.as_path());
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            if let Some(MockEntry::File { .. }) = state.entries.get(dir) {
                return Err(anyhow!("Not a directory: {:?}", dir));
            }
            state.entries.insert(dir.to_path_buf(), MockEntry::Dir);
            current = dir.parent();
        }
        Ok(())
    }
}
