// src/freshness/stamps.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::fs::{normalize_path, FileSystem};

/// In-memory cache of modification times.
///
/// Inputs are typically shared by many tasks (headers, intermediate files),
/// so each path is queried at most once per freshness evaluation. A missing
/// or unreadable file is cached as `None`.
#[derive(Debug, Default)]
pub struct StampCache {
    stamps: HashMap<PathBuf, Option<SystemTime>>,
}

impl StampCache {
    pub fn new() -> Self {
        Self {
            stamps: HashMap::new(),
        }
    }

    /// Modification time of `path`, or `None` if it does not exist.
    pub fn get_or_query(&mut self, fs: &dyn FileSystem, path: &Path) -> Option<SystemTime> {
        let key = normalize_path(path);
        if let Some(stamp) = self.stamps.get(&key) {
            return *stamp;
        }

        let stamp = if fs.exists(path) {
            match fs.modified(path) {
                Ok(ts) => Some(ts),
                Err(e) => {
                    debug!(path = ?path, error = %e, "cannot read modification time; treating as missing");
                    None
                }
            }
        } else {
            None
        };

        self.stamps.insert(key, stamp);
        stamp
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn caches_by_normalized_path() {
        let fs = MockFileSystem::new();
        fs.add_file("a.c", "");
        let mut cache = StampCache::new();

        let first = cache.get_or_query(&fs, Path::new("a.c"));
        fs.touch("a.c").unwrap();
        let second = cache.get_or_query(&fs, Path::new("./a.c"));

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_file_is_none() {
        let fs = MockFileSystem::new();
        let mut cache = StampCache::new();
        assert_eq!(cache.get_or_query(&fs, Path::new("nope")), None);
    }
}
