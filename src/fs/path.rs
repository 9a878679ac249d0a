// src/fs/path.rs

//! Path helpers for artifact matching.

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path so that two spellings of the same artifact
/// compare equal.
///
/// - `.` components are dropped.
/// - `dir/..` pairs are folded; a leading `..` on a relative path is kept.
/// - Redundant separators disappear through `components()`.
///
/// The filesystem is never touched, so symlinks are not resolved and the
/// path does not need to exist.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`.
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }

    out.iter().map(|c| c.as_os_str()).collect()
}
