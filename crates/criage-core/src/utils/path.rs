//! Path utilities for safe file system operations.
//!
//! Provides path normalization, traversal checks and install-size walking.

use crate::error::{CriageError, CriageResult};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Normalize a path by resolving . and .. components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                // Keep a leading `..` so escaping stays visible to callers
                if matches!(components.last(), None | Some(Component::ParentDir)) {
                    components.push(component);
                } else {
                    components.pop();
                }
            },
            other => components.push(other),
        }
    }

    components.iter().collect()
}

/// Check if a relative path stays inside its base directory
pub fn is_safe_path(path: &Path) -> bool {
    if path.is_absolute() {
        return false;
    }

    let mut depth = 0i32;

    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            },
            Component::Normal(_) => depth += 1,
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }

    true
}

/// Safely join paths, preventing directory traversal
pub fn safe_join(base: &Path, path: &Path) -> CriageResult<PathBuf> {
    if !is_safe_path(path) {
        return Err(CriageError::archive(format!(
            "path escapes destination: {}",
            path.display()
        )));
    }

    Ok(base.join(normalize_path(path)))
}

/// Total size in bytes of all regular files below `dir`.
///
/// Unreadable entries are skipped; a missing directory has size zero.
pub fn dir_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}
