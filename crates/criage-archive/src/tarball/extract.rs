//! Tar stream extraction
//!
//! Every entry path is validated before anything touches the disk:
//! absolute paths, `..` components and symlinks pointing outside the
//! destination abort the whole unpack. Paths are checked against what is
//! already on disk, so links written by earlier entries cannot be chained
//! into an escape.

use criage_core::error::CriageError;
use criage_core::utils::{normalize_path, safe_join};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::{Archive, Entry, EntryType};

use crate::ArchiveResult;

/// Unpack a plain tar stream into `dest_dir`, returning the number of entries
pub fn unpack_tree<R: Read>(reader: R, dest_dir: &Path) -> ArchiveResult<usize> {
    let mut archive = Archive::new(reader);

    fs::create_dir_all(dest_dir)
        .map_err(|e| CriageError::io(format!("Failed to create {}", dest_dir.display()), e))?;
    let root = fs::canonicalize(dest_dir)
        .map_err(|e| CriageError::io(format!("Failed to resolve {}", dest_dir.display()), e))?;

    let entries = archive
        .entries()
        .map_err(|e| CriageError::archive(format!("Unreadable archive: {}", e)))?;

    let mut count = 0;
    for entry in entries {
        let mut entry = entry.map_err(|e| CriageError::archive(format!("Corrupt entry: {}", e)))?;
        let entry_path = entry
            .path()
            .map_err(|e| CriageError::archive(format!("Invalid entry path: {}", e)))?
            .into_owned();
        let target = safe_join(dest_dir, &entry_path)?;

        match entry.header().entry_type() {
            EntryType::Regular | EntryType::Continuous => {
                write_file(&mut entry, &root, &entry_path, &target)?
            },
            EntryType::Directory => {
                real_location(&root, &entry_path, &target)?;
                fs::create_dir_all(&target).map_err(|e| {
                    CriageError::io(format!("Failed to create {}", target.display()), e)
                })?;
            },
            EntryType::Symlink => write_symlink(&entry, &root, &entry_path, &target)?,
            other => {
                tracing::debug!(path = %entry_path.display(), kind = ?other, "skipping entry");
                continue;
            },
        }

        #[cfg(unix)]
        if let Ok(mode) = entry.header().mode() {
            use std::os::unix::fs::PermissionsExt;
            let is_file = fs::symlink_metadata(&target).map_or(false, |m| m.is_file());
            if is_file && mode & 0o777 != 0 {
                let _ = fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o777));
            }
        }

        count += 1;
    }

    Ok(count)
}

fn write_file<R: Read>(
    entry: &mut Entry<'_, R>,
    root: &Path,
    entry_path: &Path,
    target: &Path,
) -> ArchiveResult<()> {
    if let Some(parent) = target.parent() {
        real_location(root, entry_path, parent)?;
        fs::create_dir_all(parent)
            .map_err(|e| CriageError::io(format!("Failed to create {}", parent.display()), e))?;
    }

    // Never write through a link left by an earlier entry
    if fs::symlink_metadata(target).map_or(false, |m| m.file_type().is_symlink()) {
        fs::remove_file(target)
            .map_err(|e| CriageError::io(format!("Failed to replace {}", target.display()), e))?;
    }

    let mut file = fs::File::create(target)
        .map_err(|e| CriageError::io(format!("Failed to create {}", target.display()), e))?;
    std::io::copy(entry, &mut file)
        .map_err(|e| CriageError::io(format!("Failed to write {}", target.display()), e))?;
    Ok(())
}

fn write_symlink<R: Read>(
    entry: &Entry<'_, R>,
    root: &Path,
    entry_path: &Path,
    target: &Path,
) -> ArchiveResult<()> {
    let link = entry
        .link_name()
        .map_err(|e| CriageError::archive(format!("Invalid link target: {}", e)))?
        .ok_or_else(|| {
            CriageError::archive(format!("symlink {} has no target", entry_path.display()))
        })?
        .into_owned();

    // Resolve from where the link really lands, not where its name says
    let parent = target.parent().unwrap_or(target);
    let real_parent = real_location(root, entry_path, parent)?;
    let resolved = normalize_path(&real_parent.join(&link));
    let escapes = link.is_absolute()
        || !resolved.starts_with(root)
        || fs::canonicalize(&resolved).map_or(false, |real| !real.starts_with(root));
    if escapes {
        return Err(escape_error(entry_path));
    }

    fs::create_dir_all(parent)
        .map_err(|e| CriageError::io(format!("Failed to create {}", parent.display()), e))?;

    #[cfg(unix)]
    std::os::unix::fs::symlink(&link, target)
        .map_err(|e| CriageError::io(format!("Failed to link {}", target.display()), e))?;
    #[cfg(not(unix))]
    tracing::warn!(path = %entry_path.display(), "symlinks are not supported here, skipped");

    Ok(())
}

/// Where `path` really is once links already on disk are followed.
///
/// Fails unless that location is inside `root`. Components that do not
/// exist yet are plain names and are appended as they are.
fn real_location(root: &Path, entry_path: &Path, path: &Path) -> ArchiveResult<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();
    while fs::symlink_metadata(existing).is_err() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            },
            _ => break,
        }
    }

    let mut real = fs::canonicalize(existing).map_err(|_| escape_error(entry_path))?;
    real.extend(missing.iter().rev());
    if real.starts_with(root) {
        Ok(real)
    } else {
        Err(escape_error(entry_path))
    }
}

fn escape_error(entry_path: &Path) -> CriageError {
    CriageError::archive(format!(
        "{} points outside the package",
        entry_path.display()
    ))
}
