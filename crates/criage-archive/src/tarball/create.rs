//! Tar stream creation
//!
//! Entries are stored relative to the source directory, in file-name order,
//! so that the same tree always produces the same stream.

use criage_core::error::CriageError;
use std::io::Write;
use std::path::Path;
use tar::Builder;
use walkdir::WalkDir;

use crate::ArchiveResult;

/// Write every file and directory below `source_dir` into `writer` as tar
///
/// Returns the writer so the caller can finish its compression layer.
pub fn write_tree<W: Write>(writer: W, source_dir: &Path) -> ArchiveResult<W> {
    if !source_dir.is_dir() {
        return Err(CriageError::archive(format!(
            "{} is not a directory",
            source_dir.display()
        )));
    }

    let mut builder = Builder::new(writer);
    builder.follow_symlinks(false);

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            CriageError::archive(format!("Failed to walk {}: {}", source_dir.display(), e))
        })?;
        let path = entry.path();
        let relative = path
            .strip_prefix(source_dir)
            .map_err(|e| CriageError::archive(format!("Failed to strip prefix: {}", e)))?;

        // Skip the root directory itself
        if relative.as_os_str().is_empty() {
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_file() {
            builder
                .append_path_with_name(path, relative)
                .map_err(|e| CriageError::io(format!("Failed to add {}", relative.display()), e))?;
        } else if file_type.is_dir() {
            builder
                .append_dir(relative, path)
                .map_err(|e| CriageError::io(format!("Failed to add {}", relative.display()), e))?;
        } else {
            tracing::debug!(path = %relative.display(), "skipping special file");
        }
    }

    builder
        .into_inner()
        .map_err(|e| CriageError::io("Failed to finish tar stream", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = tar::Archive::new(bytes);
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn test_entries_are_relative_and_sorted() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path();
        fs::create_dir(source.join("src")).unwrap();
        fs::write(source.join("src").join("main.txt"), "main").unwrap();
        fs::write(source.join("criage.json"), "{}").unwrap();

        let bytes = write_tree(Vec::new(), source).unwrap();
        let names = entry_names(&bytes);
        assert_eq!(names, vec!["criage.json", "src", "src/main.txt"]);
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let result = write_tree(Vec::new(), &temp_dir.path().join("absent"));
        assert!(matches!(result, Err(CriageError::Archive { .. })));
    }
}
