//! Reading and writing package manifests

use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

use criage_core::error::CriageError;
use criage_core::types::PackageManifest;

use crate::ManagerResult;

/// Path of the manifest in `dir`, preferring `criage.json` over the legacy name
pub fn find_manifest(dir: &Path) -> Option<PathBuf> {
    [PackageManifest::FILE_NAME, PackageManifest::LEGACY_FILE_NAME]
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Load the manifest at the root of `dir`
pub async fn read_manifest(dir: &Path) -> ManagerResult<PackageManifest> {
    let path = find_manifest(dir).ok_or_else(|| {
        CriageError::io(
            format!("No {} in {}", PackageManifest::FILE_NAME, dir.display()),
            Error::from(ErrorKind::NotFound),
        )
    })?;

    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| CriageError::io(format!("Failed to read {}", path.display()), e))?;

    serde_json::from_str(&content).map_err(|e| CriageError::JsonParse {
        message: format!("{}: {}", path.display(), e),
    })
}

/// Write `manifest` as `criage.json` in `dir`
pub async fn write_manifest(dir: &Path, manifest: &PackageManifest) -> ManagerResult<PathBuf> {
    let path = dir.join(PackageManifest::FILE_NAME);
    let content = serde_json::to_string_pretty(manifest).map_err(|e| CriageError::JsonParse {
        message: format!("Failed to serialize manifest: {}", e),
    })?;

    tokio::fs::write(&path, content)
        .await
        .map_err(|e| CriageError::io(format!("Failed to write {}", path.display()), e))?;
    Ok(path)
}
