//! Creating, building and publishing packages

use std::path::{Path, PathBuf};

use criage_archive::{ArchiveCodec, ArchiveFormat};
use criage_core::error::CriageError;
use criage_core::types::PackageManifest;
use criage_registry::UploadResponse;

use super::{blocking, validate_name, PackageManager};
use crate::manifest::{find_manifest, read_manifest, write_manifest};
use crate::ManagerResult;

/// An archive written by [`PackageManager::build_package`]
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltPackage {
    pub path: PathBuf,
    pub manifest: PackageManifest,
    pub format: ArchiveFormat,
    pub size: u64,
}

/// `{name}-{version}.{ext}`
pub fn archive_name(manifest: &PackageManifest, format: ArchiveFormat) -> String {
    format!("{}-{}.{}", manifest.name, manifest.version, format.extension())
}

fn readme(name: &str, description: &str) -> String {
    format!(
        "# {name}\n\n{description}\n\n## Installation\n\n```bash\ncriage install {name}\n```\n"
    )
}

impl PackageManager {
    /// Scaffold a new package at `parent/name`: manifest, `src/` and a README
    pub async fn create_package(
        &self,
        parent: &Path,
        name: &str,
        author: &str,
        description: &str,
    ) -> ManagerResult<PathBuf> {
        validate_name(name)?;
        let dir = parent.join(name);
        if find_manifest(&dir).is_some() {
            return Err(CriageError::ConfigValidation {
                field: "name".to_string(),
                reason: format!("{} already contains a package", dir.display()),
            });
        }

        let src = dir.join("src");
        tokio::fs::create_dir_all(&src)
            .await
            .map_err(|e| CriageError::io(format!("Failed to create {}", src.display()), e))?;

        let manifest = PackageManifest::scaffold(name, author, description);
        write_manifest(&dir, &manifest).await?;

        let readme_path = dir.join("README.md");
        tokio::fs::write(&readme_path, readme(name, description))
            .await
            .map_err(|e| CriageError::io(format!("Failed to write {}", readme_path.display()), e))?;

        tracing::info!(name, path = %dir.display(), "created package");
        Ok(dir)
    }

    /// Pack `source_dir` into an archive.
    ///
    /// Without `output` the archive lands in `source_dir` under its default
    /// name. `level` falls back to the configured compression level.
    pub async fn build_package(
        &self,
        source_dir: &Path,
        output: Option<&Path>,
        format: ArchiveFormat,
        level: Option<i32>,
    ) -> ManagerResult<BuiltPackage> {
        let manifest = read_manifest(source_dir).await?;
        let level = level.unwrap_or(self.ctx.config.compression_level);
        let path = match output {
            Some(path) => path.to_path_buf(),
            None => source_dir.join(archive_name(&manifest, format)),
        };

        // Packed outside the tree so the archive never contains itself
        let staging = self.staging_dir()?;
        let packed = staging.path().join(archive_name(&manifest, format));
        self.pack(source_dir, &packed, format, level).await?;

        let size = tokio::fs::copy(&packed, &path)
            .await
            .map_err(|e| CriageError::io(format!("Failed to write {}", path.display()), e))?;

        tracing::info!(
            name = %manifest.name,
            version = %manifest.version,
            %format,
            size,
            path = %path.display(),
            "built package"
        );
        Ok(BuiltPackage {
            path,
            manifest,
            format,
            size,
        })
    }

    /// Build `source_dir` as a `.criage` archive and upload it.
    ///
    /// `registry` names a configured repository or gives a URL; `token`
    /// replaces the repository's own token. The archive only lives in the
    /// temp directory and is gone when this returns.
    pub async fn publish_package(
        &self,
        source_dir: &Path,
        registry: Option<&str>,
        token: Option<&str>,
    ) -> ManagerResult<UploadResponse> {
        let mut repo = self.repository(registry)?;
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            repo.token = Some(token.to_string());
        }

        let manifest = read_manifest(source_dir).await?;
        let staging = self.staging_dir()?;
        let archive = staging
            .path()
            .join(format!("{}-{}.criage", manifest.name, manifest.version));
        self.pack(
            source_dir,
            &archive,
            ArchiveFormat::TarZst,
            self.ctx.config.compression_level,
        )
        .await?;

        tracing::info!(
            name = %manifest.name,
            version = %manifest.version,
            repository = %repo.name,
            "publishing"
        );
        self.ctx.client.upload(&repo, &archive).await
    }

    async fn pack(&self, source_dir: &Path, archive: &Path, format: ArchiveFormat, level: i32) -> ManagerResult<()> {
        let codec = self.ctx.codecs.get(format)?;
        let (source, target) = (source_dir.to_path_buf(), archive.to_path_buf());
        blocking(move || codec.pack_file(&source, &target, level)).await
    }
}
