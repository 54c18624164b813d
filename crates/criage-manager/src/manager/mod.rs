//! Package lifecycle coordination
//!
//! Every mutation follows the same order: resolve, download into a scratch
//! directory, unpack into the install directory, read the shipped manifest,
//! persist the record. The store is written before memory changes, and a
//! failure at any step removes what the operation created.

mod authoring;
mod repository;

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use criage_archive::{ArchiveCodec, ArchiveFormat};
use criage_core::error::CriageError;
use criage_core::types::{by_priority, InstalledPackage, Platform, Scope, SearchResult};
use criage_core::utils::dir_size;
use criage_resolver::Resolution;
use tempfile::TempDir;

use crate::context::Context;
use crate::manifest::read_manifest;
use crate::ManagerResult;

pub use authoring::BuiltPackage;

/// Parameters of an install request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Exact version; the latest listed one when absent
    pub version: Option<String>,
    pub global: bool,
    /// Replace an existing install of the same scope
    pub force: bool,
    pub os: Option<String>,
    pub arch: Option<String>,
}

impl InstallOptions {
    pub fn scope(&self) -> Scope {
        Scope::from_global(self.global)
    }

    /// Requested platform, with missing halves taken from the running one
    pub fn platform(&self) -> Platform {
        Platform::or_current(self.os.as_deref(), self.arch.as_deref())
    }
}

/// Coordinates installs, removals and updates over one [`Context`]
#[derive(Debug)]
pub struct PackageManager {
    ctx: Context,
}

impl PackageManager {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Install `name` into the requested scope.
    ///
    /// An existing record for the same (name, scope) is only replaced when
    /// `force` is set, whatever version was asked for.
    pub async fn install(&self, name: &str, options: &InstallOptions) -> ManagerResult<InstalledPackage> {
        validate_name(name)?;
        let scope = options.scope();
        let _guard = self.ctx.locks.acquire(name, scope).await;

        if let Some(existing) = self.ctx.store.get(name, scope) {
            if !options.force {
                return Err(CriageError::AlreadyInstalled {
                    name: name.to_string(),
                    version: existing.version,
                    scope,
                });
            }
            tracing::debug!(name, installed = %existing.version, %scope, "forcing reinstall");
        }

        let platform = options.platform();
        tracing::info!(
            name,
            version = options.version.as_deref().unwrap_or("latest"),
            %scope,
            %platform,
            "installing"
        );

        let resolution = self
            .ctx
            .resolver
            .resolve(
                &self.ctx.config.repositories,
                name,
                options.version.as_deref(),
                &platform,
            )
            .await?;

        self.install_resolved(name, scope, options.force, &resolution).await
    }

    /// Remove an installed package and its record.
    ///
    /// Install, uninstall and update of the same (name, scope) never overlap.
    ///
    /// `purge` is accepted for compatibility and removes nothing extra.
    pub async fn uninstall(&self, name: &str, scope: Scope, purge: bool) -> ManagerResult<InstalledPackage> {
        let _guard = self.ctx.locks.acquire(name, scope).await;
        let record = self.info(name, scope)?;
        if purge {
            tracing::debug!(name, "purge has no additional effect");
        }

        remove_dir_if_exists(&record.install_path).await?;
        self.ctx.store.remove(name, scope)?;

        tracing::info!(name, version = %record.version, %scope, "uninstalled");
        Ok(record)
    }

    /// Move an installed package to the latest version for this platform.
    ///
    /// The local install is preferred when the name exists in both scopes;
    /// the scope of the install is kept.
    pub async fn update(&self, name: &str) -> ManagerResult<InstalledPackage> {
        let scope = [Scope::Local, Scope::Global]
            .into_iter()
            .find(|&scope| self.ctx.store.get(name, scope).is_some())
            .ok_or_else(|| CriageError::NotInstalledAnywhere {
                name: name.to_string(),
            })?;
        let _guard = self.ctx.locks.acquire(name, scope).await;
        // Re-read under the lock; a concurrent uninstall may have won
        let current = self.info(name, scope)?;

        let resolution = self
            .ctx
            .resolver
            .resolve(&self.ctx.config.repositories, name, None, &Platform::current())
            .await?;

        if resolution.version.version == current.version {
            return Err(CriageError::AlreadyCurrent {
                name: name.to_string(),
                version: current.version,
            });
        }

        tracing::info!(
            name,
            from = %current.version,
            to = %resolution.version.version,
            scope = %current.scope,
            "updating"
        );
        self.install_resolved(name, current.scope, true, &resolution).await
    }

    /// Query every enabled repository and rank the combined hits.
    ///
    /// A failing repository contributes nothing. Equal scores keep the order
    /// in which they arrived.
    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        let mut results = Vec::new();
        for repo in by_priority(&self.ctx.config.repositories) {
            match self.ctx.client.search(&repo, query).await {
                Ok(found) => {
                    tracing::debug!(repository = %repo.name, hits = found.len(), "search results");
                    results.extend(found);
                },
                Err(e) => {
                    tracing::warn!(repository = %repo.name, error = %e, "search failed, skipping");
                },
            }
        }

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results
    }

    /// Installed packages of one scope, ascending by name
    pub fn list(&self, scope: Scope, outdated: bool) -> Vec<InstalledPackage> {
        if outdated {
            tracing::debug!("outdated filter is not applied");
        }
        self.ctx.store.list(scope)
    }

    pub fn info(&self, name: &str, scope: Scope) -> ManagerResult<InstalledPackage> {
        self.ctx
            .store
            .get(name, scope)
            .ok_or_else(|| CriageError::NotInstalled {
                name: name.to_string(),
                scope,
            })
    }

    pub fn shutdown(&self) {
        self.ctx.shutdown();
    }

    async fn install_resolved(
        &self,
        name: &str,
        scope: Scope,
        force: bool,
        resolution: &Resolution,
    ) -> ManagerResult<InstalledPackage> {
        let file = &resolution.file;
        let format = ArchiveFormat::detect(&file.format, &file.filename).ok_or_else(|| {
            CriageError::archive(format!("unsupported archive format for {}", file.filename))
        })?;
        let codec = self.ctx.codecs.get(format)?;

        // Dropped on every exit path, taking the download with it
        let staging = self.staging_dir()?;
        let archive = staging
            .path()
            .join(format!("{}.{}", name, format.extension()));
        let bytes = self
            .ctx
            .client
            .download(&resolution.repository, &resolution.download_url, &archive)
            .await?;
        tracing::debug!(name, bytes, "artifact downloaded");

        let install_path = self.ctx.scope_root(scope).as_std_path().join(name);
        if force {
            remove_dir_if_exists(&install_path).await?;
        }
        let created = !install_path.exists();

        match self
            .populate(name, scope, resolution, codec, &archive, &install_path)
            .await
        {
            Ok(record) => {
                tracing::info!(
                    name,
                    version = %record.version,
                    %scope,
                    size = record.size,
                    repository = %resolution.repository.name,
                    "installed"
                );
                Ok(record)
            },
            Err(e) => {
                if created {
                    if let Err(cleanup) = remove_dir_if_exists(&install_path).await {
                        tracing::warn!(path = %install_path.display(), error = %cleanup, "cleanup failed");
                    }
                }
                // The previous files were removed before unpacking; the record stays
                if let Some(stale) = self.ctx.store.get(name, scope).filter(|_| force) {
                    tracing::warn!(
                        name,
                        version = %stale.version,
                        %scope,
                        path = %stale.install_path.display(),
                        "previous install was removed, its record remains until reinstalled"
                    );
                }
                Err(e)
            },
        }
    }

    /// Unpack, describe and persist one install
    async fn populate(
        &self,
        name: &str,
        scope: Scope,
        resolution: &Resolution,
        codec: Arc<dyn ArchiveCodec>,
        archive: &Path,
        install_path: &Path,
    ) -> ManagerResult<InstalledPackage> {
        let (source, dest) = (archive.to_path_buf(), install_path.to_path_buf());
        blocking(move || codec.unpack_file(&source, &dest)).await?;

        let manifest = read_manifest(install_path).await?;
        if manifest.name != name || manifest.version != resolution.version.version {
            tracing::warn!(
                name,
                version = %resolution.version.version,
                manifest_name = %manifest.name,
                manifest_version = %manifest.version,
                "shipped manifest disagrees with the repository"
            );
        }

        let mut record = resolution.to_installed(name, scope);
        if !manifest.description.is_empty() {
            record.description = manifest.description;
        }
        if !manifest.author.is_empty() {
            record.author = manifest.author;
        }
        if !manifest.license.is_empty() {
            record.license = manifest.license;
        }
        if !manifest.dependencies.is_empty() {
            record.dependencies = manifest.dependencies;
        }
        record.files = manifest.files;
        record.scripts = manifest.scripts;
        record.install_path = install_path.to_path_buf();

        let root = install_path.to_path_buf();
        record.size = blocking(move || Ok(dir_size(&root))).await?;

        self.ctx.store.upsert(record.clone())?;
        Ok(record)
    }

    /// Fresh directory under the configured temp path
    fn staging_dir(&self) -> ManagerResult<TempDir> {
        let root = self.ctx.config.temp_path.as_std_path();
        std::fs::create_dir_all(root)
            .map_err(|e| CriageError::io(format!("Failed to create {}", root.display()), e))?;
        tempfile::Builder::new()
            .prefix("criage-")
            .tempdir_in(root)
            .map_err(|e| CriageError::io(format!("Failed to create scratch directory in {}", root.display()), e))
    }
}

fn validate_name(name: &str) -> ManagerResult<()> {
    if InstalledPackage::is_valid_name(name) {
        Ok(())
    } else {
        Err(CriageError::ConfigValidation {
            field: "name".to_string(),
            reason: format!("'{}' is not a valid package name", name),
        })
    }
}

async fn remove_dir_if_exists(path: &Path) -> ManagerResult<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CriageError::io(format!("Failed to remove {}", path.display()), e)),
    }
}

/// Run filesystem-heavy work off the async workers
async fn blocking<T, F>(task: F) -> ManagerResult<T>
where
    F: FnOnce() -> ManagerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| CriageError::archive(format!("background task failed: {}", e)))?
}
