//! Priority-ordered, first-match resolution

use criage_core::error::CriageError;
use criage_core::types::{
    by_priority, InstalledPackage, Platform, RemoteFile, RemotePackage, RemoteVersion, Repository,
    ResolutionPolicy, Scope,
};
use criage_registry::RepositoryClient;

use crate::ResolverResult;

/// A concrete artifact chosen for a request
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Repository that satisfied the request
    pub repository: Repository,
    pub package: RemotePackage,
    pub version: RemoteVersion,
    pub file: RemoteFile,
    pub download_url: String,
}

impl Resolution {
    /// Record shape for the resolved artifact, before anything is unpacked
    pub fn to_installed(&self, name: &str, scope: Scope) -> InstalledPackage {
        let mut record = InstalledPackage::new(name, self.version.version.clone(), scope);
        record.description = if self.version.description.is_empty() {
            self.package.description.clone()
        } else {
            self.version.description.clone()
        };
        record.author = self.package.author.clone();
        record.license = self.package.license.clone();
        record.dependencies = self.version.dependencies.clone();
        record.size = self.file.size;
        record
    }
}

/// Pick the version and the platform file from one package.
///
/// Without an explicit version the last listed version is taken; repository
/// order is authoritative. The first file for the exact os/arch pair wins.
pub fn select<'a>(
    package: &'a RemotePackage,
    version: Option<&str>,
    platform: &Platform,
) -> ResolverResult<(&'a RemoteVersion, &'a RemoteFile)> {
    let selected = match version {
        Some(wanted) => package.find_version(wanted),
        None => package.latest_version(),
    }
    .ok_or_else(|| CriageError::VersionNotFound {
        name: package.name.clone(),
        version: version.unwrap_or("latest").to_string(),
    })?;

    let file = selected
        .file_for(&platform.os, &platform.arch)
        .ok_or_else(|| CriageError::PlatformNotFound {
            name: package.name.clone(),
            version: selected.version.clone(),
            os: platform.os.clone(),
            arch: platform.arch.clone(),
        })?;

    Ok((selected, file))
}

/// Walks repositories in ascending priority and stops at the first match
#[derive(Debug, Clone)]
pub struct Resolver {
    client: RepositoryClient,
    policy: ResolutionPolicy,
}

impl Resolver {
    pub fn new(client: RepositoryClient, policy: ResolutionPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Resolve `name` against `repositories`.
    ///
    /// Disabled repositories are skipped and a repository that fails or lacks
    /// the package is passed over. What happens when a repository has the
    /// package but no matching version or platform file depends on the
    /// policy. Every failure collapses into `PackageNotFound`.
    pub async fn resolve(
        &self,
        repositories: &[Repository],
        name: &str,
        version: Option<&str>,
        platform: &Platform,
    ) -> ResolverResult<Resolution> {
        for repo in by_priority(repositories) {
            let package = match self.client.fetch_package(&repo, name).await {
                Ok(package) => package,
                Err(e) if e.is_not_found() => {
                    tracing::debug!(repository = %repo.name, name, "package not in repository");
                    continue;
                },
                Err(e) => {
                    tracing::warn!(repository = %repo.name, name, error = %e, "repository lookup failed, skipping");
                    continue;
                },
            };

            let choice = select(&package, version, platform)
                .map(|(selected, file)| (selected.clone(), file.clone()));

            match choice {
                Ok((version, file)) => {
                    tracing::info!(
                        repository = %repo.name,
                        name,
                        version = %version.version,
                        %platform,
                        "resolved"
                    );
                    let download_url = RepositoryClient::download_url(
                        &repo,
                        &package.name,
                        &version.version,
                        &file.filename,
                    );
                    return Ok(Resolution {
                        repository: repo,
                        package,
                        version,
                        file,
                        download_url,
                    });
                },
                Err(miss) => match self.policy {
                    ResolutionPolicy::FirstSatisfying => {
                        tracing::debug!(repository = %repo.name, reason = %miss, "no match, trying next repository");
                    },
                    ResolutionPolicy::FirstContaining => {
                        tracing::debug!(repository = %repo.name, reason = %miss, "authoritative repository has no match");
                        break;
                    },
                },
            }
        }

        Err(CriageError::PackageNotFound {
            name: name.to_string(),
        })
    }
}
