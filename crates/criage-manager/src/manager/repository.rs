//! Direct repository queries

use criage_core::error::CriageError;
use criage_core::types::{by_priority, PackageListPage, RemoteVersion, Repository, Statistics};
use criage_registry::RefreshResponse;
use serde_json::{Map, Value};

use super::PackageManager;
use crate::ManagerResult;

impl PackageManager {
    /// Repository named or located by `target`.
    ///
    /// Without a target the highest-priority enabled repository is used. A
    /// URL that matches no configured repository is used as is.
    pub fn repository(&self, target: Option<&str>) -> ManagerResult<Repository> {
        let repositories = &self.ctx.config.repositories;

        let Some(target) = target.filter(|t| !t.is_empty()) else {
            return by_priority(repositories)
                .into_iter()
                .next()
                .ok_or_else(|| CriageError::ConfigValidation {
                    field: "repositories".to_string(),
                    reason: "no enabled repository is configured".to_string(),
                });
        };

        let wanted = target.trim_end_matches('/');
        if let Some(repo) = repositories
            .iter()
            .find(|r| r.name == target || r.url.trim_end_matches('/') == wanted)
        {
            return Ok(repo.clone());
        }

        let secure = target.starts_with("https://");
        if secure || (target.starts_with("http://") && !self.ctx.config.force_https) {
            return Ok(Repository::new(wanted, wanted, 0));
        }

        Err(CriageError::ConfigValidation {
            field: "repository".to_string(),
            reason: format!("'{}' is neither a configured repository nor an allowed URL", target),
        })
    }

    pub async fn repository_info(&self, target: Option<&str>) -> ManagerResult<Map<String, Value>> {
        let repo = self.repository(target)?;
        self.ctx.client.repository_info(&repo).await
    }

    pub async fn repository_stats(&self, target: Option<&str>) -> ManagerResult<Statistics> {
        let repo = self.repository(target)?;
        self.ctx.client.stats(&repo).await
    }

    /// Ask a repository to rebuild its index; `token` overrides the configured one
    pub async fn refresh_index(
        &self,
        target: Option<&str>,
        token: Option<&str>,
    ) -> ManagerResult<RefreshResponse> {
        let mut repo = self.repository(target)?;
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            repo.token = Some(token.to_string());
        }

        let response = self.ctx.client.refresh_index(&repo).await?;
        tracing::info!(
            repository = %repo.name,
            total = response.total_packages,
            "index refreshed"
        );
        Ok(response)
    }

    /// One page of a repository's packages; out-of-range paging is clamped
    pub async fn list_repository_packages(
        &self,
        target: Option<&str>,
        page: i64,
        limit: i64,
    ) -> ManagerResult<PackageListPage> {
        let repo = self.repository(target)?;
        self.ctx.client.list_packages(&repo, page, limit).await
    }

    pub async fn version_info(
        &self,
        target: Option<&str>,
        name: &str,
        version: &str,
    ) -> ManagerResult<RemoteVersion> {
        let repo = self.repository(target)?;
        self.ctx.client.fetch_version(&repo, name, version).await
    }
}
