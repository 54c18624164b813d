//! Configuration model and defaults

use camino::{Utf8Path, Utf8PathBuf};
use criage_core::error::CriageError;
use criage_core::types::{Repository, ResolutionPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ConfigResult;

/// Default repository consulted when nothing else is configured
pub const DEFAULT_REPOSITORY_URL: &str = "https://packages.criage.ru";

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Repositories in any order; priority decides consultation order
    pub repositories: Vec<Repository>,
    /// Root of the global install partition
    pub global_path: Utf8PathBuf,
    /// Root of the local install partition
    pub local_path: Utf8PathBuf,
    pub cache_path: Utf8PathBuf,
    /// Scratch space for downloads and unpacking
    pub temp_path: Utf8PathBuf,
    /// HTTP timeout, applied once at client construction
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,
    pub max_concurrency: usize,
    pub compression_level: i32,
    pub force_https: bool,
    /// Process-wide cap on outbound repository calls
    pub requests_per_second: u32,
    pub resolution_policy: ResolutionPolicy,
}

/// Configuration as read from disk: every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Vec<Repository>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_path: Option<Utf8PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<Utf8PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<Utf8PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_path: Option<Utf8PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_https: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_second: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_policy: Option<ResolutionPolicy>,
}

impl Config {
    /// Defaults rooted at `<home>/.criage`
    pub fn with_home(home: &Utf8Path) -> Self {
        let root = home.join(".criage");
        Self {
            repositories: vec![Repository::new("criage-main", DEFAULT_REPOSITORY_URL, 1)],
            global_path: root.join("packages"),
            local_path: Utf8PathBuf::from("./criage_modules"),
            cache_path: root.join("cache"),
            temp_path: root.join("temp"),
            timeout_secs: 30,
            max_concurrency: 4,
            compression_level: 3,
            force_https: false,
            requests_per_second: 5,
            resolution_policy: ResolutionPolicy::default(),
        }
    }

    /// Overlay whatever the file set on top of `self`
    pub fn merge(mut self, partial: PartialConfig) -> Self {
        if let Some(repositories) = partial.repositories {
            self.repositories = repositories;
        }
        if let Some(path) = partial.global_path {
            self.global_path = path;
        }
        if let Some(path) = partial.local_path {
            self.local_path = path;
        }
        if let Some(path) = partial.cache_path {
            self.cache_path = path;
        }
        if let Some(path) = partial.temp_path {
            self.temp_path = path;
        }
        if let Some(timeout) = partial.timeout {
            self.timeout_secs = timeout;
        }
        if let Some(n) = partial.max_concurrency {
            self.max_concurrency = n;
        }
        if let Some(level) = partial.compression_level {
            self.compression_level = level;
        }
        if let Some(force) = partial.force_https {
            self.force_https = force;
        }
        if let Some(rps) = partial.requests_per_second {
            self.requests_per_second = rps;
        }
        if let Some(policy) = partial.resolution_policy {
            self.resolution_policy = policy;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Directories that must exist before the manager starts
    pub fn directories(&self) -> [&Utf8Path; 4] {
        [
            &self.global_path,
            &self.local_path,
            &self.cache_path,
            &self.temp_path,
        ]
    }

    /// Validate configuration completeness
    pub fn validate(&self) -> ConfigResult<()> {
        if self.repositories.is_empty() {
            return Err(CriageError::ConfigValidation {
                field: "repositories".to_string(),
                reason: "at least one repository is required".to_string(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for repo in &self.repositories {
            if !seen.insert(repo.name.as_str()) {
                return Err(CriageError::ConfigValidation {
                    field: "repositories".to_string(),
                    reason: format!("duplicate repository name '{}'", repo.name),
                });
            }

            let parsed = url::Url::parse(&repo.url).map_err(|e| CriageError::ConfigValidation {
                field: format!("repositories.{}.url", repo.name),
                reason: format!("invalid URL '{}': {}", repo.url, e),
            })?;

            if self.force_https && parsed.scheme() != "https" {
                return Err(CriageError::ConfigValidation {
                    field: format!("repositories.{}.url", repo.name),
                    reason: "force_https is set but the URL is not https".to_string(),
                });
            }
        }

        if self.timeout_secs == 0 {
            return Err(CriageError::ConfigValidation {
                field: "timeout".to_string(),
                reason: "timeout must be at least one second".to_string(),
            });
        }

        Ok(())
    }
}
