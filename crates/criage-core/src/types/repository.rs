//! Repository endpoint descriptions.

use serde::{Deserialize, Serialize};

/// A remote package repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub url: String,
    /// Lower value is consulted first
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Repository {
    /// Create an enabled repository without a token
    pub fn new(name: impl Into<String>, url: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            priority,
            enabled: true,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Join an API path onto the base URL without doubling slashes
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// API path followed by caller-supplied segments, each percent-encoded
    /// as exactly one path segment
    pub fn endpoint_with(&self, path: &str, segments: &[&str]) -> String {
        let base = self.endpoint(path);
        let Ok(mut url) = url::Url::parse(&base) else {
            // Unparseable bases fail at request time anyway
            return format!("{}/{}", base.trim_end_matches('/'), segments.join("/"));
        };
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.into()
    }

    /// Token, ignoring empty strings left in configuration files
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// How the resolver treats a repository that has the package name but not
/// the requested version or platform build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionPolicy {
    /// Skip it and keep going down the priority list
    #[default]
    FirstSatisfying,
    /// Stop there: the first repository carrying the name is authoritative
    FirstContaining,
}

/// Enabled repositories in ascending priority; equal priorities keep their order
pub fn by_priority(repositories: &[Repository]) -> Vec<Repository> {
    let mut ordered: Vec<Repository> = repositories.iter().filter(|r| r.enabled).cloned().collect();
    ordered.sort_by_key(|r| r.priority);
    ordered
}
