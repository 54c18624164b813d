//! Repository API response types

use criage_core::types::{null_as_default, SearchResult};
use serde::{Deserialize, Serialize};

/// Common `{success, data, error|message}` envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Server-supplied reason for a failed call, preferring `error`
    pub fn reason(&self) -> String {
        self.error
            .as_deref()
            .filter(|e| !e.is_empty())
            .or(self.message.as_deref())
            .unwrap_or("no reason given")
            .to_string()
    }
}

/// Payload of `GET /api/v1/search`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchData {
    #[serde(default)]
    pub query: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub total: u64,
}

/// Body of a successful `POST /api/v1/upload` (not enveloped)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size: u64,
}

/// Body of `POST /api/v1/refresh` (not enveloped)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub total_packages: u64,
    #[serde(default)]
    pub last_updated: String,
}
