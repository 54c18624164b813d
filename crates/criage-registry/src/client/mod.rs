//! HTTP client for criage repositories

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use criage_core::error::CriageError;
use criage_core::types::{
    PackageListPage, RemotePackage, RemoteVersion, Repository, SearchResult, Statistics,
};

use crate::api::{ApiResponse, RefreshResponse, SearchData, UploadResponse};
use crate::limiter::RateLimiter;
use crate::RegistryResult;

/// Page size used when the requested one is out of range
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
/// Largest page size a repository will serve
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Clamp pagination: pages start at 1, limits outside [1, 100] become 20
pub fn clamp_page(page: i64, limit: i64) -> (u32, u32) {
    let page = u32::try_from(page.max(1)).unwrap_or(u32::MAX);
    let limit = match u32::try_from(limit) {
        Ok(limit) if (1..=MAX_PAGE_LIMIT).contains(&limit) => limit,
        _ => DEFAULT_PAGE_LIMIT,
    };
    (page, limit)
}

/// Client for every repository; all calls share one rate limiter
#[derive(Debug, Clone)]
pub struct RepositoryClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    limiter: Arc<RateLimiter>,
}

impl RepositoryClient {
    /// Create a client whose requests time out after `timeout`
    pub fn new(timeout: Duration, limiter: Arc<RateLimiter>) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .gzip(true)
            .user_agent(concat!("criage/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CriageError::remote("Failed to create HTTP client", e))?;

        Ok(Self { client, limiter })
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Download locator for one platform file of a version
    pub fn download_url(repo: &Repository, name: &str, version: &str, filename: &str) -> String {
        repo.endpoint_with("api/v1/download", &[name, version, filename])
    }

    /// Fetch a package with all of its versions
    pub async fn fetch_package(&self, repo: &Repository, name: &str) -> RegistryResult<RemotePackage> {
        let url = repo.endpoint_with("api/v1/packages", &[name]);
        let response = self.send(repo, self.request(repo, Method::GET, &url)).await?;

        match response.status() {
            StatusCode::OK => {
                let envelope: ApiResponse<RemotePackage> = decode(repo, response, "package").await?;
                match envelope.data {
                    Some(package) if envelope.success => Ok(package),
                    _ => Err(CriageError::PackageNotFound {
                        name: name.to_string(),
                    }),
                }
            },
            StatusCode::NOT_FOUND => Err(CriageError::PackageNotFound {
                name: name.to_string(),
            }),
            status => Err(status_error(repo, "package lookup", status)),
        }
    }

    /// Fetch one version of a package
    pub async fn fetch_version(
        &self,
        repo: &Repository,
        name: &str,
        version: &str,
    ) -> RegistryResult<RemoteVersion> {
        let url = repo.endpoint_with("api/v1/packages", &[name, version]);
        let response = self.send(repo, self.request(repo, Method::GET, &url)).await?;

        match response.status() {
            StatusCode::OK => {
                let envelope = decode(repo, response, "version").await?;
                expect_data(repo, envelope, "version lookup")
            },
            StatusCode::NOT_FOUND => Err(CriageError::VersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
            }),
            status => Err(status_error(repo, "version lookup", status)),
        }
    }

    pub async fn search(&self, repo: &Repository, query: &str) -> RegistryResult<Vec<SearchResult>> {
        let url = repo.endpoint("api/v1/search");
        let request = self.request(repo, Method::GET, &url).query(&[("q", query)]);
        let response = self.send(repo, request).await?;

        if response.status() != StatusCode::OK {
            return Err(status_error(repo, "search", response.status()));
        }

        let envelope: ApiResponse<SearchData> = decode(repo, response, "search").await?;
        if !envelope.success {
            return Err(CriageError::remote_status(format!(
                "{}: search failed: {}",
                repo.name,
                envelope.reason()
            )));
        }
        Ok(envelope.data.unwrap_or_default().results)
    }

    /// One page of the repository's package listing
    pub async fn list_packages(
        &self,
        repo: &Repository,
        page: i64,
        limit: i64,
    ) -> RegistryResult<PackageListPage> {
        let (page, limit) = clamp_page(page, limit);
        let url = repo.endpoint("api/v1/packages");
        let request = self
            .request(repo, Method::GET, &url)
            .query(&[("page", page), ("limit", limit)]);
        let response = self.send(repo, request).await?;

        if response.status() != StatusCode::OK {
            return Err(status_error(repo, "package listing", response.status()));
        }
        let envelope = decode(repo, response, "package listing").await?;
        expect_data(repo, envelope, "package listing")
    }

    pub async fn stats(&self, repo: &Repository) -> RegistryResult<Statistics> {
        let url = repo.endpoint("api/v1/stats");
        let response = self.send(repo, self.request(repo, Method::GET, &url)).await?;

        if response.status() != StatusCode::OK {
            return Err(status_error(repo, "stats", response.status()));
        }
        let envelope = decode(repo, response, "stats").await?;
        expect_data(repo, envelope, "stats")
    }

    /// Free-form description served at the API root
    pub async fn repository_info(
        &self,
        repo: &Repository,
    ) -> RegistryResult<serde_json::Map<String, serde_json::Value>> {
        let url = repo.endpoint("api/v1/");
        let response = self.send(repo, self.request(repo, Method::GET, &url)).await?;

        if response.status() != StatusCode::OK {
            return Err(status_error(repo, "repository info", response.status()));
        }
        let envelope = decode(repo, response, "repository info").await?;
        expect_data(repo, envelope, "repository info")
    }

    /// Ask the repository to rebuild its package index (token required)
    pub async fn refresh_index(&self, repo: &Repository) -> RegistryResult<RefreshResponse> {
        if repo.bearer_token().is_none() {
            return Err(CriageError::InvalidCredentials {
                repository: repo.name.clone(),
            });
        }

        let url = repo.endpoint("api/v1/refresh");
        let request = self
            .request(repo, Method::POST, &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        let response = self.send(repo, request).await?;

        match response.status() {
            StatusCode::OK => {},
            StatusCode::UNAUTHORIZED => {
                return Err(CriageError::InvalidCredentials {
                    repository: repo.name.clone(),
                })
            },
            status => return Err(status_error(repo, "index refresh", status)),
        }

        let body: RefreshResponse = decode(repo, response, "refresh").await?;
        if !body.success {
            return Err(CriageError::remote_status(format!(
                "{}: index refresh failed: {}",
                repo.name, body.message
            )));
        }
        Ok(body)
    }

    /// Upload one archive as multipart field `package`
    pub async fn upload(&self, repo: &Repository, archive: &Path) -> RegistryResult<UploadResponse> {
        let bytes = tokio::fs::read(archive)
            .await
            .map_err(|e| CriageError::io(format!("Failed to read {}", archive.display()), e))?;
        let filename = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "package".to_string());

        let form = Form::new().part("package", Part::bytes(bytes).file_name(filename));
        let url = repo.endpoint("api/v1/upload");
        let response = self
            .send(repo, self.request(repo, Method::POST, &url).multipart(form))
            .await?;

        match response.status() {
            StatusCode::CREATED => {},
            StatusCode::UNAUTHORIZED => {
                return Err(CriageError::InvalidCredentials {
                    repository: repo.name.clone(),
                })
            },
            status => return Err(status_error(repo, "upload", status)),
        }

        let body: UploadResponse = decode(repo, response, "upload").await?;
        if !body.success {
            return Err(CriageError::remote_status(format!(
                "{}: upload failed: {}",
                repo.name, body.message
            )));
        }
        tracing::info!(repository = %repo.name, file = %body.filename, size = body.size, "uploaded");
        Ok(body)
    }

    /// Stream an artifact into `dest`, returning the number of bytes written
    pub async fn download(&self, repo: &Repository, url: &str, dest: &Path) -> RegistryResult<u64> {
        let mut response = self.send(repo, self.request(repo, Method::GET, url)).await?;
        if response.status() != StatusCode::OK {
            return Err(status_error(repo, "download", response.status()));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| CriageError::io(format!("Failed to create {}", dest.display()), e))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CriageError::remote(format!("{}: download interrupted", repo.name), e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| CriageError::io(format!("Failed to write {}", dest.display()), e))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| CriageError::io(format!("Failed to write {}", dest.display()), e))?;

        tracing::debug!(repository = %repo.name, bytes = written, "download complete");
        Ok(written)
    }

    fn request(&self, repo: &Repository, method: Method, url: &str) -> RequestBuilder {
        let request = self.client.request(method, url);
        match repo.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Wait for a permit, then issue the request exactly once
    async fn send(&self, repo: &Repository, request: RequestBuilder) -> RegistryResult<Response> {
        let request = request
            .build()
            .map_err(|e| CriageError::remote(format!("{}: invalid request", repo.name), e))?;
        let method = request.method().clone();
        let url = request.url().clone();

        self.limiter.acquire().await;
        tracing::debug!(repository = %repo.name, %method, %url, "request");

        self.client.execute(request).await.map_err(|e| {
            CriageError::remote(format!("{}: {} {} failed", repo.name, method, url), e)
        })
    }
}

async fn decode<T: DeserializeOwned>(repo: &Repository, response: Response, what: &str) -> RegistryResult<T> {
    response.json::<T>().await.map_err(|e| {
        CriageError::remote(format!("{}: malformed {} response", repo.name, what), e)
    })
}

fn expect_data<T>(repo: &Repository, envelope: ApiResponse<T>, what: &str) -> RegistryResult<T> {
    if !envelope.success {
        return Err(CriageError::remote_status(format!(
            "{}: {} failed: {}",
            repo.name,
            what,
            envelope.reason()
        )));
    }
    envelope.data.ok_or_else(|| {
        CriageError::remote_status(format!("{}: {} returned no data", repo.name, what))
    })
}

fn status_error(repo: &Repository, what: &str, status: StatusCode) -> CriageError {
    CriageError::remote_status(format!("{}: {} returned status {}", repo.name, what, status))
}

#[cfg(test)]
mod tests;
