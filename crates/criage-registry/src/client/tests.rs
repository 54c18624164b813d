//! Unit tests for the repository client

use super::*;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> RepositoryClient {
    let limiter = Arc::new(RateLimiter::new(1000));
    RepositoryClient::new(Duration::from_secs(5), limiter).unwrap()
}

fn repo(server: &MockServer) -> Repository {
    Repository::new("test", server.uri(), 1)
}

fn demo_package() -> serde_json::Value {
    json!({
        "name": "demo",
        "description": "Demo package",
        "author": "someone",
        "license": "MIT",
        "versions": [
            {
                "version": "1.0.0",
                "files": [
                    {"os": "linux", "arch": "amd64", "format": "tar.gz", "filename": "demo-1.0.0.tar.gz", "size": 10}
                ]
            },
            {"version": "1.1.0", "files": []}
        ],
        "downloads": 42
    })
}

#[test]
fn test_clamp_page() {
    assert_eq!(clamp_page(0, 0), (1, DEFAULT_PAGE_LIMIT));
    assert_eq!(clamp_page(-3, 101), (1, DEFAULT_PAGE_LIMIT));
    assert_eq!(clamp_page(4, 100), (4, 100));
    assert_eq!(clamp_page(2, 1), (2, 1));
}

#[test]
fn test_download_url() {
    let repo = Repository::new("main", "https://packages.example.com/", 1);
    assert_eq!(
        RepositoryClient::download_url(&repo, "demo", "1.0.0", "demo-1.0.0.tar.gz"),
        "https://packages.example.com/api/v1/download/demo/1.0.0/demo-1.0.0.tar.gz"
    );
}

#[tokio::test]
async fn test_fetch_package_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/packages/demo"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": demo_package()})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let package = client().fetch_package(&repo(&server), "demo").await.unwrap();
    assert_eq!(package.name, "demo");
    assert_eq!(package.versions.len(), 2);
    assert_eq!(package.latest_version().unwrap().version, "1.1.0");
}

#[tokio::test]
async fn test_fetch_package_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/packages/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/packages/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let client = client();
    let result = client.fetch_package(&repo(&server), "missing").await;
    assert!(matches!(result, Err(CriageError::PackageNotFound { .. })));

    let result = client.fetch_package(&repo(&server), "empty").await;
    assert!(matches!(result, Err(CriageError::PackageNotFound { .. })));
}

#[tokio::test]
async fn test_server_error_is_remote_unavailable_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/packages/demo"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let result = client().fetch_package(&repo(&server), "demo").await;
    match result {
        Err(err @ CriageError::RemoteUnavailable { .. }) => assert!(err.is_recoverable()),
        other => panic!("expected RemoteUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_bearer_token_is_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/packages/demo"))
        .and(header("Authorization", "Bearer s3cret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": demo_package()})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let repo = repo(&server).with_token("s3cret");
    assert!(client().fetch_package(&repo, "demo").await.is_ok());
}

#[tokio::test]
async fn test_fetch_version_not_found_is_distinct() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/packages/demo/9.9.9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/packages/demo/1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"version": "1.0.0", "checksum": "abc"}
        })))
        .mount(&server)
        .await;

    let client = client();
    let result = client.fetch_version(&repo(&server), "demo", "9.9.9").await;
    match result {
        Err(CriageError::VersionNotFound { name, version }) => {
            assert_eq!(name, "demo");
            assert_eq!(version, "9.9.9");
        },
        other => panic!("expected VersionNotFound, got {:?}", other),
    }

    let version = client.fetch_version(&repo(&server), "demo", "1.0.0").await.unwrap();
    assert_eq!(version.checksum, "abc");
}

#[tokio::test]
async fn test_version_is_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/packages/demo/1.0%3Fx%2Fy"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = client().fetch_version(&repo(&server), "demo", "1.0?x/y").await;
    assert!(matches!(result, Err(CriageError::VersionNotFound { .. })));
}

#[tokio::test]
async fn test_search_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .and(query_param("q", "demo tool"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "query": "demo tool",
                "results": [{"name": "demo", "version": "1.0.0", "score": 0.5}],
                "total": 1
            }
        })))
        .mount(&server)
        .await;

    let results = client().search(&repo(&server), "demo tool").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].score, 0.5);
}

#[tokio::test]
async fn test_search_failure_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "error": "index offline"})),
        )
        .mount(&server)
        .await;

    let err = client().search(&repo(&server), "x").await.unwrap_err();
    assert!(err.to_string().contains("index offline"));
}

#[tokio::test]
async fn test_list_packages_clamps_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/packages"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"packages": [demo_package()], "total": 1, "page": 1, "limit": 20, "total_pages": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client().list_packages(&repo(&server), 0, 500).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.packages[0].name, "demo");
}

#[tokio::test]
async fn test_stats_and_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"total_downloads": 7, "total_packages": 3}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"name": "Test Repository", "version": "1.0"}
        })))
        .mount(&server)
        .await;

    let client = client();
    let stats = client.stats(&repo(&server)).await.unwrap();
    assert_eq!(stats.total_downloads, 7);
    assert_eq!(stats.total_packages, 3);

    let info = client.repository_info(&repo(&server)).await.unwrap();
    assert_eq!(info["name"], "Test Repository");
}

#[tokio::test]
async fn test_stats_without_data_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let result = client().stats(&repo(&server)).await;
    assert!(matches!(result, Err(CriageError::RemoteUnavailable { .. })));
}

#[tokio::test]
async fn test_refresh_requires_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client().refresh_index(&repo(&server)).await;
    assert!(matches!(result, Err(CriageError::InvalidCredentials { .. })));
}

#[tokio::test]
async fn test_refresh_unauthorized_and_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/refresh"))
        .and(header("Authorization", "Bearer good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "refreshed",
            "total_packages": 12,
            "last_updated": "2024-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/refresh"))
        .and(header("Authorization", "Bearer bad"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client();
    let refreshed = client
        .refresh_index(&repo(&server).with_token("good"))
        .await
        .unwrap();
    assert_eq!(refreshed.total_packages, 12);

    let result = client.refresh_index(&repo(&server).with_token("bad")).await;
    assert!(matches!(result, Err(CriageError::InvalidCredentials { .. })));
}

#[tokio::test]
async fn test_upload_requires_created() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("demo-1.0.0.tar.gz");
    std::fs::write(&archive, b"archive bytes").unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/upload"))
        .and(header("Authorization", "Bearer created"))
        .and(body_string_contains("name=\"package\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "message": "ok",
            "filename": "demo-1.0.0.tar.gz",
            "size": 13
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/upload"))
        .and(header("Authorization", "Bearer ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/upload"))
        .and(header("Authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client();
    let uploaded = client
        .upload(&repo(&server).with_token("created"), &archive)
        .await
        .unwrap();
    assert_eq!(uploaded.size, 13);

    // 200 is not a successful upload
    let result = client.upload(&repo(&server).with_token("ok"), &archive).await;
    assert!(matches!(result, Err(CriageError::RemoteUnavailable { .. })));

    let result = client.upload(&repo(&server).with_token("expired"), &archive).await;
    assert!(matches!(result, Err(CriageError::InvalidCredentials { .. })));
}

#[tokio::test]
async fn test_download_streams_to_file() {
    let temp = tempfile::tempdir().unwrap();
    let dest = temp.path().join("artifact.tmp");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/download/demo/1.0.0/demo.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
        .mount(&server)
        .await;

    let repo = repo(&server);
    let url = RepositoryClient::download_url(&repo, "demo", "1.0.0", "demo.tar.gz");
    let written = client().download(&repo, &url, &dest).await.unwrap();
    assert_eq!(written, 4096);
    assert_eq!(std::fs::read(&dest).unwrap().len(), 4096);

    let missing = RepositoryClient::download_url(&repo, "demo", "1.0.0", "gone.tar.gz");
    let result = client().download(&repo, &missing, &dest).await;
    tokio_test::assert_err!(result);
}
