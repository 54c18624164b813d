//! Repository-side projections of packages.
//!
//! These mirror the JSON bodies served under `/api/v1/` by a criage
//! repository. Every field is defaulted so that older servers which omit
//! a field still decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A package as a repository describes it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemotePackage {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub homepage: String,
    /// Source repository URL
    #[serde(default)]
    pub repository: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub keywords: Vec<String>,
    /// Repository-supplied order is authoritative; the last entry is the latest
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub versions: Vec<RemoteVersion>,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

impl RemotePackage {
    /// The version a request without an explicit version resolves to
    pub fn latest_version(&self) -> Option<&RemoteVersion> {
        self.versions.last()
    }

    /// Exact string match on the version
    pub fn find_version(&self, version: &str) -> Option<&RemoteVersion> {
        self.versions.iter().find(|v| v.version == version)
    }
}

/// One published version of a package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteVersion {
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub dev_dependencies: BTreeMap<String, String>,
    /// At most one file per (os, arch); first match wins if violated
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub files: Vec<RemoteFile>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub uploaded: Option<DateTime<Utc>>,
    #[serde(default)]
    pub downloads: u64,
}

impl RemoteVersion {
    /// First file built for exactly this os/arch pair
    pub fn file_for(&self, os: &str, arch: &str) -> Option<&RemoteFile> {
        self.files.iter().find(|f| f.os == os && f.arch == arch)
    }
}

/// One platform build of a version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub os: String,
    pub arch: String,
    #[serde(default)]
    pub format: String,
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub url: String,
}

/// Search hit as ranked by a repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    /// Higher is more relevant
    #[serde(default)]
    pub score: f64,
}

/// Aggregate statistics of a repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub total_downloads: u64,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub packages_by_license: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub packages_by_author: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub popular_packages: Vec<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_packages: u64,
}

/// One page of the repository package listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageListPage {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub packages: Vec<RemotePackage>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total_pages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(os: &str, arch: &str, name: &str) -> RemoteFile {
        RemoteFile {
            os: os.to_string(),
            arch: arch.to_string(),
            format: "tar.gz".to_string(),
            filename: name.to_string(),
            ..RemoteFile::default()
        }
    }

    #[test]
    fn test_latest_is_last_entry_not_highest() {
        let pkg = RemotePackage {
            name: "demo".to_string(),
            versions: vec![
                RemoteVersion {
                    version: "2.0.0".to_string(),
                    ..RemoteVersion::default()
                },
                RemoteVersion {
                    version: "1.5.0".to_string(),
                    ..RemoteVersion::default()
                },
            ],
            ..RemotePackage::default()
        };
        assert_eq!(pkg.latest_version().unwrap().version, "1.5.0");
        assert_eq!(pkg.find_version("2.0.0").unwrap().version, "2.0.0");
        assert!(pkg.find_version("3.0.0").is_none());
    }

    #[test]
    fn test_file_for_first_match_wins() {
        let version = RemoteVersion {
            version: "1.0.0".to_string(),
            files: vec![
                file("linux", "arm64", "a.tar.gz"),
                file("linux", "amd64", "first.tar.gz"),
                file("linux", "amd64", "second.tar.gz"),
            ],
            ..RemoteVersion::default()
        };
        assert_eq!(
            version.file_for("linux", "amd64").unwrap().filename,
            "first.tar.gz"
        );
        assert!(version.file_for("darwin", "amd64").is_none());
    }

    #[test]
    fn test_decode_sparse_package() {
        let json = r#"{
            "name": "demo",
            "versions": [{"version": "1.0.0", "files": [
                {"os": "linux", "arch": "amd64", "filename": "demo.tar.gz"}
            ]}],
            "updated": "2024-01-01T00:00:00Z"
        }"#;
        let pkg: RemotePackage = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.versions.len(), 1);
        assert_eq!(pkg.versions[0].files[0].filename, "demo.tar.gz");
        assert!(pkg.updated.is_some());
        assert_eq!(pkg.downloads, 0);
    }

    #[test]
    fn test_decode_null_collections() {
        let json = r#"{
            "name": "demo",
            "keywords": null,
            "versions": [{
                "version": "1.0.0",
                "dependencies": null,
                "dev_dependencies": null,
                "files": null
            }]
        }"#;
        let pkg: RemotePackage = serde_json::from_str(json).unwrap();
        assert!(pkg.keywords.is_empty());
        let version = pkg.latest_version().unwrap();
        assert!(version.dependencies.is_empty());
        assert!(version.files.is_empty());

        let page: PackageListPage =
            serde_json::from_str(r#"{"packages": null, "total": 0}"#).unwrap();
        assert!(page.packages.is_empty());

        let json = r#"{"packages_by_license": null, "popular_packages": null}"#;
        let stats: Statistics = serde_json::from_str(json).unwrap();
        assert!(stats.packages_by_license.is_empty());
        assert!(stats.popular_packages.is_empty());
    }
}
