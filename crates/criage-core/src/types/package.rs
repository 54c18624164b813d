//! Installed package records and package manifests.
//!
//! `InstalledPackage` is what the registry store persists; `PackageManifest`
//! is what a package ships inside its archive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Installation partition. The same name may live in both at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Local,
}

impl Scope {
    /// Map the `--global` style flag onto a scope
    pub fn from_global(global: bool) -> Self {
        if global {
            Scope::Global
        } else {
            Scope::Local
        }
    }

    pub fn is_global(self) -> bool {
        matches!(self, Scope::Global)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Local => "local",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one installed package, keyed by (name, scope)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub license: String,
    pub install_date: DateTime<Utc>,
    pub install_path: PathBuf,
    /// Persisted as the `global` boolean of the partition document
    #[serde(rename = "global", with = "scope_flag")]
    pub scope: Scope,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub files: Vec<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub scripts: BTreeMap<String, String>,
}

impl InstalledPackage {
    /// Create a record with required fields, stamped with the current time
    pub fn new(name: impl Into<String>, version: impl Into<String>, scope: Scope) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: String::new(),
            author: String::new(),
            license: String::new(),
            install_date: Utc::now(),
            install_path: PathBuf::new(),
            scope,
            dependencies: BTreeMap::new(),
            size: 0,
            files: Vec::new(),
            scripts: BTreeMap::new(),
        }
    }

    /// Check if this is a valid package name
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !name.starts_with(['-', '.'])
            && !name.ends_with('-')
    }
}

mod scope_flag {
    use super::Scope;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(scope: &Scope, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(scope.is_global())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Scope, D::Error> {
        bool::deserialize(deserializer).map(Scope::from_global)
    }
}

/// Lifecycle hooks declared by a package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageHooks {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub pre_install: Vec<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub post_install: Vec<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub pre_remove: Vec<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub post_remove: Vec<String>,
}

/// Manifest shipped at the root of every package archive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub files: Vec<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub scripts: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<PackageHooks>,
    #[serde(
        default,
        deserialize_with = "super::null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl PackageManifest {
    /// File name written by `create` and preferred when reading
    pub const FILE_NAME: &'static str = "criage.json";

    /// Older archives carry JSON under this name
    pub const LEGACY_FILE_NAME: &'static str = "criage.yaml";

    /// Scaffold manifest for a freshly created package
    pub fn scaffold(name: &str, author: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            version: "0.1.0".to_string(),
            description: description.to_string(),
            author: author.to_string(),
            license: "MIT".to_string(),
            files: vec!["src/".to_string()],
            ..Self::default()
        }
    }
}
