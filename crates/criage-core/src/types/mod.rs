//! Core data types for criage package management.
//!
//! This module provides the fundamental types used throughout the workspace:
//! - Installed-package records and their scope
//! - Repository-side package, version and file projections
//! - Repository endpoints and target platforms

pub mod package;
pub mod platform;
pub mod remote;
pub mod repository;

// Re-export all public types
pub use package::{InstalledPackage, PackageHooks, PackageManifest, Scope};
pub use platform::Platform;
pub use remote::{PackageListPage, RemoteFile, RemotePackage, RemoteVersion, SearchResult, Statistics};
pub use repository::{by_priority, Repository, ResolutionPolicy};

use serde::{Deserialize, Deserializer};

/// Decode an explicit `null` collection as its empty value
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
