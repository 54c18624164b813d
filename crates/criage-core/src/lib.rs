//! # criage-core
//!
//! Core types and utilities shared across all criage crates.
//!
//! This crate provides:
//! - Installed-package records and the global/local `Scope` split
//! - Repository-side projections (`RemotePackage`, `RemoteVersion`, `RemoteFile`)
//! - `CriageError` for unified error handling
//! - Utility functions for paths, directory sizes and checksums
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (InstalledPackage, Repository, Platform, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{CriageError, CriageResult};
pub use types::{
    InstalledPackage, PackageHooks, PackageListPage, PackageManifest, Platform, RemoteFile,
    RemotePackage, RemoteVersion, Repository, ResolutionPolicy, Scope, SearchResult, Statistics,
};
