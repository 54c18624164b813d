//! # criage-manager
//!
//! Lifecycle coordination for criage packages.
//!
//! The [`PackageManager`] drives install, uninstall, update, search and list
//! over an explicit [`Context`] that owns every shared component: the
//! configuration, the rate limiter, the repository client, the registry store,
//! the resolver and the archive codecs. It also carries the authoring side
//! (create, build, publish) and thin repository passthroughs.

pub mod context;
pub mod manager;
pub mod manifest;

// Re-export main types
pub use context::{Context, InstallLocks};
pub use manager::{BuiltPackage, InstallOptions, PackageManager};
pub use manifest::{find_manifest, read_manifest, write_manifest};

use criage_core::error::CriageError;

/// Result type for lifecycle operations
pub type ManagerResult<T> = Result<T, CriageError>;
