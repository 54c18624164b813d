//! Registry of installed packages
//!
//! Installed-package records live in two independent partitions, one per
//! scope. Each partition is a single `packages.json` document mapping package
//! names to records, rewritten in full on every change. The in-memory view is
//! guarded by one reader/writer lock per process.

pub mod partition;
pub mod store;

// Re-export main types
pub use partition::{Partition, PARTITION_FILE};
pub use store::RegistryStore;

use criage_core::error::CriageError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, CriageError>;
