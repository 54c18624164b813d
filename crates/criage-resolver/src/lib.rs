//! Package resolution for criage
//!
//! Turns a package name, an optional version and a target platform into one
//! concrete downloadable file by consulting repositories in priority order.
//! Only the requested package is resolved; dependencies are not followed.

pub mod resolve;

// Re-export main types
pub use resolve::{select, Resolution, Resolver};

use criage_core::error::CriageError;

/// Result type for resolution
pub type ResolverResult<T> = Result<T, CriageError>;
