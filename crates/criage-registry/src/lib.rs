//! Repository client for the criage package manager
//!
//! This crate provides the process-wide rate limiter and the HTTP client that
//! talks to criage repositories. Every outbound call waits for a permit first
//! and is issued exactly once; retry policy belongs to the caller.

pub mod api;
pub mod client;
pub mod limiter;

// Re-export main types
pub use api::{ApiResponse, RefreshResponse, SearchData, UploadResponse};
pub use client::{clamp_page, RepositoryClient, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use limiter::{RateLimiter, DEFAULT_RATE};

use criage_core::error::CriageError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, CriageError>;
