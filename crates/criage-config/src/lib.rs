//! Configuration for the criage package manager
//!
//! This crate defines the configuration model, its defaults, and the loader
//! that reads `~/.criage/config.toml` (or the older `config.json`), applies
//! `CRIAGE_*` environment overrides and validates the result.

pub mod loader;
pub mod model;

// Re-export main types
pub use loader::{ConfigLoader, ConfigSource};
pub use model::{Config, PartialConfig};

use criage_core::error::CriageError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, CriageError>;
