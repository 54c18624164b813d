//! Utility functions and helpers.
//!
//! Common functionality used across multiple criage crates.

pub mod hash;
pub mod path;

// Re-export commonly used utilities
pub use hash::{sha256_file, sha256_hex, verify_file_checksum};
pub use path::{dir_size, is_safe_path, normalize_path, safe_join};
