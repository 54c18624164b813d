//! Archive codecs for criage packages
//!
//! Package artifacts are tar streams compressed with gzip or zstd. This crate
//! packs a directory tree into such a stream and unpacks one into a fresh
//! directory, refusing entries that would land outside it.

pub mod codec;
pub mod format;
pub mod tarball;

// Re-export main types
pub use codec::{ArchiveCodec, CodecRegistry, TarGzCodec, TarZstCodec};
pub use format::ArchiveFormat;

use criage_core::error::CriageError;

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, CriageError>;
