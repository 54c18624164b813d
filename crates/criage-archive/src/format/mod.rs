//! Archive format names

use criage_core::error::CriageError;
use std::fmt;
use std::str::FromStr;

/// Compression wrapped around the tar stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArchiveFormat {
    TarGz,
    TarZst,
}

impl ArchiveFormat {
    pub const ALL: [ArchiveFormat; 2] = [ArchiveFormat::TarGz, ArchiveFormat::TarZst];

    /// Canonical name, also used as the file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::TarZst => "tar.zst",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            ArchiveFormat::TarGz => &["tar.gz", "tgz"],
            ArchiveFormat::TarZst => &["tar.zst", "criage"],
        }
    }

    /// Guess the format from a file name's extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_ascii_lowercase();
        Self::ALL.into_iter().find(|format| {
            format
                .aliases()
                .iter()
                .any(|alias| lower.ends_with(&format!(".{}", alias)))
        })
    }

    /// Declared format first, falling back to the file name
    pub fn detect(declared: &str, filename: &str) -> Option<Self> {
        declared
            .parse()
            .ok()
            .or_else(|| Self::from_filename(filename))
    }
}

impl FromStr for ArchiveFormat {
    type Err = CriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.aliases().contains(&name.as_str()))
            .ok_or_else(|| CriageError::archive(format!("unsupported archive format '{}'", s)))
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
