//! Target platform identification.
//!
//! Repositories label builds with `linux`/`darwin`/`windows` and
//! `amd64`/`arm64`/`386`/`arm`, so the running platform is translated into
//! that vocabulary before matching.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating system and architecture pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Platform of the running process
    pub fn current() -> Self {
        Self::new(
            os_name(std::env::consts::OS),
            arch_name(std::env::consts::ARCH),
        )
    }

    /// Fill whichever half is missing from the running platform
    pub fn or_current(os: Option<&str>, arch: Option<&str>) -> Self {
        let current = Self::current();
        Self {
            os: os.filter(|s| !s.is_empty()).map_or(current.os, str::to_string),
            arch: arch.filter(|s| !s.is_empty()).map_or(current.arch, str::to_string),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

fn os_name(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn arch_name(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_mapping() {
        assert_eq!(os_name("macos"), "darwin");
        assert_eq!(os_name("linux"), "linux");
        assert_eq!(arch_name("x86_64"), "amd64");
        assert_eq!(arch_name("aarch64"), "arm64");
        assert_eq!(arch_name("riscv64"), "riscv64");
    }

    #[test]
    fn test_or_current_fills_missing_half() {
        let current = Platform::current();
        let p = Platform::or_current(Some("windows"), None);
        assert_eq!(p.os, "windows");
        assert_eq!(p.arch, current.arch);

        let p = Platform::or_current(Some(""), Some("arm"));
        assert_eq!(p.os, current.os);
        assert_eq!(p.arch, "arm");
    }

    #[test]
    fn test_display() {
        assert_eq!(Platform::new("linux", "amd64").to_string(), "linux/amd64");
    }
}
