//! Error types and result aliases for criage operations.
//!
//! Provides a unified error type that covers every failure a component can
//! hand back to its caller, with actionable error messages.

use crate::types::Scope;
use thiserror::Error;

/// Unified error type for all criage operations
#[derive(Error, Debug)]
pub enum CriageError {
    // Lifecycle errors
    #[error("Package '{name}' ({version}) is already installed in {scope} scope")]
    AlreadyInstalled {
        name: String,
        version: String,
        scope: Scope,
    },

    #[error("Package '{name}' is not installed in {scope} scope")]
    NotInstalled { name: String, scope: Scope },

    #[error("Package '{name}' is not installed in any scope")]
    NotInstalledAnywhere { name: String },

    #[error("Package '{name}' is already at the latest version ({version})")]
    AlreadyCurrent { name: String, version: String },

    // Resolution errors
    #[error("Package '{name}' not found in any repository")]
    PackageNotFound { name: String },

    #[error("Version '{version}' of package '{name}' not found")]
    VersionNotFound { name: String, version: String },

    #[error("Package '{name}' {version} has no build for {os}/{arch}")]
    PlatformNotFound {
        name: String,
        version: String,
        os: String,
        arch: String,
    },

    // Repository errors
    #[error("Repository unavailable: {message}")]
    RemoteUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid credentials for repository '{repository}'")]
    InvalidCredentials { repository: String },

    // Config errors
    #[error("Failed to parse {file}: {message}")]
    TomlParse { file: String, message: String },

    #[error("Failed to parse JSON: {message}")]
    JsonParse { message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Archive errors
    #[error("Archive error: {message}")]
    Archive { message: String },

    #[error("Integrity check failed for {package}: expected {expected}, got {actual}")]
    IntegrityFailure {
        package: String,
        expected: String,
        actual: String,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for criage operations
pub type CriageResult<T> = Result<T, CriageError>;

impl CriageError {
    /// Create a remote-unavailable error from any error type
    pub fn remote<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::RemoteUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a remote-unavailable error without an underlying cause
    pub fn remote_status(message: impl Into<String>) -> Self {
        Self::RemoteUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create an archive error
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    /// True for the "package, version or platform absent" family
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CriageError::PackageNotFound { .. }
                | CriageError::VersionNotFound { .. }
                | CriageError::PlatformNotFound { .. }
        )
    }

    /// Check if retrying the same call may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CriageError::RemoteUnavailable { .. } | CriageError::Io { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            CriageError::AlreadyInstalled { .. } => {
                Some("Pass --force to reinstall or install a different version")
            },
            CriageError::NotInstalled { .. } => {
                Some("Check the scope: global packages need --global")
            },
            CriageError::NotInstalledAnywhere { .. } => Some("Install it first with 'criage install'"),
            CriageError::PackageNotFound { .. } => {
                Some("Check the package name spelling or try 'criage search'")
            },
            CriageError::PlatformNotFound { .. } => {
                Some("Pass --os/--arch to pick a build published for another platform")
            },
            CriageError::RemoteUnavailable { .. } => {
                Some("Check your internet connection and try again")
            },
            CriageError::InvalidCredentials { .. } => {
                Some("Check the repository token in ~/.criage/config.toml")
            },
            _ => None,
        }
    }
}
