//! SHA-256 checksum utilities.
//!
//! Repositories publish hex SHA-256 digests on every version and file,
//! optionally prefixed with `sha256:`.

use crate::error::{CriageError, CriageResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;

/// Hex SHA-256 of a byte slice
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hex SHA-256 of a file, streamed
pub fn sha256_file(path: &Path) -> CriageResult<String> {
    let mut file = File::open(path)
        .map_err(|e| CriageError::io(format!("Failed to open {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|e| CriageError::io(format!("Failed to read {}", path.display()), e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Verify a file against an expected digest (case-insensitive, prefix optional)
pub fn verify_file_checksum(path: &Path, expected: &str) -> CriageResult<()> {
    let expected = expected.trim();
    let expected = expected.strip_prefix("sha256:").unwrap_or(expected);
    let actual = sha256_file(path)?;

    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(CriageError::IntegrityFailure {
            package: path.display().to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_sha256_hex() {
        assert_eq!(sha256_hex(b"hello world"), HELLO_SHA256);
    }

    #[test]
    fn test_verify_file_checksum() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("artifact.bin");
        std::fs::write(&path, b"hello world").unwrap();

        assert_eq!(sha256_file(&path).unwrap(), HELLO_SHA256);
        assert!(verify_file_checksum(&path, HELLO_SHA256).is_ok());
        assert!(verify_file_checksum(&path, &format!("sha256:{}", HELLO_SHA256.to_uppercase())).is_ok());

        match verify_file_checksum(&path, "00") {
            Err(CriageError::IntegrityFailure { actual, .. }) => assert_eq!(actual, HELLO_SHA256),
            other => panic!("expected IntegrityFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = sha256_file(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(CriageError::Io { .. })));
    }
}
