//! One scope's on-disk document

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use criage_core::error::CriageError;
use criage_core::types::{InstalledPackage, Scope};
use tempfile::NamedTempFile;

use crate::StoreResult;

/// Document name inside each scope root
pub const PARTITION_FILE: &str = "packages.json";

/// Name-keyed records of one scope
pub type Records = BTreeMap<String, InstalledPackage>;

/// The `packages.json` file of one scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    scope: Scope,
    path: PathBuf,
}

impl Partition {
    /// Partition stored under a scope's root directory
    pub fn new(scope: Scope, root: &Path) -> Self {
        Self {
            scope,
            path: root.join(PARTITION_FILE),
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document; a missing file is an empty partition
    pub fn load(&self) -> StoreResult<Records> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Records::new()),
            Err(e) => {
                return Err(CriageError::io(
                    format!("Failed to read {}", self.path.display()),
                    e,
                ))
            },
        };

        if content.trim().is_empty() {
            return Ok(Records::new());
        }

        // A document holding `null` is an empty partition
        let mut records = serde_json::from_str::<Option<Records>>(&content)
            .map_err(|e| CriageError::JsonParse {
                message: format!("{}: {}", self.path.display(), e),
            })?
            .unwrap_or_default();

        // The partition decides the scope, whatever the record claims
        for record in records.values_mut() {
            record.scope = self.scope;
        }
        Ok(records)
    }

    /// Replace the document atomically: write a sibling temp file, then rename
    pub fn save(&self, records: &Records) -> StoreResult<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)
            .map_err(|e| CriageError::io(format!("Failed to create {}", dir.display()), e))?;

        let content = serde_json::to_vec_pretty(records).map_err(|e| CriageError::JsonParse {
            message: format!("Failed to serialize {}: {}", self.path.display(), e),
        })?;

        let mut temp = NamedTempFile::new_in(dir)
            .map_err(|e| CriageError::io(format!("Failed to create temp file in {}", dir.display()), e))?;
        temp.write_all(&content)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| CriageError::io(format!("Failed to write {}", self.path.display()), e))?;
        temp.persist(&self.path)
            .map_err(|e| CriageError::io(format!("Failed to replace {}", self.path.display()), e.error))?;

        Ok(())
    }

    /// Load the whole document, apply one change, write it back
    pub fn update<F>(&self, change: F) -> StoreResult<Records>
    where
        F: FnOnce(&mut Records),
    {
        let mut records = self.load()?;
        change(&mut records);
        self.save(&records)?;
        Ok(records)
    }
}
