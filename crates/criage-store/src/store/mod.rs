//! In-memory registry backed by the two partitions

use std::collections::BTreeMap;
use std::path::Path;

use criage_core::types::{InstalledPackage, Scope};
use parking_lot::RwLock;

use crate::partition::{Partition, Records};
use crate::StoreResult;

#[derive(Debug, Default)]
struct Registry {
    global: Records,
    local: Records,
}

impl Registry {
    fn scope(&self, scope: Scope) -> &Records {
        match scope {
            Scope::Global => &self.global,
            Scope::Local => &self.local,
        }
    }

    fn scope_mut(&mut self, scope: Scope) -> &mut Records {
        match scope {
            Scope::Global => &mut self.global,
            Scope::Local => &mut self.local,
        }
    }
}

/// Authoritative set of installed packages.
///
/// Readers share the lock; a mutation holds it exclusively for the whole
/// read-modify-write of its partition, so in-process writers never interleave.
/// Memory only changes after the document was written, so a failed write
/// leaves both views untouched.
#[derive(Debug)]
pub struct RegistryStore {
    global: Partition,
    local: Partition,
    registry: RwLock<Registry>,
}

impl RegistryStore {
    /// Open both partitions and merge them into one view
    pub fn open(global_root: &Path, local_root: &Path) -> StoreResult<Self> {
        let global = Partition::new(Scope::Global, global_root);
        let local = Partition::new(Scope::Local, local_root);

        let registry = Registry {
            global: global.load()?,
            local: local.load()?,
        };
        tracing::debug!(
            global = registry.global.len(),
            local = registry.local.len(),
            "loaded installed packages"
        );

        Ok(Self {
            global,
            local,
            registry: RwLock::new(registry),
        })
    }

    fn partition(&self, scope: Scope) -> &Partition {
        match scope {
            Scope::Global => &self.global,
            Scope::Local => &self.local,
        }
    }

    pub fn get(&self, name: &str, scope: Scope) -> Option<InstalledPackage> {
        self.registry.read().scope(scope).get(name).cloned()
    }

    pub fn contains(&self, name: &str, scope: Scope) -> bool {
        self.registry.read().scope(scope).contains_key(name)
    }

    /// Insert or replace the record for its (name, scope)
    pub fn upsert(&self, record: InstalledPackage) -> StoreResult<()> {
        let scope = record.scope;
        let mut registry = self.registry.write();

        let persisted = self.partition(scope).update(|records| {
            records.insert(record.name.clone(), record.clone());
        })?;

        tracing::debug!(name = %record.name, version = %record.version, %scope, "stored record");
        *registry.scope_mut(scope) = persisted;
        Ok(())
    }

    /// Remove the record if present; removing twice is not an error
    pub fn remove(&self, name: &str, scope: Scope) -> StoreResult<Option<InstalledPackage>> {
        let mut registry = self.registry.write();

        let mut removed = None;
        let persisted = self.partition(scope).update(|records| {
            removed = records.remove(name);
        })?;

        tracing::debug!(name, %scope, existed = removed.is_some(), "removed record");
        *registry.scope_mut(scope) = persisted;
        Ok(removed)
    }

    /// All records of a scope, ascending by name
    pub fn list(&self, scope: Scope) -> Vec<InstalledPackage> {
        self.registry.read().scope(scope).values().cloned().collect()
    }

    /// Every record keyed by (name, scope)
    pub fn snapshot(&self) -> BTreeMap<(String, Scope), InstalledPackage> {
        let registry = self.registry.read();
        [Scope::Global, Scope::Local]
            .into_iter()
            .flat_map(|scope| {
                registry
                    .scope(scope)
                    .iter()
                    .map(move |(name, record)| ((name.clone(), scope), record.clone()))
            })
            .collect()
    }
}
