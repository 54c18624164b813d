//! Shared components, built once per process

use std::collections::HashMap;
use std::sync::Arc;

use criage_archive::CodecRegistry;
use criage_config::Config;
use criage_core::error::CriageError;
use criage_core::types::Scope;
use criage_registry::{RateLimiter, RepositoryClient};
use criage_resolver::Resolver;
use criage_store::RegistryStore;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::ManagerResult;

/// Everything a lifecycle operation needs, passed explicitly
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub limiter: Arc<RateLimiter>,
    pub client: RepositoryClient,
    pub store: RegistryStore,
    pub resolver: Resolver,
    pub codecs: CodecRegistry,
    pub locks: InstallLocks,
}

impl Context {
    /// Build the context with the default codecs.
    ///
    /// Must be called from within a tokio runtime: the rate limiter starts its
    /// ticker immediately.
    pub fn new(config: Config) -> ManagerResult<Self> {
        Self::with_codecs(config, CodecRegistry::default())
    }

    pub fn with_codecs(config: Config, codecs: CodecRegistry) -> ManagerResult<Self> {
        for dir in config.directories() {
            std::fs::create_dir_all(dir)
                .map_err(|e| CriageError::io(format!("Failed to create {}", dir), e))?;
        }

        let limiter = Arc::new(RateLimiter::new(config.requests_per_second));
        let client = RepositoryClient::new(config.timeout(), Arc::clone(&limiter))?;
        let resolver = Resolver::new(client.clone(), config.resolution_policy);
        let store = RegistryStore::open(
            config.global_path.as_std_path(),
            config.local_path.as_std_path(),
        )?;

        tracing::debug!(
            repositories = config.repositories.len(),
            rate = limiter.per_second(),
            policy = ?config.resolution_policy,
            "context ready"
        );

        Ok(Self {
            config,
            limiter,
            client,
            store,
            resolver,
            codecs,
            locks: InstallLocks::default(),
        })
    }

    /// Root directory of a scope's installs
    pub fn scope_root(&self, scope: Scope) -> &camino::Utf8Path {
        match scope {
            Scope::Global => &self.config.global_path,
            Scope::Local => &self.config.local_path,
        }
    }

    /// Stop the limiter's ticker; safe to call more than once
    pub fn shutdown(&self) {
        self.limiter.shutdown();
    }
}

/// One async lock per (name, scope); mutations of the same install queue up
#[derive(Debug, Default)]
pub struct InstallLocks {
    locks: parking_lot::Mutex<HashMap<(String, Scope), Arc<Mutex<()>>>>,
}

impl InstallLocks {
    pub async fn acquire(&self, name: &str, scope: Scope) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            // Entries only the map still references are neither held nor awaited
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry((name.to_string(), scope)).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[tokio::test]
    async fn test_context_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let home = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let mut config = Config::with_home(&home);
        config.local_path = home.join("project").join("criage_modules");

        let ctx = Context::new(config).unwrap();
        for path in ctx.config.directories() {
            assert!(path.is_dir(), "{} was not created", path);
        }
        assert_eq!(
            ctx.scope_root(Scope::Local).as_str(),
            home.join("project").join("criage_modules").as_str()
        );
        assert!(ctx.store.list(Scope::Global).is_empty());

        ctx.shutdown();
        ctx.shutdown();
        assert!(ctx.limiter.is_shut_down());
    }

    #[tokio::test]
    async fn test_install_locks_are_keyed() {
        let locks = InstallLocks::default();
        let held = locks.acquire("demo", Scope::Local).await;

        // Other keys are free while one is held
        let _global = locks.acquire("demo", Scope::Global).await;
        let _other = locks.acquire("other", Scope::Local).await;

        let waiting = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            locks.acquire("demo", Scope::Local),
        )
        .await;
        assert!(waiting.is_err());

        drop(held);
        let _again = locks.acquire("demo", Scope::Local).await;
    }
}
