//! Durable key/value storage for client state
//!
//! Every piece of client state that must survive a restart goes through
//! [`PersistentStore`]. The store does not look at the bytes it holds:
//! callers own serialization and must treat unreadable content as absent.

use std::future::Future;

use crate::cache::RedisStore;
use crate::error::StoreResult;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Well-known keys. Each owner writes only its own key.
pub mod keys {
    /// Serialized session collection, owned by the session store
    pub const CHAT_SESSIONS: &str = "chat_sessions";
    /// Bearer credential, owned by the auth gate
    pub const TOKEN: &str = "token";
    /// Display preference
    pub const THEME: &str = "theme";
}

/// Key/value store that survives process restarts.
///
/// A single `write` replaces the value of one key atomically; readers
/// never observe a partially written value.
pub trait PersistentStore: Send + Sync {
    /// Read the value stored under `key`, `None` if absent
    fn read(&self, key: &str) -> impl Future<Output = StoreResult<Option<Vec<u8>>>> + Send;

    /// Replace the value stored under `key`
    fn write(&self, key: &str, value: &[u8]) -> impl Future<Output = StoreResult<()>> + Send;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Backend chosen at startup from configuration
#[derive(Clone)]
pub enum StoreBackend {
    Memory(MemoryStore),
    File(FileStore),
    Redis(RedisStore),
}

impl StoreBackend {
    /// Short backend name for logs
    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Memory(_) => "memory",
            StoreBackend::File(_) => "file",
            StoreBackend::Redis(_) => "redis",
        }
    }
}

impl PersistentStore for StoreBackend {
    async fn read(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        match self {
            StoreBackend::Memory(store) => store.read(key).await,
            StoreBackend::File(store) => store.read(key).await,
            StoreBackend::Redis(store) => store.read(key).await,
        }
    }

    async fn write(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        match self {
            StoreBackend::Memory(store) => store.write(key, value).await,
            StoreBackend::File(store) => store.write(key, value).await,
            StoreBackend::Redis(store) => store.write(key, value).await,
        }
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        match self {
            StoreBackend::Memory(store) => store.remove(key).await,
            StoreBackend::File(store) => store.remove(key).await,
            StoreBackend::Redis(store) => store.remove(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_backend_delegates_to_inner_store() -> StoreResult<()> {
        let inner = MemoryStore::new();
        let backend = StoreBackend::Memory(inner.clone());

        backend.write(keys::THEME, b"dark").await?;
        assert_eq!(inner.read(keys::THEME).await?, Some(b"dark".to_vec()));

        backend.remove(keys::THEME).await?;
        assert_eq!(backend.read(keys::THEME).await?, None);
        assert_eq!(backend.name(), "memory");
        Ok(())
    }
}
