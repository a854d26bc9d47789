//! Redis-backed persistent store
//!
//! Lets several client installations on one host share state through a
//! Redis instance. Keys are namespaced with a prefix so the store can live
//! next to other data.

use redis::{AsyncCommands, Client};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::store::PersistentStore;

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Prefix prepended to every key
    pub key_prefix: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_KEY_PREFIX`: Key namespace (default: "deptchat")
    pub fn from_env() -> StoreResult<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let key_prefix =
            std::env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "deptchat".to_string());

        if url.trim().is_empty() {
            return Err(StoreError::Configuration("REDIS_URL is empty".to_string()));
        }

        Ok(RedisConfig { url, key_prefix })
    }
}

/// Persistent store on top of a Redis client
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    key_prefix: String,
}

impl RedisStore {
    /// Initialize a new Redis-backed store
    pub fn new(config: &RedisConfig) -> StoreResult<Self> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisStore {
            client,
            key_prefix: config.key_prefix.clone(),
        })
    }

    async fn get_connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    fn namespaced(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> StoreResult<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

impl PersistentStore for RedisStore {
    async fn read(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut conn = self.get_connection().await?;
        let value: Option<Vec<u8>> = conn.get(self.namespaced(key)).await?;
        Ok(value)
    }

    async fn write(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let key = self.namespaced(key);
        debug!("Writing {} bytes to Redis key {}", value.len(), key);
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(self.namespaced(key)).await?;
        Ok(())
    }
}
