//! Redis-backed token store.

use orgauth_core::error::{CoreError, CoreResult};
use orgauth_core::repository::TokenStore;
use tracing::info;

use super::config::TokenStoreConfig;

/// Token store backed by plain Redis strings (`SET` without expiry).
#[derive(Clone)]
pub struct RedisTokenStore {
    client: redis::Client,
}

impl RedisTokenStore {
    /// Create a store from a connection URL. Does not connect.
    pub fn new(url: &str) -> CoreResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| CoreError::TokenStore(format!("failed to create Redis client: {e}")))?;

        Ok(Self { client })
    }

    /// Create a store and verify the server answers `PING`.
    pub async fn connect(config: &TokenStoreConfig) -> CoreResult<Self> {
        info!(url = %config.redis_url, "Connecting to Redis token store");
        let store = Self::new(&config.redis_url)?;
        store.ping().await?;
        info!("Successfully connected to Redis token store");
        Ok(store)
    }

    pub async fn ping(&self) -> CoreResult<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| CoreError::TokenStore(format!("Redis PING failed: {e}")))?;

        Ok(())
    }

    async fn get_connection(&self) -> CoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CoreError::TokenStore(format!("failed to get Redis connection: {e}")))
    }
}

impl TokenStore for RedisTokenStore {
    async fn set_mapping(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| CoreError::TokenStore(format!("Redis SET failed: {e}")))?;

        Ok(())
    }

    async fn get_mapping(&self, key: &str) -> CoreResult<Option<String>> {
        let mut conn = self.get_connection().await?;

        redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(|e| CoreError::TokenStore(format!("Redis GET failed: {e}")))
    }

    async fn delete_mapping(&self, key: &str) -> CoreResult<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| CoreError::TokenStore(format!("Redis DEL failed: {e}")))?;

        Ok(())
    }
}
