use crate::error::{AppError, AppResult};
use crate::models::Link;
use deadpool_redis::{redis::AsyncCommands, Manager, Pool, Runtime};
use std::time::Duration;

/// Cache layer for link lookups on the redirect hot path
#[derive(Clone)]
pub struct Cache {
    pool: Pool,
    default_ttl: Duration,
}

impl Cache {
    /// Create a new cache connection pool
    pub async fn new(
        redis_url: &str,
        max_connections: u32,
        default_ttl_seconds: u64,
    ) -> AppResult<Self> {
        let manager = Manager::new(redis_url)
            .map_err(|e| AppError::Configuration(format!("Invalid Redis URL: {}", e)))?;

        let pool = Pool::builder(manager)
            .max_size(max_connections as usize)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create Redis pool: {}", e)))?;

        Ok(Self {
            pool,
            default_ttl: Duration::from_secs(default_ttl_seconds),
        })
    }

    /// Ping the Redis server to check connectivity
    pub async fn ping(&self) -> AppResult<String> {
        let mut conn = self.pool.get().await?;
        let response: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(response)
    }

    /// Get a link from cache by short code
    pub async fn get_link(&self, short_code: &str) -> AppResult<Option<Link>> {
        let key = Self::link_key(short_code);
        let mut conn = self.pool.get().await?;

        let value: Option<String> = conn.get(&key).await?;

        match value {
            Some(v) => {
                let link: Link = serde_json::from_str(&v).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(link))
            }
            None => Ok(None),
        }
    }

    /// Set a link in cache
    pub async fn set_link(&self, link: &Link) -> AppResult<()> {
        let key = Self::link_key(&link.short_code);
        let value = serde_json::to_string(link)?;
        let mut conn = self.pool.get().await?;

        let _: () = conn.set_ex(&key, value, self.default_ttl.as_secs()).await?;

        Ok(())
    }

    /// Delete a link from cache
    pub async fn delete_link(&self, short_code: &str) -> AppResult<()> {
        let key = Self::link_key(short_code);
        let mut conn = self.pool.get().await?;

        let _: () = conn.del(&key).await?;

        Ok(())
    }

    /// Generate cache key for a link
    fn link_key(short_code: &str) -> String {
        format!("{}:{}", Self::KEY_PREFIX, short_code)
    }

    const KEY_PREFIX: &'static str = "link";
}
