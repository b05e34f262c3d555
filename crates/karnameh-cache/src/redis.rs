//! Redis client storing JSON values.

use std::time::Duration;

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error, instrument};

use crate::CacheConfig;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Shared Redis connection with a default TTL and key prefix.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    default_ttl: Duration,
    prefix: String,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("default_ttl", &self.default_ttl)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.redis_url.as_str())?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self {
            conn,
            default_ttl: config.ttl(),
            prefix: config.key_prefix.clone(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Reads a cached value.
    ///
    /// Redis and decoding failures are logged and reported as a miss.
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let mut conn = self.conn.clone();

        let raw = match conn.get::<_, Option<String>>(key).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(cache.key = %key, error = %e, "Redis GET error");
                return None;
            }
        };

        let Some(raw) = raw else {
            debug!(cache.key = %key, "Cache miss");
            return None;
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(cache.key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                error!(cache.key = %key, error = %e, "Failed to decode cached value");
                None
            }
        }
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(value)?;

        conn.set_ex::<_, _, ()>(key, json, self.default_ttl.as_secs())
            .await?;

        debug!(cache.key = %key, cache.ttl_secs = self.default_ttl.as_secs(), "Cache set");
        Ok(())
    }

    /// Deletes every key matching a glob pattern, walking the keyspace with
    /// `SCAN`. Returns how many keys were removed.
    #[instrument(skip(self), fields(cache.operation = "SCAN_DEL"))]
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                deleted += conn.del::<_, u64>(&keys).await?;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        debug!(cache.pattern = %pattern, cache.deleted = deleted, "Pattern invalidation complete");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Cached {
        average: f64,
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_set_get_and_invalidate() {
        let config = CacheConfig {
            key_prefix: "karnameh-test".into(),
            ..CacheConfig::default()
        };
        let cache = RedisCache::connect(&config).await.unwrap();

        cache
            .set("karnameh-test:report:a", &Cached { average: 17.5 })
            .await
            .unwrap();
        let hit: Option<Cached> = cache.get("karnameh-test:report:a").await;
        assert_eq!(hit, Some(Cached { average: 17.5 }));

        let deleted = cache.invalidate_pattern("karnameh-test:report:*").await.unwrap();
        assert!(deleted >= 1);
        let miss: Option<Cached> = cache.get("karnameh-test:report:a").await;
        assert_eq!(miss, None);
    }
}
