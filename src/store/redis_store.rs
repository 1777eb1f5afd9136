//! Redis session cache
//!
//! - Key: `prefix + session_id` (default prefix: "sess:")
//! - Value: JSON serialized session data
//! - TTL: the configured cache expiry, via `SET EX`

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;

use super::SessionCache;
use crate::error::SessionError;
use crate::session::SessionData;

/// Redis session cache
///
/// # Example
///
/// ```rust,ignore
/// use salvo_cache_session::RedisStore;
///
/// let client = redis::Client::open("redis://127.0.0.1/")?;
/// let store = RedisStore::new(client).await?;
/// ```
#[derive(Clone)]
pub struct RedisStore {
    conn: Arc<ConnectionManager>,
    prefix: String,
}

impl RedisStore {
    /// Create a new Redis store with the default "sess:" prefix
    pub async fn new(client: redis::Client) -> Result<Self, SessionError> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::from_connection_manager(conn))
    }

    /// Create a new Redis store from a connection string
    pub async fn from_url(url: &str) -> Result<Self, SessionError> {
        let client = redis::Client::open(url)
            .map_err(|e| SessionError::StoreError(format!("Failed to create Redis client: {}", e)))?;
        Self::new(client).await
    }

    /// Create a new Redis store from an existing connection manager
    pub fn from_connection_manager(conn: ConnectionManager) -> Self {
        Self {
            conn: Arc::new(conn),
            prefix: "sess:".to_string(),
        }
    }

    /// Build with custom prefix
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    fn make_key(&self, sid: &str) -> String {
        format!("{}{}", self.prefix, sid)
    }
}

#[async_trait]
impl SessionCache for RedisStore {
    async fn get(&self, sid: &str) -> Result<Option<SessionData>, SessionError> {
        let key = self.make_key(sid);
        let mut conn = (*self.conn).clone();

        let data: Option<String> = conn.get(&key).await?;
        match data {
            // A stored JSON null reads as a miss
            Some(json) => Ok(serde_json::from_str::<Option<SessionData>>(&json)?),
            None => Ok(None),
        }
    }

    async fn has(&self, sid: &str) -> Result<bool, SessionError> {
        let key = self.make_key(sid);
        let mut conn = (*self.conn).clone();

        Ok(conn.exists(&key).await?)
    }

    async fn set(&self, sid: &str, data: &SessionData, ttl_secs: u64) -> Result<bool, SessionError> {
        let key = self.make_key(sid);
        let mut conn = (*self.conn).clone();

        // Redis rejects EX 0; an entry that expires immediately is no entry
        if ttl_secs == 0 {
            conn.del::<_, ()>(&key).await?;
            return Ok(true);
        }

        let json = serde_json::to_string(data)?;
        conn.set_ex::<_, _, ()>(&key, &json, ttl_secs).await?;
        Ok(true)
    }

    async fn delete(&self, sid: &str) -> Result<bool, SessionError> {
        let key = self.make_key(sid);
        let mut conn = (*self.conn).clone();

        let removed: u64 = conn.del(&key).await?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    // Tests require a running Redis instance
    // Run with: cargo test --features redis-store -- --ignored

    use super::*;

    #[tokio::test]
    #[ignore]
    async fn test_redis_store_basic() {
        let store = RedisStore::from_url("redis://127.0.0.1/")
            .await
            .unwrap()
            .with_prefix("test-sess:");

        let mut data = SessionData::new();
        data.set("user", "alice").unwrap();

        assert!(store.set("test-id", &data, 3600).await.unwrap());
        assert!(store.has("test-id").await.unwrap());

        let retrieved = store.get("test-id").await.unwrap().unwrap();
        assert_eq!(retrieved.get::<String>("user"), Some("alice".to_string()));

        assert!(store.delete("test-id").await.unwrap());
        assert!(store.get("test-id").await.unwrap().is_none());
    }
}
