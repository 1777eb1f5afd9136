//! Session cache trait

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::SessionError;
use crate::session::SessionData;

/// Trait for the cache backing session persistence
///
/// Keys are session IDs, values the session data. Eviction and durability are
/// the store's business; failures are returned to the caller unchanged.
#[async_trait]
pub trait SessionCache: Send + Sync + 'static {
    /// Get the data stored under `sid`
    ///
    /// Returns None on a cache miss
    async fn get(&self, sid: &str) -> Result<Option<SessionData>, SessionError>;

    /// Check whether an entry exists for `sid`
    async fn has(&self, sid: &str) -> Result<bool, SessionError>;

    /// Store `data` under `sid` for `ttl_secs` seconds
    ///
    /// Returns false if the store declined the write
    async fn set(&self, sid: &str, data: &SessionData, ttl_secs: u64) -> Result<bool, SessionError>;

    /// Delete the entry for `sid`
    ///
    /// Returns whether an entry was removed
    async fn delete(&self, sid: &str) -> Result<bool, SessionError>;
}

#[async_trait]
impl<T: SessionCache + ?Sized> SessionCache for Arc<T> {
    async fn get(&self, sid: &str) -> Result<Option<SessionData>, SessionError> {
        (**self).get(sid).await
    }

    async fn has(&self, sid: &str) -> Result<bool, SessionError> {
        (**self).has(sid).await
    }

    async fn set(&self, sid: &str, data: &SessionData, ttl_secs: u64) -> Result<bool, SessionError> {
        (**self).set(sid, data, ttl_secs).await
    }

    async fn delete(&self, sid: &str) -> Result<bool, SessionError> {
        (**self).delete(sid).await
    }
}
