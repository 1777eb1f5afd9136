//! In-memory session cache
//!
//! This is primarily for development and testing.
//! For production, use RedisStore or another shared cache.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::SessionCache;
use crate::error::SessionError;
use crate::session::SessionData;

/// TTLs too large for `Instant` are capped at roughly a century
const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 3600;

struct StoredSession {
    data: SessionData,
    expires_at: Instant,
}

impl StoredSession {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory session cache
///
/// Warning: This store is not suitable for production use because:
/// - Sessions are lost on server restart
/// - Sessions are not shared across multiple server instances
/// - Expired entries are only reclaimed by [`MemoryStore::cleanup_expired`]
#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
}

impl MemoryStore {
    /// Create a new memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clean up expired sessions
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.sessions.write().retain(|_, stored| stored.is_live(now));
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions.read().values().filter(|s| s.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionCache for MemoryStore {
    async fn get(&self, sid: &str) -> Result<Option<SessionData>, SessionError> {
        let sessions = self.sessions.read();
        Ok(sessions
            .get(sid)
            .filter(|stored| stored.is_live(Instant::now()))
            .map(|stored| stored.data.clone()))
    }

    async fn has(&self, sid: &str) -> Result<bool, SessionError> {
        let sessions = self.sessions.read();
        Ok(sessions
            .get(sid)
            .is_some_and(|stored| stored.is_live(Instant::now())))
    }

    async fn set(&self, sid: &str, data: &SessionData, ttl_secs: u64) -> Result<bool, SessionError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(ttl_secs))
            .unwrap_or_else(|| now + Duration::from_secs(MAX_TTL_SECS));
        let stored = StoredSession {
            data: data.clone(),
            expires_at,
        };
        self.sessions.write().insert(sid.to_string(), stored);
        Ok(true)
    }

    async fn delete(&self, sid: &str) -> Result<bool, SessionError> {
        Ok(self.sessions.write().remove(sid).is_some())
    }
}
