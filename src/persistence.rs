//! Cache-backed session persistence
//!
//! [`CacheSessionPersistence`] resolves a [`Session`] from an inbound request
//! and, once the request is handled, writes it back to the cache and sets the
//! session cookie plus caching headers on the response.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use salvo_core::http::cookie::time::{Duration as CookieDuration, OffsetDateTime, PrimitiveDateTime};
use salvo_core::http::cookie::Cookie;
use std::future::Future;
use std::sync::Arc;

use crate::cache_headers::{cache_headers, http_date, CacheHeaders, CACHE_HEADER_NAMES};
use crate::config::{determine_last_modified, CacheLimiter, SessionConfig};
use crate::error::SessionError;
use crate::message::{session_cookie_value, SessionRequest, SessionResponse};
use crate::session::{Session, SessionData};
use crate::store::SessionCache;

/// Generate a new session ID: 16 random bytes from the OS, hex encoded
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Session persistence on top of a [`SessionCache`]
///
/// Holds no per-request state; clones share the same cache.
pub struct CacheSessionPersistence<S: SessionCache> {
    cache: Arc<S>,
    config: SessionConfig,
    last_modified: String,
}

impl<S: SessionCache> CacheSessionPersistence<S> {
    /// Create the persistence, validating `config`.
    ///
    /// Fails with [`SessionError::InvalidConfig`] when the cookie name is empty.
    pub fn new(cache: S, config: SessionConfig) -> Result<Self, SessionError> {
        Self::from_arc(Arc::new(cache), config)
    }

    /// Like [`CacheSessionPersistence::new`], sharing an existing cache handle
    pub fn from_arc(cache: Arc<S>, config: SessionConfig) -> Result<Self, SessionError> {
        if config.cookie_name.is_empty() {
            return Err(SessionError::InvalidConfig(
                "Session cookie name must not be empty".to_string(),
            ));
        }

        let last_modified = http_date(config.last_modified.unwrap_or_else(determine_last_modified));

        Ok(Self {
            cache,
            config,
            last_modified,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn cache(&self) -> &S {
        &self.cache
    }

    /// The formatted `Last-Modified` value sent by caching limiters
    pub fn last_modified(&self) -> &str {
        &self.last_modified
    }

    pub fn cache_limiter(&self) -> CacheLimiter {
        self.config.cache_limiter
    }

    /// Resolve the session for an inbound request.
    ///
    /// A missing cookie or an unknown ID yields an empty session; only cache
    /// failures are errors. The cookie is read up front, so the returned
    /// future does not borrow the request.
    pub fn initialize_session<R>(
        &self,
        req: &R,
    ) -> impl Future<Output = Result<Session, SessionError>> + Send + '_
    where
        R: SessionRequest + ?Sized,
    {
        let id = session_cookie_value(req, &self.config.cookie_name).unwrap_or_default();
        self.load_session(id)
    }

    /// Load the session stored under `id`; an empty `id` starts a new session
    /// without touching the cache.
    pub async fn load_session(&self, id: String) -> Result<Session, SessionError> {
        if id.is_empty() {
            return Ok(Session::new(id, SessionData::new()));
        }

        let data = match self.cache.get(&id).await? {
            Some(data) => data,
            None => {
                tracing::debug!(session_id = %id, "session not found in cache");
                SessionData::new()
            }
        };
        Ok(Session::new(id, data))
    }

    /// Persist `session` and decorate `res` with the session cookie and
    /// caching headers.
    ///
    /// Sessions without an ID that are empty or unchanged leave the response
    /// untouched. The cookie is only set once the cache write succeeded.
    pub async fn persist_session<R>(&self, session: Session, res: R) -> Result<R, SessionError>
    where
        R: SessionResponse,
    {
        if session.id().is_empty() && (session.is_empty() || !session.has_changed()) {
            tracing::debug!("skipping persistence of empty session");
            return Ok(res);
        }

        let id = if session.id().is_empty() || session.is_regenerated() || session.has_changed() {
            self.regenerate_session(session.id()).await?
        } else {
            session.id().to_string()
        };

        if !self.cache.set(&id, session.data(), self.config.cache_expire).await? {
            return Err(SessionError::NotPersisted(id));
        }

        let cookie = self.session_cookie(id, self.persistence_duration(&session));
        let mut res = res.with_cookie(cookie)?;

        if CACHE_HEADER_NAMES.iter().any(|name| res.has_header(name)) {
            return Ok(res);
        }

        for (name, value) in self.cache_headers().iter() {
            res = res.with_header(name, value)?;
        }
        Ok(res)
    }

    /// The caching headers for the configured limiter, as of now
    pub fn cache_headers(&self) -> CacheHeaders {
        cache_headers(
            self.config.cache_limiter,
            Utc::now(),
            self.config.cache_expire,
            &self.last_modified,
        )
    }

    /// Drop the cache entry of `old_id`, if any, and issue a new ID
    async fn regenerate_session(&self, old_id: &str) -> Result<String, SessionError> {
        if !old_id.is_empty() && self.cache.has(old_id).await? {
            self.cache.delete(old_id).await?;
        }
        let id = generate_session_id();
        tracing::debug!(old_session_id = %old_id, session_id = %id, "regenerated session id");
        Ok(id)
    }

    /// Seconds the session cookie should live; 0 for a browser-session cookie
    fn persistence_duration(&self, session: &Session) -> u64 {
        let duration = match session.session_lifetime() {
            Some(lifetime) => lifetime,
            None if self.config.persistent => i64::try_from(self.config.cache_expire).unwrap_or(i64::MAX),
            None => 0,
        };
        duration.max(0) as u64
    }

    fn session_cookie(&self, id: String, duration: u64) -> Cookie<'static> {
        let mut builder = Cookie::build((self.config.cookie_name.clone(), id))
            .path(self.config.cookie_path.clone())
            .secure(self.config.cookie_secure)
            .http_only(self.config.cookie_http_only);

        if let Some(domain) = self.config.cookie_domain.clone() {
            builder = builder.domain(domain);
        }

        if duration > 0 {
            let secs = i64::try_from(duration).unwrap_or(i64::MAX);
            let expires = OffsetDateTime::now_utc()
                .checked_add(CookieDuration::seconds(secs))
                .unwrap_or(PrimitiveDateTime::MAX.assume_utc());
            builder = builder.expires(expires);
        }

        builder.build()
    }
}

impl<S: SessionCache> Clone for CacheSessionPersistence<S> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
            last_modified: self.last_modified.clone(),
        }
    }
}
