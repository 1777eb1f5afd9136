//! Session configuration

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Default number of seconds session data lives in the cache (180 minutes).
pub const DEFAULT_CACHE_EXPIRE: u64 = 10800;

/// Policy deciding which HTTP caching headers accompany a session response.
///
/// Mirrors the classic `session.cache_limiter` modes of PHP.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheLimiter {
    /// Forbid any caching
    #[default]
    NoCache,
    /// Allow shared caches for `cache_expire` seconds
    Public,
    /// Allow private caches, with an `Expires` in the past for HTTP/1.0 clients
    Private,
    /// Allow private caches without sending `Expires`
    PrivateNoExpire,
}

impl CacheLimiter {
    /// Parse a limiter name, falling back to [`CacheLimiter::NoCache`] for
    /// anything unrecognized.
    pub fn parse_lenient(value: &str) -> Self {
        match value {
            "public" => CacheLimiter::Public,
            "private" => CacheLimiter::Private,
            "private_no_expire" => CacheLimiter::PrivateNoExpire,
            _ => CacheLimiter::NoCache,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheLimiter::NoCache => "nocache",
            CacheLimiter::Public => "public",
            CacheLimiter::Private => "private",
            CacheLimiter::PrivateNoExpire => "private_no_expire",
        }
    }
}

impl From<&str> for CacheLimiter {
    fn from(value: &str) -> Self {
        Self::parse_lenient(value)
    }
}

impl From<String> for CacheLimiter {
    fn from(value: String) -> Self {
        Self::parse_lenient(&value)
    }
}

impl fmt::Display for CacheLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for cache-backed session persistence
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Name of the session cookie. Must not be empty.
    pub cookie_name: String,

    /// Cookie domain (default: None - current domain only)
    pub cookie_domain: Option<String>,

    /// Cookie path (default: "/")
    pub cookie_path: String,

    /// Secure flag for cookie (default: false)
    pub cookie_secure: bool,

    /// HttpOnly flag for cookie (default: false)
    pub cookie_http_only: bool,

    /// Which caching headers to emit (default: nocache)
    pub cache_limiter: CacheLimiter,

    /// Seconds session data lives in the cache; also the `max-age` of the
    /// caching headers and the cookie lifetime for persistent sessions
    pub cache_expire: u64,

    /// Value of the `Last-Modified` header. When None it is derived from the
    /// modification time of the running executable.
    pub last_modified: Option<DateTime<Utc>>,

    /// Whether session cookies carry an `Expires` attribute by default
    pub persistent: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: String::new(),
            cookie_domain: None,
            cookie_path: "/".to_string(),
            cookie_secure: false,
            cookie_http_only: false,
            cache_limiter: CacheLimiter::NoCache,
            cache_expire: DEFAULT_CACHE_EXPIRE,
            last_modified: None,
            persistent: false,
        }
    }
}

impl SessionConfig {
    /// Create a new session configuration with the given cookie name
    pub fn new<S: Into<String>>(cookie_name: S) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            ..Default::default()
        }
    }

    /// Set the cookie domain
    pub fn with_cookie_domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.cookie_domain = Some(domain.into());
        self
    }

    /// Set the cookie path (default: "/")
    pub fn with_cookie_path<S: Into<String>>(mut self, path: S) -> Self {
        self.cookie_path = path.into();
        self
    }

    /// Set the Secure flag (default: false)
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Set the HttpOnly flag (default: false)
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.cookie_http_only = http_only;
        self
    }

    /// Set the cache limiter. Unknown names become `nocache`.
    pub fn with_cache_limiter(mut self, limiter: impl Into<CacheLimiter>) -> Self {
        self.cache_limiter = limiter.into();
        self
    }

    /// Set the cache expiry in seconds (default: 10800)
    pub fn with_cache_expire(mut self, secs: u64) -> Self {
        self.cache_expire = secs;
        self
    }

    /// Set the cache expiry from a Duration
    pub fn with_cache_expire_duration(mut self, duration: Duration) -> Self {
        self.cache_expire = duration.as_secs();
        self
    }

    /// Pin the `Last-Modified` value instead of deriving it
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Set whether cookies are persistent by default (default: false)
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }
}

/// Best guess at when the application was last deployed: the mtime of the
/// running executable, then of the working directory, then now.
pub(crate) fn determine_last_modified() -> DateTime<Utc> {
    let candidates = [std::env::current_exe().ok(), std::env::current_dir().ok()];
    candidates
        .into_iter()
        .flatten()
        .find_map(|path| std::fs::metadata(path).and_then(|m| m.modified()).ok())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new("sess");
        assert_eq!(config.cookie_name, "sess");
        assert_eq!(config.cookie_path, "/");
        assert_eq!(config.cookie_domain, None);
        assert!(!config.cookie_secure);
        assert!(!config.cookie_http_only);
        assert_eq!(config.cache_limiter, CacheLimiter::NoCache);
        assert_eq!(config.cache_expire, 10800);
        assert!(config.last_modified.is_none());
        assert!(!config.persistent);
    }

    #[test]
    fn test_cache_limiter_parsing() {
        for name in ["nocache", "public", "private", "private_no_expire"] {
            assert_eq!(CacheLimiter::from(name).as_str(), name);
        }
        assert_eq!(CacheLimiter::from("not-valid"), CacheLimiter::NoCache);
        assert_eq!(CacheLimiter::from("PUBLIC"), CacheLimiter::NoCache);
        assert_eq!(CacheLimiter::from(""), CacheLimiter::NoCache);
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new("sess")
            .with_cookie_domain("example.com")
            .with_cookie_path("/api")
            .with_secure(true)
            .with_http_only(true)
            .with_cache_limiter("private")
            .with_cache_expire_duration(Duration::from_secs(60))
            .with_persistent(true);

        assert_eq!(config.cookie_domain.as_deref(), Some("example.com"));
        assert_eq!(config.cookie_path, "/api");
        assert!(config.cookie_secure);
        assert!(config.cookie_http_only);
        assert_eq!(config.cache_limiter, CacheLimiter::Private);
        assert_eq!(config.cache_expire, 60);
        assert!(config.persistent);
    }

    #[test]
    fn test_determine_last_modified_is_not_in_future() {
        assert!(determine_last_modified() <= Utc::now());
    }
}
