//! Building [`CacheSessionPersistence`] from application settings
//!
//! Settings are read from a JSON document, either directly or nested under
//! the `session_cache` key:
//!
//! ```json
//! {
//!     "session_cache": {
//!         "cache_item_pool_service": "cache",
//!         "cookie_name": "PHPSESSION",
//!         "cookie_domain": null,
//!         "cookie_path": "/",
//!         "cookie_secure": false,
//!         "cookie_http_only": false,
//!         "cache_limiter": "nocache",
//!         "cache_expire": 10800,
//!         "last_modified": null,
//!         "persistent": false
//!     }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{SessionConfig, DEFAULT_CACHE_EXPIRE};
use crate::error::SessionError;
use crate::persistence::CacheSessionPersistence;
use crate::store::SessionCache;

/// Key under which session settings may be nested
pub const SETTINGS_KEY: &str = "session_cache";

/// Cache service looked up when the settings name none
pub const DEFAULT_CACHE_SERVICE: &str = "cache";

/// Cookie name used when the settings name none
pub const DEFAULT_COOKIE_NAME: &str = "PHPSESSION";

/// A type-erased cache handle as held by the registry
pub type SharedCache = Arc<dyn SessionCache>;

/// Session settings as found in application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub cache_item_pool_service: String,
    pub cookie_name: String,
    pub cookie_domain: Option<String>,
    pub cookie_path: String,
    pub cookie_secure: bool,
    pub cookie_http_only: bool,
    pub cache_limiter: String,
    pub cache_expire: u64,
    /// Unix timestamp in seconds
    pub last_modified: Option<i64>,
    pub persistent: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cache_item_pool_service: DEFAULT_CACHE_SERVICE.to_string(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_domain: None,
            cookie_path: "/".to_string(),
            cookie_secure: false,
            cookie_http_only: false,
            cache_limiter: "nocache".to_string(),
            cache_expire: DEFAULT_CACHE_EXPIRE,
            last_modified: None,
            persistent: false,
        }
    }
}

impl SessionSettings {
    /// Read settings from a JSON document, nested under [`SETTINGS_KEY`] or at
    /// the top level. Missing keys take their defaults.
    pub fn from_json(value: &Value) -> Result<Self, SessionError> {
        let section = value.get(SETTINGS_KEY).unwrap_or(value);
        if section.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(section.clone())?)
    }

    /// Turn the settings into a [`SessionConfig`]
    pub fn to_config(&self) -> Result<SessionConfig, SessionError> {
        let mut config = SessionConfig::new(self.cookie_name.clone())
            .with_cookie_path(self.cookie_path.clone())
            .with_secure(self.cookie_secure)
            .with_http_only(self.cookie_http_only)
            .with_cache_limiter(self.cache_limiter.as_str())
            .with_cache_expire(self.cache_expire)
            .with_persistent(self.persistent);

        if let Some(domain) = &self.cookie_domain {
            config = config.with_cookie_domain(domain.clone());
        }

        if let Some(ts) = self.last_modified {
            let last_modified = DateTime::<Utc>::from_timestamp(ts, 0).ok_or_else(|| {
                SessionError::InvalidConfig(format!("last_modified {} is out of range", ts))
            })?;
            config = config.with_last_modified(last_modified);
        }

        Ok(config)
    }
}

/// Named cache services available to the factory
#[derive(Clone, Default)]
pub struct CacheRegistry {
    services: HashMap<String, SharedCache>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `cache` under `name`, replacing any earlier registration
    pub fn register<C: SessionCache>(mut self, name: impl Into<String>, cache: C) -> Self {
        self.services.insert(name.into(), Arc::new(cache));
        self
    }

    pub fn has(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<SharedCache> {
        self.services.get(name).cloned()
    }

    /// Build persistence from `settings`, using the cache service they name.
    ///
    /// Fails with [`SessionError::MissingDependency`] when that service is not
    /// registered.
    pub fn build(
        &self,
        settings: &SessionSettings,
    ) -> Result<CacheSessionPersistence<SharedCache>, SessionError> {
        let service = settings.cache_item_pool_service.as_str();
        let cache = self
            .get(service)
            .ok_or_else(|| SessionError::missing_dependency(service))?;

        tracing::debug!(service, cookie_name = %settings.cookie_name, "building session persistence");
        CacheSessionPersistence::new(cache, settings.to_config()?)
    }

    /// Read settings from a JSON document and build persistence from them
    pub fn build_from_json(
        &self,
        value: &Value,
    ) -> Result<CacheSessionPersistence<SharedCache>, SessionError> {
        self.build(&SessionSettings::from_json(value)?)
    }
}
