//! Session error types

use std::fmt;

/// Errors that can occur while resolving or persisting sessions
#[derive(Debug)]
pub enum SessionError {
    /// Invalid persistence configuration, e.g. an empty cookie name
    InvalidConfig(String),
    /// A named cache service could not be found while wiring the persistence
    MissingDependency(String),
    /// Error from the cache store
    StoreError(String),
    /// Error during serialization/deserialization
    SerializationError(String),
    /// The cache store declined to write the session with this ID
    NotPersisted(String),
    /// A header value could not be represented on the response
    InvalidHeader(String),
    /// Redis error (when redis-store feature is enabled)
    #[cfg(feature = "redis-store")]
    RedisError(redis::RedisError),
}

impl SessionError {
    /// Error raised when a cache service is not registered under `service`
    pub fn missing_dependency(service: &str) -> Self {
        SessionError::MissingDependency(format!(
            "CacheSessionPersistence requires the cache service \"{}\"; none found",
            service
        ))
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidConfig(msg) => write!(f, "Invalid session configuration: {}", msg),
            SessionError::MissingDependency(msg) => write!(f, "Missing dependency: {}", msg),
            SessionError::StoreError(msg) => write!(f, "Session store error: {}", msg),
            SessionError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            SessionError::NotPersisted(id) => write!(f, "Session {} was not written to the cache", id),
            SessionError::InvalidHeader(msg) => write!(f, "Invalid header: {}", msg),
            #[cfg(feature = "redis-store")]
            SessionError::RedisError(e) => write!(f, "Redis error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(feature = "redis-store")]
impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        SessionError::RedisError(err)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::SerializationError(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for SessionError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        SessionError::InvalidHeader(err.to_string())
    }
}
