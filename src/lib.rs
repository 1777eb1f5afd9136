//! # salvo-cache-session
//!
//! Cache-backed session persistence for the Salvo web framework.
//!
//! Session data lives in an external cache keyed by a random session ID; the
//! client only carries that ID in a cookie. Alongside the cookie, responses
//! get HTTP caching headers chosen by a PHP-style cache limiter so that
//! intermediaries never cache a session-bearing response incorrectly.
//!
//! ## Features
//!
//! - **Framework-neutral core**: [`CacheSessionPersistence`] works on plain
//!   `http` messages as well as salvo's own request and response
//! - **ID rotation**: new IDs are issued whenever session data changes or a
//!   regeneration is requested, and the previous cache entry is dropped
//! - **Cache limiters**: `nocache`, `public`, `private`, `private_no_expire`
//! - **Pluggable caches**: Redis, Memory, or any [`SessionCache`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salvo::prelude::*;
//! use salvo_cache_session::{CacheSessionHandler, MemoryStore, SessionConfig, SessionDepotExt};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SessionConfig::new("sess").with_cache_limiter("private");
//!     let session_handler = CacheSessionHandler::new(MemoryStore::new(), config).unwrap();
//!
//!     let router = Router::new()
//!         .hoop(session_handler)
//!         .get(index);
//!
//!     let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
//!     Server::new(acceptor).serve(router).await;
//! }
//!
//! #[handler]
//! async fn index(depot: &mut Depot) -> String {
//!     let session = depot.session_mut().unwrap();
//!     let views: i32 = session.get("views").unwrap_or(0);
//!     session.set("views", views + 1).unwrap();
//!     format!("views: {}", views + 1)
//! }
//! ```

pub mod cache_headers;
pub mod config;
pub mod error;
pub mod factory;
pub mod handler;
pub mod message;
pub mod persistence;
pub mod session;
pub mod store;

pub use cache_headers::{cache_headers, CacheHeaders};
pub use config::{CacheLimiter, SessionConfig};
pub use error::SessionError;
pub use factory::{CacheRegistry, SessionSettings};
pub use handler::CacheSessionHandler;
pub use message::{CookieParams, SessionRequest, SessionResponse};
pub use persistence::{generate_session_id, CacheSessionPersistence};
pub use session::{Session, SessionData, SESSION_LIFETIME_KEY};
pub use store::{MemoryStore, SessionCache};

#[cfg(feature = "redis-store")]
pub use store::RedisStore;

/// Extension trait for Depot to easily access session
pub mod depot_ext;
pub use depot_ext::SessionDepotExt;
