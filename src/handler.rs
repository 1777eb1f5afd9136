//! Session middleware for Salvo

use async_trait::async_trait;
use salvo_core::http::StatusError;
use salvo_core::{Depot, FlowCtrl, Handler, Request, Response};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::persistence::CacheSessionPersistence;
use crate::session::Session;
use crate::store::SessionCache;

pub(crate) const SESSION_KEY: &str = "salvo.cache.session";

/// Session middleware backed by a [`SessionCache`]
///
/// Resolves the session before the rest of the chain runs and exposes it in
/// the depot (see [`SessionDepotExt`](crate::SessionDepotExt)). After the
/// chain, the session is persisted and the cookie and caching headers are set.
pub struct CacheSessionHandler<S: SessionCache> {
    persistence: CacheSessionPersistence<S>,
}

impl<S: SessionCache> CacheSessionHandler<S> {
    /// Create a new session handler
    pub fn new(store: S, config: SessionConfig) -> Result<Self, SessionError> {
        Ok(Self::from_persistence(CacheSessionPersistence::new(store, config)?))
    }

    /// Wrap an already built persistence
    pub fn from_persistence(persistence: CacheSessionPersistence<S>) -> Self {
        Self { persistence }
    }

    pub fn persistence(&self) -> &CacheSessionPersistence<S> {
        &self.persistence
    }
}

impl<S: SessionCache> Clone for CacheSessionHandler<S> {
    fn clone(&self) -> Self {
        Self {
            persistence: self.persistence.clone(),
        }
    }
}

#[async_trait]
impl<S: SessionCache> Handler for CacheSessionHandler<S> {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        let session = match self.persistence.initialize_session(&*req).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Failed to load session: {}", e);
                res.render(StatusError::internal_server_error());
                ctrl.skip_rest();
                return;
            }
        };

        depot.insert(SESSION_KEY, session);

        ctrl.call_next(req, depot, res).await;

        let session = match depot.remove::<Session>(SESSION_KEY) {
            Ok(session) => session,
            Err(_) => {
                tracing::debug!("session removed from depot by a handler; nothing to persist");
                return;
            }
        };

        let persisted = self
            .persistence
            .persist_session(session, &mut *res)
            .await
            .map(|_| ());
        if let Err(e) = persisted {
            tracing::error!("Failed to save session: {}", e);
            res.render(StatusError::internal_server_error());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depot_ext::SessionDepotExt;
    use crate::store::MemoryStore;
    use salvo::prelude::*;
    use salvo::test::{ResponseExt, TestClient};
    use salvo::Service;

    #[handler]
    async fn bump(depot: &mut Depot) -> String {
        let session = depot.session_mut().expect("session in depot");
        let views: i32 = session.get("views").unwrap_or(0);
        session.set("views", views + 1).expect("serializable");
        format!("{}", views + 1)
    }

    #[handler]
    async fn peek(depot: &mut Depot) -> String {
        let views: i32 = depot.session().and_then(|s| s.get("views")).unwrap_or(0);
        format!("{}", views)
    }

    fn service(store: MemoryStore) -> Service {
        let handler = CacheSessionHandler::new(store, SessionConfig::new("sess")).unwrap();
        let router = Router::new()
            .hoop(handler)
            .push(Router::with_path("bump").get(bump))
            .push(Router::with_path("peek").get(peek));
        Service::new(router)
    }

    #[tokio::test]
    async fn test_untouched_session_sets_nothing() {
        let store = MemoryStore::new();
        let service = service(store.clone());

        let mut res = TestClient::get("http://127.0.0.1:5800/peek").send(&service).await;

        assert_eq!(res.take_string().await.unwrap(), "0");
        assert!(res.cookie("sess").is_none());
        assert!(res.headers().get("cache-control").is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_modified_session_is_persisted() {
        let store = MemoryStore::new();
        let service = service(store.clone());

        let mut res = TestClient::get("http://127.0.0.1:5800/bump").send(&service).await;
        assert_eq!(res.take_string().await.unwrap(), "1");

        let id = res.cookie("sess").expect("session cookie").value().to_string();
        assert_eq!(id.len(), 32);
        assert_eq!(
            res.headers().get("cache-control").unwrap(),
            "no-store, no-cache, must-revalidate"
        );
        assert_eq!(store.len(), 1);

        let mut res = TestClient::get("http://127.0.0.1:5800/peek")
            .add_header("cookie", format!("sess={}", id), true)
            .send(&service)
            .await;
        assert_eq!(res.take_string().await.unwrap(), "1");
        // Unchanged session keeps its ID
        assert_eq!(res.cookie("sess").unwrap().value(), id);
    }
}
