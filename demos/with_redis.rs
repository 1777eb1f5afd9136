//! Redis session cache example, wired through the settings factory
//!
//! Settings are read from the `SESSION_SETTINGS` environment variable as JSON,
//! e.g. `{"session_cache": {"cookie_name": "app", "cache_limiter": "public"}}`.

use salvo::prelude::*;
use salvo_cache_session::{CacheRegistry, CacheSessionHandler, RedisStore, SessionDepotExt};
use serde::Serialize;

#[derive(Serialize)]
struct SessionInfo {
    #[serde(rename = "sessionId")]
    session_id: String,
    counter: i32,
    changed: bool,
}

#[handler]
async fn health() -> &'static str {
    "ok"
}

#[handler]
async fn counter(depot: &mut Depot, res: &mut Response) {
    let Some(session) = depot.session_mut() else {
        res.render(StatusError::internal_server_error());
        return;
    };

    let count: i32 = session.get("counter").unwrap_or(0) + 1;
    if session.set("counter", count).is_err() {
        res.render(StatusError::internal_server_error());
        return;
    }

    res.render(Json(SessionInfo {
        session_id: session.id().to_string(),
        counter: count,
        changed: session.has_changed(),
    }));
}

#[handler]
async fn no_store(depot: &mut Depot, res: &mut Response) {
    if let Some(session) = depot.session_mut() {
        let _ = session.set("visited_no_store", true);
    }
    // Caller-supplied caching headers win over the session limiter
    res.headers_mut()
        .insert("cache-control", salvo::http::header::HeaderValue::from_static("no-store"));
    res.render("caching headers left to the handler");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
    let settings = std::env::var("SESSION_SETTINGS").unwrap_or_else(|_| "{}".to_string());

    let store = match RedisStore::from_url(&redis_url).await {
        Ok(store) => store.with_prefix("sess:"),
        Err(e) => {
            eprintln!("Failed to connect to Redis at {}: {}", redis_url, e);
            return;
        }
    };

    let settings: serde_json::Value = match serde_json::from_str(&settings) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("SESSION_SETTINGS is not valid JSON: {}", e);
            return;
        }
    };

    let registry = CacheRegistry::new().register("cache", store);
    let persistence = match registry.build_from_json(&settings) {
        Ok(persistence) => persistence,
        Err(e) => {
            eprintln!("Failed to build session persistence: {}", e);
            return;
        }
    };
    println!(
        "Cookie '{}', cache limiter '{}'",
        persistence.config().cookie_name,
        persistence.cache_limiter()
    );

    let router = Router::new()
        .push(Router::with_path("health").get(health))
        .push(
            Router::new()
                .hoop(CacheSessionHandler::from_persistence(persistence))
                .get(counter)
                .push(Router::with_path("no-store").get(no_store)),
        );

    let port = std::env::var("PORT").unwrap_or_else(|_| "5800".to_string());
    let addr = format!("127.0.0.1:{}", port);

    let acceptor = TcpListener::new(addr.clone()).bind().await;
    println!("Server running at http://{}", addr);
    println!();
    println!("Endpoints:");
    println!("  GET /health   - Health check (no session)");
    println!("  GET /         - Increment counter");
    println!("  GET /no-store - Handler sets its own Cache-Control");

    Server::new(acceptor).serve(router).await;
}
