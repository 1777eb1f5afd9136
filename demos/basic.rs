//! Basic example using the in-memory session cache

use salvo::prelude::*;
use salvo_cache_session::{CacheSessionHandler, MemoryStore, SessionConfig, SessionDepotExt};

#[handler]
async fn index(depot: &mut Depot) -> String {
    let session = depot.session_mut().expect("Session not found");

    let views: i32 = session.get("views").unwrap_or(0);
    if let Err(e) = session.set("views", views + 1) {
        return format!("Could not update session: {}", e);
    }

    format!(
        "Hello! You have viewed this page {} time(s).\nSession ID: {}",
        views + 1,
        session.id()
    )
}

#[handler]
async fn get_user(depot: &mut Depot) -> String {
    let user = depot.session().and_then(|s| s.get::<String>("user"));

    match user {
        Some(user) => format!("Logged in as: {}", user),
        None => "Not logged in".to_string(),
    }
}

#[handler]
async fn login(req: &mut Request, depot: &mut Depot) -> String {
    let username = req.query::<String>("name").unwrap_or_else(|| "anonymous".to_string());
    let session = depot.session_mut().expect("Session not found");

    // New identity, new session ID
    session.regenerate();
    if let Err(e) = session.set("user", &username) {
        return format!("Could not update session: {}", e);
    }

    format!("User set to: {}", username)
}

#[handler]
async fn remember_me(depot: &mut Depot) -> &'static str {
    let session = depot.session_mut().expect("Session not found");

    // One week, whatever the global persistence setting says
    match session.persist_session_for(7 * 24 * 3600) {
        Ok(()) => "Cookie will survive browser restarts for a week",
        Err(_) => "Could not update session",
    }
}

#[handler]
async fn logout(depot: &mut Depot) -> &'static str {
    let session = depot.session_mut().expect("Session not found");

    session.clear();

    "Logged out successfully"
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = SessionConfig::new("sess")
        .with_http_only(true)
        .with_cache_limiter("private")
        .with_cache_expire(3600);

    let session_handler = match CacheSessionHandler::new(MemoryStore::new(), config) {
        Ok(handler) => handler,
        Err(e) => {
            eprintln!("Invalid session configuration: {}", e);
            return;
        }
    };

    let router = Router::new()
        .hoop(session_handler)
        .get(index)
        .push(Router::with_path("user").get(get_user))
        .push(Router::with_path("login").get(login))
        .push(Router::with_path("remember").get(remember_me))
        .push(Router::with_path("logout").get(logout));

    let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
    println!("Server running at http://127.0.0.1:5800");
    println!("Try these endpoints:");
    println!("  GET /                 - View counter");
    println!("  GET /user             - Get current user");
    println!("  GET /login?name=alice - Set user (rotates session ID)");
    println!("  GET /remember         - Make the session cookie persistent");
    println!("  GET /logout           - Clear session");

    Server::new(acceptor).serve(router).await;
}
