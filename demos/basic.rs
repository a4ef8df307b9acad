//! Basic example using the in-memory cluster

use salvo::prelude::*;
use salvo_cassandra_session::{
    CassandraStore, KeyPair, MemoryCluster, SessionDepotExt, StoreConfig, SessionHandler,
};

const SESSION_NAME: &str = "app.sid";

#[handler]
async fn index(req: &mut Request, depot: &mut Depot, res: &mut Response) -> String {
    let registry = depot.session_registry_mut().expect("Session registry not found");
    let session = registry.get(&*req, SESSION_NAME).await;

    // Get current view count
    let views: i32 = session.get("views").unwrap_or(0);

    // Increment view count
    session.set("views", views + 1).expect("views serialize");
    let id = session.id().to_string();

    if let Err(e) = registry.save_all(res).await {
        return format!("Failed to save session: {}", e);
    }

    format!(
        "Hello! You have viewed this page {} time(s).\nSession ID: {}",
        views + 1,
        if id.is_empty() { "(new)" } else { id.as_str() }
    )
}

#[handler]
async fn get_user(req: &mut Request, depot: &mut Depot) -> String {
    let registry = depot.session_registry_mut().expect("Session registry not found");
    let session = registry.get(&*req, SESSION_NAME).await;

    match session.get::<String>("user") {
        Some(user) => format!("Logged in as: {}", user),
        None => "Not logged in".to_string(),
    }
}

#[handler]
async fn set_user(req: &mut Request, depot: &mut Depot, res: &mut Response) -> String {
    // Get username from query parameter
    let username = req
        .query::<String>("name")
        .unwrap_or_else(|| "anonymous".to_string());

    let registry = depot.session_registry_mut().expect("Session registry not found");
    let session = registry.get(&*req, SESSION_NAME).await;
    session.set("user", &username).expect("user serialize");

    match registry.save_all(res).await {
        Ok(()) => format!("User set to: {}", username),
        Err(e) => format!("Failed to save session: {}", e),
    }
}

#[handler]
async fn logout(req: &mut Request, depot: &mut Depot, res: &mut Response) -> &'static str {
    let registry = depot.session_registry_mut().expect("Session registry not found");

    // Expire the cookie; the row goes away with its TTL
    registry.get(&*req, SESSION_NAME).await.expire();

    match registry.save_all(res).await {
        Ok(()) => "Logged out successfully",
        Err(_) => "Failed to log out",
    }
}

#[tokio::main]
async fn main() {
    // Set up logging
    tracing_subscriber::fmt::init();

    // In-memory cluster with the session table
    let cluster = MemoryCluster::new().with_table("sessions");

    // Configure the store; prepend a new key pair to rotate keys
    let config = StoreConfig::with_key_pairs([
        KeyPair::new("your-super-secret-key-change-in-production")
            .with_block_key(*b"0123456789abcdef0123456789abcdef"),
    ])
    .with_max_age(3600) // 1 hour
    .with_http_only(true);

    let store = CassandraStore::new(cluster, config);

    // Build router
    let router = Router::new()
        .hoop(SessionHandler::new(store))
        .get(index)
        .push(Router::with_path("user").get(get_user))
        .push(Router::with_path("login").get(set_user))
        .push(Router::with_path("logout").get(logout));

    // Start server
    let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
    println!("Server running at http://127.0.0.1:5800");
    println!("Try these endpoints:");
    println!("  GET /           - View counter");
    println!("  GET /user       - Get current user");
    println!("  GET /login?name=alice - Set user");
    println!("  GET /logout     - Expire session cookie");

    Server::new(acceptor).serve(router).await;
}
