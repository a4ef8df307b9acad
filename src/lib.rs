//! # salvo-cassandra-session
//!
//! Cassandra-backed session store for the Salvo web framework.
//!
//! The session cookie carries only a signed (and optionally encrypted) session
//! ID. The session payload is stored as a blob in a single Cassandra table and
//! expires through the row TTL.
//!
//! ## Features
//!
//! - **Random session IDs**: 32 bytes from the OS CSPRNG, base-32 encoded
//! - **Authenticated cookies**: HMAC-SHA256 with timestamp, optional AES-256-GCM,
//!   multiple key pairs for rotation
//! - **One table**: `(id, values)` with `USING TTL` writes, default name `sessions`
//! - **Pluggable cluster**: any client implementing [`Cluster`], an in-memory
//!   cluster for development and tests
//! - **Explicit saves**: sessions are written only when the handler asks
//!
//! The table is expected to exist:
//!
//! ```sql
//! CREATE TABLE sessions (id text PRIMARY KEY, values blob);
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salvo::prelude::*;
//! use salvo_cassandra_session::{
//!     CassandraStore, KeyPair, MemoryCluster, SessionDepotExt, SessionHandler, StoreConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let cluster = MemoryCluster::new().with_table("sessions");
//!     let config = StoreConfig::new(KeyPair::new("your-hash-key")).with_max_age(86400);
//!     let store = CassandraStore::new(cluster, config);
//!
//!     let router = Router::new()
//!         .hoop(SessionHandler::new(store))
//!         .get(index);
//!
//!     let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
//!     Server::new(acceptor).serve(router).await;
//! }
//!
//! #[handler]
//! async fn index(req: &mut Request, depot: &mut Depot, res: &mut Response) {
//!     let registry = depot.session_registry_mut().unwrap();
//!     let session = registry.get(&*req, "app").await;
//!     let views: i32 = session.get("views").unwrap_or(0);
//!     session.set("views", views + 1).unwrap();
//!     registry.save_all(res).await.unwrap();
//! }
//! ```

pub mod codec;
pub mod config;
pub mod cookie_codec;
pub mod error;
pub mod handler;
pub mod id;
pub mod manager;
pub mod registry;
pub mod session;
pub mod store;
pub mod transport;

pub use codec::Values;
pub use config::{Options, SameSite, StoreConfig};
pub use cookie_codec::{Authenticator, CodecChain, CookieError, KeyPair, SecureCookie};
pub use error::SessionError;
pub use handler::SessionHandler;
pub use manager::CassandraStore;
pub use registry::Registry;
pub use session::Session;
pub use store::{Cluster, Connection, CqlValue, MemoryCluster, SessionTable, StorageError};
pub use transport::{CookieSink, CookieSource};

/// Extension trait for Depot to easily access the session registry
pub mod depot_ext;
pub use depot_ext::SessionDepotExt;
