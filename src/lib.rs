//! # expenses-session
//!
//! Server-side sessions for Salvo, backed by a key-value store such as Redis.
//!
//! ## Features
//!
//! - **Lazy materialization**: the session is only loaded (or created) when a
//!   handler first touches it; untouched requests cause no store traffic and
//!   no `Set-Cookie` header
//! - **Dirty tracking**: unchanged sessions only have their TTL refreshed
//! - **Id rotation**: `rotate` issues a new id and CSRF token, and the old store
//!   entry is deleted once the new one is written
//! - **CSRF tokens**: every session carries a random `csrf` field, checked by
//!   [`CsrfGuard`]
//! - **Pluggable storage backends**: Redis, Memory, or custom stores
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salvo::prelude::*;
//! use expenses_session::{MemoryStore, SessionAccess, SessionConfig, SessionDepotExt, SessionHandler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let session_handler = SessionHandler::new(MemoryStore::new(), SessionConfig::new());
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
//! async fn index(depot: &mut Depot) -> Result<String, StatusError> {
//!     let session = depot.session_mut().ok_or_else(StatusError::internal_server_error)?;
//!     let user = session.get("user").await.map_err(|_| StatusError::internal_server_error())?;
//!     Ok(format!("Hello, {}", user.unwrap_or_else(|| "stranger".to_string())))
//! }
//! ```

pub mod config;
pub mod csrf;
pub mod error;
pub mod handler;
pub mod lazy;
pub mod manager;
pub mod random;
pub mod session;
pub mod store;

pub use config::SessionConfig;
pub use csrf::CsrfGuard;
pub use error::SessionError;
pub use handler::SessionHandler;
pub use lazy::{LazySession, SessionAccess};
pub use manager::{CookieDirective, SessionManager};
pub use random::random_string;
pub use session::Session;
pub use store::{KeyValueStore, MemoryStore};

#[cfg(feature = "redis-store")]
pub use store::RedisStore;

/// Extension trait for Depot to easily access session
pub mod depot_ext;
pub use depot_ext::SessionDepotExt;
