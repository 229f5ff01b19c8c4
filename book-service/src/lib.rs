//! # book-service
//!
//! A CRUD REST service over a `books` table whose search endpoints accept a
//! small JSON condition language. Conditions are decoded into a typed tree
//! ([`condition::Condition`]), validated against the known columns, and
//! compiled into a parameterized SQL `WHERE` clause, so client input only
//! ever reaches the database as bound parameters.
//!
//! ## Features
//!
//! - **Condition language**: `AND`/`OR`/`NOT` groups over `=`, `LIKE` and `ILIKE` leaves
//! - **Backends**: PostgreSQL and SQLite through the sqlx `Any` driver
//! - **Middleware stack**: request IDs, body limits, timeouts, compression, panic recovery
//! - **Observability**: structured JSON logs via `tracing`
//! - **Health checks**: liveness and readiness probes
//!
//! ## Example
//!
//! ```rust
//! use book_service::prelude::*;
//!
//! let condition = Condition::new()
//!     .like("title", "Harry Potter")
//!     .not(Condition::new().equal("author", "Lord Voldermort"));
//!
//! let compiled = condition.compile();
//! assert_eq!(compiled.text, "title LIKE ? AND NOT (author = ?)");
//! assert_eq!(compiled.params.len(), 2);
//! ```

pub mod condition;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod observability;
pub mod query;
pub mod repository;
pub mod routes;
pub mod server;
pub mod state;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::condition::{Combinator, Condition, ConditionError, LeafOperator, Value};
    pub use crate::config::Config;
    pub use crate::database::{create_pool, Dialect};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{ApiError, ItemResponse, ListResponse};
    pub use crate::observability::init_tracing;
    pub use crate::query::{FindQuery, OrderBy};
    pub use crate::repository::{Book, BookChanges, BookRepository, NewBook, Pagination, Repository};
    pub use crate::routes::router;
    pub use crate::server::Server;
    pub use crate::state::AppState;
}
