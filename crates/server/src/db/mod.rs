//! Database operations for the assistant's `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `users` - Customers (bulk loaded, read-only here)
//! - `products`, `orders`, `order_items` - Catalog and order history (read-only here)
//! - `distribution_centers`, `inventory_items` - Loaded for referential completeness
//! - `conversations` - Chat conversations, one owner each
//! - `messages` - Append-only chat messages
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p shopchat-cli -- migrate
//! ```
//!
//! Queries are checked at runtime (`sqlx::query_as` with `FromRow` rows) so the
//! crate builds without a live database.

pub mod catalog;
pub mod conversations;
pub mod store;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::{CatalogRepository, ProductQuery};
pub use conversations::ConversationRepository;
pub use store::{CatalogLookup, ConversationStore, PgStore, UserDirectory};
pub use users::{UserRepository, page_bounds};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
