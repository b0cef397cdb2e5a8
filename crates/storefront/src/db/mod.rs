//! Database operations for the storefront `SQLite` store.
//!
//! # Tables
//!
//! - `authors`, `publishers`, `genres`, `books`, `quotes`, `deliveries` -
//!   read-mostly catalog
//! - `users` - site authentication
//! - `carts`, `cart_items` - one open cart per identity
//! - `orders`, `order_items` - immutable checkout snapshots
//! - `rate_limit_windows` - fixed-window admission counters
//! - tower-sessions storage (managed by the session store itself)
//!
//! Repositories map `FromRow` row structs into the domain types in
//! [`crate::models`]; money and status columns are TEXT and parse failures
//! surface as [`RepositoryError::DataCorruption`].
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p paperback-cli -- migrate
//! ```

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

pub mod books;
pub mod carts;
pub mod catalog;
pub mod orders;
pub mod rate_limit;
pub mod users;

pub use books::BookRepository;
pub use carts::CartRepository;
pub use catalog::CatalogRepository;
pub use orders::OrderRepository;
pub use rate_limit::FixedWindowLimiter;
pub use users::UserRepository;

/// Embedded migrations for the storefront database.
pub static MIGRATOR: Migrator = sqlx::migrate!();

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

    /// Constraint violation (e.g., unique email, already-checked-out cart).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// Foreign key enforcement is switched on per connection; the checkout
/// transaction relies on it.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}
