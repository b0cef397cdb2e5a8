//! Database migration command.
//!
//! Runs the storefront's embedded migrations
//! (`crates/storefront/migrations/`) against the configured database.

use tracing::info;

use paperback_storefront::db;

use super::CommandError;

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database URL is missing, the connection
/// fails, or a migration fails.
pub async fn storefront() -> Result<(), CommandError> {
    let database_url = super::database_url()?;

    info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running storefront migrations...");
    db::MIGRATOR.run(&pool).await?;

    info!("Storefront migrations complete!");
    Ok(())
}
