//! Fixed-window admission counters, persisted in the database.
//!
//! Unlike the per-IP governor middleware, these counters are keyed by
//! resolved identity and live in the store, so they hold across server
//! processes and restarts. Windows expire explicitly: every hit prunes rows
//! from earlier windows.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::RepositoryError;

/// A fixed-window rate limiter over the `rate_limit_windows` table.
pub struct FixedWindowLimiter<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FixedWindowLimiter<'a> {
    /// Create a new limiter.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a hit for `key` at `now` and report whether it is admitted.
    ///
    /// The window containing `now` has length `window_secs`; a hit is
    /// admitted while the window's count stays at or under `limit`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn hit(
        &self,
        key: &str,
        limit: i64,
        window_secs: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let window_start = (now.timestamp() / window_secs) * window_secs;

        // Expired windows for this key are dead weight; drop them on the way in.
        sqlx::query("DELETE FROM rate_limit_windows WHERE key = ? AND window_start < ?")
            .bind(key)
            .bind(window_start)
            .execute(self.pool)
            .await?;

        let count: i64 = sqlx::query_scalar(
            r"
            INSERT INTO rate_limit_windows (key, window_start, count)
            VALUES (?, ?, 1)
            ON CONFLICT (key, window_start) DO UPDATE SET count = count + 1
            RETURNING count
            ",
        )
        .bind(key)
        .bind(window_start)
        .fetch_one(self.pool)
        .await?;

        Ok(count <= limit)
    }
}
