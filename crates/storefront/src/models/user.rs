//! User domain types.

use chrono::{DateTime, Utc};

use paperback_core::{Email, UserId};

/// A storefront user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name.
    pub fullname: String,
    /// Whether the account has been verified.
    pub is_verified: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}
