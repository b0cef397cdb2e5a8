//! Request identity types.
//!
//! Every cart and order operation takes a single resolved [`Identity`]
//! rather than re-deriving "who is this" from the request. The identity is
//! either an authenticated user id or the anonymous session key.

use serde::{Deserialize, Serialize};

use paperback_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

/// Anonymous session key: a uuid generated on first cart access and kept in
/// the session record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    #[must_use]
    pub const fn new(key: String) -> Self {
        Self(key)
    }

    /// Generate a fresh random session key.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The resolved owner of carts and orders for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// An authenticated user.
    User(UserId),
    /// An anonymous visitor, keyed by session.
    Anonymous(SessionKey),
}

impl Identity {
    /// The user id, when authenticated.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Anonymous(_) => None,
        }
    }

    /// Stable key for admission-control counters.
    #[must_use]
    pub fn rate_limit_key(&self, operation: &str) -> String {
        match self {
            Self::User(id) => format!("{operation}:user:{id}"),
            Self::Anonymous(key) => format!("{operation}:anon:{key}"),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {id}"),
            Self::Anonymous(key) => write!(f, "session {key}"),
        }
    }
}

/// Session keys for identity and cart-adjacent state.
pub mod session_keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the anonymous session key backing [`super::Identity::Anonymous`].
    pub const SESSION_KEY: &str = "session_key";

    /// Key for the delivery method selected in the cart view.
    pub const DELIVERY_METHOD: &str = "delivery_method";
}
