//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use paperback_core::{BookId, CartId, CartItemId, CartStatus, OrderId, UserId};

/// A shopping cart owned by exactly one identity.
///
/// At most one `Open` cart exists per identity; checkout flips the cart to
/// `CheckedOut` and it is never mutated again.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: Option<UserId>,
    pub session_key: Option<String>,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
}

/// One (book, quantity) line in a cart.
///
/// Unique per (cart, book). `owned` flips to true when a payment for the
/// owning identity completes; `order_id` back-references the order the line
/// was folded into at checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub book_id: BookId,
    pub quantity: i64,
    pub owned: bool,
    pub order_id: Option<OrderId>,
    pub added_at: DateTime<Utc>,
}

/// A quantity change requested against a cart line.
///
/// `Decrease` floors at quantity 1; removing a line is a separate, explicit
/// operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityAction {
    Increase,
    Decrease,
}
