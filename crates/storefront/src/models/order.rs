//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use paperback_core::{BookId, OrderId, OrderItemId, OrderStatus, UserId};

/// An order created from a cart at checkout.
///
/// `total_price` is computed from the cart lines at creation and never
/// recomputed; the item snapshot below is the authoritative breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub session_key: Option<String>,
    /// Opaque reference passed to the payment gateway.
    pub payment_ref: String,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub payment_date: Option<DateTime<Utc>>,
}

/// One line of an order's immutable snapshot.
///
/// `price` is the book's price captured at checkout time, immune to later
/// catalog changes. Append-only once created.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub book_id: BookId,
    pub quantity: i64,
    pub price: Decimal,
}
