//! The checkout engine: converts an open cart into an immutable order.
//!
//! Admission control runs first (fixed-window counters keyed by identity,
//! stored in the database so they hold across processes), then the cart is
//! snapshotted into an order inside one transaction. Observers never see a
//! partial order: the order row, its item snapshot, the cart-line
//! back-references, and the cart's `checked_out` flip commit together or
//! not at all.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::db::{CartRepository, FixedWindowLimiter, OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::Identity;
use crate::models::order::Order;

/// Length of both admission windows, in seconds.
pub const WINDOW_SECS: i64 = 60;

/// Checkout attempts admitted per identity per window; the next one is
/// rejected with `RateLimited`.
pub const CHECKOUT_LIMIT: i64 = 3;

/// Orders an identity may create inside a rolling window before
/// `TooManyOrders`.
pub const ORDER_LIMIT: i64 = 3;

/// The checkout engine.
pub struct CheckoutService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Convert the identity's open cart into a pending order.
    ///
    /// # Errors
    ///
    /// - `AuthenticationRequired` for anonymous identities.
    /// - `RateLimited` past [`CHECKOUT_LIMIT`] attempts in the current
    ///   window; the attempt itself is counted whether or not it succeeds.
    /// - `EmptyCart` when there is no open cart or it has no lines.
    /// - `TooManyOrders` past [`ORDER_LIMIT`] orders in the rolling window.
    /// - `Validation` when the cart was checked out concurrently.
    pub async fn checkout(&self, identity: &Identity) -> Result<Order> {
        self.checkout_at(identity, Utc::now()).await
    }

    /// [`checkout`](Self::checkout) with an explicit clock; admission
    /// windows are computed from `now`.
    pub async fn checkout_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<Order> {
        let user_id = identity
            .user_id()
            .ok_or(AppError::AuthenticationRequired)?;

        let admitted = FixedWindowLimiter::new(self.pool)
            .hit(
                &identity.rate_limit_key("checkout"),
                CHECKOUT_LIMIT,
                WINDOW_SECS,
                now,
            )
            .await?;
        if !admitted {
            tracing::warn!(identity = %identity, "checkout attempt rejected by admission window");
            return Err(AppError::RateLimited);
        }

        let carts = CartRepository::new(self.pool);
        let Some(cart) = carts.find_open_carts(identity).await?.into_iter().next() else {
            return Err(AppError::EmptyCart);
        };
        let lines = carts.items_with_books(cart.id).await?;
        if lines.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let total_price: Decimal = lines
            .iter()
            .map(|(item, book)| Decimal::from(item.quantity) * book.price)
            .sum();

        let orders = OrderRepository::new(self.pool);
        let since = now - Duration::seconds(WINDOW_SECS);
        if orders.count_recent(user_id, since).await? >= ORDER_LIMIT {
            tracing::warn!(identity = %identity, "order creation rejected by rolling window");
            return Err(AppError::TooManyOrders);
        }

        let order = orders
            .create_from_cart(user_id, &cart, &lines, total_price)
            .await
            .map_err(|err| match err {
                RepositoryError::Conflict(_) => {
                    AppError::Validation("cart has already been checked out".to_owned())
                }
                other => AppError::Database(other),
            })?;

        tracing::info!(
            order = %order.id,
            cart = %cart.id,
            total = %order.total_price,
            lines = lines.len(),
            "checkout complete"
        );

        Ok(order)
    }
}
