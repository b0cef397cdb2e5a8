//! The order/payment state machine.
//!
//! Orders move `draft -> pending -> {completed, failed}`; the legal moves
//! are encoded in [`OrderStatus::can_transition_to`]. The gateway callback
//! is the only trigger. Replaying a callback for an order already in a
//! terminal state is an explicit no-op so side effects (ownership marking,
//! payment date) never run twice.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use paperback_core::{OrderId, OrderStatus};

use crate::db::{OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::order::Order;

/// What the gateway reported for an order.
///
/// `Error` means the provider itself malfunctioned: the order is left
/// pending and the caller sees `GatewayError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackOutcome {
    Success,
    Failed,
    Error,
}

/// The payment tracker.
pub struct PaymentService<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> PaymentService<'a> {
    /// Create a new payment service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// Apply a gateway callback to an order and return its final state.
    ///
    /// On success the order completes and, atomically with the status
    /// change, every unowned cart line of the owning user flips to owned
    /// with `payment_date` stamped. On failure the order fails with no
    /// ownership side effects.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown order.
    /// - `Validation` for a `draft` order (never admitted to payment).
    /// - `Gateway` when the provider reported a malfunction; the order
    ///   stays pending.
    pub async fn process_callback(
        &self,
        order_id: OrderId,
        outcome: CallbackOutcome,
    ) -> Result<Order> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

        if order.status.is_terminal() {
            tracing::info!(
                order = %order_id,
                status = %order.status,
                "callback replay for a terminal order; ignoring"
            );
            return Ok(order);
        }

        let target = match outcome {
            CallbackOutcome::Success => OrderStatus::Completed,
            CallbackOutcome::Failed => OrderStatus::Failed,
            CallbackOutcome::Error => {
                tracing::warn!(order = %order_id, "gateway reported a provider malfunction");
                return Err(AppError::Gateway(
                    "payment provider reported a processing error".to_owned(),
                ));
            }
        };

        if !order.status.can_transition_to(target) {
            return Err(AppError::Validation(format!(
                "order {order_id} has not been admitted to payment"
            )));
        }

        let applied = match target {
            OrderStatus::Completed => {
                self.orders
                    .complete_payment(order_id, order.user_id, Utc::now())
                    .await
            }
            _ => self.orders.fail_payment(order_id).await,
        };
        match applied {
            Ok(()) => {
                tracing::info!(order = %order_id, status = %target, "payment state advanced");
            }
            // Lost a race with a concurrent callback; the winner already
            // ran the side effects, so fall through to re-read the order.
            Err(RepositoryError::Conflict(_)) => {
                tracing::info!(order = %order_id, "payment transition lost a concurrent race");
            }
            Err(err) => return Err(err.into()),
        }

        self.orders
            .get(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))
    }
}
