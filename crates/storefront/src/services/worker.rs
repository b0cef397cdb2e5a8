//! Best-effort background order processing.
//!
//! After checkout the engine spawns a fire-and-forget job that re-reads the
//! order and verifies the stored total against its item snapshot. Failures
//! retry with exponential backoff; once the attempt budget is exhausted the
//! order id is dead-lettered to the log. Nothing here ever surfaces to the
//! checkout response.

use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use thiserror::Error;

use paperback_core::{OrderId, money};

use crate::db::{OrderRepository, RepositoryError};

/// Attempts before an order is dead-lettered.
pub const MAX_ATTEMPTS: u32 = 3;

/// Base delay between attempts; doubles each retry.
const RETRY_BASE: Duration = Duration::from_millis(500);

/// Why an order failed verification.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("order {0} not found")]
    Missing(OrderId),

    #[error("order {order_id}: stored total {stored} does not match item snapshot total {computed}")]
    TotalMismatch {
        order_id: OrderId,
        stored: String,
        computed: String,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Entry point for `tokio::spawn` after checkout.
pub async fn process_order(pool: SqlitePool, order_id: OrderId) {
    process_order_with_retry(&pool, order_id, RETRY_BASE).await;
}

/// Run the verification loop with an explicit backoff base. Returns whether
/// the order verified before the attempt budget ran out.
pub async fn process_order_with_retry(
    pool: &SqlitePool,
    order_id: OrderId,
    retry_base: Duration,
) -> bool {
    for attempt in 1..=MAX_ATTEMPTS {
        match verify_order(pool, order_id).await {
            Ok(()) => {
                tracing::debug!(order = %order_id, attempt, "order verified");
                return true;
            }
            Err(err) => {
                tracing::warn!(
                    order = %order_id,
                    attempt,
                    error = %err,
                    "order processing attempt failed"
                );
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(retry_base * 2u32.pow(attempt - 1)).await;
                }
            }
        }
    }

    tracing::error!(
        order = %order_id,
        attempts = MAX_ATTEMPTS,
        "order processing exhausted its retry budget; dead-lettered"
    );
    false
}

/// Check that the order's stored total equals the sum over its item
/// snapshot.
async fn verify_order(pool: &SqlitePool, order_id: OrderId) -> Result<(), ProcessError> {
    let Some((order, items)) = OrderRepository::new(pool).get_with_items(order_id).await? else {
        return Err(ProcessError::Missing(order_id));
    };

    let computed: Decimal = items
        .iter()
        .map(|item| Decimal::from(item.quantity) * item.price)
        .sum();

    if computed != order.total_price {
        return Err(ProcessError::TotalMismatch {
            order_id,
            stored: money::format_amount(order.total_price),
            computed: money::format_amount(computed),
        });
    }

    Ok(())
}
