//! Checkout and order detail handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use serde_json::{Value, json};

use paperback_core::{OrderId, money};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Identity;
use crate::models::order::{Order, OrderItem};
use crate::services::checkout::CheckoutService;
use crate::services::worker;
use crate::state::AppState;

/// Order detail payload: the order plus its immutable item snapshot.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// POST `/checkout` - convert the user's open cart into a pending order.
///
/// On success a best-effort verification job is spawned in the background;
/// its outcome never affects this response.
pub async fn checkout(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    let identity = Identity::User(user.id);
    let order = CheckoutService::new(state.pool())
        .checkout(&identity)
        .await?;

    tokio::spawn(worker::process_order(state.pool().clone(), order.id));

    Ok(Json(json!({
        "success": true,
        "order_id": order.id,
        "payment_ref": order.payment_ref,
        "total_price": money::format_amount(order.total_price),
        "status": order.status,
    })))
}

/// GET `/order/{order_id}` - order detail, owner only.
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderResponse>> {
    let order_id = OrderId::new(order_id);
    let (order, items) = OrderRepository::new(state.pool())
        .get_with_items(order_id)
        .await?
        // Orders outside the caller's ownership 404 rather than 403 so ids
        // aren't probeable.
        .filter(|(order, _)| order.user_id == Some(user.id))
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    Ok(Json(OrderResponse { order, items }))
}
