//! Payment page and gateway callback handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Value, json};

use paperback_core::{OrderId, money};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::payment::{CallbackOutcome, PaymentService};
use crate::state::AppState;

/// Header the gateway presents its shared secret in.
pub const GATEWAY_TOKEN_HEADER: &str = "x-gateway-token";

/// Body of the gateway's callback.
#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub order_id: i64,
    pub outcome: CallbackOutcome,
}

/// GET `/payment/{order_id}` - what the payment page needs to hand off to
/// the gateway. Owner only; the order must still be payable.
pub async fn page(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<Value>> {
    let order_id = OrderId::new(order_id);
    let order = OrderRepository::new(state.pool())
        .get(order_id)
        .await?
        .filter(|order| order.user_id == Some(user.id))
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    Ok(Json(json!({
        "order_id": order.id,
        "payment_ref": order.payment_ref,
        "total_price": money::format_amount(order.total_price),
        "status": order.status,
        "payment_date": order.payment_date,
    })))
}

/// POST `/payment/callback` - the gateway's success/failure report.
///
/// When a shared secret is configured the gateway must present it in
/// `X-Gateway-Token`; otherwise callbacks are accepted unauthenticated
/// (development only). Replays for terminal orders are no-ops.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CallbackRequest>,
) -> Result<Json<Value>> {
    verify_gateway_token(&state, &headers)?;

    let order = PaymentService::new(state.pool())
        .process_callback(OrderId::new(body.order_id), body.outcome)
        .await?;

    Ok(Json(json!({
        "success": true,
        "order_id": order.id,
        "status": order.status,
    })))
}

fn verify_gateway_token(state: &AppState, headers: &HeaderMap) -> Result<()> {
    let Some(expected) = state.config().gateway_token.as_ref() else {
        return Ok(());
    };

    let presented = headers
        .get(GATEWAY_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    if presented != Some(expected.expose_secret()) {
        tracing::warn!("payment callback rejected: missing or wrong gateway token");
        return Err(AppError::AuthenticationRequired);
    }

    Ok(())
}
