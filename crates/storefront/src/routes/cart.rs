//! Cart route handlers.
//!
//! Anonymous visitors can view and adjust a session-keyed cart; adding a
//! book requires a logged-in user. Every handler resolves the request's
//! [`Identity`] once and hands it to the cart manager.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_sessions::Session;

use paperback_core::{BookId, CartItemId, DeliveryId, money};

use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, ResolvedIdentity};
use crate::models::book::Delivery;
use crate::models::cart::QuantityAction;
use crate::models::{Identity, session_keys};
use crate::services::cart::{CartService, CartView};
use crate::state::AppState;

/// Body of `POST /update-cart`.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub cart_item_id: i64,
    pub action: QuantityAction,
}

/// Body of `POST /cart` (delivery method selection).
#[derive(Debug, Deserialize)]
pub struct SelectDeliveryRequest {
    pub delivery_id: i64,
}

/// Response to a delivery selection.
#[derive(Debug, Serialize)]
pub struct SelectDeliveryResponse {
    pub success: bool,
    pub delivery: Delivery,
    pub total_with_delivery: String,
}

/// GET `/cart` - the cart page payload, priced with the session's selected
/// delivery method.
pub async fn show(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
    session: Session,
) -> Result<Json<CartView>> {
    let selected: Option<DeliveryId> = session.get(session_keys::DELIVERY_METHOD).await?;
    let view = CartService::new(state.pool())
        .cart_view(&identity, selected)
        .await?;

    Ok(Json(view))
}

/// POST `/cart` - select a delivery method for this session.
///
/// The choice only affects the displayed total; checkout ignores it.
pub async fn select_delivery(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
    session: Session,
    Json(body): Json<SelectDeliveryRequest>,
) -> Result<Json<SelectDeliveryResponse>> {
    let delivery_id = DeliveryId::new(body.delivery_id);
    let view = CartService::new(state.pool())
        .cart_view(&identity, Some(delivery_id))
        .await?;
    let delivery = view
        .delivery
        .ok_or_else(|| AppError::NotFound(format!("delivery method {delivery_id}")))?;

    session
        .insert(session_keys::DELIVERY_METHOD, delivery_id)
        .await?;

    Ok(Json(SelectDeliveryResponse {
        success: true,
        delivery,
        total_with_delivery: money::format_amount(view.total_with_delivery),
    }))
}

/// POST `/add-to-cart/{book_id}` - add one unit of a book.
///
/// Requires a logged-in user; the (cart, book) line is found-or-created
/// and gains one unit.
pub async fn add(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> Result<Json<Value>> {
    let identity = Identity::User(user.id);
    let added = CartService::new(state.pool())
        .add_item(&identity, BookId::new(book_id))
        .await?;

    Ok(Json(json!({
        "success": true,
        "cart_count": added.cart_count,
        "message": format!("Added \"{}\" to your cart", added.book.title),
    })))
}

/// POST `/update-cart` - increase or decrease a line's quantity.
///
/// Decrease floors at 1; the response carries the new quantity plus the
/// line and cart totals so the client can redraw without refetching.
pub async fn update(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
    Json(body): Json<UpdateCartRequest>,
) -> Result<Json<Value>> {
    let update = CartService::new(state.pool())
        .update_quantity(&identity, CartItemId::new(body.cart_item_id), body.action)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "new_quantity": update.new_quantity,
        "total_price": money::format_amount(update.line_total),
        "product_id": update.book_id,
        "total_price_all": money::format_amount(update.cart_total),
    })))
}

/// POST `/remove-from-cart/{item_id}` - delete a cart line.
///
/// A line belonging to another identity's cart is silently left alone; the
/// response is success either way.
pub async fn remove(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
    Path(item_id): Path<i64>,
) -> Result<Json<Value>> {
    CartService::new(state.pool())
        .remove_item(&identity, CartItemId::new(item_id))
        .await?;

    Ok(Json(json!({ "success": true })))
}
