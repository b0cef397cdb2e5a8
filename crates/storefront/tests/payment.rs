//! Payment callbacks: the order state machine, ownership transfer, and
//! terminal-state idempotence.

mod common;

use axum::Router;
use axum::http::StatusCode;
use secrecy::SecretString;
use serde_json::json;
use sqlx::SqlitePool;

use paperback_storefront::config::StorefrontConfig;

use common::{
    add_to_cart, register_and_login, seed_book, send, send_with_header, test_app, test_app_with,
    test_pool,
};

/// Register, fill a cart, and check out. Returns (cookie, `order_id`).
async fn place_order(app: &Router, pool: &SqlitePool, email: &str) -> (String, i64) {
    let cookie = register_and_login(app, email).await;
    let book_id = seed_book(pool, "Dune", "20.00").await;
    add_to_cart(app, &cookie, book_id).await;

    let response = send(app, "POST", "/checkout", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    let order_id = response.body["order_id"].as_i64().expect("order id");

    (cookie, order_id)
}

async fn owned_flags(pool: &SqlitePool, order_id: i64) -> Vec<bool> {
    sqlx::query_scalar("SELECT owned FROM cart_items WHERE order_id = ?")
        .bind(order_id)
        .fetch_all(pool)
        .await
        .expect("owned flags")
}

#[tokio::test]
async fn success_callback_completes_the_order_and_transfers_ownership() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let (cookie, order_id) = place_order(&app, &pool, "reader@example.com").await;

    let response = send(
        &app,
        "POST",
        "/payment/callback",
        None,
        Some(json!({ "order_id": order_id, "outcome": "success" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], json!("completed"));

    assert_eq!(owned_flags(&pool, order_id).await, vec![true]);

    let detail = send(
        &app,
        "GET",
        &format!("/order/{order_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(detail.body["order"]["status"], json!("completed"));
    assert!(
        !detail.body["order"]["payment_date"].is_null(),
        "payment date is stamped"
    );
}

#[tokio::test]
async fn replaying_a_terminal_callback_is_a_noop() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let (_cookie, order_id) = place_order(&app, &pool, "reader@example.com").await;

    let callback = json!({ "order_id": order_id, "outcome": "success" });
    let first = send(&app, "POST", "/payment/callback", None, Some(callback.clone())).await;
    assert_eq!(first.body["status"], json!("completed"));

    // Sabotage the flag: a replay that re-ran side effects would set it
    // back to true.
    sqlx::query("UPDATE cart_items SET owned = 0 WHERE order_id = ?")
        .bind(order_id)
        .execute(&pool)
        .await
        .expect("reset owned");

    let replay = send(&app, "POST", "/payment/callback", None, Some(callback)).await;
    assert_eq!(replay.status, StatusCode::OK);
    assert_eq!(replay.body["status"], json!("completed"));

    assert_eq!(
        owned_flags(&pool, order_id).await,
        vec![false],
        "terminal replay must not re-run ownership marking"
    );
}

#[tokio::test]
async fn failed_callback_fails_the_order_without_side_effects() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let (cookie, order_id) = place_order(&app, &pool, "reader@example.com").await;

    let response = send(
        &app,
        "POST",
        "/payment/callback",
        None,
        Some(json!({ "order_id": order_id, "outcome": "failed" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], json!("failed"));

    assert_eq!(owned_flags(&pool, order_id).await, vec![false]);

    let detail = send(
        &app,
        "GET",
        &format!("/order/{order_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert!(detail.body["order"]["payment_date"].is_null());
}

#[tokio::test]
async fn callback_for_a_draft_order_is_rejected() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    // A draft order never admitted to payment, inserted out-of-band.
    let order_id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO orders (payment_ref, total_price, status, created_at)
        VALUES ('draft-ref', '10.00', 'draft', '2025-03-01T12:00:00Z')
        RETURNING id
        ",
    )
    .fetch_one(&pool)
    .await
    .expect("draft order");

    let response = send(
        &app,
        "POST",
        "/payment/callback",
        None,
        Some(json!({ "order_id": order_id, "outcome": "success" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_error_leaves_the_order_pending() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let (cookie, order_id) = place_order(&app, &pool, "reader@example.com").await;

    let response = send(
        &app,
        "POST",
        "/payment/callback",
        None,
        Some(json!({ "order_id": order_id, "outcome": "error" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);

    let detail = send(
        &app,
        "GET",
        &format!("/order/{order_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(detail.body["order"]["status"], json!("pending"));
}

#[tokio::test]
async fn callback_for_an_unknown_order_is_404() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;

    let response = send(
        &app,
        "POST",
        "/payment/callback",
        None,
        Some(json!({ "order_id": 999, "outcome": "success" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn configured_gateway_token_is_enforced() {
    let pool = test_pool().await;
    let config = StorefrontConfig {
        gateway_token: Some(SecretString::from("shared-secret")),
        ..StorefrontConfig::for_tests()
    };
    let app = test_app_with(pool.clone(), config).await;
    let (_cookie, order_id) = place_order(&app, &pool, "reader@example.com").await;

    let body = json!({ "order_id": order_id, "outcome": "success" });

    let unsigned = send(&app, "POST", "/payment/callback", None, Some(body.clone())).await;
    assert_eq!(unsigned.status, StatusCode::UNAUTHORIZED);

    let wrong = send_with_header(
        &app,
        "POST",
        "/payment/callback",
        None,
        Some(("x-gateway-token", "nope")),
        Some(body.clone()),
    )
    .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let signed = send_with_header(
        &app,
        "POST",
        "/payment/callback",
        None,
        Some(("x-gateway-token", "shared-secret")),
        Some(body),
    )
    .await;
    assert_eq!(signed.status, StatusCode::OK);
    assert_eq!(signed.body["status"], json!("completed"));
}
