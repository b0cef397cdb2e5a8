//! Checkout: the atomic cart-to-order snapshot and its admission rules.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{add_to_cart, register_and_login, seed_book, send, test_app, test_pool};

#[tokio::test]
async fn checkout_requires_auth() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;

    let response = send(&app, "POST", "/checkout", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn checkout_of_empty_cart_is_rejected() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let cookie = register_and_login(&app, "reader@example.com").await;

    let response = send(&app, "POST", "/checkout", Some(&cookie), None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], json!("Cart is empty"));

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(orders, 0);
}

#[tokio::test]
async fn checkout_snapshots_lines_into_an_order() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let cookie = register_and_login(&app, "reader@example.com").await;
    let hardcover = seed_book(&pool, "Hardcover", "10.00").await;
    let paperback = seed_book(&pool, "Paperback", "5.00").await;

    add_to_cart(&app, &cookie, hardcover).await;
    for _ in 0..3 {
        add_to_cart(&app, &cookie, paperback).await;
    }

    let response = send(&app, "POST", "/checkout", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["success"], json!(true));
    assert_eq!(response.body["total_price"], json!("25.00"));
    assert_eq!(response.body["status"], json!("pending"));
    let order_id = response.body["order_id"].as_i64().expect("order id");

    let detail = send(
        &app,
        "GET",
        &format!("/order/{order_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(detail.status, StatusCode::OK);
    let items = detail.body["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    assert_eq!(detail.body["order"]["total_price"], json!("25.00"));
}

#[tokio::test]
async fn order_totals_are_immune_to_later_price_changes() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let cookie = register_and_login(&app, "reader@example.com").await;
    let book_id = seed_book(&pool, "Dune", "20.00").await;
    add_to_cart(&app, &cookie, book_id).await;

    let response = send(&app, "POST", "/checkout", Some(&cookie), None).await;
    let order_id = response.body["order_id"].as_i64().expect("order id");

    sqlx::query("UPDATE books SET price = '99.00' WHERE id = ?")
        .bind(book_id)
        .execute(&pool)
        .await
        .expect("reprice");

    let detail = send(
        &app,
        "GET",
        &format!("/order/{order_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(detail.body["order"]["total_price"], json!("20.00"));
    assert_eq!(detail.body["items"][0]["price"], json!("20.00"));
}

#[tokio::test]
async fn checkout_closes_the_cart_for_good() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let cookie = register_and_login(&app, "reader@example.com").await;
    let book_id = seed_book(&pool, "Dune", "20.00").await;
    add_to_cart(&app, &cookie, book_id).await;

    let response = send(&app, "POST", "/checkout", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::OK);

    // The checked-out cart is sealed; the next access starts a fresh one.
    let cart = send(&app, "GET", "/cart", Some(&cookie), None).await;
    assert!(cart.body["lines"].as_array().expect("lines").is_empty());

    // And re-submitting finds nothing to convert.
    let again = send(&app, "POST", "/checkout", Some(&cookie), None).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["error"], json!("Cart is empty"));

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(orders, 1, "no duplicate order from the same lines");
}

#[tokio::test]
async fn orders_are_invisible_to_other_users() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let book_id = seed_book(&pool, "Dune", "20.00").await;

    let owner = register_and_login(&app, "owner@example.com").await;
    add_to_cart(&app, &owner, book_id).await;
    let response = send(&app, "POST", "/checkout", Some(&owner), None).await;
    let order_id = response.body["order_id"].as_i64().expect("order id");

    let intruder = register_and_login(&app, "intruder@example.com").await;
    let detail = send(
        &app,
        "GET",
        &format!("/order/{order_id}"),
        Some(&intruder),
        None,
    )
    .await;

    assert_eq!(detail.status, StatusCode::NOT_FOUND);
}
