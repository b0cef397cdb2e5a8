//! Cart mutation flows: uniqueness per (cart, book), the quantity floor,
//! and ownership checks on line updates.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{add_to_cart, register_and_login, seed_book, seed_delivery, send, test_app, test_pool};

#[tokio::test]
async fn add_to_cart_requires_auth() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let book_id = seed_book(&pool, "Dune", "20.00").await;

    let response = send(&app, "POST", &format!("/add-to-cart/{book_id}"), None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], json!(false));
}

#[tokio::test]
async fn adding_same_book_twice_folds_into_one_line() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let cookie = register_and_login(&app, "reader@example.com").await;
    let book_id = seed_book(&pool, "Dune", "20.00").await;

    let first = add_to_cart(&app, &cookie, book_id).await;
    assert_eq!(first["cart_count"], json!(1));

    let second = add_to_cart(&app, &cookie, book_id).await;
    assert_eq!(second["cart_count"], json!(1), "still one line");

    let cart = send(&app, "GET", "/cart", Some(&cookie), None).await;
    assert_eq!(cart.status, StatusCode::OK);
    let lines = cart.body["lines"].as_array().expect("lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["item"]["quantity"], json!(2));
    assert_eq!(cart.body["total"], json!("40.00"));
}

#[tokio::test]
async fn add_of_unknown_book_is_404() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let cookie = register_and_login(&app, "reader@example.com").await;

    let response = send(&app, "POST", "/add-to-cart/999", Some(&cookie), None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn decrease_floors_at_quantity_one() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let cookie = register_and_login(&app, "reader@example.com").await;
    let book_id = seed_book(&pool, "Dune", "20.00").await;
    add_to_cart(&app, &cookie, book_id).await;

    let cart = send(&app, "GET", "/cart", Some(&cookie), None).await;
    let item_id = cart.body["lines"][0]["item"]["id"].as_i64().expect("item id");

    let response = send(
        &app,
        "POST",
        "/update-cart",
        Some(&cookie),
        Some(json!({ "cart_item_id": item_id, "action": "decrease" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], json!("success"));
    assert_eq!(response.body["new_quantity"], json!(1));
    assert_eq!(response.body["total_price"], json!("20.00"));
    assert_eq!(response.body["total_price_all"], json!("20.00"));
}

#[tokio::test]
async fn increase_recomputes_line_and_cart_totals() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let cookie = register_and_login(&app, "reader@example.com").await;
    let dune = seed_book(&pool, "Dune", "20.00").await;
    let hobbit = seed_book(&pool, "The Hobbit", "7.50").await;
    add_to_cart(&app, &cookie, dune).await;
    add_to_cart(&app, &cookie, hobbit).await;

    let cart = send(&app, "GET", "/cart", Some(&cookie), None).await;
    let item_id = cart.body["lines"][0]["item"]["id"].as_i64().expect("item id");

    let response = send(
        &app,
        "POST",
        "/update-cart",
        Some(&cookie),
        Some(json!({ "cart_item_id": item_id, "action": "increase" })),
    )
    .await;

    assert_eq!(response.body["new_quantity"], json!(2));
    assert_eq!(response.body["total_price"], json!("40.00"));
    assert_eq!(response.body["total_price_all"], json!("47.50"));
    assert_eq!(response.body["product_id"], json!(dune));
}

#[tokio::test]
async fn update_of_unknown_item_is_404() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let cookie = register_and_login(&app, "reader@example.com").await;

    let response = send(
        &app,
        "POST",
        "/update-cart",
        Some(&cookie),
        Some(json!({ "cart_item_id": 424_242, "action": "increase" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_of_another_identitys_line_is_404() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let book_id = seed_book(&pool, "Dune", "20.00").await;

    let owner = register_and_login(&app, "owner@example.com").await;
    add_to_cart(&app, &owner, book_id).await;
    let cart = send(&app, "GET", "/cart", Some(&owner), None).await;
    let item_id = cart.body["lines"][0]["item"]["id"].as_i64().expect("item id");

    let intruder = register_and_login(&app, "intruder@example.com").await;
    let response = send(
        &app,
        "POST",
        "/update-cart",
        Some(&intruder),
        Some(json!({ "cart_item_id": item_id, "action": "increase" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn remove_deletes_own_line() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let cookie = register_and_login(&app, "reader@example.com").await;
    let book_id = seed_book(&pool, "Dune", "20.00").await;
    add_to_cart(&app, &cookie, book_id).await;

    let cart = send(&app, "GET", "/cart", Some(&cookie), None).await;
    let item_id = cart.body["lines"][0]["item"]["id"].as_i64().expect("item id");

    let response = send(
        &app,
        "POST",
        &format!("/remove-from-cart/{item_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], json!(true));

    let cart = send(&app, "GET", "/cart", Some(&cookie), None).await;
    assert!(cart.body["lines"].as_array().expect("lines").is_empty());
    assert_eq!(cart.body["total"], json!("0"));
}

#[tokio::test]
async fn remove_of_another_identitys_line_is_a_silent_noop() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let book_id = seed_book(&pool, "Dune", "20.00").await;

    let owner = register_and_login(&app, "owner@example.com").await;
    add_to_cart(&app, &owner, book_id).await;
    let cart = send(&app, "GET", "/cart", Some(&owner), None).await;
    let item_id = cart.body["lines"][0]["item"]["id"].as_i64().expect("item id");

    let intruder = register_and_login(&app, "intruder@example.com").await;
    let response = send(
        &app,
        "POST",
        &format!("/remove-from-cart/{item_id}"),
        Some(&intruder),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], json!(true));

    let cart = send(&app, "GET", "/cart", Some(&owner), None).await;
    assert_eq!(
        cart.body["lines"].as_array().expect("lines").len(),
        1,
        "the owner's line survives"
    );
}

#[tokio::test]
async fn anonymous_visitors_get_an_empty_session_cart() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;

    let response = send(&app, "GET", "/cart", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["lines"].as_array().expect("lines").is_empty());
    assert!(response.cookie.is_some(), "a session is created lazily");
}

#[tokio::test]
async fn delivery_selection_prices_the_displayed_total() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let cookie = register_and_login(&app, "reader@example.com").await;
    let book_id = seed_book(&pool, "Dune", "20.00").await;
    let delivery_id = seed_delivery(&pool, "Courier", "7.00").await;
    add_to_cart(&app, &cookie, book_id).await;

    let response = send(
        &app,
        "POST",
        "/cart",
        Some(&cookie),
        Some(json!({ "delivery_id": delivery_id })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total_with_delivery"], json!("27.00"));

    // The selection sticks to the session.
    let cart = send(&app, "GET", "/cart", Some(&cookie), None).await;
    assert_eq!(cart.body["delivery"]["method"], json!("Courier"));
    assert_eq!(cart.body["total_with_delivery"], json!("27.00"));

    let unknown = send(
        &app,
        "POST",
        "/cart",
        Some(&cookie),
        Some(json!({ "delivery_id": 999 })),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}
