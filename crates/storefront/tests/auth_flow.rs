//! Registration, login, logout, and the login-time cart merge.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{add_to_cart, register_and_login, seed_book, send, test_app, test_pool};

#[tokio::test]
async fn register_login_logout_roundtrip() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;

    let cookie = register_and_login(&app, "reader@example.com").await;

    // Logged-in: add-to-cart is permitted.
    let book_id = seed_book(&pool, "Dune", "20.00").await;
    add_to_cart(&app, &cookie, book_id).await;

    let logout = send(&app, "POST", "/auth/logout", Some(&cookie), None).await;
    assert_eq!(logout.status, StatusCode::OK);
    let cookie = logout.cookie.unwrap_or(cookie);

    // Logged-out: back to authentication required.
    let response = send(
        &app,
        "POST",
        &format!("/add-to-cart/{book_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let body = json!({
        "email": "reader@example.com",
        "password": "correct horse battery",
        "fullname": "Reader",
    });

    let first = send(&app, "POST", "/auth/register", None, Some(body.clone())).await;
    assert_eq!(first.status, StatusCode::OK);

    let second = send(&app, "POST", "/auth/register", None, Some(body)).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "reader@example.com",
            "password": "correct horse battery",
        })),
    )
    .await;

    let wrong_password = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({
            "email": "reader@example.com",
            "password": "incorrect pony staple",
        })),
    )
    .await;
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);

    let unknown_user = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({
            "email": "nobody@example.com",
            "password": "correct horse battery",
        })),
    )
    .await;
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn weak_passwords_are_rejected_at_registration() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;

    let response = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "reader@example.com",
            "password": "short",
        })),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_adopts_the_anonymous_session_cart() {
    let pool = test_pool().await;
    let app = test_app(pool.clone()).await;
    let book_id = seed_book(&pool, "Dune", "20.00").await;

    // Browse anonymously: the session gets its key and a lazily-created
    // cart. Plant a line in it out-of-band (anonymous visitors cannot add
    // via the API).
    let browse = send(&app, "GET", "/cart", None, None).await;
    let anon_cookie = browse.cookie.expect("anonymous session cookie");
    let cart_id: i64 =
        sqlx::query_scalar("SELECT id FROM carts WHERE session_key IS NOT NULL")
            .fetch_one(&pool)
            .await
            .expect("anonymous cart");
    sqlx::query("INSERT INTO cart_items (cart_id, book_id, quantity, owned, added_at) VALUES (?, ?, 2, 0, '2025-03-01T12:00:00Z')")
        .bind(cart_id)
        .bind(book_id)
        .execute(&pool)
        .await
        .expect("anonymous line");

    // Register elsewhere, then log in from the anonymous session.
    send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "reader@example.com",
            "password": "correct horse battery",
        })),
    )
    .await;
    let login = send(
        &app,
        "POST",
        "/auth/login",
        Some(&anon_cookie),
        Some(json!({
            "email": "reader@example.com",
            "password": "correct horse battery",
        })),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK);
    let user_cookie = login.cookie.expect("cycled session cookie");

    // The anonymous cart became the user's cart, line intact.
    let cart = send(&app, "GET", "/cart", Some(&user_cookie), None).await;
    let lines = cart.body["lines"].as_array().expect("lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["item"]["quantity"], json!(2));
    assert_eq!(cart.body["total"], json!("40.00"));

    let anonymous_carts: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM carts WHERE session_key IS NOT NULL")
            .fetch_one(&pool)
            .await
            .expect("count");
    assert_eq!(anonymous_carts, 0, "no orphaned anonymous cart");
}
