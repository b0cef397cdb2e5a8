//! Shared harness for the storefront integration tests.
//!
//! Every test runs against its own in-memory `SQLite` database with the
//! real migrations applied and the real router (session layer included) in
//! front, driven through `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::str::FromStr;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceExt;
use tower_sessions_sqlx_store::SqliteStore;

use paperback_storefront::config::StorefrontConfig;
use paperback_storefront::state::AppState;
use paperback_storefront::{db, middleware, routes};

/// A fresh, fully migrated in-memory database.
///
/// One connection only: every `sqlite::memory:` connection is its own
/// database, so the pool must never open a second one.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("connect options")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory pool");

    db::MIGRATOR.run(&pool).await.expect("migrations");

    pool
}

/// The full application router over `pool` with the default test config.
pub async fn test_app(pool: SqlitePool) -> Router {
    test_app_with(pool, StorefrontConfig::for_tests()).await
}

/// The full application router with an explicit config (e.g. a gateway
/// token).
pub async fn test_app_with(pool: SqlitePool, config: StorefrontConfig) -> Router {
    let store = SqliteStore::new(pool.clone());
    store.migrate().await.expect("session store migration");
    let session_layer = middleware::create_session_layer(store, &config);

    let state = AppState::new(config, pool);

    routes::routes().layer(session_layer).with_state(state)
}

/// What a driven request came back with.
pub struct TestResponse {
    pub status: StatusCode,
    /// The session cookie pair from `Set-Cookie`, if one was issued.
    pub cookie: Option<String>,
    pub body: Value,
}

/// Drive one request through the router.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    send_with_header(app, method, uri, cookie, None, body).await
}

/// [`send`] plus one extra request header.
pub async fn send_with_header(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    extra_header: Option<(&str, &str)>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some((name, value)) = extra_header {
        builder = builder.header(name, value);
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");

    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).to_owned());

    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        cookie,
        body,
    }
}

/// Register an account and log in, returning the session cookie.
pub async fn register_and_login(app: &Router, email: &str) -> String {
    let response = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "correct horse battery",
            "fullname": "Test Reader",
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "register: {}", response.body);

    let response = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({
            "email": email,
            "password": "correct horse battery",
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "login: {}", response.body);

    response.cookie.expect("login issues a session cookie")
}

/// Insert a book priced at `price`, creating placeholder catalog rows as
/// needed. Returns the book id.
pub async fn seed_book(pool: &SqlitePool, title: &str, price: &str) -> i64 {
    seed_book_full(pool, title, price, "exist", "normal", 2020).await
}

/// [`seed_book`] with explicit status, featured tier, and year.
pub async fn seed_book_full(
    pool: &SqlitePool,
    title: &str,
    price: &str,
    status: &str,
    featured: &str,
    year: i64,
) -> i64 {
    for table in ["authors", "publishers", "genres"] {
        sqlx::query(&format!(
            "INSERT OR IGNORE INTO {table} (id, name) VALUES (1, 'Seed')"
        ))
        .execute(pool)
        .await
        .expect("seed catalog row");
    }

    sqlx::query_scalar(
        r"
        INSERT INTO books
            (title, author_id, publisher_id, genre_id, year_published, status, price, featured)
        VALUES (?, 1, 1, 1, ?, ?, ?, ?)
        RETURNING id
        ",
    )
    .bind(title)
    .bind(year)
    .bind(status)
    .bind(price)
    .bind(featured)
    .fetch_one(pool)
    .await
    .expect("seed book")
}

/// Insert a delivery method, returning its id.
pub async fn seed_delivery(pool: &SqlitePool, method: &str, price: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO deliveries (method, price) VALUES (?, ?) RETURNING id")
        .bind(method)
        .bind(price)
        .fetch_one(pool)
        .await
        .expect("seed delivery")
}

/// Add `book_id` to the logged-in user's cart via the API.
pub async fn add_to_cart(app: &Router, cookie: &str, book_id: i64) -> Value {
    let response = send(
        app,
        "POST",
        &format!("/add-to-cart/{book_id}"),
        Some(cookie),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "add: {}", response.body);
    response.body
}
