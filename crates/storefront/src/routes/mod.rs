//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Home page data
//! GET  /library                 - Full book list
//! GET  /books                   - Filtered/paginated listing
//! GET  /books/{book_id}         - Book detail
//!
//! # Cart
//! GET  /cart                    - Cart view (with delivery selection)
//! POST /cart                    - Select delivery method
//! POST /add-to-cart/{book_id}   - Add one unit (auth required)
//! POST /update-cart             - Change quantity {cart_item_id, action}
//! POST /remove-from-cart/{item_id} - Remove line
//!
//! # Checkout & orders
//! POST /checkout                - Cart -> order (auth required)
//! GET  /payment/{order_id}      - Payment page data (owner)
//! POST /payment/callback        - Gateway result (gateway-trusted)
//! GET  /order/{order_id}        - Order detail (owner)
//!
//! # Auth
//! POST /auth/register           - Create account
//! POST /auth/login              - Login (cycles session, merges carts)
//! POST /auth/logout             - Logout
//! ```
//!
//! The split into [`general_routes`] and [`strict_routes`] exists so the
//! binary can wrap each group in a differently-tuned IP rate limiter;
//! [`routes`] merges both without limiters.

pub mod auth;
pub mod books;
pub mod cart;
pub mod home;
pub mod orders;
pub mod payment;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Catalog, cart, order, and payment routes.
pub fn general_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/library", get(books::library))
        .route("/books", get(books::list))
        .route("/books/{book_id}", get(books::show))
        .route("/cart", get(cart::show).post(cart::select_delivery))
        .route("/add-to-cart/{book_id}", post(cart::add))
        .route("/update-cart", post(cart::update))
        .route("/remove-from-cart/{item_id}", post(cart::remove))
        .route("/payment/{order_id}", get(payment::page))
        .route("/payment/callback", post(payment::callback))
        .route("/order/{order_id}", get(orders::show))
}

/// Routes behind the strict IP limiter: auth plus checkout.
pub fn strict_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .route("/checkout", post(orders::checkout))
}

/// Create all routes for the storefront (no rate-limit layers).
pub fn routes() -> Router<AppState> {
    general_routes().merge(strict_routes())
}
