//! Business services for the storefront.
//!
//! - [`auth`] - registration and password login
//! - [`cart`] - the cart manager (one open cart per identity)
//! - [`checkout`] - the cart-to-order checkout engine
//! - [`payment`] - the order/payment state machine
//! - [`worker`] - best-effort background order processing

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod payment;
pub mod worker;
