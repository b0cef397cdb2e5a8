//! Core type definitions.
//!
//! - [`id`] - Type-safe entity ID newtypes
//! - [`email`] - Validated email addresses
//! - [`money`] - Decimal money amounts and their TEXT-column encoding
//! - [`status`] - Status enums for books, carts, and orders

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{MoneyError, format_amount, parse_amount};
pub use status::{BookStatus, CartStatus, Featured, OrderStatus};
