//! Decimal money amounts and their TEXT-column encoding.
//!
//! Prices are stored in the database as TEXT holding a plain decimal string
//! ("19.99"). All arithmetic happens on [`rust_decimal::Decimal`] so repeated
//! additions never accumulate floating-point drift.

use rust_decimal::Decimal;
use thiserror::Error;

/// Number of decimal places every stored or displayed amount carries.
pub const AMOUNT_SCALE: u32 = 2;

/// Errors that can occur when parsing a money amount.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input string is not a valid decimal number.
    #[error("invalid money amount: {0}")]
    Invalid(String),

    /// Money amounts must not be negative.
    #[error("money amount cannot be negative: {0}")]
    Negative(String),
}

/// Parse a stored amount string into a [`Decimal`].
///
/// # Errors
///
/// Returns [`MoneyError::Invalid`] if the string is not a decimal number and
/// [`MoneyError::Negative`] if it parses but is below zero.
pub fn parse_amount(s: &str) -> Result<Decimal, MoneyError> {
    let amount: Decimal = s
        .trim()
        .parse()
        .map_err(|_| MoneyError::Invalid(s.to_owned()))?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative(s.to_owned()));
    }

    Ok(amount)
}

/// Format an amount for storage or display with exactly two decimal places.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(AMOUNT_SCALE))
}
