//! Helpers for validating money amounts and moving them in and out of SQLite.
//!
//! Amounts are [Decimal]s with exactly two decimal places. They are stored as
//! TEXT so that SQLite never rounds them through a floating point number.

use std::str::FromStr;

use rusqlite::{Row, types::Type};
use rust_decimal::Decimal;

use crate::Error;

/// The number of decimal places used for every stored amount.
pub const MONEY_SCALE: u32 = 2;

/// Check that `amount` has at most two decimal places and return it with
/// exactly two, e.g. `12.5` becomes `12.50`.
///
/// `field` names the offending field in the error message.
///
/// # Errors
/// Returns [Error::Validation] if `amount` has more than two decimal places.
pub fn normalize_amount(amount: Decimal, field: &str) -> Result<Decimal, Error> {
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(Error::Validation(format!(
            "{field} must have at most {MONEY_SCALE} decimal places, got {amount}"
        )));
    }

    let mut normalized = amount;
    normalized.rescale(MONEY_SCALE);

    Ok(normalized)
}

/// Like [normalize_amount], but also requires `amount` to be greater than zero.
///
/// # Errors
/// Returns [Error::Validation] if `amount` is zero, negative, or has more
/// than two decimal places.
pub fn normalize_positive_amount(amount: Decimal, field: &str) -> Result<Decimal, Error> {
    if amount <= Decimal::ZERO {
        return Err(Error::Validation(format!(
            "{field} must be greater than zero, got {amount}"
        )));
    }

    normalize_amount(amount, field)
}

/// Read the TEXT column at `index` as a [Decimal] with two decimal places.
pub(crate) fn get_amount(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;
    let mut amount = Decimal::from_str(&text).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })?;
    amount.rescale(MONEY_SCALE);

    Ok(amount)
}

/// Format `amount` for storage.
pub(crate) fn to_sql_text(amount: Decimal) -> String {
    let mut amount = amount;
    amount.rescale(MONEY_SCALE);
    amount.to_string()
}
