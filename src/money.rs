//! Monetary amounts as stored in `NUMERIC(12,2)` columns.
//!
//! Amounts are rounded to cents half away from zero, which is what Postgres does on
//! insert, so every store sees the same value.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::ServiceError;

/// Decimal places kept for stored amounts.
pub const SCALE: u32 = 2;

/// Largest magnitude a stored amount may have: 9,999,999,999.99.
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, SCALE)
}

/// Rounds to cents; `None` when the magnitude does not fit the column.
pub fn to_cents(amount: Decimal) -> Option<Decimal> {
    let rounded = amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
    (rounded.abs() <= max_amount()).then_some(rounded)
}

/// [`to_cents`] for caller input; `field` names the value in the error message.
pub fn validated(amount: Decimal, field: &str) -> Result<Decimal, ServiceError> {
    to_cents(amount).ok_or_else(|| {
        ServiceError::validation(format!(
            "{field} cannot exceed {} in magnitude",
            max_amount()
        ))
    })
}
