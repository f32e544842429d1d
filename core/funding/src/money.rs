//! Exact decimal money arithmetic.
//!
//! Amounts are `rust_decimal::Decimal` end to end — persisted as TEXT,
//! summed in Rust, never run through floating point. The processor speaks
//! integer minor units (cents), so conversion lives here too.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::errors::{FundingError, Result};
use crate::types::{Investment, PaymentStatus};

/// Stored scale of every amount: 2 fractional digits (currency minor units).
pub const SCALE: u32 = 2;

/// Parse a TEXT-encoded amount as stored in the database.
pub fn parse_amount(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .map_err(|e| FundingError::Validation(format!("bad amount {s:?}: {e}")))
}

/// Canonical TEXT encoding: fixed two fractional digits.
pub fn format_amount(d: &Decimal) -> String {
    format!("{:.*}", SCALE as usize, d.round_dp(SCALE))
}

/// Reject amounts carrying fractional minor units (e.g. `10.005`).
pub fn check_scale(amount: Decimal) -> Result<()> {
    if amount.round_dp(SCALE) != amount {
        return Err(FundingError::Validation(format!(
            "amount {amount} has more than {SCALE} decimal places"
        )));
    }
    Ok(())
}

/// Convert an amount to the processor's integer minor-unit representation.
///
/// `round(amount × 100)` per the processor contract; amounts that would
/// produce fractional minor units are rejected rather than silently rounded.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    check_scale(amount)?;
    let cents = amount * Decimal::ONE_HUNDRED;
    cents
        .to_i64()
        .ok_or_else(|| FundingError::Validation(format!("amount {amount} out of range")))
}

/// Exact sum of the settled investments in `investments`.
///
/// Pure and idempotent — this is the aggregator's arithmetic; the service
/// crate wraps it in a transaction.
pub fn sum_settled<'a, I>(investments: I) -> Decimal
where
    I: IntoIterator<Item = &'a Investment>,
{
    investments
        .into_iter()
        .filter(|i| i.status == PaymentStatus::Settled)
        .map(|i| i.amount)
        .sum()
}
