//! Monetary rounding policy.
//!
//! Every monetary value in the ledger is rounded to two decimal places at the
//! point it is computed (round half away from zero), never at display time.

use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{DomainError, DomainResult};

/// Number of decimal places kept for money.
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a single posting, payment, expense or opening balance may
/// carry: 999,999,999,999,999.99. It fits a `NUMERIC(20, 2)` column and leaves
/// running balances far from the `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_569_325_055, 23_283_064, 0, false, 2);

/// Round a monetary value to 2 decimals, half away from zero.
///
/// The result always carries exactly two decimal places, so `4750` comes
/// back as `4750.00`.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// `a * b` rounded to money scale, failing instead of overflowing.
pub fn checked_amount(a: Decimal, b: Decimal) -> DomainResult<Decimal> {
    a.checked_mul(b)
        .map(round2)
        .ok_or_else(|| DomainError::validation(format!("amount overflow: {a} x {b}")))
}

/// `balance + delta` rounded to money scale, failing instead of overflowing.
pub fn checked_sum(balance: Decimal, delta: Decimal) -> DomainResult<Decimal> {
    balance
        .checked_add(delta)
        .map(round2)
        .ok_or_else(|| DomainError::validation(format!("balance overflow: {balance} + {delta}")))
}

/// Reject an amount whose magnitude exceeds `MAX_AMOUNT`.
pub fn ensure_within_limit(what: &str, amount: Decimal) -> DomainResult<()> {
    if amount.abs() > MAX_AMOUNT {
        return Err(DomainError::validation(format!(
            "{what} {amount} exceeds the limit of {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

/// Parse a user-supplied decimal amount (surrounding whitespace tolerated).
pub fn parse_amount(raw: &str) -> DomainResult<Decimal> {
    Decimal::from_str(raw.trim())
        .map_err(|e| DomainError::validation(format!("invalid amount '{raw}': {e}")))
}
