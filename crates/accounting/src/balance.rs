//! Sign convention and balance display.
//!
//! Two separate rules live here and are easy to mix up:
//! - how a transaction moves a balance depends on the account's fixed
//!   `BalanceType` (`signed_amount`);
//! - how a computed balance is labelled (`CR` / `DB`) depends only on the sign
//!   of that computed balance (`BalanceDisplay::of`).

use rust_decimal::Decimal;
use serde::Serialize;

use millerp_core::round2;

use crate::account::BalanceType;
use crate::transaction::EntryType;

/// Effect of a transaction on an account balance of the given type.
///
/// The side matching the balance type adds, the other side subtracts.
pub fn signed_amount(balance_type: BalanceType, entry_type: EntryType, amount: Decimal) -> Decimal {
    if entry_type == balance_type.increasing_side() {
        amount
    } else {
        -amount
    }
}

/// Report label of a computed balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BalanceLabel {
    #[serde(rename = "CR")]
    Cr,
    #[serde(rename = "DB")]
    Db,
}

impl BalanceLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            BalanceLabel::Cr => "CR",
            BalanceLabel::Db => "DB",
        }
    }
}

impl core::fmt::Display for BalanceLabel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Magnitude + label pair shown on statements and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceDisplay {
    pub magnitude: Decimal,
    pub label: BalanceLabel,
}

impl BalanceDisplay {
    /// Label a computed balance: negative is `DB`, zero and positive are `CR`.
    pub fn of(computed: Decimal) -> Self {
        let label = if computed.is_sign_negative() && !computed.is_zero() {
            BalanceLabel::Db
        } else {
            BalanceLabel::Cr
        };
        Self {
            magnitude: round2(computed.abs()),
            label,
        }
    }
}

impl core::fmt::Display for BalanceDisplay {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2} {}", self.magnitude, self.label)
    }
}

/// First line of a ledger statement: stored opening balance as an unsigned
/// magnitude, plus the account's balance type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpeningBalance {
    pub magnitude: Decimal,
    pub balance_type: BalanceType,
}

impl OpeningBalance {
    pub fn new(opening: Decimal, balance_type: BalanceType) -> Self {
        Self {
            magnitude: round2(opening.abs()),
            balance_type,
        }
    }
}
