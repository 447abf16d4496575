//! Pricing of pending entries into ledger transactions (pure part of the
//! posting path; persistence and atomicity live in the infra crate).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use millerp_core::{
    checked_amount, ensure_within_limit, AccountId, DomainError, DomainResult, PricingId,
};

use crate::pending::{PendingEntry, PendingEntryType};
use crate::transaction::{EntryType, ItemLine, Transaction};

/// Price submitted by the accountant for one pending entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceInput {
    pub price_per_unit: Decimal,
    /// Weight deducted at weigh-in (moisture, trim). PURCHASE only.
    #[serde(default)]
    pub cut_weight: Option<Decimal>,
}

/// Result of pricing a pending entry, before it is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedEntry {
    pub pricing_id: PricingId,
    pub entry_type: PendingEntryType,
    pub account_id: AccountId,
    pub side: EntryType,
    pub final_quantity: Decimal,
    pub price_per_unit: Decimal,
    pub total_amount: Decimal,
}

impl PendingEntry {
    /// Value this entry at `input`.
    ///
    /// Fails with `AlreadyProcessed` when the entry was consumed already and
    /// with `Validation` for a non-positive price, a negative cut weight or a
    /// cut weight larger than the quantity.
    pub fn price(&self, input: PriceInput) -> DomainResult<PricedEntry> {
        if !self.is_pending() {
            return Err(DomainError::already_processed(format!(
                "pending entry {} ({})",
                self.pricing_id(),
                self.display_reference()
            )));
        }
        if input.price_per_unit <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "price per unit must be greater than zero (got {})",
                input.price_per_unit
            )));
        }
        let account_id = self.account_id().ok_or_else(|| {
            DomainError::validation(format!(
                "{} has no counterparty account",
                self.display_reference()
            ))
        })?;
        let quantity = self.quantity().ok_or_else(|| {
            DomainError::validation(format!("{} has no quantity", self.display_reference()))
        })?;

        let cut = match input.cut_weight {
            Some(c) if c.is_sign_negative() && !c.is_zero() => {
                return Err(DomainError::validation(format!(
                    "cut weight must not be negative (got {c})"
                )));
            }
            Some(c) if self.entry_type().allows_cut_weight() => c,
            _ => Decimal::ZERO,
        };

        let final_quantity = quantity - cut;
        if final_quantity.is_sign_negative() && !final_quantity.is_zero() {
            return Err(DomainError::validation(format!(
                "cut weight {cut} exceeds quantity {quantity}"
            )));
        }

        let total_amount = checked_amount(input.price_per_unit, final_quantity)?;
        ensure_within_limit("total amount", total_amount)?;

        Ok(PricedEntry {
            pricing_id: self.pricing_id(),
            entry_type: self.entry_type(),
            account_id,
            side: self.entry_type().polarity(),
            final_quantity,
            price_per_unit: input.price_per_unit,
            total_amount,
        })
    }
}

impl PricedEntry {
    /// Draft the ledger row for this priced entry.
    pub fn to_transaction(&self, entry: &PendingEntry, date: NaiveDate) -> DomainResult<Transaction> {
        if entry.pricing_id() != self.pricing_id {
            return Err(DomainError::internal("priced entry does not match pending entry"));
        }

        let reference = entry.display_reference();
        let mut description = format!(
            "{} {}: {} {} {} @ {:.2}",
            self.entry_type.label(),
            reference,
            self.final_quantity,
            entry.unit(),
            entry.item_name(),
            self.price_per_unit
        );
        if let Some(original) = entry.original_reference_no() {
            description.push_str(&format!(" (against {original})"));
        }

        let mut tx = Transaction::draft(
            self.account_id,
            self.side,
            self.total_amount,
            date,
            reference,
            description,
        )?
        .with_item(ItemLine {
            item_name: entry.item_name().to_string(),
            quantity: self.final_quantity,
            unit: entry.unit().to_string(),
            price_per_unit: self.price_per_unit,
        });
        if let Some(original) = entry.original_reference_no() {
            tx = tx.against(original);
        }
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pending::NewPendingEntry;
    use chrono::Utc;
    use proptest::prelude::*;

    fn entry(entry_type: PendingEntryType, quantity: Decimal) -> PendingEntry {
        PendingEntry::receive(
            PricingId::new(),
            NewPendingEntry {
                entry_type,
                account_id: Some(AccountId::new()),
                counterparty_name: None,
                item_name: "Waste paper".into(),
                quantity: Some(quantity),
                unit: "kg".into(),
                reference_no: "77".into(),
                original_reference_no: entry_type.is_return().then(|| "PUR-12".to_string()),
                event_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn price(p: Decimal, cut: Option<Decimal>) -> PriceInput {
        PriceInput {
            price_per_unit: p,
            cut_weight: cut,
        }
    }

    #[test]
    fn purchase_with_cut_weight() {
        let e = entry(PendingEntryType::Purchase, Decimal::from(100));
        let priced = e.price(price(Decimal::from(50), Some(Decimal::from(5)))).unwrap();
        assert_eq!(priced.final_quantity, Decimal::from(95));
        assert_eq!(priced.total_amount, Decimal::new(475_000, 2));
        assert_eq!(priced.side, EntryType::Credit);
    }

    #[test]
    fn cut_weight_ignored_outside_purchases() {
        let e = entry(PendingEntryType::Sale, Decimal::from(10));
        let priced = e.price(price(Decimal::from(3), Some(Decimal::from(4)))).unwrap();
        assert_eq!(priced.final_quantity, Decimal::from(10));
        assert_eq!(priced.total_amount, Decimal::from(30));
    }

    #[test]
    fn rounding_of_fractional_price() {
        let e = entry(PendingEntryType::StorePurchase, Decimal::from(10));
        let priced = e.price(price(Decimal::new(7333, 3), None)).unwrap();
        assert_eq!(priced.total_amount, Decimal::new(7333, 2));
    }

    #[test]
    fn rejects_bad_prices_and_weights() {
        let e = entry(PendingEntryType::Purchase, Decimal::from(10));
        for bad in [Decimal::ZERO, Decimal::from(-5)] {
            assert!(matches!(e.price(price(bad, None)), Err(DomainError::Validation(_))));
        }
        let too_much = e.price(price(Decimal::ONE, Some(Decimal::from(11))));
        assert!(matches!(too_much, Err(DomainError::Validation(_))));
        let negative_cut = e.price(price(Decimal::ONE, Some(Decimal::from(-1))));
        assert!(matches!(negative_cut, Err(DomainError::Validation(_))));
    }

    #[test]
    fn totals_over_the_limit_are_rejected() {
        let e = entry(PendingEntryType::Purchase, Decimal::from(1_000_000));
        let err = e.price(price(Decimal::from(10_000_000_000i64), None)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn cut_equal_to_quantity_prices_to_zero() {
        let e = entry(PendingEntryType::Purchase, Decimal::from(10));
        let priced = e.price(price(Decimal::ONE, Some(Decimal::from(10)))).unwrap();
        assert!(priced.total_amount.is_zero());
    }

    #[test]
    fn processed_entries_cannot_be_priced() {
        let mut e = entry(PendingEntryType::Sale, Decimal::ONE);
        e.mark_processed().unwrap();
        assert!(matches!(
            e.price(price(Decimal::ONE, None)),
            Err(DomainError::AlreadyProcessed(_))
        ));
    }

    #[test]
    fn return_transaction_references_original() {
        let e = entry(PendingEntryType::PurchaseReturn, Decimal::from(2));
        let priced = e.price(price(Decimal::from(10), None)).unwrap();
        let tx = priced
            .to_transaction(&e, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap())
            .unwrap();
        assert_eq!(tx.reference_no(), "PRT-77");
        assert_eq!(tx.against_reference(), Some("PUR-12"));
        assert_eq!(tx.entry_type(), EntryType::Debit);
        assert_eq!(tx.amount(), Decimal::from(20));
        assert!(tx.description().contains("against PUR-12"));
    }

    proptest! {
        /// Totals always carry at most two decimal places.
        #[test]
        fn totals_are_money_scaled(
            price_milli in 1i64..10_000_000i64,
            qty_centi in 0i64..10_000_000i64,
        ) {
            let e = entry(PendingEntryType::Sale, Decimal::new(qty_centi, 2));
            let priced = e.price(price(Decimal::new(price_milli, 3), None)).unwrap();
            prop_assert!(priced.total_amount.scale() <= 2);
            let exact = Decimal::new(price_milli, 3) * Decimal::new(qty_centi, 2);
            prop_assert!((priced.total_amount - exact).abs() <= Decimal::new(5, 3));
        }
    }
}
