//! Pending entry queue: unpriced operational events awaiting a price.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;

use millerp_accounting::{NewPendingEntry, PendingCategory, PendingEntry};
use millerp_core::{AccountId, DomainError, DomainResult, Entity, PricingId};

use crate::store::LedgerStore;

/// A pending entry joined with its counterparty account, ready for pricing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingListing {
    #[serde(flatten)]
    pub entry: PendingEntry,
    pub account_name: String,
}

#[derive(Debug, Clone)]
pub struct PendingEntryQueue<S> {
    store: S,
}

impl<S> PendingEntryQueue<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Intake point for the gate and store subsystems.
    pub fn enqueue(&self, new: NewPendingEntry) -> DomainResult<PendingEntry> {
        let entry = PendingEntry::receive(PricingId::new(), new, Utc::now())?;
        self.store.insert_pending(entry.clone())?;
        tracing::info!(
            pricing_id = %entry.id(),
            reference = %entry.display_reference(),
            "pending entry received"
        );
        Ok(entry)
    }

    pub fn get(&self, pricing_id: PricingId) -> DomainResult<PendingEntry> {
        self.store
            .pending_entry(pricing_id)?
            .ok_or_else(|| DomainError::not_found(format!("pending entry {pricing_id}")))
    }

    /// PENDING entries of `category`, most recent event first.
    ///
    /// Entries whose counterparty account cannot be resolved in the chart, or
    /// that carry no quantity, are left out.
    pub fn list_pending(&self, category: PendingCategory) -> DomainResult<Vec<PendingListing>> {
        let names: HashMap<AccountId, String> = self
            .store
            .accounts()?
            .into_iter()
            .map(|a| (a.id(), a.name().to_string()))
            .collect();

        let mut listings: Vec<PendingListing> = self
            .store
            .pending_entries()?
            .into_iter()
            .filter(|e| e.is_pending() && category.includes(e.entry_type()) && e.is_priceable())
            .filter_map(|entry| {
                let account_id = entry.account_id()?;
                let account_name = names.get(&account_id)?.clone();
                Some(PendingListing {
                    entry,
                    account_name,
                })
            })
            .collect();

        listings.sort_by(|a, b| {
            b.entry
                .event_date()
                .cmp(&a.entry.event_date())
                .then_with(|| b.entry.recorded_at().cmp(&a.entry.recorded_at()))
        });
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use millerp_accounting::{
        AccountLevel, AccountType, BalanceType, ContactInfo, NewAccount, PendingEntryType,
    };
    use rust_decimal::Decimal;

    use crate::chart::ChartOfAccounts;
    use crate::store::InMemoryLedgerStore;

    fn setup() -> (PendingEntryQueue<Arc<InMemoryLedgerStore>>, AccountId) {
        let store = Arc::new(InMemoryLedgerStore::new());
        let acc = ChartOfAccounts::new(store.clone())
            .create_account(NewAccount {
                name: "Hassan Traders".into(),
                account_type: AccountType::Supplier,
                balance_type: BalanceType::Credit,
                opening_balance: Decimal::ZERO,
                level: AccountLevel::TOP,
                parent_id: None,
                contact: ContactInfo::default(),
            })
            .unwrap();
        (PendingEntryQueue::new(store), acc.id())
    }

    fn entry(
        entry_type: PendingEntryType,
        account_id: Option<AccountId>,
        reference: &str,
        day: u32,
    ) -> NewPendingEntry {
        NewPendingEntry {
            entry_type,
            account_id,
            counterparty_name: Some("Hassan Traders".into()),
            item_name: "Waste paper".into(),
            quantity: Some(Decimal::from(100)),
            unit: "kg".into(),
            reference_no: reference.into(),
            original_reference_no: entry_type.is_return().then(|| "PUR-1".to_string()),
            event_date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
        }
    }

    #[test]
    fn lists_most_recent_first_within_category() {
        let (queue, acc) = setup();
        queue.enqueue(entry(PendingEntryType::Purchase, Some(acc), "1", 1)).unwrap();
        queue.enqueue(entry(PendingEntryType::Purchase, Some(acc), "2", 3)).unwrap();
        queue.enqueue(entry(PendingEntryType::Sale, Some(acc), "3", 5)).unwrap();

        let purchases = queue.list_pending(PendingCategory::Purchases).unwrap();
        let refs: Vec<_> = purchases.iter().map(|l| l.entry.reference_no()).collect();
        assert_eq!(refs, vec!["2", "1"]);
        assert_eq!(purchases[0].account_name, "Hassan Traders");

        assert_eq!(queue.list_pending(PendingCategory::All).unwrap().len(), 3);
    }

    #[test]
    fn unresolvable_entries_are_hidden() {
        let (queue, acc) = setup();
        queue.enqueue(entry(PendingEntryType::Purchase, None, "1", 1)).unwrap();
        queue
            .enqueue(entry(PendingEntryType::Purchase, Some(AccountId::new()), "2", 1))
            .unwrap();
        let mut no_qty = entry(PendingEntryType::Purchase, Some(acc), "3", 1);
        no_qty.quantity = None;
        queue.enqueue(no_qty).unwrap();
        queue.enqueue(entry(PendingEntryType::Purchase, Some(acc), "4", 1)).unwrap();

        let listed = queue.list_pending(PendingCategory::All).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].entry.reference_no(), "4");
    }

    #[test]
    fn reference_numbers_are_namespaced_by_type() {
        let (queue, acc) = setup();
        queue.enqueue(entry(PendingEntryType::Purchase, Some(acc), "7", 1)).unwrap();
        queue.enqueue(entry(PendingEntryType::Sale, Some(acc), "7", 1)).unwrap();
        let dup = queue.enqueue(entry(PendingEntryType::Purchase, Some(acc), "7", 2));
        assert!(matches!(dup, Err(DomainError::Conflict(_))));
    }

    #[test]
    fn get_unknown_is_not_found() {
        let (queue, _) = setup();
        assert!(matches!(queue.get(PricingId::new()), Err(DomainError::NotFound(_))));
    }
}
