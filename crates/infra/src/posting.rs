//! Posting engine: converts one priced pending entry into a ledger transaction.
//!
//! ## Posting flow
//!
//! ```text
//! PostPendingEntry
//!   ↓
//! 1. Load the pending entry (NotFound if unknown)
//!   ↓
//! 2. Price it: validate price/cut weight, compute the final quantity and total
//!   ↓
//! 3. Draft the transaction (side from the entry type polarity)
//!   ↓
//! 4. Commit one PostingUnit: insert transaction, move balance, mark PROCESSED
//! ```
//!
//! Steps 1-3 are pure and may run concurrently for the same entry. Step 4 runs
//! under the store's write lock and re-checks the PENDING status there, so two
//! racing posts of one entry yield exactly one transaction; the loser receives
//! `AlreadyProcessed`.

use chrono::{NaiveDate, Utc};
use millerp_accounting::{PriceInput, Transaction};
use millerp_core::{DomainError, DomainResult, Entity, PricingId};

use crate::ledger::TransactionLedger;
use crate::store::{Committed, LedgerStore, PostingUnit};

/// Request to price and post one pending entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PostPendingEntry {
    pub pricing_id: PricingId,
    pub price: PriceInput,
    /// Ledger date; today (UTC) when absent.
    pub transaction_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct PostingEngine<S> {
    store: S,
    ledger: TransactionLedger<S>,
}

impl<S> PostingEngine<S>
where
    S: LedgerStore + Clone,
{
    pub fn new(store: S) -> Self {
        Self {
            ledger: TransactionLedger::new(store.clone()),
            store,
        }
    }

    pub fn post_pending_entry(&self, cmd: PostPendingEntry) -> DomainResult<Transaction> {
        let pricing_id = cmd.pricing_id;
        let result = self.try_post(cmd);
        match &result {
            Ok(tx) => tracing::info!(
                %pricing_id,
                transaction_id = %tx.id(),
                account_id = %tx.account_id(),
                side = tx.entry_type().as_str(),
                amount = %tx.amount(),
                "pending entry posted"
            ),
            Err(err) => tracing::warn!(%pricing_id, code = err.code(), error = %err, "posting rejected"),
        }
        result
    }

    fn try_post(&self, cmd: PostPendingEntry) -> DomainResult<Transaction> {
        let entry = self
            .store
            .pending_entry(cmd.pricing_id)?
            .ok_or_else(|| DomainError::not_found(format!("pending entry {}", cmd.pricing_id)))?;

        let priced = entry.price(cmd.price)?;
        let date = cmd.transaction_date.unwrap_or_else(|| Utc::now().date_naive());
        let transaction = priced.to_transaction(&entry, date)?;

        match self.ledger.record(PostingUnit::PricedEntry {
            pricing_id: entry.id(),
            transaction,
        })? {
            Committed::PricedEntry(tx) => Ok(tx),
            other => Err(DomainError::internal(format!(
                "unexpected commit result for priced entry: {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use millerp_accounting::{
        AccountLevel, AccountType, BalanceType, ContactInfo, EntryType, NewAccount,
        NewPendingEntry, PendingEntryType, PendingStatus,
    };
    use millerp_core::AccountId;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use crate::chart::ChartOfAccounts;
    use crate::pending_queue::PendingEntryQueue;
    use crate::store::InMemoryLedgerStore;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    struct Fixture {
        store: Arc<InMemoryLedgerStore>,
        engine: PostingEngine<Arc<InMemoryLedgerStore>>,
        queue: PendingEntryQueue<Arc<InMemoryLedgerStore>>,
        account: AccountId,
    }

    fn fixture(balance_type: BalanceType) -> Fixture {
        let store = Arc::new(InMemoryLedgerStore::new());
        let account = ChartOfAccounts::new(store.clone())
            .create_account(NewAccount {
                name: "Kraft Traders".into(),
                account_type: AccountType::Supplier,
                balance_type,
                opening_balance: Decimal::ZERO,
                level: AccountLevel::TOP,
                parent_id: None,
                contact: ContactInfo::default(),
            })
            .unwrap()
            .id();
        Fixture {
            engine: PostingEngine::new(store.clone()),
            queue: PendingEntryQueue::new(store.clone()),
            store,
            account,
        }
    }

    fn enqueue(f: &Fixture, entry_type: PendingEntryType, reference: &str) -> PricingId {
        f.queue
            .enqueue(NewPendingEntry {
                entry_type,
                account_id: Some(f.account),
                counterparty_name: None,
                item_name: "Waste paper".into(),
                quantity: Some(dec("100")),
                unit: "kg".into(),
                reference_no: reference.into(),
                original_reference_no: entry_type.is_return().then(|| "G-1".to_string()),
                event_date: day(),
            })
            .unwrap()
            .id()
    }

    fn post(pricing_id: PricingId, price: &str, cut: Option<&str>) -> PostPendingEntry {
        PostPendingEntry {
            pricing_id,
            price: PriceInput {
                price_per_unit: dec(price),
                cut_weight: cut.map(dec),
            },
            transaction_date: Some(day()),
        }
    }

    #[test]
    fn sale_posts_debit_with_prefixed_reference() {
        let f = fixture(BalanceType::Debit);
        let id = enqueue(&f, PendingEntryType::Sale, "INV-7");
        let tx = f.engine.post_pending_entry(post(id, "12.5", None)).unwrap();

        assert_eq!(tx.entry_type(), EntryType::Debit);
        assert_eq!(tx.amount(), dec("1250.00"));
        assert_eq!(tx.reference_no(), "SAL-INV-7");
        assert_eq!(tx.transaction_date(), day());
        let balance = f.store.account(f.account).unwrap().unwrap().current_balance();
        assert_eq!(balance, dec("1250.00"));
    }

    #[test]
    fn purchase_return_reverses_polarity() {
        let f = fixture(BalanceType::Credit);
        let id = enqueue(&f, PendingEntryType::PurchaseReturn, "R-1");
        let tx = f.engine.post_pending_entry(post(id, "2", None)).unwrap();

        assert_eq!(tx.entry_type(), EntryType::Debit);
        assert_eq!(tx.against_reference(), Some("G-1"));
        let balance = f.store.account(f.account).unwrap().unwrap().current_balance();
        assert_eq!(balance, dec("-200.00"));
    }

    #[test]
    fn second_post_is_already_processed() {
        let f = fixture(BalanceType::Credit);
        let id = enqueue(&f, PendingEntryType::Purchase, "G-9");
        f.engine.post_pending_entry(post(id, "1", None)).unwrap();

        let err = f.engine.post_pending_entry(post(id, "1", None)).unwrap_err();
        assert!(matches!(err, DomainError::AlreadyProcessed(_)));
        assert_eq!(f.store.all_transactions().unwrap().len(), 1);
        assert_eq!(f.queue.get(id).unwrap().status(), PendingStatus::Processed);
    }

    #[test]
    fn rejected_price_leaves_entry_pending() {
        let f = fixture(BalanceType::Credit);
        let id = enqueue(&f, PendingEntryType::Purchase, "G-10");

        let err = f.engine.post_pending_entry(post(id, "0", None)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = f.engine.post_pending_entry(post(id, "5", Some("101"))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        assert!(f.store.all_transactions().unwrap().is_empty());
        assert_eq!(f.queue.get(id).unwrap().status(), PendingStatus::Pending);
    }

    #[test]
    fn unknown_entry_is_not_found() {
        let f = fixture(BalanceType::Credit);
        let err = f
            .engine
            .post_pending_entry(post(PricingId::new(), "1", None))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
