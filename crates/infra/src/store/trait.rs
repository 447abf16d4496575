use std::sync::Arc;

use millerp_accounting::{
    Account, AccountUpdate, Expense, NewExpense, NewPayment, Payment, PendingEntry, Transaction,
    VoucherClaim,
};
use millerp_core::{AccountId, DomainResult, PricingId, TransactionId};

/// One atomic write against the ledger.
///
/// Each variant is applied entirely or not at all. Voucher numbers are
/// resolved inside the unit so two concurrent payments can never draw the
/// same number.
#[derive(Debug, Clone)]
pub enum PostingUnit {
    /// Priced pending entry: insert `transaction`, move the account balance
    /// and flip the entry to PROCESSED.
    PricedEntry {
        pricing_id: PricingId,
        transaction: Transaction,
    },
    /// Payment voucher: the transaction reference becomes the voucher number.
    Payment {
        claim: VoucherClaim,
        request: NewPayment,
        transaction: Transaction,
    },
    /// Expense voucher; `transaction` is present only for chart accounts.
    Expense {
        claim: VoucherClaim,
        request: NewExpense,
        transaction: Option<Transaction>,
    },
}

/// What a committed `PostingUnit` produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Committed {
    PricedEntry(Transaction),
    Payment {
        payment: Payment,
        transaction: Transaction,
    },
    Expense {
        expense: Expense,
        transaction: Option<Transaction>,
    },
}

/// Storage for accounts, pending entries, transactions and vouchers.
///
/// Reads return committed state only. `commit` and `remove_transactions` are
/// the only operations that change balances.
pub trait LedgerStore: Send + Sync {
    fn account(&self, id: AccountId) -> DomainResult<Option<Account>>;
    fn accounts(&self) -> DomainResult<Vec<Account>>;
    /// Conflict if the id is already taken.
    fn insert_account(&self, account: Account) -> DomainResult<()>;
    /// Metadata-only update applied under the store lock.
    fn update_account(&self, id: AccountId, update: AccountUpdate) -> DomainResult<Account>;

    fn pending_entry(&self, id: PricingId) -> DomainResult<Option<PendingEntry>>;
    fn pending_entries(&self) -> DomainResult<Vec<PendingEntry>>;
    /// Conflict if the reference number is taken within the entry type.
    fn insert_pending(&self, entry: PendingEntry) -> DomainResult<()>;

    /// Transactions of one account in insertion order.
    fn transactions(&self, account_id: AccountId) -> DomainResult<Vec<Transaction>>;
    /// Every transaction in insertion order.
    fn all_transactions(&self) -> DomainResult<Vec<Transaction>>;

    fn payments(&self) -> DomainResult<Vec<Payment>>;
    fn expenses(&self) -> DomainResult<Vec<Expense>>;

    /// Apply one posting unit atomically.
    fn commit(&self, unit: PostingUnit) -> DomainResult<Committed>;

    /// Maintenance: delete transactions and re-derive the balances of the
    /// affected accounts, atomically. Unknown ids are ignored.
    fn remove_transactions(&self, ids: &[TransactionId]) -> DomainResult<Vec<Transaction>>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn account(&self, id: AccountId) -> DomainResult<Option<Account>> {
        (**self).account(id)
    }

    fn accounts(&self) -> DomainResult<Vec<Account>> {
        (**self).accounts()
    }

    fn insert_account(&self, account: Account) -> DomainResult<()> {
        (**self).insert_account(account)
    }

    fn update_account(&self, id: AccountId, update: AccountUpdate) -> DomainResult<Account> {
        (**self).update_account(id, update)
    }

    fn pending_entry(&self, id: PricingId) -> DomainResult<Option<PendingEntry>> {
        (**self).pending_entry(id)
    }

    fn pending_entries(&self) -> DomainResult<Vec<PendingEntry>> {
        (**self).pending_entries()
    }

    fn insert_pending(&self, entry: PendingEntry) -> DomainResult<()> {
        (**self).insert_pending(entry)
    }

    fn transactions(&self, account_id: AccountId) -> DomainResult<Vec<Transaction>> {
        (**self).transactions(account_id)
    }

    fn all_transactions(&self) -> DomainResult<Vec<Transaction>> {
        (**self).all_transactions()
    }

    fn payments(&self) -> DomainResult<Vec<Payment>> {
        (**self).payments()
    }

    fn expenses(&self) -> DomainResult<Vec<Expense>> {
        (**self).expenses()
    }

    fn commit(&self, unit: PostingUnit) -> DomainResult<Committed> {
        (**self).commit(unit)
    }

    fn remove_transactions(&self, ids: &[TransactionId]) -> DomainResult<Vec<Transaction>> {
        (**self).remove_transactions(ids)
    }
}
