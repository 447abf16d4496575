use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use millerp_accounting::{
    Account, AccountUpdate, Expense, ExpenseTarget, Payment, PendingEntry, PendingEntryType,
    Transaction, VoucherClaim, VoucherNamespace,
};
use millerp_core::{AccountId, DomainError, DomainResult, Entity, PricingId, TransactionId};

use super::r#trait::{Committed, LedgerStore, PostingUnit};

#[derive(Debug, Default)]
struct VoucherBook {
    next: u64,
    issued: HashSet<String>,
}

impl VoucherBook {
    /// Resolve a claim without mutating the book.
    fn resolve(&self, claim: &VoucherClaim) -> DomainResult<(String, u64)> {
        match &claim.requested {
            Some(no) if self.issued.contains(no) => Err(DomainError::conflict(format!(
                "voucher {no} already exists"
            ))),
            Some(no) => Ok((no.clone(), self.next)),
            None => {
                let mut seq = self.next.max(1);
                loop {
                    let candidate = claim.namespace.format(seq);
                    if !self.issued.contains(&candidate) {
                        return Ok((candidate, seq + 1));
                    }
                    seq += 1;
                }
            }
        }
    }
}

type ReferenceKey = (AccountId, String);

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<AccountId, Account>,
    pending: HashMap<PricingId, PendingEntry>,
    pending_refs: HashSet<(PendingEntryType, String)>,
    /// Insertion order is the tie-break for same-day transactions.
    transactions: Vec<Transaction>,
    references: HashMap<ReferenceKey, usize>,
    vouchers: HashMap<VoucherNamespace, VoucherBook>,
    payments: Vec<Payment>,
    expenses: Vec<Expense>,
}

impl LedgerState {
    fn require_account(&self, id: AccountId) -> DomainResult<&Account> {
        self.accounts
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("account {id}")))
    }

    fn ensure_unique_reference(&self, tx: &Transaction) -> DomainResult<()> {
        let key = (tx.account_id(), tx.reference_no().to_string());
        if self.references.get(&key).copied().unwrap_or(0) > 0 {
            return Err(DomainError::conflict(format!(
                "reference {} already posted to account {}",
                tx.reference_no(),
                tx.account_id()
            )));
        }
        Ok(())
    }

    /// Balance effect of `tx` on a copy of its account. Nothing is written.
    fn staged_account(&self, tx: &Transaction) -> DomainResult<Account> {
        let mut account = self.require_account(tx.account_id())?.clone();
        account.apply_transaction(tx)?;
        Ok(account)
    }

    fn push_transaction(&mut self, tx: Transaction, account: Account) {
        *self
            .references
            .entry((tx.account_id(), tx.reference_no().to_string()))
            .or_insert(0) += 1;
        self.accounts.insert(account.id(), account);
        self.transactions.push(tx);
    }

    fn issue_voucher(&mut self, namespace: VoucherNamespace, number: String, next: u64) {
        let book = self.vouchers.entry(namespace).or_default();
        book.issued.insert(number);
        book.next = book.next.max(next);
    }

    fn resolve_voucher(&self, claim: &VoucherClaim) -> DomainResult<(String, u64)> {
        match self.vouchers.get(&claim.namespace) {
            Some(book) => book.resolve(claim),
            None => VoucherBook::default().resolve(claim),
        }
    }

    // Every fallible step runs before the first write, so an error leaves the
    // state untouched.
    fn apply(&mut self, unit: PostingUnit) -> DomainResult<Committed> {
        match unit {
            PostingUnit::PricedEntry {
                pricing_id,
                transaction,
            } => {
                let mut entry = self
                    .pending
                    .get(&pricing_id)
                    .cloned()
                    .ok_or_else(|| DomainError::not_found(format!("pending entry {pricing_id}")))?;
                entry.mark_processed()?;
                if entry.account_id() != Some(transaction.account_id()) {
                    return Err(DomainError::internal(
                        "transaction account differs from pending entry account",
                    ));
                }
                self.ensure_unique_reference(&transaction)?;
                let account = self.staged_account(&transaction)?;

                self.pending.insert(pricing_id, entry);
                self.push_transaction(transaction.clone(), account);
                Ok(Committed::PricedEntry(transaction))
            }
            PostingUnit::Payment {
                claim,
                request,
                transaction,
            } => {
                let (voucher_no, next) = self.resolve_voucher(&claim)?;
                let transaction = transaction.with_reference(voucher_no.clone());
                if let Some(bank) = request.bank_account_id {
                    self.require_account(bank)?;
                }
                self.ensure_unique_reference(&transaction)?;
                let account = self.staged_account(&transaction)?;
                let payment = Payment::from_request(request, voucher_no.clone(), transaction.id());

                self.issue_voucher(claim.namespace, voucher_no, next);
                self.push_transaction(transaction.clone(), account);
                self.payments.push(payment.clone());
                Ok(Committed::Payment {
                    payment,
                    transaction,
                })
            }
            PostingUnit::Expense {
                claim,
                request,
                transaction,
            } => {
                let (voucher_no, next) = self.resolve_voucher(&claim)?;
                let staged = match transaction {
                    Some(tx) => {
                        let tx = tx.with_reference(voucher_no.clone());
                        if let ExpenseTarget::Account(id) = &request.target {
                            if *id != tx.account_id() {
                                return Err(DomainError::internal(
                                    "expense transaction account differs from target",
                                ));
                            }
                        }
                        self.ensure_unique_reference(&tx)?;
                        let account = self.staged_account(&tx)?;
                        Some((tx, account))
                    }
                    None => None,
                };
                let expense = Expense::from_request(
                    request,
                    voucher_no.clone(),
                    staged.as_ref().map(|(tx, _)| tx.id()),
                );

                self.issue_voucher(claim.namespace, voucher_no, next);
                let transaction = staged.map(|(tx, account)| {
                    self.push_transaction(tx.clone(), account);
                    tx
                });
                self.expenses.push(expense.clone());
                Ok(Committed::Expense {
                    expense,
                    transaction,
                })
            }
        }
    }
}

/// In-memory ledger store.
///
/// One `RwLock` guards the whole state: every posting unit runs under the
/// write lock, readers see committed state only. Intended for tests/dev and
/// single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| DomainError::internal("ledger store lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| DomainError::internal("ledger store lock poisoned"))
    }

    /// Load a transaction carried over from an earlier system, bypassing the
    /// reference uniqueness check (such data may contain duplicates that the
    /// offline cleanup later removes). The account balance is still moved.
    pub fn import_legacy_transaction(&self, tx: Transaction) -> DomainResult<()> {
        let mut state = self.write()?;
        let account = state.staged_account(&tx)?;
        state.push_transaction(tx, account);
        Ok(())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn account(&self, id: AccountId) -> DomainResult<Option<Account>> {
        Ok(self.read()?.accounts.get(&id).cloned())
    }

    fn accounts(&self) -> DomainResult<Vec<Account>> {
        Ok(self.read()?.accounts.values().cloned().collect())
    }

    fn insert_account(&self, account: Account) -> DomainResult<()> {
        let mut state = self.write()?;
        if state.accounts.contains_key(&account.id()) {
            return Err(DomainError::conflict(format!("account {} already exists", account.id())));
        }
        state.accounts.insert(account.id(), account);
        Ok(())
    }

    fn update_account(&self, id: AccountId, update: AccountUpdate) -> DomainResult<Account> {
        let mut state = self.write()?;
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("account {id}")))?;
        let mut staged = account.clone();
        staged.apply_update(update)?;
        *account = staged.clone();
        Ok(staged)
    }

    fn pending_entry(&self, id: PricingId) -> DomainResult<Option<PendingEntry>> {
        Ok(self.read()?.pending.get(&id).cloned())
    }

    fn pending_entries(&self) -> DomainResult<Vec<PendingEntry>> {
        Ok(self.read()?.pending.values().cloned().collect())
    }

    fn insert_pending(&self, entry: PendingEntry) -> DomainResult<()> {
        let mut state = self.write()?;
        let key = (entry.entry_type(), entry.reference_no().to_string());
        if state.pending_refs.contains(&key) {
            return Err(DomainError::conflict(format!(
                "{} reference {} already exists",
                entry.entry_type().label(),
                entry.reference_no()
            )));
        }
        if state.pending.contains_key(&entry.id()) {
            return Err(DomainError::conflict(format!(
                "pending entry {} already exists",
                entry.id()
            )));
        }
        state.pending_refs.insert(key);
        state.pending.insert(entry.id(), entry);
        Ok(())
    }

    fn transactions(&self, account_id: AccountId) -> DomainResult<Vec<Transaction>> {
        Ok(self
            .read()?
            .transactions
            .iter()
            .filter(|t| t.account_id() == account_id)
            .cloned()
            .collect())
    }

    fn all_transactions(&self) -> DomainResult<Vec<Transaction>> {
        Ok(self.read()?.transactions.clone())
    }

    fn payments(&self) -> DomainResult<Vec<Payment>> {
        Ok(self.read()?.payments.clone())
    }

    fn expenses(&self) -> DomainResult<Vec<Expense>> {
        Ok(self.read()?.expenses.clone())
    }

    fn commit(&self, unit: PostingUnit) -> DomainResult<Committed> {
        self.write()?.apply(unit)
    }

    fn remove_transactions(&self, ids: &[TransactionId]) -> DomainResult<Vec<Transaction>> {
        let wanted: HashSet<TransactionId> = ids.iter().copied().collect();
        let mut state = self.write()?;

        let (doomed, survivors): (Vec<&Transaction>, Vec<&Transaction>) = state
            .transactions
            .iter()
            .partition(|t| wanted.contains(&t.id()));
        let touched: HashSet<AccountId> = doomed.iter().map(|t| t.account_id()).collect();

        // Rebuild on copies first so an overflow leaves the state untouched.
        let mut rebuilt = Vec::with_capacity(touched.len());
        for id in touched {
            if let Some(account) = state.accounts.get(&id) {
                let mut account = account.clone();
                account.rebuild_balance(survivors.iter().copied())?;
                rebuilt.push(account);
            }
        }

        let (removed, kept): (Vec<Transaction>, Vec<Transaction>) = state
            .transactions
            .drain(..)
            .partition(|t| wanted.contains(&t.id()));
        state.transactions = kept;
        for tx in &removed {
            let key = (tx.account_id(), tx.reference_no().to_string());
            if let Some(count) = state.references.get_mut(&key) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    state.references.remove(&key);
                }
            }
        }
        for account in rebuilt {
            state.accounts.insert(account.id(), account);
        }

        Ok(removed)
    }
}
