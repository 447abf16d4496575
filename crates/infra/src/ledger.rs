//! Transaction ledger: append-only history and point-in-time queries.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use millerp_accounting::Transaction;
use millerp_core::{AccountId, DomainError, DomainResult, Entity, TransactionId};

use crate::store::{Committed, LedgerStore, PostingUnit};

/// A (reference_no, account_id) pair that appears more than once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    pub account_id: AccountId,
    pub reference_no: String,
    pub keep: Transaction,
    pub remove: Vec<Transaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DuplicateCleanupReport {
    pub groups: Vec<DuplicateGroup>,
    pub removed: Vec<TransactionId>,
}

/// Group duplicate transactions; within a group the most recently dated row
/// is kept, ties going to the row inserted last.
///
/// `history` must be in insertion order.
pub fn plan_duplicate_cleanup(history: &[Transaction]) -> Vec<DuplicateGroup> {
    let mut order: Vec<(AccountId, String)> = Vec::new();
    let mut groups: HashMap<(AccountId, String), Vec<(usize, &Transaction)>> = HashMap::new();

    for (idx, tx) in history.iter().enumerate() {
        let key = (tx.account_id(), tx.reference_no().to_string());
        let rows = groups.entry(key.clone()).or_default();
        if rows.is_empty() {
            order.push(key);
        }
        rows.push((idx, tx));
    }

    order
        .into_iter()
        .filter_map(|key| {
            let rows = groups.remove(&key)?;
            if rows.len() < 2 {
                return None;
            }
            let (keep_idx, keep) = rows
                .iter()
                .max_by_key(|(idx, tx)| (tx.transaction_date(), *idx))
                .map(|(idx, tx)| (*idx, (*tx).clone()))?;
            let remove = rows
                .iter()
                .filter(|(idx, _)| *idx != keep_idx)
                .map(|(_, tx)| (*tx).clone())
                .collect();
            Some(DuplicateGroup {
                account_id: key.0,
                reference_no: key.1,
                keep,
                remove,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct TransactionLedger<S> {
    store: S,
}

impl<S> TransactionLedger<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The single write path into the ledger; only the posting engine and
    /// the payment recorder go through here.
    pub(crate) fn record(&self, unit: PostingUnit) -> DomainResult<Committed> {
        self.store.commit(unit)
    }

    /// Transactions of `account_id` dated within `[start, end)`, oldest first.
    pub fn list_for_account(
        &self,
        account_id: AccountId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DomainResult<Vec<Transaction>> {
        if start > end {
            return Err(DomainError::validation(format!(
                "start date {start} is after end date {end}"
            )));
        }
        if self.store.account(account_id)?.is_none() {
            return Err(DomainError::not_found(format!("account {account_id}")));
        }

        let mut rows: Vec<Transaction> = self
            .store
            .transactions(account_id)?
            .into_iter()
            .filter(|t| t.transaction_date() >= start && t.transaction_date() < end)
            .collect();
        // Stable: same-day rows keep insertion order.
        rows.sort_by_key(|t| t.transaction_date());
        Ok(rows)
    }

    /// Dry run of `cleanup_duplicates`.
    pub fn find_duplicates(&self) -> DomainResult<Vec<DuplicateGroup>> {
        Ok(plan_duplicate_cleanup(&self.store.all_transactions()?))
    }

    /// Offline maintenance: remove duplicate (reference_no, account_id) rows
    /// and re-derive the balances of the affected accounts.
    pub fn cleanup_duplicates(&self) -> DomainResult<DuplicateCleanupReport> {
        let groups = self.find_duplicates()?;
        let ids: Vec<TransactionId> = groups
            .iter()
            .flat_map(|g| g.remove.iter().map(|t| t.id()))
            .collect();
        if ids.is_empty() {
            return Ok(DuplicateCleanupReport::default());
        }

        let removed = self.store.remove_transactions(&ids)?;
        tracing::info!(
            groups = groups.len(),
            removed = removed.len(),
            "duplicate transactions removed"
        );
        Ok(DuplicateCleanupReport {
            groups,
            removed: removed.iter().map(|t| t.id()).collect(),
        })
    }
}
