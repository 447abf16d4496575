//! Balance aggregator: opening, running and roll-up balances, computed on read.
//!
//! Nothing here writes. Every figure is derived from the opening balance plus
//! the signed transaction history, in the account's own orientation.

use std::collections::HashMap;

use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use millerp_accounting::{
    signed_amount, Account, AccountLevel, BalanceDisplay, OpeningBalance, Transaction,
};
use millerp_core::{checked_sum, round2, AccountId, DomainError, DomainResult, Entity};

use crate::chart::ChartOfAccounts;
use crate::ledger::TransactionLedger;
use crate::store::LedgerStore;

/// One transaction line of an account statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementLine {
    pub transaction: Transaction,
    /// Signed effect on the account balance.
    pub effect: Decimal,
    pub balance: Decimal,
    pub display: BalanceDisplay,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountStatement {
    pub account_id: AccountId,
    pub account_name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Balance as of the day before `start`.
    pub brought_forward: Decimal,
    pub lines: Vec<StatementLine>,
    pub closing_balance: Decimal,
    pub closing_display: BalanceDisplay,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSummary {
    pub account_id: AccountId,
    pub name: String,
    pub level: AccountLevel,
    pub balance: Decimal,
    pub display: BalanceDisplay,
}

/// Accounts and transaction history loaded once for a roll-up walk.
struct Snapshot {
    accounts: HashMap<AccountId, Account>,
    children: HashMap<AccountId, Vec<AccountId>>,
    history: HashMap<AccountId, Vec<Transaction>>,
}

impl Snapshot {
    fn load<S: LedgerStore>(store: &S) -> DomainResult<Self> {
        let mut children: HashMap<AccountId, Vec<AccountId>> = HashMap::new();
        let accounts: HashMap<AccountId, Account> = store
            .accounts()?
            .into_iter()
            .map(|a| (a.id(), a))
            .collect();
        for account in accounts.values() {
            if let Some(parent) = account.parent_id() {
                children.entry(parent).or_default().push(account.id());
            }
        }

        let mut history: HashMap<AccountId, Vec<Transaction>> = HashMap::new();
        for tx in store.all_transactions()? {
            history.entry(tx.account_id()).or_default().push(tx);
        }

        Ok(Self {
            accounts,
            children,
            history,
        })
    }

    fn running(&self, id: AccountId, as_of: NaiveDate) -> DomainResult<Decimal> {
        let account = self
            .accounts
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("account {id}")))?;
        let history = self.history.get(&id).map(Vec::as_slice).unwrap_or_default();
        running_total(account, history, as_of)
    }

    // Depth is bounded by the four chart levels.
    fn rollup(&self, id: AccountId, as_of: NaiveDate) -> DomainResult<Decimal> {
        match self.children.get(&id) {
            Some(kids) if !kids.is_empty() => {
                let mut total = Decimal::ZERO;
                for kid in kids {
                    total = checked_sum(total, self.rollup(*kid, as_of)?)?;
                }
                Ok(total)
            }
            _ => self.running(id, as_of),
        }
    }
}

/// opening + Σ signed amounts dated on or before `as_of`.
fn running_total(
    account: &Account,
    history: &[Transaction],
    as_of: NaiveDate,
) -> DomainResult<Decimal> {
    history
        .iter()
        .filter(|t| t.transaction_date() <= as_of)
        .map(|t| signed_amount(account.balance_type(), t.entry_type(), t.amount()))
        .try_fold(round2(account.opening_balance()), checked_sum)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[derive(Debug, Clone)]
pub struct BalanceAggregator<S> {
    store: S,
    chart: ChartOfAccounts<S>,
    ledger: TransactionLedger<S>,
}

impl<S> BalanceAggregator<S>
where
    S: LedgerStore + Clone,
{
    pub fn new(store: S) -> Self {
        Self {
            chart: ChartOfAccounts::new(store.clone()),
            ledger: TransactionLedger::new(store.clone()),
            store,
        }
    }

    pub fn opening_balance(&self, id: AccountId) -> DomainResult<OpeningBalance> {
        let account = self.chart.get_account(id)?;
        Ok(OpeningBalance::new(
            account.opening_balance(),
            account.balance_type(),
        ))
    }

    /// Balance of one account as of `as_of` (inclusive; today when `None`).
    pub fn running_balance(&self, id: AccountId, as_of: Option<NaiveDate>) -> DomainResult<Decimal> {
        let account = self.chart.get_account(id)?;
        let history = self.store.transactions(id)?;
        running_total(&account, &history, as_of.unwrap_or_else(today))
    }

    /// Sum of the children's roll-ups for inner nodes, the running balance
    /// as of today for leaves.
    pub fn rollup_balance(&self, id: AccountId) -> DomainResult<Decimal> {
        self.rollup_balance_as_of(id, today())
    }

    pub fn rollup_balance_as_of(&self, id: AccountId, as_of: NaiveDate) -> DomainResult<Decimal> {
        self.chart.get_account(id)?;
        Snapshot::load(&self.store)?.rollup(id, as_of)
    }

    /// Account statement over `[start, end)`.
    pub fn statement(
        &self,
        id: AccountId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DomainResult<AccountStatement> {
        let account = self.chart.get_account(id)?;
        let lines = self.ledger.list_for_account(id, start, end)?;

        let brought_forward = match start.checked_sub_days(Days::new(1)) {
            Some(day_before) => {
                running_total(&account, &self.store.transactions(id)?, day_before)?
            }
            None => round2(account.opening_balance()),
        };

        let mut balance = brought_forward;
        let mut statement_lines = Vec::with_capacity(lines.len());
        for tx in lines {
            let effect = signed_amount(account.balance_type(), tx.entry_type(), tx.amount());
            balance = checked_sum(balance, effect)?;
            statement_lines.push(StatementLine {
                transaction: tx,
                effect,
                balance,
                display: BalanceDisplay::of(balance),
            });
        }

        Ok(AccountStatement {
            account_id: id,
            account_name: account.name().to_string(),
            start,
            end,
            brought_forward,
            lines: statement_lines,
            closing_balance: balance,
            closing_display: BalanceDisplay::of(balance),
        })
    }

    /// Roll-up balance of every account at `level`, optionally under one parent.
    pub fn level_summary(
        &self,
        level: u8,
        parent_id: Option<AccountId>,
    ) -> DomainResult<Vec<BalanceSummary>> {
        let accounts = self.chart.get_level(level, parent_id, None)?;
        let snapshot = Snapshot::load(&self.store)?;
        let as_of = today();

        accounts
            .into_iter()
            .map(|account| {
                let balance = snapshot.rollup(account.id(), as_of)?;
                Ok(BalanceSummary {
                    account_id: account.id(),
                    name: account.name().to_string(),
                    level: account.level(),
                    balance,
                    display: BalanceDisplay::of(balance),
                })
            })
            .collect()
    }
}
