//! Chart-of-accounts service: the 4-level account hierarchy.

use chrono::Utc;
use rust_decimal::Decimal;

use millerp_accounting::{
    Account, AccountLevel, AccountType, AccountUpdate, BalanceType, ContactInfo, NewAccount,
};
use millerp_core::{AccountId, DomainError, DomainResult, Entity};

use crate::store::LedgerStore;

/// Standard Level-1 heads used to bootstrap an empty chart.
pub const STANDARD_HEADS: [(&str, BalanceType); 5] = [
    ("Assets", BalanceType::Debit),
    ("Liabilities", BalanceType::Credit),
    ("Customers", BalanceType::Debit),
    ("Suppliers", BalanceType::Credit),
    ("Expenses", BalanceType::Debit),
];

#[derive(Debug, Clone)]
pub struct ChartOfAccounts<S> {
    store: S,
}

impl<S> ChartOfAccounts<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn get_account(&self, id: AccountId) -> DomainResult<Account> {
        self.store
            .account(id)?
            .ok_or_else(|| DomainError::not_found(format!("account {id}")))
    }

    /// Accounts at `level`, ordered by name, optionally narrowed to one parent
    /// and/or one account type.
    ///
    /// A `parent_id` that is not an account at `level - 1` is `NotFound`.
    pub fn get_level(
        &self,
        level: u8,
        parent_id: Option<AccountId>,
        account_type: Option<AccountType>,
    ) -> DomainResult<Vec<Account>> {
        let level = AccountLevel::new(level)?;

        if let Some(pid) = parent_id {
            let parent_ok = match (self.store.account(pid)?, level.parent_level()) {
                (Some(p), Some(expected)) => p.level() == expected,
                _ => false,
            };
            if !parent_ok {
                return Err(DomainError::not_found(format!(
                    "parent account {pid} at level {}",
                    level.get().saturating_sub(1)
                )));
            }
        }

        let mut accounts: Vec<Account> = self
            .store
            .accounts()?
            .into_iter()
            .filter(|a| a.level() == level)
            .filter(|a| parent_id.is_none_or(|pid| a.parent_id() == Some(pid)))
            .filter(|a| account_type.is_none_or(|t| a.account_type() == t))
            .collect();
        sort_accounts(&mut accounts);
        Ok(accounts)
    }

    /// Direct children of `id` (one level down), ordered by name.
    pub fn children(&self, id: AccountId) -> DomainResult<Vec<Account>> {
        self.get_account(id)?;
        let mut accounts: Vec<Account> = self
            .store
            .accounts()?
            .into_iter()
            .filter(|a| a.parent_id() == Some(id))
            .collect();
        sort_accounts(&mut accounts);
        Ok(accounts)
    }

    pub fn create_account(&self, new: NewAccount) -> DomainResult<Account> {
        let parent = match new.parent_id {
            Some(pid) => self.store.account(pid)?,
            None => None,
        };
        let account = Account::open(AccountId::new(), new, parent.as_ref(), Utc::now())?;
        self.store.insert_account(account.clone())?;

        tracing::info!(
            account_id = %account.id(),
            level = account.level().get(),
            balance_type = account.balance_type().as_str(),
            "account created"
        );
        Ok(account)
    }

    /// Update name/type/contact. Balances are out of reach here.
    pub fn update_account(&self, id: AccountId, update: AccountUpdate) -> DomainResult<Account> {
        let account = self.store.update_account(id, update)?;
        tracing::info!(account_id = %id, "account updated");
        Ok(account)
    }

    /// Create the standard Level-1 heads when the chart is empty.
    ///
    /// Returns the created heads (empty if the chart already had accounts).
    pub fn seed_standard_heads(&self) -> DomainResult<Vec<Account>> {
        if !self.store.accounts()?.is_empty() {
            return Ok(vec![]);
        }
        STANDARD_HEADS
            .iter()
            .map(|(name, balance_type)| {
                self.create_account(NewAccount {
                    name: (*name).to_string(),
                    account_type: AccountType::Category,
                    balance_type: *balance_type,
                    opening_balance: Decimal::ZERO,
                    level: AccountLevel::TOP,
                    parent_id: None,
                    contact: ContactInfo::default(),
                })
            })
            .collect()
    }
}

fn sort_accounts(accounts: &mut [Account]) {
    accounts.sort_by(|a, b| {
        a.name()
            .to_lowercase()
            .cmp(&b.name().to_lowercase())
            .then_with(|| a.id().cmp(&b.id()))
    });
}
