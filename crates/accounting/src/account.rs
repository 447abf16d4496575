use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use millerp_core::{
    checked_sum, ensure_within_limit, round2, AccountId, DomainError, DomainResult, Entity,
};

use crate::balance::signed_amount;
use crate::transaction::{EntryType, Transaction};

/// Depth of a node in the chart of accounts (1 = head, 4 = leaf account).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AccountLevel(u8);

impl AccountLevel {
    pub const TOP: AccountLevel = AccountLevel(1);
    pub const LEAF: AccountLevel = AccountLevel(4);

    pub fn new(level: u8) -> DomainResult<Self> {
        if (Self::TOP.0..=Self::LEAF.0).contains(&level) {
            Ok(Self(level))
        } else {
            Err(DomainError::validation(format!(
                "account level must be between 1 and 4 (got {level})"
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Level a parent of this level must have (`None` for Level 1).
    pub fn parent_level(self) -> Option<AccountLevel> {
        (self.0 > Self::TOP.0).then(|| AccountLevel(self.0 - 1))
    }

    pub fn child_level(self) -> Option<AccountLevel> {
        (self.0 < Self::LEAF.0).then(|| AccountLevel(self.0 + 1))
    }
}

impl TryFrom<u8> for AccountLevel {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountLevel> for u8 {
    fn from(value: AccountLevel) -> Self {
        value.0
    }
}

impl core::fmt::Display for AccountLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Level {}", self.0)
    }
}

/// Business classification of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Customer,
    Supplier,
    Vendor,
    Expense,
    Other,
    /// Internal grouping node of the chart (heads and sub-heads).
    Category,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Customer => "CUSTOMER",
            AccountType::Supplier => "SUPPLIER",
            AccountType::Vendor => "VENDOR",
            AccountType::Expense => "EXPENSE",
            AccountType::Other => "OTHER",
            AccountType::Category => "CATEGORY",
        }
    }
}

impl FromStr for AccountType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CUSTOMER" => Ok(AccountType::Customer),
            "SUPPLIER" => Ok(AccountType::Supplier),
            "VENDOR" => Ok(AccountType::Vendor),
            "EXPENSE" => Ok(AccountType::Expense),
            "OTHER" => Ok(AccountType::Other),
            "CATEGORY" => Ok(AccountType::Category),
            other => Err(DomainError::validation(format!("unknown account type '{other}'"))),
        }
    }
}

/// Normal balance side, fixed when the account is opened.
///
/// It decides how DEBIT and CREDIT transactions combine into the balance; it
/// does not decide how the balance is labelled on reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BalanceType {
    Debit,
    Credit,
}

impl BalanceType {
    pub fn as_str(self) -> &'static str {
        match self {
            BalanceType::Debit => "DEBIT",
            BalanceType::Credit => "CREDIT",
        }
    }

    /// The transaction side that increases a balance of this type.
    pub fn increasing_side(self) -> EntryType {
        match self {
            BalanceType::Debit => EntryType::Debit,
            BalanceType::Credit => EntryType::Credit,
        }
    }
}

impl FromStr for BalanceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBIT" | "DR" | "DB" => Ok(BalanceType::Debit),
            "CREDIT" | "CR" => Ok(BalanceType::Credit),
            other => Err(DomainError::validation(format!(
                "balance type must be DEBIT or CREDIT (got '{other}')"
            ))),
        }
    }
}

/// Contact metadata kept alongside counterparty accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Input for opening a new chart-of-accounts node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub account_type: AccountType,
    pub balance_type: BalanceType,
    pub opening_balance: Decimal,
    pub level: AccountLevel,
    pub parent_id: Option<AccountId>,
    #[serde(default)]
    pub contact: ContactInfo,
}

/// Mutable metadata of an account. Balances are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub account_type: Option<AccountType>,
    pub contact: Option<ContactInfo>,
}

/// A node of the chart of accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    name: String,
    account_type: AccountType,
    balance_type: BalanceType,
    opening_balance: Decimal,
    current_balance: Decimal,
    level: AccountLevel,
    parent_id: Option<AccountId>,
    contact: ContactInfo,
    created_at: DateTime<Utc>,
}

impl Account {
    /// Open an account, checking the hierarchy rule against `parent`.
    ///
    /// `parent` must be the record referenced by `new.parent_id` (the caller
    /// resolves it). The current balance starts at the opening balance.
    pub fn open(
        id: AccountId,
        new: NewAccount,
        parent: Option<&Account>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = normalize_name(&new.name)?;

        match (new.level.parent_level(), new.parent_id, parent) {
            (None, None, _) => {}
            (None, Some(_), _) => {
                return Err(DomainError::validation("level 1 accounts cannot have a parent"));
            }
            (Some(_), None, _) => {
                return Err(DomainError::validation(format!(
                    "{} accounts require a parent",
                    new.level
                )));
            }
            (Some(_), Some(pid), None) => {
                return Err(DomainError::not_found(format!("parent account {pid}")));
            }
            (Some(expected), Some(pid), Some(p)) => {
                if p.id != pid {
                    return Err(DomainError::internal("parent record does not match parent_id"));
                }
                if p.level != expected {
                    return Err(DomainError::validation(format!(
                        "parent of a {} account must be {} (parent is {})",
                        new.level, expected, p.level
                    )));
                }
            }
        }

        ensure_within_limit("opening balance", new.opening_balance)?;
        let opening = round2(new.opening_balance);
        Ok(Self {
            id,
            name,
            account_type: new.account_type,
            balance_type: new.balance_type,
            opening_balance: opening,
            current_balance: opening,
            level: new.level,
            parent_id: new.parent_id,
            contact: new.contact,
            created_at: now,
        })
    }

    pub fn id_typed(&self) -> AccountId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn balance_type(&self) -> BalanceType {
        self.balance_type
    }

    pub fn opening_balance(&self) -> Decimal {
        self.opening_balance
    }

    pub fn current_balance(&self) -> Decimal {
        self.current_balance
    }

    pub fn level(&self) -> AccountLevel {
        self.level
    }

    pub fn parent_id(&self) -> Option<AccountId> {
        self.parent_id
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Apply a metadata update. Never touches balances.
    pub fn apply_update(&mut self, update: AccountUpdate) -> DomainResult<()> {
        let name = match update.name {
            Some(n) => Some(normalize_name(&n)?),
            None => None,
        };
        if let Some(n) = name {
            self.name = n;
        }
        if let Some(t) = update.account_type {
            self.account_type = t;
        }
        if let Some(c) = update.contact {
            self.contact = c;
        }
        Ok(())
    }

    /// Move the current balance by one posted transaction.
    ///
    /// Only the posting unit of a ledger store may call this, together with
    /// the insert of `tx`.
    pub fn apply_transaction(&mut self, tx: &Transaction) -> DomainResult<()> {
        if tx.account_id() != self.id {
            return Err(DomainError::internal(format!(
                "transaction {} does not belong to account {}",
                tx.id_typed(),
                self.id
            )));
        }
        let delta = signed_amount(self.balance_type, tx.entry_type(), tx.amount());
        self.current_balance = checked_sum(self.current_balance, delta)?;
        Ok(())
    }

    /// Re-derive the current balance from the opening balance and the full
    /// transaction history of this account (maintenance only).
    /// The balance is left unchanged when the sum overflows.
    pub fn rebuild_balance<'a>(
        &mut self,
        history: impl IntoIterator<Item = &'a Transaction>,
    ) -> DomainResult<()> {
        let rebuilt = history
            .into_iter()
            .filter(|t| t.account_id() == self.id)
            .map(|t| signed_amount(self.balance_type, t.entry_type(), t.amount()))
            .try_fold(self.opening_balance, checked_sum)?;
        self.current_balance = rebuilt;
        Ok(())
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

fn normalize_name(raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("account name must not be blank"));
    }
    Ok(name.to_string())
}
