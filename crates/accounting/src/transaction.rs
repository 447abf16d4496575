use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use millerp_core::{
    ensure_within_limit, round2, AccountId, DomainError, DomainResult, Entity, TransactionId,
};

/// Side of a posted transaction.
///
/// CREDIT: money owed to or received from the counterparty.
/// DEBIT: money the mill has paid, or is owed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    pub fn opposite(self) -> Self {
        match self {
            EntryType::Debit => EntryType::Credit,
            EntryType::Credit => EntryType::Debit,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Debit => "DEBIT",
            EntryType::Credit => "CREDIT",
        }
    }
}

/// Item detail carried by transactions that come from priced entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLine {
    pub item_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub price_per_unit: Decimal,
}

/// One immutable ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    transaction_date: NaiveDate,
    account_id: AccountId,
    reference_no: String,
    entry_type: EntryType,
    amount: Decimal,
    description: String,
    item: Option<ItemLine>,
    /// For returns: the GRN / document being reversed.
    against_reference: Option<String>,
    created_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a transaction that has not been committed yet.
    pub fn draft(
        account_id: AccountId,
        entry_type: EntryType,
        amount: Decimal,
        transaction_date: NaiveDate,
        reference_no: impl Into<String>,
        description: impl Into<String>,
    ) -> DomainResult<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::validation(format!(
                "transaction amount must not be negative (got {amount})"
            )));
        }
        ensure_within_limit("transaction amount", amount)?;
        Ok(Self {
            id: TransactionId::new(),
            transaction_date,
            account_id,
            reference_no: reference_no.into(),
            entry_type,
            amount: round2(amount),
            description: description.into(),
            item: None,
            against_reference: None,
            created_at: Utc::now(),
        })
    }

    pub fn with_item(mut self, item: ItemLine) -> Self {
        self.item = Some(item);
        self
    }

    pub fn against(mut self, reference_no: impl Into<String>) -> Self {
        self.against_reference = Some(reference_no.into());
        self
    }

    /// Replace the reference number (used when a voucher number is assigned
    /// at commit time).
    pub fn with_reference(mut self, reference_no: impl Into<String>) -> Self {
        self.reference_no = reference_no.into();
        self
    }

    pub fn id_typed(&self) -> TransactionId {
        self.id
    }

    pub fn transaction_date(&self) -> NaiveDate {
        self.transaction_date
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn reference_no(&self) -> &str {
        &self.reference_no
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn item(&self) -> Option<&ItemLine> {
        self.item.as_ref()
    }

    pub fn against_reference(&self) -> Option<&str> {
        self.against_reference.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
