use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use millerp_core::{AccountId, DomainError, DomainResult, Entity, PricingId};

use crate::transaction::EntryType;

/// Business operation behind a pending entry.
///
/// Each variant differs only in the side it posts and in whether it reverses
/// an earlier document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PendingEntryType {
    Purchase,
    Sale,
    PurchaseReturn,
    SaleReturn,
    StorePurchase,
    StoreReturn,
}

impl PendingEntryType {
    pub const ALL: [PendingEntryType; 6] = [
        PendingEntryType::Purchase,
        PendingEntryType::Sale,
        PendingEntryType::PurchaseReturn,
        PendingEntryType::SaleReturn,
        PendingEntryType::StorePurchase,
        PendingEntryType::StoreReturn,
    ];

    /// Non-return operation this one reverses (itself for non-returns).
    pub fn base(self) -> Self {
        match self {
            PendingEntryType::PurchaseReturn => PendingEntryType::Purchase,
            PendingEntryType::SaleReturn => PendingEntryType::Sale,
            PendingEntryType::StoreReturn => PendingEntryType::StorePurchase,
            other => other,
        }
    }

    pub fn is_return(self) -> bool {
        self.base() != self
    }

    /// Transaction side posted against the counterparty.
    pub fn polarity(self) -> EntryType {
        let base = match self.base() {
            PendingEntryType::Purchase | PendingEntryType::StorePurchase => EntryType::Credit,
            _ => EntryType::Debit,
        };
        if self.is_return() { base.opposite() } else { base }
    }

    /// Cut weight only applies to mill purchases weighed at the gate.
    pub fn allows_cut_weight(self) -> bool {
        self == PendingEntryType::Purchase
    }

    /// Prefix of the ledger reference; reference numbers are only unique
    /// within one entry type, so the prefix keeps them apart in the ledger.
    pub fn reference_prefix(self) -> &'static str {
        match self {
            PendingEntryType::Purchase => "PUR",
            PendingEntryType::Sale => "SAL",
            PendingEntryType::PurchaseReturn => "PRT",
            PendingEntryType::SaleReturn => "SRT",
            PendingEntryType::StorePurchase => "STP",
            PendingEntryType::StoreReturn => "STR",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PendingEntryType::Purchase => "Purchase",
            PendingEntryType::Sale => "Sale",
            PendingEntryType::PurchaseReturn => "Purchase return",
            PendingEntryType::SaleReturn => "Sale return",
            PendingEntryType::StorePurchase => "Store purchase",
            PendingEntryType::StoreReturn => "Store return",
        }
    }
}

impl FromStr for PendingEntryType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PURCHASE" => Ok(PendingEntryType::Purchase),
            "SALE" => Ok(PendingEntryType::Sale),
            "PURCHASE_RETURN" => Ok(PendingEntryType::PurchaseReturn),
            "SALE_RETURN" => Ok(PendingEntryType::SaleReturn),
            "STORE_PURCHASE" => Ok(PendingEntryType::StorePurchase),
            "STORE_RETURN" => Ok(PendingEntryType::StoreReturn),
            other => Err(DomainError::validation(format!("unknown entry type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PendingStatus {
    Pending,
    Processed,
}

/// Listing filter for the pending queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingCategory {
    #[default]
    All,
    Purchases,
    Sales,
    Returns,
    Store,
}

impl PendingCategory {
    pub fn includes(self, entry_type: PendingEntryType) -> bool {
        use PendingEntryType::*;
        match self {
            PendingCategory::All => true,
            PendingCategory::Purchases => entry_type == Purchase,
            PendingCategory::Sales => entry_type == Sale,
            PendingCategory::Returns => matches!(entry_type, PurchaseReturn | SaleReturn),
            PendingCategory::Store => matches!(entry_type, StorePurchase | StoreReturn),
        }
    }
}

impl FromStr for PendingCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(PendingCategory::All),
            "purchases" | "purchase" => Ok(PendingCategory::Purchases),
            "sales" | "sale" => Ok(PendingCategory::Sales),
            "returns" | "return" => Ok(PendingCategory::Returns),
            "store" => Ok(PendingCategory::Store),
            other => Err(DomainError::validation(format!("unknown pending category '{other}'"))),
        }
    }
}

/// An operational event as handed over by the gate or store subsystem.
///
/// Counterparty and quantity are optional because the producing system may
/// hand over incomplete records; such entries are never listed for pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPendingEntry {
    pub entry_type: PendingEntryType,
    pub account_id: Option<AccountId>,
    #[serde(default)]
    pub counterparty_name: Option<String>,
    pub item_name: String,
    pub quantity: Option<Decimal>,
    pub unit: String,
    pub reference_no: String,
    /// Document reversed by a return (required for return types).
    #[serde(default)]
    pub original_reference_no: Option<String>,
    pub event_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEntry {
    pricing_id: PricingId,
    entry_type: PendingEntryType,
    account_id: Option<AccountId>,
    counterparty_name: Option<String>,
    item_name: String,
    quantity: Option<Decimal>,
    unit: String,
    status: PendingStatus,
    reference_no: String,
    original_reference_no: Option<String>,
    event_date: NaiveDate,
    recorded_at: DateTime<Utc>,
}

impl PendingEntry {
    pub fn receive(
        pricing_id: PricingId,
        new: NewPendingEntry,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let reference_no = new.reference_no.trim().to_string();
        if reference_no.is_empty() {
            return Err(DomainError::validation("reference number must not be blank"));
        }
        if let Some(q) = new.quantity {
            if q.is_sign_negative() && !q.is_zero() {
                return Err(DomainError::validation(format!(
                    "quantity must not be negative (got {q})"
                )));
            }
        }
        let original_reference_no = new
            .original_reference_no
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if new.entry_type.is_return() && original_reference_no.is_none() {
            return Err(DomainError::validation(format!(
                "{} entries must reference the original document",
                new.entry_type.label()
            )));
        }

        Ok(Self {
            pricing_id,
            entry_type: new.entry_type,
            account_id: new.account_id,
            counterparty_name: new.counterparty_name,
            item_name: new.item_name,
            quantity: new.quantity,
            unit: new.unit,
            status: PendingStatus::Pending,
            reference_no,
            original_reference_no,
            event_date: new.event_date,
            recorded_at: now,
        })
    }

    pub fn pricing_id(&self) -> PricingId {
        self.pricing_id
    }

    pub fn entry_type(&self) -> PendingEntryType {
        self.entry_type
    }

    pub fn account_id(&self) -> Option<AccountId> {
        self.account_id
    }

    pub fn counterparty_name(&self) -> Option<&str> {
        self.counterparty_name.as_deref()
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn quantity(&self) -> Option<Decimal> {
        self.quantity
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn status(&self) -> PendingStatus {
        self.status
    }

    pub fn reference_no(&self) -> &str {
        &self.reference_no
    }

    pub fn original_reference_no(&self) -> Option<&str> {
        self.original_reference_no.as_deref()
    }

    pub fn event_date(&self) -> NaiveDate {
        self.event_date
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == PendingStatus::Pending
    }

    /// Whether the entry carries enough data to be priced.
    pub fn is_priceable(&self) -> bool {
        self.account_id.is_some() && self.quantity.is_some_and(|q| !q.is_zero())
    }

    /// Reference written to the ledger, e.g. `PUR-1042`.
    pub fn display_reference(&self) -> String {
        format!("{}-{}", self.entry_type.reference_prefix(), self.reference_no)
    }

    /// Idempotency guard: PENDING → PROCESSED, exactly once.
    pub fn mark_processed(&mut self) -> DomainResult<()> {
        if self.status != PendingStatus::Pending {
            return Err(DomainError::already_processed(format!(
                "pending entry {} ({})",
                self.pricing_id,
                self.display_reference()
            )));
        }
        self.status = PendingStatus::Processed;
        Ok(())
    }
}

impl Entity for PendingEntry {
    type Id = PricingId;

    fn id(&self) -> Self::Id {
        self.pricing_id
    }
}
