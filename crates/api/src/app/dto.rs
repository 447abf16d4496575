use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use millerp_accounting::{AccountType, PendingCategory, PriceInput};
use millerp_core::{AccountId, DomainError, DomainResult, PricingId};
use millerp_infra::PostPendingEntry;

// -------------------------
// Query strings
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct LevelQuery {
    pub parent_id: Option<String>,
    pub account_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PendingQuery {
    pub category: Option<String>,
}

// -------------------------
// Request bodies
// -------------------------

#[derive(Debug, Deserialize)]
pub struct PostPendingRequest {
    pub price_per_unit: Decimal,
    #[serde(default)]
    pub cut_weight: Option<Decimal>,
    #[serde(default)]
    pub transaction_date: Option<NaiveDate>,
}

impl PostPendingRequest {
    pub fn into_command(self, pricing_id: PricingId) -> PostPendingEntry {
        PostPendingEntry {
            pricing_id,
            price: PriceInput {
                price_per_unit: self.price_per_unit,
                cut_weight: self.cut_weight,
            },
            transaction_date: self.transaction_date,
        }
    }
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_account_id(raw: &str) -> DomainResult<AccountId> {
    AccountId::from_str(raw.trim())
}

pub fn parse_pricing_id(raw: &str) -> DomainResult<PricingId> {
    PricingId::from_str(raw.trim())
}

pub fn parse_date(field: &str, raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        DomainError::validation(format!("{field} must be a date (YYYY-MM-DD), got {raw:?}"))
    })
}

pub fn parse_optional_date(field: &str, raw: Option<&str>) -> DomainResult<Option<NaiveDate>> {
    raw.filter(|r| !r.trim().is_empty())
        .map(|r| parse_date(field, r))
        .transpose()
}

impl LevelQuery {
    pub fn parent_id(&self) -> DomainResult<Option<AccountId>> {
        self.parent_id
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .map(parse_account_id)
            .transpose()
    }

    pub fn account_type(&self) -> DomainResult<Option<AccountType>> {
        self.account_type
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .map(AccountType::from_str)
            .transpose()
    }
}

impl RangeQuery {
    /// Both bounds are required.
    pub fn bounds(&self) -> DomainResult<(NaiveDate, NaiveDate)> {
        let start = parse_optional_date("start", self.start.as_deref())?
            .ok_or_else(|| DomainError::validation("start is required"))?;
        let end = parse_optional_date("end", self.end.as_deref())?
            .ok_or_else(|| DomainError::validation("end is required"))?;
        Ok((start, end))
    }
}

impl PendingQuery {
    pub fn category(&self) -> DomainResult<PendingCategory> {
        match self.category.as_deref().map(str::trim) {
            None | Some("") => Ok(PendingCategory::All),
            Some(raw) => PendingCategory::from_str(raw),
        }
    }
}
