//! Payment and expense vouchers: postings with no pending-entry precursor.

use core::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use millerp_core::{
    ensure_within_limit, round2, AccountId, DomainError, DomainResult, TransactionId,
};

use crate::transaction::EntryType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentDirection {
    /// Paid out by the mill.
    Issued,
    /// Received by the mill.
    Received,
}

impl PaymentDirection {
    pub fn side(self) -> EntryType {
        match self {
            PaymentDirection::Issued => EntryType::Debit,
            PaymentDirection::Received => EntryType::Credit,
        }
    }

    pub fn namespace(self) -> VoucherNamespace {
        match self {
            PaymentDirection::Issued => VoucherNamespace::PaymentIssued,
            PaymentDirection::Received => VoucherNamespace::PaymentReceived,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    Cash,
    Online,
    Cheque,
}

impl FromStr for PaymentMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASH" => Ok(PaymentMode::Cash),
            "ONLINE" => Ok(PaymentMode::Online),
            "CHEQUE" | "CHECK" => Ok(PaymentMode::Cheque),
            other => Err(DomainError::validation(format!("unknown payment mode '{other}'"))),
        }
    }
}

/// Independent voucher number sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoucherNamespace {
    PaymentIssued,
    PaymentReceived,
    Expense,
}

impl VoucherNamespace {
    pub fn prefix(self) -> &'static str {
        match self {
            VoucherNamespace::PaymentIssued => "PAY-ISS",
            VoucherNamespace::PaymentReceived => "PAY-REC",
            VoucherNamespace::Expense => "EXP",
        }
    }

    /// Voucher number for sequence position `seq` (1-based).
    pub fn format(self, seq: u64) -> String {
        format!("{}-{seq:06}", self.prefix())
    }
}

/// A voucher number to be resolved inside the posting unit: either the
/// caller's own number or the next one from the namespace sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoucherClaim {
    pub namespace: VoucherNamespace,
    pub requested: Option<String>,
}

impl VoucherClaim {
    pub fn new(namespace: VoucherNamespace, requested: Option<String>) -> Self {
        let requested = requested.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self { namespace, requested }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub direction: PaymentDirection,
    #[serde(default)]
    pub voucher_no: Option<String>,
    pub mode: PaymentMode,
    #[serde(default)]
    pub bank_account_id: Option<AccountId>,
    #[serde(default)]
    pub cheque_no: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    pub payment_date: NaiveDate,
}

impl NewPayment {
    pub fn validate(&self) -> DomainResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "payment amount must be greater than zero (got {})",
                self.amount
            )));
        }
        ensure_within_limit("payment amount", self.amount)?;
        if self.mode == PaymentMode::Online && self.bank_account_id.is_none() {
            return Err(DomainError::validation("online payments require a bank account"));
        }
        Ok(())
    }

    pub fn description(&self) -> String {
        let verb = match self.direction {
            PaymentDirection::Issued => "Payment issued",
            PaymentDirection::Received => "Payment received",
        };
        let mode = match (self.mode, self.cheque_no.as_deref()) {
            (PaymentMode::Cheque, Some(no)) => format!("cheque {no}"),
            (PaymentMode::Cheque, None) => "cheque".to_string(),
            (PaymentMode::Online, _) => "online transfer".to_string(),
            (PaymentMode::Cash, _) => "cash".to_string(),
        };
        match self.remarks.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) => format!("{verb} by {mode}: {r}"),
            None => format!("{verb} by {mode}"),
        }
    }
}

/// A recorded payment voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub voucher_no: String,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub direction: PaymentDirection,
    pub mode: PaymentMode,
    pub bank_account_id: Option<AccountId>,
    pub cheque_no: Option<String>,
    pub remarks: Option<String>,
    pub payment_date: NaiveDate,
    pub transaction_id: TransactionId,
}

impl Payment {
    pub fn from_request(new: NewPayment, voucher_no: String, transaction_id: TransactionId) -> Self {
        Self {
            voucher_no,
            account_id: new.account_id,
            amount: round2(new.amount),
            direction: new.direction,
            mode: new.mode,
            bank_account_id: new.bank_account_id,
            cheque_no: new.cheque_no,
            remarks: new.remarks,
            payment_date: new.payment_date,
            transaction_id,
        }
    }
}

/// Where an expense is booked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ExpenseTarget {
    /// Named cash/bank/expense bucket outside the counterparty chart.
    Bucket(String),
    /// An account of the chart (only OTHER-type accounts are accepted).
    Account(AccountId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    pub target: ExpenseTarget,
    pub amount: Decimal,
    #[serde(default)]
    pub voucher_no: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub expense_date: NaiveDate,
}

impl NewExpense {
    pub fn validate(&self) -> DomainResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "expense amount must be greater than zero (got {})",
                self.amount
            )));
        }
        ensure_within_limit("expense amount", self.amount)?;
        if let ExpenseTarget::Bucket(name) = &self.target {
            if name.trim().is_empty() {
                return Err(DomainError::validation("expense bucket must not be blank"));
            }
        }
        Ok(())
    }

    pub fn description(&self) -> String {
        let base = match &self.target {
            ExpenseTarget::Bucket(name) => format!("Expense: {}", name.trim()),
            ExpenseTarget::Account(_) => "Expense".to_string(),
        };
        match self.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => format!("{base} ({d})"),
            None => base,
        }
    }
}

/// A recorded expense voucher. Always a DEBIT-style outflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub voucher_no: String,
    pub target: ExpenseTarget,
    pub amount: Decimal,
    pub description: String,
    pub expense_date: NaiveDate,
    /// Set when the expense was posted to an account of the chart.
    pub transaction_id: Option<TransactionId>,
}

impl Expense {
    pub fn from_request(
        new: NewExpense,
        voucher_no: String,
        transaction_id: Option<TransactionId>,
    ) -> Self {
        let description = new.description();
        Self {
            voucher_no,
            target: new.target,
            amount: round2(new.amount),
            description,
            expense_date: new.expense_date,
            transaction_id,
        }
    }
}
