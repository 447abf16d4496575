//! Accounting module: chart of accounts, pending entries, postings and
//! balances of the mill ledger.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod account;
pub mod balance;
pub mod pending;
pub mod posting;
pub mod transaction;
pub mod voucher;

pub use account::{
    Account, AccountLevel, AccountType, AccountUpdate, BalanceType, ContactInfo, NewAccount,
};
pub use balance::{signed_amount, BalanceDisplay, BalanceLabel, OpeningBalance};
pub use pending::{NewPendingEntry, PendingCategory, PendingEntry, PendingEntryType, PendingStatus};
pub use posting::{PriceInput, PricedEntry};
pub use transaction::{EntryType, ItemLine, Transaction};
pub use voucher::{
    Expense, ExpenseTarget, NewExpense, NewPayment, Payment, PaymentDirection, PaymentMode,
    VoucherClaim, VoucherNamespace,
};
