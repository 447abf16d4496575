//! Ledger services over a pluggable `LedgerStore`: chart of accounts, pending
//! queue, posting engine, transaction ledger, balances and vouchers.

pub mod balances;
pub mod chart;
pub mod ledger;
pub mod payments;
pub mod pending_queue;
pub mod posting;
pub mod store;

mod integration_tests;

pub use balances::{AccountStatement, BalanceAggregator, BalanceSummary, StatementLine};
pub use chart::{ChartOfAccounts, STANDARD_HEADS};
pub use ledger::{DuplicateCleanupReport, DuplicateGroup, TransactionLedger, plan_duplicate_cleanup};
pub use payments::{ExpenseReceipt, PaymentReceipt, PaymentRecorder};
pub use pending_queue::{PendingEntryQueue, PendingListing};
pub use posting::{PostPendingEntry, PostingEngine};
pub use store::{
    Committed, InMemoryLedgerStore, LedgerStore, PostgresLedgerStore, PostingUnit,
};
