//! Ledger persistence boundary.
//!
//! Services talk to a `LedgerStore`; the store owns the atomic posting unit
//! (transaction insert + balance update + pending status flip) so no service
//! can observe or produce a partial posting.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use r#trait::{Committed, LedgerStore, PostingUnit};
