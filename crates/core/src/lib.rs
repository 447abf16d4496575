//! `millerp-core`: domain foundation building blocks for the mill ledger.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod money;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AccountId, PricingId, TransactionId};
pub use money::{
    checked_amount, checked_sum, ensure_within_limit, parse_amount, round2, MAX_AMOUNT,
};
