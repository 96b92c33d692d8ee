//! # WalletKit Core
//!
//! Pure primitives for WalletKit: identifiers, the wallet and ledger entry
//! model, subscription plan shapes, cost estimation, and the revenue
//! distribution engine.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over platform data structures.
//!
//! ## Key Types
//!
//! - [`Wallet`] - A user's wallet with credit and on-chain balance buckets
//! - [`LedgerEntry`] - The immutable record of a single balance change
//! - [`WalletId`] - Identifier derived from `(owner, kind)` via Blake3
//! - [`DistributionRequest`] / [`DistributionPlan`] - Revenue splitting
//!
//! ## Money
//!
//! All amounts are [`rust_decimal::Decimal`] in the base asset. The
//! distribution engine truncates toward zero at 8 decimal places so a
//! split can never pay out more than its input.

pub mod cost;
pub mod distribution;
pub mod error;
pub mod graph;
pub mod plan;
pub mod types;
pub mod wallet;

pub use cost::{estimate_cost, CostedOperation, TokenProtocol};
pub use distribution::{distribute, DistributionPlan, DistributionRequest, Payout, PayoutReason};
pub use error::DistributionError;
pub use graph::{AppRecord, Capability, PermissionEdge, TokenRecord};
pub use plan::{CreditPackage, PlanLimits, SubscriptionPlan};
pub use types::{AppId, EntryId, PlanId, TokenId, UserId, WalletId};
pub use wallet::{BalanceBucket, EntryKind, LedgerEntry, Wallet, WalletKind};

/// Current time in Unix milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
