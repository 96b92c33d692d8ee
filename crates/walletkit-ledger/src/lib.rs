//! # WalletKit Ledger
//!
//! The credit ledger: per-user wallets with prepaid credits and on-chain
//! balances, an append-only entry log, and the static plan catalog.
//!
//! ## Key Types
//!
//! - [`CreditLedger`] - All balance-affecting operations, over any [`Store`]
//! - [`PlanCatalog`] - Subscription plans and one-time credit packages
//! - [`WalletSummary`] - Read-only projection for display
//!
//! ## Design Notes
//!
//! - The ledger is the sole writer of wallet and entry state
//! - Denied deductions are routine outcomes, not errors
//! - Distribution payouts land in the on-chain bucket, not credits
//!
//! [`Store`]: walletkit_store::Store

pub mod catalog;
pub mod error;
pub mod ledger;

pub use catalog::PlanCatalog;
pub use error::{LedgerError, Result};
pub use ledger::{CreditLedger, WalletSummary, SUMMARY_ENTRIES};
