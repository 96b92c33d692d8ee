//! Error types for the ledger module.

use rust_decimal::Decimal;
use thiserror::Error;

use walletkit_core::PlanId;
use walletkit_store::StoreError;

/// Errors that can occur during ledger operations.
///
/// Insufficient credits is deliberately not here: a denied deduction is a
/// routine outcome and comes back as a [`walletkit_store::DebitOutcome`]
/// variant instead.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Non-positive amount passed to a balance-affecting operation.
    #[error("invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    /// Referenced plan is not in the catalog.
    #[error("unknown plan: {0}")]
    UnknownPlan(PlanId),

    /// Referenced credit package is not in the catalog.
    #[error("unknown credit package: {0}")]
    UnknownPackage(String),

    /// The wallet has been deactivated; only read operations are allowed.
    #[error("wallet is deactivated")]
    WalletDeactivated,

    /// Storage backend failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
