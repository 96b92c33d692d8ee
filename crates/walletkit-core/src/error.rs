//! Error types for WalletKit core computations.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from the revenue distribution engine.
#[derive(Debug, Error)]
pub enum DistributionError {
    #[error("invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("royalty percent out of range: {percent}")]
    InvalidRoyalty { percent: Decimal },

    #[error("share table is empty")]
    NoShares,
}
