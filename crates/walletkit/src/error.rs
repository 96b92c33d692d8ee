//! Error types for the Platform.

use thiserror::Error;

use walletkit_bridge::BridgeError;
use walletkit_core::DistributionError;
use walletkit_ledger::LedgerError;
use walletkit_perms::PermsError;
use walletkit_store::StoreError;

/// Errors that can occur during Platform operations.
///
/// Routine denials (insufficient credits, permission denied) are not
/// errors; they come back as outcome values from the operation that
/// produced them.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Wallet bridge failure.
    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Credit ledger failure.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Permission graph failure.
    #[error("permission error: {0}")]
    Permission(#[from] PermsError),

    /// Revenue distribution rejected its input.
    #[error("distribution error: {0}")]
    Distribution(#[from] DistributionError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for Platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
