//! Error types for the permission graph.

use thiserror::Error;

use walletkit_core::{AppId, TokenId};
use walletkit_store::StoreError;

/// Errors that can occur during permission operations.
///
/// A denied interaction is not an error; it comes back as an
/// [`InteractionOutcome`] variant.
///
/// [`InteractionOutcome`]: crate::graph::InteractionOutcome
#[derive(Debug, Error)]
pub enum PermsError {
    /// Referenced token is unknown, or not owned by the named app.
    #[error("unknown token: {0}")]
    UnknownToken(TokenId),

    /// Referenced app was never registered.
    #[error("unknown app: {0}")]
    UnknownApp(AppId),

    /// Storage backend failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
