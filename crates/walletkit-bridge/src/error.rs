//! Error types for the bridge module.

use thiserror::Error;

/// Errors that can occur during bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The bridge is not connected.
    #[error("bridge not connected")]
    NotConnected,

    /// No response arrived within the call's budget.
    #[error("call timed out after {budget_ms}ms")]
    CallTimeout { budget_ms: u64 },

    /// The connection dropped while the call was pending.
    #[error("connection closed")]
    ConnectionClosed,

    /// The wallet process answered with `success: false`.
    #[error("call rejected by wallet: {0}")]
    Rejected(String),

    /// The wallet process answered with the wrong response type.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Link-level failure while opening or writing.
    #[error("link error: {0}")]
    Link(String),
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
