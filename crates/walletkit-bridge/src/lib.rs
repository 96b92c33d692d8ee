//! # WalletKit Bridge
//!
//! The bridge to the external wallet process: a persistent, unreliable
//! duplex connection turned into awaitable, timeout-bounded remote calls
//! plus a fan-out stream for unsolicited events.
//!
//! ## Overview
//!
//! [`BridgeTransport`] owns the single connection and the in-flight call
//! table. A [`WalletLink`] supplies the connection itself; when no real
//! wallet process is present, [`MockWalletLink`] answers every request
//! with deterministic, artificially-delayed results so dependent code is
//! agnostic to which one is in play.
//!
//! ## Key Types
//!
//! - [`BridgeTransport`] - Correlated calls, timeouts, and event fan-out
//! - [`WireMessage`] - Tagged JSON messages exchanged with the wallet
//! - [`WalletLink`] / [`MockWalletLink`] - Connection factories
//! - [`RequestId`] - Correlation identifier per call
//!
//! ## Failure Semantics
//!
//! - An unmatched response is logged and dropped, never misapplied
//! - A malformed inbound payload is logged and dropped
//! - A connection drop fails every pending call exactly once
//! - Timeouts remove the in-flight entry, so a late response is dropped

pub mod error;
pub mod link;
pub mod messages;
pub mod transport;

pub use error::{BridgeError, Result};
pub use link::{
    link_pair, ChannelWalletLink, LinkHandle, LinkRemote, MockWalletLink, UnavailableWalletLink,
    WalletLink,
};
pub use messages::{RequestId, WireMessage};
pub use transport::{
    BridgeTransport, EventHandler, HandlerId, LinkState, WalletInfo, AUTHENTICATE_BUDGET,
    CONNECT_TIMEOUT, GET_WALLET_BUDGET, SEND_TRANSACTION_BUDGET, SIGN_MESSAGE_BUDGET,
};
