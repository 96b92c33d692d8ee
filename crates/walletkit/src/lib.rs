//! # WalletKit
//!
//! The unified API for the WalletKit platform - prepaid credits, revenue
//! distribution, cross-app permissions, and the external wallet bridge.
//!
//! ## Overview
//!
//! WalletKit provides a portable, embeddable library for:
//!
//! - **Credit Ledger**: Per-user wallets with append-only entries; balances
//!   are the running effect of the entry log
//! - **Revenue Distribution**: Royalty-first, pro-rata splitting of asset
//!   revenue across stakeholders
//! - **Permission Graph**: Capability-scoped access between apps over
//!   tokens they do not own
//! - **Bridge Transport**: Correlated request/response calls to an
//!   external self-custodied wallet
//!
//! ## Key Concepts
//!
//! - **LedgerEntry**: Immutable. Never edited. Corrections are new
//!   offsetting entries.
//! - **Credits vs on-chain**: prepaid credits and settled on-chain value
//!   are separate buckets that never mix implicitly.
//! - **Outcome, not error**: insufficient credits and permission denials
//!   are ordinary return values.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use walletkit::{Platform, PlatformConfig};
//! use walletkit::bridge::MockWalletLink;
//! use walletkit::core::{CostedOperation, TokenProtocol, UserId};
//! use walletkit::store::SqliteStore;
//!
//! async fn example() {
//!     // Open storage
//!     let store = SqliteStore::open("walletkit.db").unwrap();
//!
//!     // Create the platform with a mock wallet link
//!     let platform = Platform::new(store, MockWalletLink::new(), PlatformConfig::default());
//!
//!     // Top up and spend credits
//!     let user = UserId::from("alice");
//!     platform.ledger().add_credits(&user, "1".parse().unwrap(), "top-up").await.unwrap();
//!     let outcome = platform
//!         .unlock_asset(&user, "track-42", &CostedOperation::Tokenize { protocol: TokenProtocol::Stas })
//!         .await
//!         .unwrap();
//!     println!("{outcome:?}");
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `walletkit::core` - Core primitives (ids, money, distribution)
//! - `walletkit::store` - Storage abstraction, memory and SQLite backends
//! - `walletkit::bridge` - Wallet bridge transport
//! - `walletkit::ledger` - Credit ledger and plan catalog
//! - `walletkit::perms` - Permission graph

pub mod error;
pub mod platform;

// Re-export component crates
pub use walletkit_bridge as bridge;
pub use walletkit_core as core;
pub use walletkit_ledger as ledger;
pub use walletkit_perms as perms;
pub use walletkit_store as store;

// Re-export main types for convenience
pub use error::{PlatformError, Result};
pub use platform::{
    Platform, PlatformConfig, RevenueEvent, SendOutcome, SettlementReport, UnlockOutcome,
};

// Re-export commonly used core types
pub use walletkit_core::{
    AppId, Capability, CostedOperation, DistributionPlan, DistributionRequest, LedgerEntry,
    PlanId, TokenId, TokenProtocol, UserId, Wallet, WalletId,
};
