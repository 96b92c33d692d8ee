//! # WalletKit Store
//!
//! Storage abstraction for WalletKit. Provides a trait-based interface for
//! wallet, ledger, and permission graph persistence with SQLite and
//! in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts persistence behind the [`Store`] trait,
//! allowing the ledger and permission graph to be storage-agnostic. The
//! primary implementation is [`SqliteStore`], with [`MemoryStore`] for
//! testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`DebitOutcome`] - Result of an atomic debit attempt
//! - [`MergeOutcome`] / [`RevokeOutcome`] - Results of edge mutations
//!
//! ## Design Notes
//!
//! - **Atomic mutations**: check-then-act sequences run under the backend's
//!   own lock, so concurrent callers serialize
//! - **Routine outcomes as values**: insufficient funds and missing edges
//!   are outcome enum variants, not errors
//! - **Append-only entries**: ledger entries are never updated or deleted

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{DebitOutcome, MergeOutcome, RevokeOutcome, Store};
