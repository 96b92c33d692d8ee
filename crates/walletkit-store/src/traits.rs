//! Store trait: the abstract interface for wallet, ledger, and graph
//! persistence.
//!
//! This trait allows the platform to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use std::collections::BTreeSet;

use async_trait::async_trait;
use rust_decimal::Decimal;

use walletkit_core::{
    AppId, AppRecord, Capability, LedgerEntry, PermissionEdge, TokenId, TokenRecord, UserId,
    Wallet, WalletId, WalletKind,
};

use crate::error::Result;

/// Result of an atomic debit attempt.
///
/// Insufficient funds and inactive wallets are routine outcomes, not
/// errors; the caller decides how to surface them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebitOutcome {
    /// The debit was applied. Carries the remaining credit balance.
    Applied { remaining: Decimal },
    /// The wallet's credits were below the requested amount. Nothing
    /// was written.
    InsufficientCredits { available: Decimal },
    /// The wallet is deactivated. Nothing was written.
    Inactive,
}

/// Result of merging a permission edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No edge existed for the triple; one was created.
    Created,
    /// An edge existed and gained at least one new capability.
    Extended,
    /// An edge existed and already carried every requested capability.
    Unchanged,
}

/// Result of a capability-scoped revoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The last capabilities were removed and the edge deleted.
    Removed,
    /// Some capabilities were removed but the edge survives.
    Narrowed,
    /// No edge existed for the triple.
    NotFound,
}

/// The Store trait: async interface for platform persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
///
/// # Design Notes
///
/// - **Atomic mutations**: check-then-act sequences (`apply_debit`,
///   `merge_edge`, `remove_capabilities`) execute under the backend's own
///   lock, so concurrent callers cannot interleave between the check and
///   the write.
/// - **Routine outcomes as values**: insufficient funds, missing edges and
///   already-granted capabilities come back as outcome enums, not errors.
/// - **Append-only entries**: ledger entries are never updated or deleted.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Wallet Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a wallet by id.
    async fn get_wallet(&self, id: &WalletId) -> Result<Option<Wallet>>;

    /// Get the wallet for `(owner, kind)`, creating an empty one if absent.
    async fn get_or_create_wallet(
        &self,
        owner: &UserId,
        kind: WalletKind,
        now: i64,
    ) -> Result<Wallet>;

    /// Activate or deactivate a wallet.
    ///
    /// Returns `false` if the wallet does not exist.
    async fn set_wallet_active(&self, id: &WalletId, active: bool) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Ledger Entry Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a non-debit entry and apply its balance effect.
    ///
    /// Credit entries increase `credits`; revenue and distribution entries
    /// increase `on_chain_balance`. `last_activity_at` is set to the entry
    /// timestamp. Fails with `InvalidData` for debit entries (use
    /// [`Store::apply_debit`]) and `NotFound` for unknown wallets.
    async fn apply_entry(&self, entry: &LedgerEntry) -> Result<()>;

    /// Atomically check credits and apply a debit entry.
    ///
    /// The balance check, the append and the decrement happen as one unit;
    /// on `InsufficientCredits` or `Inactive` nothing is written.
    async fn apply_debit(&self, entry: &LedgerEntry) -> Result<DebitOutcome>;

    /// Most recent entries for a wallet, newest first.
    async fn recent_entries(&self, wallet_id: &WalletId, limit: usize) -> Result<Vec<LedgerEntry>>;

    /// Total number of entries for a wallet.
    async fn entry_count(&self, wallet_id: &WalletId) -> Result<u64>;

    // ─────────────────────────────────────────────────────────────────────────
    // App & Token Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or replace an app record.
    async fn put_app(&self, app: &AppRecord) -> Result<()>;

    /// Get an app record by id.
    async fn get_app(&self, id: &AppId) -> Result<Option<AppRecord>>;

    /// List all registered apps, ordered by id.
    async fn list_apps(&self) -> Result<Vec<AppRecord>>;

    /// Insert or replace a token record.
    async fn put_token(&self, token: &TokenRecord) -> Result<()>;

    /// Get a token record by id.
    async fn get_token(&self, id: &TokenId) -> Result<Option<TokenRecord>>;

    /// List all known tokens, ordered by id.
    async fn list_tokens(&self) -> Result<Vec<TokenRecord>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Permission Edge Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Merge an edge into the graph.
    ///
    /// If no edge exists for `(from, to, token)` the edge is inserted as
    /// given. Otherwise the existing edge absorbs the new capabilities and
    /// purpose, and `updated_at` advances only when the capability set
    /// actually grew.
    async fn merge_edge(&self, edge: &PermissionEdge) -> Result<MergeOutcome>;

    /// Get the edge for a `(from, to, token)` triple.
    async fn get_edge(
        &self,
        from: &AppId,
        to: &AppId,
        token: &TokenId,
    ) -> Result<Option<PermissionEdge>>;

    /// All edges granting access to `to`.
    async fn edges_into(&self, to: &AppId) -> Result<Vec<PermissionEdge>>;

    /// Every edge in the graph.
    async fn list_edges(&self) -> Result<Vec<PermissionEdge>>;

    /// Delete the edge for a triple. Returns `false` if absent.
    async fn remove_edge(&self, from: &AppId, to: &AppId, token: &TokenId) -> Result<bool>;

    /// Remove specific capabilities from an edge, deleting the edge when
    /// its capability set becomes empty.
    async fn remove_capabilities(
        &self,
        from: &AppId,
        to: &AppId,
        token: &TokenId,
        capabilities: &BTreeSet<Capability>,
    ) -> Result<RevokeOutcome>;
}
