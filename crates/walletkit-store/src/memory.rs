//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use walletkit_core::{
    AppId, AppRecord, BalanceBucket, Capability, LedgerEntry, PermissionEdge, TokenId,
    TokenRecord, UserId, Wallet, WalletId, WalletKind,
};

use crate::error::{Result, StoreError};
use crate::traits::{DebitOutcome, MergeOutcome, RevokeOutcome, Store};

type EdgeKey = (AppId, AppId, TokenId);

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock;
/// the write lock makes every mutating method a single critical section.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Wallets indexed by derived id.
    wallets: HashMap<WalletId, Wallet>,

    /// Append-ordered ledger entries per wallet.
    entries: HashMap<WalletId, Vec<LedgerEntry>>,

    /// Registered apps.
    apps: HashMap<AppId, AppRecord>,

    /// Known tokens.
    tokens: HashMap<TokenId, TokenRecord>,

    /// Permission edges keyed by (from, to, token).
    edges: HashMap<EdgeKey, PermissionEdge>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_wallet(&self, id: &WalletId) -> Result<Option<Wallet>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.wallets.get(id).cloned())
    }

    async fn get_or_create_wallet(
        &self,
        owner: &UserId,
        kind: WalletKind,
        now: i64,
    ) -> Result<Wallet> {
        let mut inner = self.inner.write().unwrap();
        let id = WalletId::derive(owner, kind);
        let wallet = inner
            .wallets
            .entry(id)
            .or_insert_with(|| Wallet::new(owner.clone(), kind, now));
        Ok(wallet.clone())
    }

    async fn set_wallet_active(&self, id: &WalletId, active: bool) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        match inner.wallets.get_mut(id) {
            Some(wallet) => {
                wallet.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn apply_entry(&self, entry: &LedgerEntry) -> Result<()> {
        if entry.kind.is_deduction() {
            return Err(StoreError::InvalidData(
                "debit entries must go through apply_debit".into(),
            ));
        }

        let mut inner = self.inner.write().unwrap();
        let wallet = inner
            .wallets
            .get_mut(&entry.wallet_id)
            .ok_or_else(|| StoreError::NotFound(format!("wallet {}", entry.wallet_id)))?;

        match entry.kind.bucket() {
            BalanceBucket::Credits => wallet.credits += entry.amount,
            BalanceBucket::OnChain => wallet.on_chain_balance += entry.amount,
        }
        wallet.last_activity_at = entry.timestamp;

        inner
            .entries
            .entry(entry.wallet_id)
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn apply_debit(&self, entry: &LedgerEntry) -> Result<DebitOutcome> {
        if !entry.kind.is_deduction() {
            return Err(StoreError::InvalidData(
                "apply_debit requires a debit entry".into(),
            ));
        }

        let mut inner = self.inner.write().unwrap();
        let wallet = inner
            .wallets
            .get_mut(&entry.wallet_id)
            .ok_or_else(|| StoreError::NotFound(format!("wallet {}", entry.wallet_id)))?;

        if !wallet.active {
            return Ok(DebitOutcome::Inactive);
        }
        if wallet.credits < entry.amount {
            return Ok(DebitOutcome::InsufficientCredits {
                available: wallet.credits,
            });
        }

        wallet.credits -= entry.amount;
        wallet.last_activity_at = entry.timestamp;
        let remaining = wallet.credits;

        inner
            .entries
            .entry(entry.wallet_id)
            .or_default()
            .push(entry.clone());
        Ok(DebitOutcome::Applied { remaining })
    }

    async fn recent_entries(&self, wallet_id: &WalletId, limit: usize) -> Result<Vec<LedgerEntry>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .entries
            .get(wallet_id)
            .map(|entries| entries.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn entry_count(&self, wallet_id: &WalletId) -> Result<u64> {
        let inner = self.inner.read().unwrap();
        Ok(inner.entries.get(wallet_id).map_or(0, |e| e.len() as u64))
    }

    async fn put_app(&self, app: &AppRecord) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.apps.insert(app.id.clone(), app.clone());
        Ok(())
    }

    async fn get_app(&self, id: &AppId) -> Result<Option<AppRecord>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.apps.get(id).cloned())
    }

    async fn list_apps(&self) -> Result<Vec<AppRecord>> {
        let inner = self.inner.read().unwrap();
        let mut apps: Vec<AppRecord> = inner.apps.values().cloned().collect();
        apps.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(apps)
    }

    async fn put_token(&self, token: &TokenRecord) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.tokens.insert(token.id.clone(), token.clone());
        Ok(())
    }

    async fn get_token(&self, id: &TokenId) -> Result<Option<TokenRecord>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.tokens.get(id).cloned())
    }

    async fn list_tokens(&self) -> Result<Vec<TokenRecord>> {
        let inner = self.inner.read().unwrap();
        let mut tokens: Vec<TokenRecord> = inner.tokens.values().cloned().collect();
        tokens.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tokens)
    }

    async fn merge_edge(&self, edge: &PermissionEdge) -> Result<MergeOutcome> {
        let mut inner = self.inner.write().unwrap();
        let key = (edge.from.clone(), edge.to.clone(), edge.token.clone());

        match inner.edges.get_mut(&key) {
            Some(existing) => {
                let before = existing.capabilities.len();
                existing.capabilities.extend(edge.capabilities.iter().copied());
                if edge.purpose.is_some() {
                    existing.purpose = edge.purpose.clone();
                }
                if existing.capabilities.len() > before {
                    existing.updated_at = edge.updated_at;
                    Ok(MergeOutcome::Extended)
                } else {
                    Ok(MergeOutcome::Unchanged)
                }
            }
            None => {
                inner.edges.insert(key, edge.clone());
                Ok(MergeOutcome::Created)
            }
        }
    }

    async fn get_edge(
        &self,
        from: &AppId,
        to: &AppId,
        token: &TokenId,
    ) -> Result<Option<PermissionEdge>> {
        let inner = self.inner.read().unwrap();
        let key = (from.clone(), to.clone(), token.clone());
        Ok(inner.edges.get(&key).cloned())
    }

    async fn edges_into(&self, to: &AppId) -> Result<Vec<PermissionEdge>> {
        let inner = self.inner.read().unwrap();
        let mut edges: Vec<PermissionEdge> = inner
            .edges
            .values()
            .filter(|e| &e.to == to)
            .cloned()
            .collect();
        edges.sort_by(|a, b| (&a.from, &a.token).cmp(&(&b.from, &b.token)));
        Ok(edges)
    }

    async fn list_edges(&self) -> Result<Vec<PermissionEdge>> {
        let inner = self.inner.read().unwrap();
        let mut edges: Vec<PermissionEdge> = inner.edges.values().cloned().collect();
        edges.sort_by(|a, b| (&a.from, &a.to, &a.token).cmp(&(&b.from, &b.to, &b.token)));
        Ok(edges)
    }

    async fn remove_edge(&self, from: &AppId, to: &AppId, token: &TokenId) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        let key = (from.clone(), to.clone(), token.clone());
        Ok(inner.edges.remove(&key).is_some())
    }

    async fn remove_capabilities(
        &self,
        from: &AppId,
        to: &AppId,
        token: &TokenId,
        capabilities: &BTreeSet<Capability>,
    ) -> Result<RevokeOutcome> {
        let mut inner = self.inner.write().unwrap();
        let key = (from.clone(), to.clone(), token.clone());

        let Some(edge) = inner.edges.get_mut(&key) else {
            return Ok(RevokeOutcome::NotFound);
        };

        for cap in capabilities {
            edge.capabilities.remove(cap);
        }
        if edge.capabilities.is_empty() {
            inner.edges.remove(&key);
            Ok(RevokeOutcome::Removed)
        } else {
            Ok(RevokeOutcome::Narrowed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use walletkit_core::EntryKind;

    async fn funded_wallet(store: &MemoryStore, owner: &str, credits: rust_decimal::Decimal) -> Wallet {
        let owner = UserId::from(owner);
        let wallet = store
            .get_or_create_wallet(&owner, WalletKind::SelfCustodied, 1_000)
            .await
            .unwrap();
        let entry = LedgerEntry::new(wallet.id, EntryKind::Credit, credits, "seed", 1_001);
        store.apply_entry(&entry).await.unwrap();
        store.get_wallet(&wallet.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = MemoryStore::new();
        let owner = UserId::from("alice");
        let a = store
            .get_or_create_wallet(&owner, WalletKind::SelfCustodied, 10)
            .await
            .unwrap();
        let b = store
            .get_or_create_wallet(&owner, WalletKind::SelfCustodied, 99)
            .await
            .unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.created_at, 10);
    }

    #[tokio::test]
    async fn test_debit_respects_balance() {
        let store = MemoryStore::new();
        let wallet = funded_wallet(&store, "alice", dec!(1)).await;

        let debit = LedgerEntry::new(wallet.id, EntryKind::Debit, dec!(0.4), "op", 1_002);
        let outcome = store.apply_debit(&debit).await.unwrap();
        assert_eq!(outcome, DebitOutcome::Applied { remaining: dec!(0.6) });

        let too_big = LedgerEntry::new(wallet.id, EntryKind::Debit, dec!(2), "op", 1_003);
        let outcome = store.apply_debit(&too_big).await.unwrap();
        assert_eq!(
            outcome,
            DebitOutcome::InsufficientCredits { available: dec!(0.6) }
        );
        assert_eq!(store.entry_count(&wallet.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_debit_on_inactive_wallet() {
        let store = MemoryStore::new();
        let wallet = funded_wallet(&store, "alice", dec!(5)).await;
        store.set_wallet_active(&wallet.id, false).await.unwrap();

        let debit = LedgerEntry::new(wallet.id, EntryKind::Debit, dec!(1), "op", 1_002);
        assert_eq!(store.apply_debit(&debit).await.unwrap(), DebitOutcome::Inactive);
    }

    #[tokio::test]
    async fn test_recent_entries_newest_first() {
        let store = MemoryStore::new();
        let wallet = funded_wallet(&store, "alice", dec!(1)).await;
        for i in 0..5 {
            let entry =
                LedgerEntry::new(wallet.id, EntryKind::Revenue, dec!(0.1), format!("r{i}"), 2_000 + i);
            store.apply_entry(&entry).await.unwrap();
        }

        let recent = store.recent_entries(&wallet.id, 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].description, "r4");
        assert_eq!(recent[2].description, "r2");
    }

    #[tokio::test]
    async fn test_merge_edge_outcomes() {
        let store = MemoryStore::new();
        let edge = PermissionEdge::single(
            AppId::from("music"),
            AppId::from("games"),
            TokenId::from("track-1"),
            Capability::Read,
            10,
        );

        assert_eq!(store.merge_edge(&edge).await.unwrap(), MergeOutcome::Created);
        assert_eq!(store.merge_edge(&edge).await.unwrap(), MergeOutcome::Unchanged);

        let mut wider = edge.clone();
        wider.capabilities.insert(Capability::Interact);
        wider.updated_at = 20;
        assert_eq!(store.merge_edge(&wider).await.unwrap(), MergeOutcome::Extended);

        let stored = store
            .get_edge(&edge.from, &edge.to, &edge.token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.granted_at, 10);
        assert_eq!(stored.updated_at, 20);
        assert!(stored.allows(Capability::Interact));
    }

    #[tokio::test]
    async fn test_capability_scoped_revoke() {
        let store = MemoryStore::new();
        let mut edge = PermissionEdge::single(
            AppId::from("music"),
            AppId::from("games"),
            TokenId::from("track-1"),
            Capability::Read,
            10,
        );
        edge.capabilities.insert(Capability::Interact);
        store.merge_edge(&edge).await.unwrap();

        let outcome = store
            .remove_capabilities(
                &edge.from,
                &edge.to,
                &edge.token,
                &BTreeSet::from([Capability::Interact]),
            )
            .await
            .unwrap();
        assert_eq!(outcome, RevokeOutcome::Narrowed);

        let outcome = store
            .remove_capabilities(
                &edge.from,
                &edge.to,
                &edge.token,
                &BTreeSet::from([Capability::Read]),
            )
            .await
            .unwrap();
        assert_eq!(outcome, RevokeOutcome::Removed);
        assert!(store
            .get_edge(&edge.from, &edge.to, &edge.token)
            .await
            .unwrap()
            .is_none());
    }
}
