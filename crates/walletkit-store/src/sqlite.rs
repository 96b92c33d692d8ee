//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for WalletKit. It uses rusqlite
//! with bundled SQLite behind a mutex; each trait method takes the lock
//! once, so check-then-act sequences are naturally serialized.
//!
//! Decimals are stored as text to keep them exact; balances are updated
//! in the same transaction as the entry insert.

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use walletkit_core::{
    AppId, AppRecord, BalanceBucket, Capability, EntryId, EntryKind, LedgerEntry, PermissionEdge,
    TokenId, TokenProtocol, TokenRecord, UserId, Wallet, WalletId, WalletKind,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{DebitOutcome, MergeOutcome, RevokeOutcome, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute a blocking operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                Some(format!("mutex poisoned: {}", e)),
            ))
        })?;
        f(&conn)
    }

    /// Execute a blocking operation that needs mutable access.
    fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                Some(format!("mutex poisoned: {}", e)),
            ))
        })?;
        f(&mut conn)
    }
}

fn blob_column_error(name: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(0, name.into(), rusqlite::types::Type::Blob)
}

fn text_column_error(name: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(0, name.into(), rusqlite::types::Type::Text)
}

fn id16(bytes: Vec<u8>, name: &str) -> rusqlite::Result<[u8; 16]> {
    bytes.try_into().map_err(|_| blob_column_error(name))
}

fn parse_decimal(s: &str, name: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(s).map_err(|_| text_column_error(name))
}

// Helper to convert a row to Wallet
fn row_to_wallet(row: &rusqlite::Row<'_>) -> rusqlite::Result<Wallet> {
    let id_bytes: Vec<u8> = row.get("wallet_id")?;
    let owner: String = row.get("owner")?;
    let kind: u8 = row.get("kind")?;
    let on_chain: String = row.get("on_chain_balance")?;
    let credits: String = row.get("credits")?;

    let kind = match kind {
        0 => WalletKind::SelfCustodied,
        1 => WalletKind::ExternallyLinked,
        _ => return Err(text_column_error("kind")),
    };

    Ok(Wallet {
        id: WalletId::from_bytes(id16(id_bytes, "wallet_id")?),
        owner: UserId::from(owner),
        kind,
        on_chain_balance: parse_decimal(&on_chain, "on_chain_balance")?,
        credits: parse_decimal(&credits, "credits")?,
        active: row.get("active")?,
        created_at: row.get("created_at")?,
        last_activity_at: row.get("last_activity_at")?,
    })
}

// Helper to convert a row to LedgerEntry
fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let entry_id: Vec<u8> = row.get("entry_id")?;
    let wallet_id: Vec<u8> = row.get("wallet_id")?;
    let kind: u8 = row.get("kind")?;
    let amount: String = row.get("amount")?;
    let metadata: Option<String> = row.get("metadata")?;

    Ok(LedgerEntry {
        id: EntryId::from_bytes(id16(entry_id, "entry_id")?),
        wallet_id: WalletId::from_bytes(id16(wallet_id, "wallet_id")?),
        kind: EntryKind::from_u8(kind).ok_or_else(|| text_column_error("kind"))?,
        amount: parse_decimal(&amount, "amount")?,
        description: row.get("description")?,
        metadata: metadata
            .map(|m| serde_json::from_str(&m).map_err(|_| text_column_error("metadata")))
            .transpose()?,
        timestamp: row.get("timestamp")?,
    })
}

// Helper to convert a row to PermissionEdge
fn row_to_edge(row: &rusqlite::Row<'_>) -> rusqlite::Result<PermissionEdge> {
    let from: String = row.get("from_app")?;
    let to: String = row.get("to_app")?;
    let token: String = row.get("token_id")?;
    let capabilities: String = row.get("capabilities")?;

    Ok(PermissionEdge {
        from: AppId::from(from),
        to: AppId::from(to),
        token: TokenId::from(token),
        capabilities: serde_json::from_str(&capabilities)
            .map_err(|_| text_column_error("capabilities"))?,
        purpose: row.get("purpose")?,
        granted_at: row.get("granted_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn row_to_token(row: &rusqlite::Row<'_>) -> rusqlite::Result<TokenRecord> {
    let id: String = row.get("token_id")?;
    let owner: String = row.get("owner_app")?;
    let protocol: String = row.get("protocol")?;

    Ok(TokenRecord {
        id: TokenId::from(id),
        owner: AppId::from(owner),
        name: row.get("name")?,
        protocol: serde_json::from_str::<TokenProtocol>(&protocol)
            .map_err(|_| text_column_error("protocol"))?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_app(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppRecord> {
    let id: String = row.get("app_id")?;
    Ok(AppRecord {
        id: AppId::from(id),
        name: row.get("name")?,
        registered_at: row.get("registered_at")?,
    })
}

fn insert_entry(conn: &Connection, entry: &LedgerEntry) -> Result<()> {
    let metadata = entry
        .metadata
        .as_ref()
        .map(|m| serde_json::to_string(m))
        .transpose()
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    conn.execute(
        "INSERT INTO ledger_entries
         (entry_id, wallet_id, kind, amount, description, metadata, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.id.as_bytes().as_slice(),
            entry.wallet_id.as_bytes().as_slice(),
            entry.kind as u8,
            entry.amount.to_string(),
            entry.description,
            metadata,
            entry.timestamp,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_wallet(&self, id: &WalletId) -> Result<Option<Wallet>> {
        let id = *id;
        self.with_conn(|conn| {
            let wallet = conn
                .query_row(
                    "SELECT * FROM wallets WHERE wallet_id = ?1",
                    params![id.as_bytes().as_slice()],
                    row_to_wallet,
                )
                .optional()?;
            Ok(wallet)
        })
    }

    async fn get_or_create_wallet(
        &self,
        owner: &UserId,
        kind: WalletKind,
        now: i64,
    ) -> Result<Wallet> {
        let owner = owner.clone();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let id = WalletId::derive(&owner, kind);

            let existing = tx
                .query_row(
                    "SELECT * FROM wallets WHERE wallet_id = ?1",
                    params![id.as_bytes().as_slice()],
                    row_to_wallet,
                )
                .optional()?;

            if let Some(wallet) = existing {
                tx.commit()?;
                return Ok(wallet);
            }

            let wallet = Wallet::new(owner.clone(), kind, now);
            tx.execute(
                "INSERT INTO wallets
                 (wallet_id, owner, kind, on_chain_balance, credits, active,
                  created_at, last_activity_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    wallet.id.as_bytes().as_slice(),
                    wallet.owner.as_str(),
                    wallet.kind as u8,
                    wallet.on_chain_balance.to_string(),
                    wallet.credits.to_string(),
                    wallet.active,
                    wallet.created_at,
                    wallet.last_activity_at,
                ],
            )?;
            tx.commit()?;
            Ok(wallet)
        })
    }

    async fn set_wallet_active(&self, id: &WalletId, active: bool) -> Result<bool> {
        let id = *id;
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE wallets SET active = ?1 WHERE wallet_id = ?2",
                params![active, id.as_bytes().as_slice()],
            )?;
            Ok(changed > 0)
        })
    }

    async fn apply_entry(&self, entry: &LedgerEntry) -> Result<()> {
        if entry.kind.is_deduction() {
            return Err(StoreError::InvalidData(
                "debit entries must go through apply_debit".into(),
            ));
        }
        let entry = entry.clone();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let column = match entry.kind.bucket() {
                BalanceBucket::Credits => "credits",
                BalanceBucket::OnChain => "on_chain_balance",
            };
            let balance: Option<String> = tx
                .query_row(
                    &format!("SELECT {column} FROM wallets WHERE wallet_id = ?1"),
                    params![entry.wallet_id.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            let balance = balance
                .ok_or_else(|| StoreError::NotFound(format!("wallet {}", entry.wallet_id)))?;
            let balance = Decimal::from_str(&balance)
                .map_err(|e| StoreError::InvalidData(format!("stored balance: {e}")))?;

            tx.execute(
                &format!(
                    "UPDATE wallets SET {column} = ?1, last_activity_at = ?2 WHERE wallet_id = ?3"
                ),
                params![
                    (balance + entry.amount).to_string(),
                    entry.timestamp,
                    entry.wallet_id.as_bytes().as_slice(),
                ],
            )?;
            insert_entry(&tx, &entry)?;
            tx.commit()?;
            Ok(())
        })
    }

    async fn apply_debit(&self, entry: &LedgerEntry) -> Result<DebitOutcome> {
        if !entry.kind.is_deduction() {
            return Err(StoreError::InvalidData(
                "apply_debit requires a debit entry".into(),
            ));
        }
        let entry = entry.clone();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let row: Option<(String, bool)> = tx
                .query_row(
                    "SELECT credits, active FROM wallets WHERE wallet_id = ?1",
                    params![entry.wallet_id.as_bytes().as_slice()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let (credits, active) =
                row.ok_or_else(|| StoreError::NotFound(format!("wallet {}", entry.wallet_id)))?;
            let credits = Decimal::from_str(&credits)
                .map_err(|e| StoreError::InvalidData(format!("stored balance: {e}")))?;

            if !active {
                return Ok(DebitOutcome::Inactive);
            }
            if credits < entry.amount {
                return Ok(DebitOutcome::InsufficientCredits { available: credits });
            }

            let remaining = credits - entry.amount;
            tx.execute(
                "UPDATE wallets SET credits = ?1, last_activity_at = ?2 WHERE wallet_id = ?3",
                params![
                    remaining.to_string(),
                    entry.timestamp,
                    entry.wallet_id.as_bytes().as_slice(),
                ],
            )?;
            insert_entry(&tx, &entry)?;
            tx.commit()?;
            Ok(DebitOutcome::Applied { remaining })
        })
    }

    async fn recent_entries(&self, wallet_id: &WalletId, limit: usize) -> Result<Vec<LedgerEntry>> {
        let wallet_id = *wallet_id;
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM ledger_entries WHERE wallet_id = ?1
                 ORDER BY rowid DESC LIMIT ?2",
            )?;
            let entries = stmt
                .query_map(
                    params![wallet_id.as_bytes().as_slice(), limit as i64],
                    row_to_entry,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
    }

    async fn entry_count(&self, wallet_id: &WalletId) -> Result<u64> {
        let wallet_id = *wallet_id;
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM ledger_entries WHERE wallet_id = ?1",
                params![wallet_id.as_bytes().as_slice()],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    async fn put_app(&self, app: &AppRecord) -> Result<()> {
        let app = app.clone();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO apps (app_id, name, registered_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(app_id) DO UPDATE SET name = excluded.name",
                params![app.id.as_str(), app.name, app.registered_at],
            )?;
            Ok(())
        })
    }

    async fn get_app(&self, id: &AppId) -> Result<Option<AppRecord>> {
        let id = id.clone();
        self.with_conn(|conn| {
            let app = conn
                .query_row(
                    "SELECT * FROM apps WHERE app_id = ?1",
                    params![id.as_str()],
                    row_to_app,
                )
                .optional()?;
            Ok(app)
        })
    }

    async fn list_apps(&self) -> Result<Vec<AppRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM apps ORDER BY app_id")?;
            let apps = stmt
                .query_map([], row_to_app)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(apps)
        })
    }

    async fn put_token(&self, token: &TokenRecord) -> Result<()> {
        let token = token.clone();
        let protocol = serde_json::to_string(&token.protocol)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tokens (token_id, owner_app, name, protocol, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(token_id) DO UPDATE SET
                     name = excluded.name, protocol = excluded.protocol",
                params![
                    token.id.as_str(),
                    token.owner.as_str(),
                    token.name,
                    protocol,
                    token.created_at,
                ],
            )?;
            Ok(())
        })
    }

    async fn get_token(&self, id: &TokenId) -> Result<Option<TokenRecord>> {
        let id = id.clone();
        self.with_conn(|conn| {
            let token = conn
                .query_row(
                    "SELECT * FROM tokens WHERE token_id = ?1",
                    params![id.as_str()],
                    row_to_token,
                )
                .optional()?;
            Ok(token)
        })
    }

    async fn list_tokens(&self) -> Result<Vec<TokenRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM tokens ORDER BY token_id")?;
            let tokens = stmt
                .query_map([], row_to_token)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tokens)
        })
    }

    async fn merge_edge(&self, edge: &PermissionEdge) -> Result<MergeOutcome> {
        let edge = edge.clone();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing = tx
                .query_row(
                    "SELECT * FROM permission_edges
                     WHERE from_app = ?1 AND to_app = ?2 AND token_id = ?3",
                    params![edge.from.as_str(), edge.to.as_str(), edge.token.as_str()],
                    row_to_edge,
                )
                .optional()?;

            let outcome = match existing {
                Some(mut current) => {
                    let before = current.capabilities.len();
                    current.capabilities.extend(edge.capabilities.iter().copied());
                    if edge.purpose.is_some() {
                        current.purpose = edge.purpose.clone();
                    }
                    let extended = current.capabilities.len() > before;
                    if extended {
                        current.updated_at = edge.updated_at;
                    }

                    let capabilities = serde_json::to_string(&current.capabilities)
                        .map_err(|e| StoreError::Serialization(e.to_string()))?;
                    tx.execute(
                        "UPDATE permission_edges
                         SET capabilities = ?1, purpose = ?2, updated_at = ?3
                         WHERE from_app = ?4 AND to_app = ?5 AND token_id = ?6",
                        params![
                            capabilities,
                            current.purpose,
                            current.updated_at,
                            edge.from.as_str(),
                            edge.to.as_str(),
                            edge.token.as_str(),
                        ],
                    )?;
                    if extended {
                        MergeOutcome::Extended
                    } else {
                        MergeOutcome::Unchanged
                    }
                }
                None => {
                    let capabilities = serde_json::to_string(&edge.capabilities)
                        .map_err(|e| StoreError::Serialization(e.to_string()))?;
                    tx.execute(
                        "INSERT INTO permission_edges
                         (from_app, to_app, token_id, capabilities, purpose,
                          granted_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            edge.from.as_str(),
                            edge.to.as_str(),
                            edge.token.as_str(),
                            capabilities,
                            edge.purpose,
                            edge.granted_at,
                            edge.updated_at,
                        ],
                    )?;
                    MergeOutcome::Created
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
    }

    async fn get_edge(
        &self,
        from: &AppId,
        to: &AppId,
        token: &TokenId,
    ) -> Result<Option<PermissionEdge>> {
        let (from, to, token) = (from.clone(), to.clone(), token.clone());
        self.with_conn(|conn| {
            let edge = conn
                .query_row(
                    "SELECT * FROM permission_edges
                     WHERE from_app = ?1 AND to_app = ?2 AND token_id = ?3",
                    params![from.as_str(), to.as_str(), token.as_str()],
                    row_to_edge,
                )
                .optional()?;
            Ok(edge)
        })
    }

    async fn edges_into(&self, to: &AppId) -> Result<Vec<PermissionEdge>> {
        let to = to.clone();
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM permission_edges WHERE to_app = ?1
                 ORDER BY from_app, token_id",
            )?;
            let edges = stmt
                .query_map(params![to.as_str()], row_to_edge)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(edges)
        })
    }

    async fn list_edges(&self) -> Result<Vec<PermissionEdge>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM permission_edges ORDER BY from_app, to_app, token_id",
            )?;
            let edges = stmt
                .query_map([], row_to_edge)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(edges)
        })
    }

    async fn remove_edge(&self, from: &AppId, to: &AppId, token: &TokenId) -> Result<bool> {
        let (from, to, token) = (from.clone(), to.clone(), token.clone());
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM permission_edges
                 WHERE from_app = ?1 AND to_app = ?2 AND token_id = ?3",
                params![from.as_str(), to.as_str(), token.as_str()],
            )?;
            Ok(removed > 0)
        })
    }

    async fn remove_capabilities(
        &self,
        from: &AppId,
        to: &AppId,
        token: &TokenId,
        capabilities: &BTreeSet<Capability>,
    ) -> Result<RevokeOutcome> {
        let (from, to, token) = (from.clone(), to.clone(), token.clone());
        let capabilities = capabilities.clone();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing = tx
                .query_row(
                    "SELECT * FROM permission_edges
                     WHERE from_app = ?1 AND to_app = ?2 AND token_id = ?3",
                    params![from.as_str(), to.as_str(), token.as_str()],
                    row_to_edge,
                )
                .optional()?;

            let Some(mut edge) = existing else {
                return Ok(RevokeOutcome::NotFound);
            };

            for cap in &capabilities {
                edge.capabilities.remove(cap);
            }

            let outcome = if edge.capabilities.is_empty() {
                tx.execute(
                    "DELETE FROM permission_edges
                     WHERE from_app = ?1 AND to_app = ?2 AND token_id = ?3",
                    params![from.as_str(), to.as_str(), token.as_str()],
                )?;
                RevokeOutcome::Removed
            } else {
                let remaining = serde_json::to_string(&edge.capabilities)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                tx.execute(
                    "UPDATE permission_edges SET capabilities = ?1
                     WHERE from_app = ?2 AND to_app = ?3 AND token_id = ?4",
                    params![remaining, from.as_str(), to.as_str(), token.as_str()],
                )?;
                RevokeOutcome::Narrowed
            };

            tx.commit()?;
            Ok(outcome)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_sqlite_wallet_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let owner = UserId::from("alice");
        let wallet = store
            .get_or_create_wallet(&owner, WalletKind::SelfCustodied, 500)
            .await
            .unwrap();

        let loaded = store.get_wallet(&wallet.id).await.unwrap().unwrap();
        assert_eq!(loaded, wallet);

        // Second call returns the same row, not a new one
        let again = store
            .get_or_create_wallet(&owner, WalletKind::SelfCustodied, 999)
            .await
            .unwrap();
        assert_eq!(again.created_at, 500);
    }

    #[tokio::test]
    async fn test_sqlite_entry_balance_effects() {
        let store = SqliteStore::open_memory().unwrap();
        let wallet = store
            .get_or_create_wallet(&UserId::from("alice"), WalletKind::SelfCustodied, 1)
            .await
            .unwrap();

        let credit = LedgerEntry::new(wallet.id, EntryKind::Credit, dec!(2.5), "buy", 2)
            .with_metadata(serde_json::json!({ "package": "medium" }));
        store.apply_entry(&credit).await.unwrap();

        let revenue = LedgerEntry::new(wallet.id, EntryKind::Distribution, dec!(0.75), "split", 3);
        store.apply_entry(&revenue).await.unwrap();

        let wallet = store.get_wallet(&wallet.id).await.unwrap().unwrap();
        assert_eq!(wallet.credits, dec!(2.5));
        assert_eq!(wallet.on_chain_balance, dec!(0.75));
        assert_eq!(wallet.last_activity_at, 3);

        let recent = store.recent_entries(&wallet.id, 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].description, "split");
        assert_eq!(
            recent[1].metadata.as_ref().unwrap()["package"],
            "medium"
        );
    }

    #[tokio::test]
    async fn test_sqlite_debit_is_atomic_unit() {
        let store = SqliteStore::open_memory().unwrap();
        let wallet = store
            .get_or_create_wallet(&UserId::from("alice"), WalletKind::SelfCustodied, 1)
            .await
            .unwrap();
        let credit = LedgerEntry::new(wallet.id, EntryKind::Credit, dec!(1), "seed", 2);
        store.apply_entry(&credit).await.unwrap();

        let debit = LedgerEntry::new(wallet.id, EntryKind::Debit, dec!(0.7), "op", 3);
        assert_eq!(
            store.apply_debit(&debit).await.unwrap(),
            DebitOutcome::Applied { remaining: dec!(0.3) }
        );

        let debit = LedgerEntry::new(wallet.id, EntryKind::Debit, dec!(0.7), "op", 4);
        assert_eq!(
            store.apply_debit(&debit).await.unwrap(),
            DebitOutcome::InsufficientCredits { available: dec!(0.3) }
        );
        // The denied debit left no entry behind
        assert_eq!(store.entry_count(&wallet.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_sqlite_edge_merge_and_revoke() {
        let store = SqliteStore::open_memory().unwrap();
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
        wider.capabilities.insert(Capability::Transfer);
        wider.updated_at = 20;
        assert_eq!(store.merge_edge(&wider).await.unwrap(), MergeOutcome::Extended);

        let stored = store
            .get_edge(&edge.from, &edge.to, &edge.token)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.allows(Capability::Transfer));
        assert_eq!(stored.granted_at, 10);

        assert!(store.remove_edge(&edge.from, &edge.to, &edge.token).await.unwrap());
        assert!(!store.remove_edge(&edge.from, &edge.to, &edge.token).await.unwrap());
    }

    #[tokio::test]
    async fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walletkit.db");

        let wallet_id = {
            let store = SqliteStore::open(&path).unwrap();
            let wallet = store
                .get_or_create_wallet(&UserId::from("alice"), WalletKind::SelfCustodied, 1)
                .await
                .unwrap();
            let credit = LedgerEntry::new(wallet.id, EntryKind::Credit, dec!(4), "seed", 2);
            store.apply_entry(&credit).await.unwrap();
            wallet.id
        };

        let store = SqliteStore::open(&path).unwrap();
        let wallet = store.get_wallet(&wallet_id).await.unwrap().unwrap();
        assert_eq!(wallet.credits, dec!(4));
    }
}
