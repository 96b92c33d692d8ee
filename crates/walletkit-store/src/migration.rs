//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL
//! string that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, walletkit_core::now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Wallets: one row per (owner, kind)
        CREATE TABLE wallets (
            wallet_id BLOB PRIMARY KEY,       -- 16 bytes, derived from (owner, kind)
            owner TEXT NOT NULL,
            kind INTEGER NOT NULL,            -- WalletKind as u8
            on_chain_balance TEXT NOT NULL,   -- Decimal as text, exact
            credits TEXT NOT NULL,            -- Decimal as text, exact
            active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,      -- Unix ms
            last_activity_at INTEGER NOT NULL,

            UNIQUE(owner, kind)
        );

        -- Append-only ledger. rowid preserves append order per wallet.
        CREATE TABLE ledger_entries (
            entry_id BLOB PRIMARY KEY,        -- 16 bytes
            wallet_id BLOB NOT NULL,
            kind INTEGER NOT NULL,            -- EntryKind as u8
            amount TEXT NOT NULL,             -- Decimal as text, always positive
            description TEXT NOT NULL,
            metadata TEXT,                    -- JSON, nullable
            timestamp INTEGER NOT NULL        -- Unix ms
        );

        -- Registered applications
        CREATE TABLE apps (
            app_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            registered_at INTEGER NOT NULL
        );

        -- Tokens minted by applications
        CREATE TABLE tokens (
            token_id TEXT PRIMARY KEY,
            owner_app TEXT NOT NULL,
            name TEXT NOT NULL,
            protocol TEXT NOT NULL,           -- TokenProtocol as JSON
            created_at INTEGER NOT NULL
        );

        -- Permission edges: at most one row per (from, to, token)
        CREATE TABLE permission_edges (
            from_app TEXT NOT NULL,
            to_app TEXT NOT NULL,
            token_id TEXT NOT NULL,
            capabilities TEXT NOT NULL,       -- JSON array of capability names
            purpose TEXT,
            granted_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (from_app, to_app, token_id)
        );

        -- Indexes for common queries
        CREATE INDEX idx_entries_wallet ON ledger_entries(wallet_id);
        CREATE INDEX idx_tokens_owner ON tokens(owner_app);
        CREATE INDEX idx_edges_to ON permission_edges(to_app);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"wallets".to_string()));
        assert!(tables.contains(&"ledger_entries".to_string()));
        assert!(tables.contains(&"apps".to_string()));
        assert!(tables.contains(&"tokens".to_string()));
        assert!(tables.contains(&"permission_edges".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }
}
