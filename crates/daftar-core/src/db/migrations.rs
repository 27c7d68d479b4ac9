//! Database migrations

use rusqlite::Connection;

use crate::error::Result;

/// Run all pending migrations
pub fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get::<_, i32>(0).map(|v| v != 0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Migration to version 1: Initial schema
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );
        -- Customers (soft-deleted via deleted_at, never purged)
        CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            server_id TEXT,
            name TEXT NOT NULL,
            phone TEXT,
            notes TEXT,
            synced INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_customers_server ON customers(server_id);
        CREATE INDEX IF NOT EXISTS idx_customers_deleted ON customers(deleted_at);
        -- Debts; amounts are integer minor units
        CREATE TABLE IF NOT EXISTS debts (
            id TEXT PRIMARY KEY,
            server_id TEXT,
            customer_id TEXT NOT NULL REFERENCES customers(id),
            amount INTEGER NOT NULL,
            paid_amount INTEGER NOT NULL DEFAULT 0,
            note TEXT,
            is_paid INTEGER NOT NULL DEFAULT 0,
            paid_at TEXT,
            paid_via TEXT,
            synced INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_debts_customer ON debts(customer_id);
        CREATE INDEX IF NOT EXISTS idx_debts_server ON debts(server_id);
        CREATE INDEX IF NOT EXISTS idx_debts_unpaid ON debts(is_paid);
        -- Outbound change queue, drained FIFO by id
        CREATE TABLE IF NOT EXISTS sync_queue (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            action TEXT NOT NULL,
            entity TEXT NOT NULL,
            local_id TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        -- Sync bookkeeping (pull watermark), outside the ledger tables
        CREATE TABLE IF NOT EXISTS sync_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        -- Record migration version
        INSERT INTO schema_version (version) VALUES (1);
        COMMIT;",
    )?;

    tracing::info!("Migrated database to version 1");
    Ok(())
}
