//! Ledger store implementation
//!
//! The normal write path couples every mutation with a change-queue append
//! in the same transaction; the pull-merge path writes through the raw
//! `upsert_*` operations and never touches the queue.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{
    Amount, ChangeAction, ChangeEntry, ChangePayload, Customer, CustomerFields, CustomerId, Debt,
    DebtCreateFields, DebtId, DebtUpdateFields, EntityKind, PaidVia,
};

const LAST_PULL_AT_KEY: &str = "last_pull_at";

/// Aggregate debt figures for the status surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSummary {
    pub unpaid_count: usize,
    pub total_unpaid: Amount,
    pub total_paid: Amount,
}

/// Trait for local ledger storage operations
pub trait LedgerStore {
    // Customers
    /// Create a customer and queue its create change
    fn create_customer(&self, fields: CustomerFields) -> Result<Customer>;

    /// Update a customer's editable fields and queue the update
    fn update_customer(&self, id: &CustomerId, fields: CustomerFields) -> Result<Customer>;

    /// Tombstone a customer and queue the delete
    fn delete_customer(&self, id: &CustomerId) -> Result<()>;

    /// Get a customer by id (tombstoned records included)
    fn get_customer(&self, id: &CustomerId) -> Result<Option<Customer>>;

    /// Find a customer by its server-assigned identifier
    fn find_customer_by_server_id(&self, server_id: &str) -> Result<Option<Customer>>;

    /// List customers, excluding tombstones, newest first
    fn list_customers(&self) -> Result<Vec<Customer>>;

    /// Count customers, excluding tombstones
    fn count_customers(&self) -> Result<usize>;

    /// Raw write used by pull-merge; never queues a change
    fn upsert_customer(&self, customer: &Customer) -> Result<()>;

    // Debts
    /// Create a debt and queue its create change
    fn create_debt(&self, customer_id: &CustomerId, amount: Amount, note: Option<String>)
        -> Result<Debt>;

    /// Apply a repayment and queue the resulting update
    fn apply_debt_payment(&self, id: &DebtId, applied: Amount, via: PaidVia) -> Result<Debt>;

    /// Tombstone a debt and queue the delete
    fn delete_debt(&self, id: &DebtId) -> Result<()>;

    /// Get a debt by id (tombstoned records included)
    fn get_debt(&self, id: &DebtId) -> Result<Option<Debt>>;

    /// Find a debt by its server-assigned identifier
    fn find_debt_by_server_id(&self, server_id: &str) -> Result<Option<Debt>>;

    /// List debts (optionally for one customer), excluding tombstones, newest first
    fn list_debts(&self, customer: Option<&CustomerId>) -> Result<Vec<Debt>>;

    /// List a customer's open debts, oldest first
    fn list_open_debts(&self, customer: &CustomerId) -> Result<Vec<Debt>>;

    /// Count debts, excluding tombstones
    fn count_debts(&self) -> Result<usize>;

    /// Raw write used by pull-merge; never queues a change
    fn upsert_debt(&self, debt: &Debt) -> Result<()>;

    /// Aggregate unpaid/paid figures across the ledger
    fn summary(&self) -> Result<LedgerSummary>;

    // Change queue
    /// Append a change entry for the given local id
    fn append_change(&self, local_id: &str, payload: &ChangePayload) -> Result<ChangeEntry>;

    /// Read the pending queue in FIFO order without draining it
    fn pending_changes(&self) -> Result<Vec<ChangeEntry>>;

    /// Return the pending queue and clear it atomically
    fn drain_queue(&self) -> Result<Vec<ChangeEntry>>;

    /// Clear the pending queue
    fn clear_queue(&self) -> Result<()>;

    /// Number of pending queue entries
    fn queue_len(&self) -> Result<usize>;

    /// Adopt a server id (when given) and flag the record as synced
    fn mark_synced(&self, entity: EntityKind, local_id: &str, server_id: Option<&str>)
        -> Result<()>;

    // Watermark
    /// Timestamp of the last successful pull, if any
    fn last_pull_at(&self) -> Result<Option<DateTime<Utc>>>;

    /// Advance the pull watermark
    fn set_last_pull_at(&self, at: DateTime<Utc>) -> Result<()>;
}

/// `SQLite` implementation of `LedgerStore`
pub struct SqliteLedgerStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteLedgerStore<'a> {
    /// Create a new store over the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_customer(row: &rusqlite::Row<'_>) -> rusqlite::Result<Customer> {
        let id: String = row.get(0)?;
        Ok(Customer {
            id: id
                .parse()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
            server_id: row.get(1)?,
            name: row.get(2)?,
            phone: row.get(3)?,
            notes: row.get(4)?,
            synced: row.get::<_, i32>(5)? != 0,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
            deleted_at: row.get(8)?,
        })
    }

    fn parse_debt(row: &rusqlite::Row<'_>) -> rusqlite::Result<Debt> {
        let id: String = row.get(0)?;
        let customer_id: String = row.get(2)?;
        let paid_via: Option<String> = row.get(8)?;
        Ok(Debt {
            id: id
                .parse()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
            server_id: row.get(1)?,
            customer_id: customer_id.parse().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
            })?,
            amount: Amount::from_minor_units(row.get(3)?),
            paid_amount: Amount::from_minor_units(row.get(4)?),
            note: row.get(5)?,
            is_paid: row.get::<_, i32>(6)? != 0,
            paid_at: row.get(7)?,
            paid_via: paid_via
                .map(|v| {
                    v.parse::<PaidVia>().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            8,
                            Type::Text,
                            e.into(),
                        )
                    })
                })
                .transpose()?,
            synced: row.get::<_, i32>(9)? != 0,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
            deleted_at: row.get(12)?,
        })
    }

    fn parse_change(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String, String, String, DateTime<Utc>)> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
        ))
    }

    fn change_from_row(
        (id, action, entity, local_id, timestamp): (i64, String, String, String, DateTime<Utc>),
        data: &str,
    ) -> Result<ChangeEntry> {
        let action = ChangeAction::parse(&action)?;
        let entity = EntityKind::parse(&entity)?;
        let value: serde_json::Value = serde_json::from_str(data)?;
        Ok(ChangeEntry {
            id,
            local_id,
            payload: ChangePayload::from_parts(entity, action, &value)?,
            timestamp,
        })
    }

    fn insert_change(&self, local_id: &str, payload: &ChangePayload) -> Result<ChangeEntry> {
        let timestamp = Utc::now();
        let data = serde_json::to_string(&payload.to_data()?)?;
        self.conn.execute(
            "INSERT INTO sync_queue (action, entity, local_id, data, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                payload.action().as_str(),
                payload.entity().as_str(),
                local_id,
                data,
                timestamp
            ],
        )?;
        Ok(ChangeEntry {
            id: self.conn.last_insert_rowid(),
            local_id: local_id.to_string(),
            payload: payload.clone(),
            timestamp,
        })
    }

    fn load_queue(&self) -> Result<Vec<ChangeEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, action, entity, local_id, created_at, data
             FROM sync_queue
             ORDER BY id ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let head = Self::parse_change(row)?;
                let data: String = row.get(5)?;
                Ok((head, data))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(head, data)| Self::change_from_row(head, &data))
            .collect()
    }

    fn write_debt(&self, debt: &Debt) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO debts
             (id, server_id, customer_id, amount, paid_amount, note, is_paid, paid_at, paid_via,
              synced, created_at, updated_at, deleted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                debt.id.as_str(),
                debt.server_id,
                debt.customer_id.as_str(),
                debt.amount.minor_units(),
                debt.paid_amount.minor_units(),
                debt.note,
                i32::from(debt.is_paid),
                debt.paid_at,
                debt.paid_via.map(PaidVia::as_str),
                i32::from(debt.synced),
                debt.created_at,
                debt.updated_at,
                debt.deleted_at
            ],
        )?;
        Ok(())
    }

    fn write_customer(&self, customer: &Customer) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO customers
             (id, server_id, name, phone, notes, synced, created_at, updated_at, deleted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                customer.id.as_str(),
                customer.server_id,
                customer.name,
                customer.phone,
                customer.notes,
                i32::from(customer.synced),
                customer.created_at,
                customer.updated_at,
                customer.deleted_at
            ],
        )?;
        Ok(())
    }
}

impl LedgerStore for SqliteLedgerStore<'_> {
    fn create_customer(&self, fields: CustomerFields) -> Result<Customer> {
        if fields.name.trim().is_empty() {
            return Err(Error::InvalidInput("customer name must not be empty".into()));
        }

        let customer = Customer::new(fields.name.clone(), fields.phone.clone(), fields.notes.clone());

        let tx = self.conn.unchecked_transaction()?;
        self.write_customer(&customer)?;
        self.insert_change(
            &customer.id.as_str(),
            &ChangePayload::CustomerCreate(fields),
        )?;
        tx.commit()?;

        Ok(customer)
    }

    fn update_customer(&self, id: &CustomerId, fields: CustomerFields) -> Result<Customer> {
        if fields.name.trim().is_empty() {
            return Err(Error::InvalidInput("customer name must not be empty".into()));
        }

        let mut customer = self
            .get_customer(id)?
            .filter(|c| !c.is_deleted())
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        customer.name = fields.name.clone();
        customer.phone = fields.phone.clone();
        customer.notes = fields.notes.clone();
        customer.updated_at = Utc::now();
        customer.synced = false;

        let tx = self.conn.unchecked_transaction()?;
        self.write_customer(&customer)?;
        self.insert_change(&id.as_str(), &ChangePayload::CustomerUpdate(fields))?;
        tx.commit()?;

        Ok(customer)
    }

    fn delete_customer(&self, id: &CustomerId) -> Result<()> {
        let now = Utc::now();
        let tx = self.conn.unchecked_transaction()?;
        let rows = self.conn.execute(
            "UPDATE customers SET deleted_at = ?, updated_at = ?, synced = 0
             WHERE id = ? AND deleted_at IS NULL",
            params![now, now, id.as_str()],
        )?;
        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        self.insert_change(&id.as_str(), &ChangePayload::CustomerDelete)?;
        tx.commit()?;
        Ok(())
    }

    fn get_customer(&self, id: &CustomerId) -> Result<Option<Customer>> {
        let result = self.conn.query_row(
            "SELECT id, server_id, name, phone, notes, synced, created_at, updated_at, deleted_at
             FROM customers WHERE id = ?",
            params![id.as_str()],
            Self::parse_customer,
        );

        match result {
            Ok(customer) => Ok(Some(customer)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_customer_by_server_id(&self, server_id: &str) -> Result<Option<Customer>> {
        let result = self.conn.query_row(
            "SELECT id, server_id, name, phone, notes, synced, created_at, updated_at, deleted_at
             FROM customers WHERE server_id = ?",
            params![server_id],
            Self::parse_customer,
        );

        match result {
            Ok(customer) => Ok(Some(customer)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_customers(&self) -> Result<Vec<Customer>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, server_id, name, phone, notes, synced, created_at, updated_at, deleted_at
             FROM customers
             WHERE deleted_at IS NULL
             ORDER BY created_at DESC",
        )?;

        let customers = stmt
            .query_map([], Self::parse_customer)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(customers)
    }

    fn count_customers(&self) -> Result<usize> {
        let count: usize = self.conn.query_row(
            "SELECT COUNT(*) FROM customers WHERE deleted_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn upsert_customer(&self, customer: &Customer) -> Result<()> {
        self.write_customer(customer)
    }

    fn create_debt(
        &self,
        customer_id: &CustomerId,
        amount: Amount,
        note: Option<String>,
    ) -> Result<Debt> {
        if !amount.is_positive() {
            return Err(Error::InvalidAmount(format!(
                "debt amount must be positive, got {amount}"
            )));
        }
        let customer = self
            .get_customer(customer_id)?
            .filter(|c| !c.is_deleted())
            .ok_or_else(|| Error::NotFound(customer_id.to_string()))?;

        let debt = Debt::new(customer.id, amount, note.clone());

        let tx = self.conn.unchecked_transaction()?;
        self.write_debt(&debt)?;
        self.insert_change(
            &debt.id.as_str(),
            &ChangePayload::DebtCreate(DebtCreateFields {
                customer_local_id: customer.id.as_str(),
                amount,
                note,
            }),
        )?;
        tx.commit()?;

        Ok(debt)
    }

    fn apply_debt_payment(&self, id: &DebtId, applied: Amount, via: PaidVia) -> Result<Debt> {
        let mut debt = self
            .get_debt(id)?
            .filter(|d| !d.is_deleted())
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        debt.apply_payment(applied, via, Utc::now())?;

        let tx = self.conn.unchecked_transaction()?;
        self.write_debt(&debt)?;
        self.insert_change(
            &id.as_str(),
            &ChangePayload::DebtUpdate(DebtUpdateFields {
                paid_amount: Some(debt.paid_amount),
                is_paid: Some(debt.is_paid),
                paid_at: debt.paid_at,
                paid_via: debt.paid_via,
                note: None,
            }),
        )?;
        tx.commit()?;

        Ok(debt)
    }

    fn delete_debt(&self, id: &DebtId) -> Result<()> {
        let now = Utc::now();
        let tx = self.conn.unchecked_transaction()?;
        let rows = self.conn.execute(
            "UPDATE debts SET deleted_at = ?, updated_at = ?, synced = 0
             WHERE id = ? AND deleted_at IS NULL",
            params![now, now, id.as_str()],
        )?;
        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        self.insert_change(&id.as_str(), &ChangePayload::DebtDelete)?;
        tx.commit()?;
        Ok(())
    }

    fn get_debt(&self, id: &DebtId) -> Result<Option<Debt>> {
        let result = self.conn.query_row(
            "SELECT id, server_id, customer_id, amount, paid_amount, note, is_paid, paid_at,
                    paid_via, synced, created_at, updated_at, deleted_at
             FROM debts WHERE id = ?",
            params![id.as_str()],
            Self::parse_debt,
        );

        match result {
            Ok(debt) => Ok(Some(debt)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_debt_by_server_id(&self, server_id: &str) -> Result<Option<Debt>> {
        let result = self.conn.query_row(
            "SELECT id, server_id, customer_id, amount, paid_amount, note, is_paid, paid_at,
                    paid_via, synced, created_at, updated_at, deleted_at
             FROM debts WHERE server_id = ?",
            params![server_id],
            Self::parse_debt,
        );

        match result {
            Ok(debt) => Ok(Some(debt)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_debts(&self, customer: Option<&CustomerId>) -> Result<Vec<Debt>> {
        let sql = "SELECT id, server_id, customer_id, amount, paid_amount, note, is_paid, paid_at,
                          paid_via, synced, created_at, updated_at, deleted_at
                   FROM debts
                   WHERE deleted_at IS NULL AND (?1 IS NULL OR customer_id = ?1)
                   ORDER BY created_at DESC";
        let mut stmt = self.conn.prepare(sql)?;

        let debts = stmt
            .query_map(params![customer.map(CustomerId::as_str)], Self::parse_debt)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(debts)
    }

    fn list_open_debts(&self, customer: &CustomerId) -> Result<Vec<Debt>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, server_id, customer_id, amount, paid_amount, note, is_paid, paid_at,
                    paid_via, synced, created_at, updated_at, deleted_at
             FROM debts
             WHERE deleted_at IS NULL AND is_paid = 0 AND customer_id = ?
             ORDER BY created_at ASC, id ASC",
        )?;

        let debts = stmt
            .query_map(params![customer.as_str()], Self::parse_debt)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(debts)
    }

    fn count_debts(&self) -> Result<usize> {
        let count: usize = self.conn.query_row(
            "SELECT COUNT(*) FROM debts WHERE deleted_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn upsert_debt(&self, debt: &Debt) -> Result<()> {
        self.write_debt(debt)
    }

    fn summary(&self) -> Result<LedgerSummary> {
        self.conn
            .query_row(
                "SELECT
                    COUNT(CASE WHEN is_paid = 0 THEN 1 END),
                    COALESCE(SUM(CASE WHEN is_paid = 0 THEN amount - paid_amount ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN is_paid = 1 THEN amount ELSE 0 END), 0)
                 FROM debts
                 WHERE deleted_at IS NULL",
                [],
                |row| {
                    Ok(LedgerSummary {
                        unpaid_count: row.get(0)?,
                        total_unpaid: Amount::from_minor_units(row.get(1)?),
                        total_paid: Amount::from_minor_units(row.get(2)?),
                    })
                },
            )
            .map_err(Into::into)
    }

    fn append_change(&self, local_id: &str, payload: &ChangePayload) -> Result<ChangeEntry> {
        self.insert_change(local_id, payload)
    }

    fn pending_changes(&self) -> Result<Vec<ChangeEntry>> {
        self.load_queue()
    }

    fn drain_queue(&self) -> Result<Vec<ChangeEntry>> {
        let tx = self.conn.unchecked_transaction()?;
        let entries = self.load_queue()?;
        self.conn.execute("DELETE FROM sync_queue", [])?;
        tx.commit()?;
        Ok(entries)
    }

    fn clear_queue(&self) -> Result<()> {
        self.conn.execute("DELETE FROM sync_queue", [])?;
        Ok(())
    }

    fn queue_len(&self) -> Result<usize> {
        let count: usize =
            self.conn
                .query_row("SELECT COUNT(*) FROM sync_queue", [], |row| row.get(0))?;
        Ok(count)
    }

    fn mark_synced(
        &self,
        entity: EntityKind,
        local_id: &str,
        server_id: Option<&str>,
    ) -> Result<()> {
        let sql = match entity {
            EntityKind::Customers => {
                "UPDATE customers SET server_id = COALESCE(?1, server_id), synced = 1 WHERE id = ?2"
            }
            EntityKind::Debts => {
                "UPDATE debts SET server_id = COALESCE(?1, server_id), synced = 1 WHERE id = ?2"
            }
        };
        self.conn.execute(sql, params![server_id, local_id])?;
        Ok(())
    }

    fn last_pull_at(&self) -> Result<Option<DateTime<Utc>>> {
        let result = self.conn.query_row(
            "SELECT value FROM sync_meta WHERE key = ?",
            params![LAST_PULL_AT_KEY],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(raw) => {
                let parsed = DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| Error::InvalidInput(format!("bad watermark {raw}: {e}")))?;
                Ok(Some(parsed.with_timezone(&Utc)))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_last_pull_at(&self, at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sync_meta (key, value) VALUES (?, ?)",
            params![LAST_PULL_AT_KEY, at.to_rfc3339()],
        )?;
        Ok(())
    }
}
