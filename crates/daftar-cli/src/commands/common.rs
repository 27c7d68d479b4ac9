use std::path::{Path, PathBuf};

use serde::Serialize;

use daftar_core::db::{Database, LedgerStore};
use daftar_core::models::{Customer, Debt};

use crate::error::CliError;

/// Resolve the database file path: explicit flag, else the platform data dir
pub fn resolve_db_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("daftar")
            .join("daftar.db")
    })
}

pub fn open_database(db_path: &Path) -> Result<Database, CliError> {
    Ok(Database::open(db_path)?)
}

/// Find one customer by unique id prefix or exact (case-insensitive) name
pub fn resolve_customer(
    store: &impl LedgerStore,
    needle: &str,
) -> Result<Customer, CliError> {
    let needle = needle.trim();
    let customers = store.list_customers()?;

    let matches: Vec<&Customer> = customers
        .iter()
        .filter(|c| {
            c.id.as_str().starts_with(needle) || c.name.eq_ignore_ascii_case(needle)
        })
        .collect();

    match matches.len() {
        0 => Err(CliError::CustomerNotFound(needle.to_string())),
        1 => Ok(matches[0].clone()),
        n => Err(CliError::Ambiguous(format!(
            "'{needle}' matches {n} customers; use a longer id prefix"
        ))),
    }
}

/// Find one debt by unique id prefix
pub fn resolve_debt(store: &impl LedgerStore, prefix: &str) -> Result<Debt, CliError> {
    let prefix = prefix.trim();
    let debts = store.list_debts(None)?;

    let matches: Vec<&Debt> = debts
        .iter()
        .filter(|d| d.id.as_str().starts_with(prefix))
        .collect();

    match matches.len() {
        0 => Err(CliError::DebtNotFound(prefix.to_string())),
        1 => Ok(matches[0].clone()),
        n => Err(CliError::Ambiguous(format!(
            "'{prefix}' matches {n} debts; use a longer id prefix"
        ))),
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerListItem {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub synced: bool,
    pub created_at: String,
}

pub fn customer_to_item(customer: &Customer) -> CustomerListItem {
    CustomerListItem {
        id: customer.id.as_str(),
        name: customer.name.clone(),
        phone: customer.phone.clone(),
        notes: customer.notes.clone(),
        synced: customer.synced,
        created_at: customer.created_at.to_rfc3339(),
    }
}

pub fn format_customer_lines(customers: &[Customer]) -> Vec<String> {
    customers
        .iter()
        .map(|c| {
            let phone = c.phone.as_deref().unwrap_or("-");
            let sync_marker = if c.synced { "" } else { " *" };
            format!("{}  {}  {}{}", short_id(&c.id.as_str()), c.name, phone, sync_marker)
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct DebtListItem {
    pub id: String,
    pub customer_id: String,
    pub amount: String,
    pub paid_amount: String,
    pub remaining: String,
    pub is_paid: bool,
    pub paid_via: Option<String>,
    pub note: Option<String>,
    pub synced: bool,
    pub created_at: String,
}

pub fn debt_to_item(debt: &Debt) -> DebtListItem {
    DebtListItem {
        id: debt.id.as_str(),
        customer_id: debt.customer_id.as_str(),
        amount: debt.amount.to_string(),
        paid_amount: debt.paid_amount.to_string(),
        remaining: debt.remaining().to_string(),
        is_paid: debt.is_paid,
        paid_via: debt.paid_via.map(|v| v.as_str().to_string()),
        note: debt.note.clone(),
        synced: debt.synced,
        created_at: debt.created_at.to_rfc3339(),
    }
}

pub fn format_debt_lines(debts: &[Debt]) -> Vec<String> {
    debts
        .iter()
        .map(|d| {
            let status = if d.is_paid {
                format!("paid ({})", d.paid_via.map_or("-", |v| v.as_str()))
            } else if d.paid_amount.is_positive() {
                format!("{} remaining", d.remaining())
            } else {
                "open".to_string()
            };
            let sync_marker = if d.synced { "" } else { " *" };
            format!(
                "{}  {}  {}{}",
                short_id(&d.id.as_str()),
                d.amount,
                status,
                sync_marker
            )
        })
        .collect()
}

/// First 8 characters of an id, enough to address records interactively
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}
