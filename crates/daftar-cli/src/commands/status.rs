use std::path::Path;

use serde::Serialize;

use daftar_core::db::LedgerStore;

use crate::commands::common::open_database;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct StatusItem {
    customers: usize,
    debts: usize,
    unpaid_debts: usize,
    total_unpaid: String,
    total_paid: String,
    pending_changes: usize,
    last_pull_at: Option<String>,
}

pub fn run_status(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let store = db.ledger();

    let summary = store.summary()?;
    let item = StatusItem {
        customers: store.count_customers()?,
        debts: store.count_debts()?,
        unpaid_debts: summary.unpaid_count,
        total_unpaid: summary.total_unpaid.to_string(),
        total_paid: summary.total_paid.to_string(),
        pending_changes: store.queue_len()?,
        last_pull_at: store.last_pull_at()?.map(|at| at.to_rfc3339()),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    println!("Customers: {}", item.customers);
    println!(
        "Debts: {} ({} unpaid, {} outstanding, {} collected)",
        item.debts, item.unpaid_debts, item.total_unpaid, item.total_paid
    );
    println!("Pending changes: {}", item.pending_changes);
    match item.last_pull_at {
        Some(at) => println!("Last sync: {at}"),
        None => println!("Last sync: never"),
    }
    Ok(())
}
