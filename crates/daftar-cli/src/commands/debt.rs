use std::path::Path;

use daftar_core::db::LedgerStore;
use daftar_core::models::Amount;
use daftar_core::util::normalize_text_option;

use crate::commands::common::{
    debt_to_item, format_debt_lines, open_database, resolve_customer, resolve_debt, short_id,
    DebtListItem,
};
use crate::error::CliError;

pub fn run_add(
    customer: &str,
    amount: &str,
    note: Option<String>,
    db_path: &Path,
) -> Result<(), CliError> {
    let amount: Amount = amount.parse()?;
    let db = open_database(db_path)?;
    let store = db.ledger();
    let customer = resolve_customer(&store, customer)?;
    let debt = store.create_debt(&customer.id, amount, normalize_text_option(note))?;

    println!("{}", debt.id);
    Ok(())
}

pub fn run_list(
    customer: Option<&str>,
    unpaid_only: bool,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let store = db.ledger();

    let filter = customer
        .map(|needle| resolve_customer(&store, needle))
        .transpose()?;
    let mut debts = store.list_debts(filter.as_ref().map(|c| &c.id))?;
    if unpaid_only {
        debts.retain(|d| !d.is_paid);
    }

    if as_json {
        let items = debts.iter().map(debt_to_item).collect::<Vec<DebtListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if debts.is_empty() {
        println!("No debts recorded.");
        return Ok(());
    }

    if let Some(customer) = filter {
        println!("Debts for {}:", customer.name);
    }
    for line in format_debt_lines(&debts) {
        println!("{line}");
    }
    Ok(())
}

pub fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let store = db.ledger();
    let debt = resolve_debt(&store, id)?;
    store.delete_debt(&debt.id)?;

    println!("Deleted debt {}", short_id(&debt.id.as_str()));
    Ok(())
}
