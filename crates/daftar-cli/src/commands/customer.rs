use std::path::Path;

use daftar_core::db::LedgerStore;
use daftar_core::models::CustomerFields;
use daftar_core::util::normalize_text_option;

use crate::commands::common::{
    customer_to_item, format_customer_lines, open_database, resolve_customer, CustomerListItem,
};
use crate::error::CliError;

pub fn run_add(
    name: &str,
    phone: Option<String>,
    notes: Option<String>,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let customer = db.ledger().create_customer(CustomerFields {
        name: name.trim().to_string(),
        phone: normalize_text_option(phone),
        notes: normalize_text_option(notes),
    })?;

    println!("{}", customer.id);
    Ok(())
}

pub fn run_list(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let customers = db.ledger().list_customers()?;

    if as_json {
        let items = customers
            .iter()
            .map(customer_to_item)
            .collect::<Vec<CustomerListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if customers.is_empty() {
        println!("No customers yet.");
        return Ok(());
    }

    for line in format_customer_lines(&customers) {
        println!("{line}");
    }
    Ok(())
}

pub fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let store = db.ledger();
    let customer = resolve_customer(&store, id)?;
    store.delete_customer(&customer.id)?;

    println!("Deleted {}", customer.name);
    Ok(())
}
