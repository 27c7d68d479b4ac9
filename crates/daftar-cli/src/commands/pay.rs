use std::path::Path;

use daftar_core::db::LedgerStore;
use daftar_core::distribution::allocate_payment;
use daftar_core::models::{Amount, PaidVia};

use crate::commands::common::{open_database, resolve_customer, resolve_debt, short_id};
use crate::error::CliError;

/// Record a payment against a customer, oldest open debts first.
///
/// Leftover is reported, never silently dropped.
pub fn run_pay(customer: &str, amount: &str, db_path: &Path) -> Result<(), CliError> {
    let payment: Amount = amount.parse()?;
    let db = open_database(db_path)?;
    let store = db.ledger();
    let customer = resolve_customer(&store, customer)?;

    let open = store.list_open_debts(&customer.id)?;
    let plan = allocate_payment(payment, &open)?;

    for split in &plan.splits {
        let debt = store.apply_debt_payment(&split.debt_id, split.amount, PaidVia::Partial)?;
        let state = if debt.is_paid {
            "settled".to_string()
        } else {
            format!("{} remaining", debt.remaining())
        };
        println!(
            "Applied {} to debt {} ({state})",
            split.amount,
            short_id(&split.debt_id.as_str())
        );
    }

    println!("Total applied: {}", plan.total_allocated());
    if plan.leftover.is_positive() {
        println!(
            "Warning: {} exceeds {}'s outstanding debt and was not applied",
            plan.leftover, customer.name
        );
    }
    Ok(())
}

/// Mark a debt settled by the customer directly
pub fn run_settle(id: &str, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let store = db.ledger();
    let debt = resolve_debt(&store, id)?;

    if debt.is_paid {
        println!("Debt {} is already paid.", short_id(&debt.id.as_str()));
        return Ok(());
    }

    let settled = store.apply_debt_payment(&debt.id, debt.remaining(), PaidVia::Customer)?;
    println!(
        "Settled debt {} ({})",
        short_id(&settled.id.as_str()),
        settled.amount
    );
    Ok(())
}
