//! Daftar CLI - record customer debts offline, sync when connected.

mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands, CustomerCommands, DebtCommands};
use crate::commands::common::resolve_db_path;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("daftar=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Customer { command } => match command {
            CustomerCommands::Add { name, phone, notes } => {
                commands::customer::run_add(&name, phone, notes, &db_path)?;
            }
            CustomerCommands::List { json } => commands::customer::run_list(json, &db_path)?,
            CustomerCommands::Delete { id } => commands::customer::run_delete(&id, &db_path)?,
        },
        Commands::Debt { command } => match command {
            DebtCommands::Add {
                customer,
                amount,
                note,
            } => commands::debt::run_add(&customer, &amount, note, &db_path)?,
            DebtCommands::List {
                customer,
                unpaid,
                json,
            } => commands::debt::run_list(customer.as_deref(), unpaid, json, &db_path)?,
            DebtCommands::Delete { id } => commands::debt::run_delete(&id, &db_path)?,
        },
        Commands::Pay { customer, amount } => {
            commands::pay::run_pay(&customer, &amount, &db_path)?;
        }
        Commands::Settle { id } => commands::pay::run_settle(&id, &db_path)?,
        Commands::Sync { watch, interval } => {
            commands::sync_cmd::run_sync(watch, interval, &db_path).await?;
        }
        Commands::Status { json } => commands::status::run_status(json, &db_path)?,
        Commands::Completions { shell } => commands::completions::run_completions(shell)?,
    }

    Ok(())
}
