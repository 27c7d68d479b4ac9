use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "daftar")]
#[command(about = "Offline-first debt notebook for small merchants")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage customers
    Customer {
        #[command(subcommand)]
        command: CustomerCommands,
    },
    /// Manage debts
    Debt {
        #[command(subcommand)]
        command: DebtCommands,
    },
    /// Record a payment, applied to the customer's oldest debts first
    Pay {
        /// Customer ID prefix or exact name
        customer: String,
        /// Payment amount, e.g. 120.50
        amount: String,
    },
    /// Mark a debt settled by the customer directly
    Settle {
        /// Debt ID or unique ID prefix
        id: String,
    },
    /// Synchronize with the remote ledger
    Sync {
        /// Keep syncing on an interval instead of exiting
        #[arg(long)]
        watch: bool,
        /// Seconds between sync cycles in watch mode
        #[arg(long, default_value = "60")]
        interval: u64,
    },
    /// Show ledger totals and sync status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
pub enum CustomerCommands {
    /// Add a new customer
    Add {
        /// Customer name
        name: String,
        /// Phone number
        #[arg(long)]
        phone: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List customers
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a customer
    Delete {
        /// Customer ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum DebtCommands {
    /// Record a new debt
    Add {
        /// Customer ID prefix or exact name
        customer: String,
        /// Debt amount, e.g. 120.50
        amount: String,
        /// Free-form note
        #[arg(long)]
        note: Option<String>,
    },
    /// List debts
    List {
        /// Filter to one customer (ID prefix or exact name)
        #[arg(long)]
        customer: Option<String>,
        /// Only show unpaid debts
        #[arg(long)]
        unpaid: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a debt
    Delete {
        /// Debt ID or unique ID prefix
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
    Elvish,
}
