//! Database layer for Daftar

mod connection;
mod ledger;
mod migrations;

pub use connection::Database;
pub use ledger::{LedgerStore, LedgerSummary, SqliteLedgerStore};
