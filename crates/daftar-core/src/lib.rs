//! daftar-core - Core library for Daftar
//!
//! This crate contains the shared models, the local ledger store, the
//! offline-first sync engine, and the FIFO distribution algorithms used by
//! all Daftar clients.

pub mod db;
pub mod distribution;
pub mod error;
pub mod models;
pub mod state;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Amount, Customer, CustomerId, Debt, DebtId, PaidVia};
pub use state::SyncState;
