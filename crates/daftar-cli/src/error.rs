use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] daftar_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] daftar_core::sync::TransportError),
    #[error("Invalid amount: {0}")]
    Amount(#[from] daftar_core::models::ParseAmountError),
    #[error("Customer not found for id/name: {0}")]
    CustomerNotFound(String),
    #[error("Debt not found for id/prefix: {0}")]
    DebtNotFound(String),
    #[error("{0}")]
    Ambiguous(String),
    #[error(
        "Sync is not configured. Set DAFTAR_SYNC_URL and DAFTAR_SYNC_TOKEN in the environment or a .env file."
    )]
    SyncNotConfigured,
}
