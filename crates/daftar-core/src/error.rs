//! Error types for daftar-core

use thiserror::Error;

use crate::sync::TransportError;

/// Result type alias using daftar-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in daftar-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Sync transport error
    #[error("Sync transport error: {0}")]
    Transport(#[from] TransportError),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid monetary amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}
