//! Sync endpoint and credential configuration.
//!
//! The credential is issued by the external authentication service; the CLI
//! only transports it. Both values come from the environment (a `.env` file
//! is honored via dotenvy in `main`).

use std::env;

use daftar_core::util::normalize_text_option;

use crate::error::CliError;

const URL_VAR: &str = "DAFTAR_SYNC_URL";
const TOKEN_VAR: &str = "DAFTAR_SYNC_TOKEN";

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub endpoint: String,
    pub credential: String,
}

/// Load sync settings, failing with a configuration hint when incomplete
pub fn load_sync_settings() -> Result<SyncSettings, CliError> {
    let endpoint = normalize_text_option(env::var(URL_VAR).ok());
    let credential = normalize_text_option(env::var(TOKEN_VAR).ok());

    match (endpoint, credential) {
        (Some(endpoint), Some(credential)) => Ok(SyncSettings {
            endpoint,
            credential,
        }),
        _ => Err(CliError::SyncNotConfigured),
    }
}
