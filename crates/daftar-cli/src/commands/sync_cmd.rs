use std::path::Path;
use std::time::Duration;

use daftar_core::db::LedgerStore;
use daftar_core::sync::{HttpSyncTransport, SyncEngine};

use crate::commands::common::open_database;
use crate::config::load_sync_settings;
use crate::error::CliError;

pub async fn run_sync(watch: bool, interval: u64, db_path: &Path) -> Result<(), CliError> {
    let settings = load_sync_settings()?;
    let transport = HttpSyncTransport::new(settings.endpoint)?;
    let engine = SyncEngine::new(transport);

    let db = open_database(db_path)?;
    let store = db.ledger();

    if !watch {
        sync_once(&engine, &store, &settings.credential).await;
        return Ok(());
    }

    // Periodic mode: one cycle immediately, then on the interval. The
    // engine's guard makes overlapping ticks a no-op.
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    loop {
        ticker.tick().await;
        sync_once(&engine, &store, &settings.credential).await;
    }
}

async fn sync_once(
    engine: &SyncEngine<HttpSyncTransport>,
    store: &impl LedgerStore,
    credential: &str,
) {
    let pending_before = store.queue_len().unwrap_or(0);
    if engine.full_sync(store, credential).await {
        if pending_before > 0 {
            println!("Sync completed ({pending_before} changes pushed)");
        } else {
            println!("Sync completed");
        }
    } else {
        // Failures are a status, not a crash; local state is untouched
        println!("Sync failed ({}); will retry", engine.state().as_str());
    }
}
