//! Push/pull synchronizers and the full-sync orchestrator.
//!
//! All failure modes resolve to a boolean: callers render a status
//! indicator, they never unwind. Transport failures leave the queue and
//! watermark intact for the next attempt; per-entry conflicts are logged,
//! dropped with the rest of the drained queue, and corrected by the next
//! pull.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::db::LedgerStore;
use crate::error::Result;
use crate::models::{CustomerId, DebtId, EntityKind};
use crate::state::SyncState;

use super::merge::{
    customer_from_remote, debt_from_remote, merge_remote_customer, merge_remote_debt,
};
use super::protocol::{OutcomeStatus, PushRequest, RemoteCustomer, RemoteDebt};
use super::transport::SyncTransport;

#[derive(Debug, Clone, Copy)]
struct PullSummary {
    customers: usize,
    debts: usize,
    deferred: usize,
}

/// Synchronization engine for one device.
///
/// Owns the connectivity flag, the single-flight guards, and the observable
/// [`SyncState`]. The local store is passed per call; the engine suspends
/// only at network boundaries.
pub struct SyncEngine<T> {
    transport: T,
    online: AtomicBool,
    push_guard: AtomicBool,
    sync_guard: AtomicBool,
    state: AtomicU8,
}

impl<T: SyncTransport> SyncEngine<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            online: AtomicBool::new(true),
            push_guard: AtomicBool::new(false),
            sync_guard: AtomicBool::new(false),
            state: AtomicU8::new(encode_state(SyncState::Idle)),
        }
    }

    /// Current sync state for status indicators
    pub fn state(&self) -> SyncState {
        decode_state(self.state.load(Ordering::SeqCst))
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Record a connectivity transition; callers invoke `full_sync` on the
    /// offline-to-online edge
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        if !online {
            self.set_state(SyncState::Offline);
        }
    }

    /// Drain the change queue to the server.
    ///
    /// Returns true when the batch request completed, regardless of
    /// per-entry conflicts; false when offline, when another push is in
    /// flight, or on transport failure (queue left intact).
    pub async fn push<S: LedgerStore>(&self, store: &S, credential: &str) -> bool {
        if !self.is_online() {
            tracing::debug!("skipping push: offline");
            return false;
        }
        if self.push_guard.swap(true, Ordering::SeqCst) {
            tracing::debug!("skipping push: another push is in flight");
            return false;
        }

        let result = self.push_batch(store, credential).await;
        self.push_guard.store(false, Ordering::SeqCst);

        match result {
            Ok(0) => true,
            Ok(count) => {
                tracing::info!(changes = count, "pushed change batch");
                true
            }
            Err(error) => {
                tracing::warn!(%error, "push failed; queue left intact");
                false
            }
        }
    }

    async fn push_batch<S: LedgerStore>(&self, store: &S, credential: &str) -> Result<usize> {
        let pending = store.pending_changes()?;
        if pending.is_empty() {
            return Ok(0);
        }

        let request = PushRequest::from_entries(&pending)?;
        let response = self.transport.push_changes(credential, &request).await?;
        if response.results.len() != pending.len() {
            tracing::warn!(
                sent = pending.len(),
                received = response.results.len(),
                "push response is not one-to-one with the batch"
            );
        }

        let entities: HashMap<&str, EntityKind> = pending
            .iter()
            .map(|entry| (entry.local_id.as_str(), entry.payload.entity()))
            .collect();

        for outcome in &response.results {
            match outcome.status {
                OutcomeStatus::Created | OutcomeStatus::Updated => {
                    if let Some(&entity) = entities.get(outcome.local_id.as_str()) {
                        store.mark_synced(entity, &outcome.local_id, outcome.server_id())?;
                    }
                }
                OutcomeStatus::Deleted => {}
                OutcomeStatus::Conflict => {
                    tracing::warn!(
                        local_id = %outcome.local_id,
                        "change rejected as conflict; the next pull re-establishes server state"
                    );
                }
            }
        }

        // Conflict entries are not retried: the queue always drains fully
        // and the next pull reconciles.
        store.clear_queue()?;
        Ok(pending.len())
    }

    /// Merge all remote records changed since the watermark.
    ///
    /// Returns false when offline or on transport failure (watermark left
    /// intact).
    pub async fn pull<S: LedgerStore>(&self, store: &S, credential: &str) -> bool {
        if !self.is_online() {
            tracing::debug!("skipping pull: offline");
            return false;
        }

        match self.pull_batch(store, credential).await {
            Ok(summary) => {
                if summary.customers > 0 || summary.debts > 0 || summary.deferred > 0 {
                    tracing::info!(
                        customers = summary.customers,
                        debts = summary.debts,
                        deferred = summary.deferred,
                        "merged pulled records"
                    );
                }
                true
            }
            Err(error) => {
                tracing::warn!(%error, "pull failed; watermark left intact");
                false
            }
        }
    }

    async fn pull_batch<S: LedgerStore>(&self, store: &S, credential: &str) -> Result<PullSummary> {
        let since = store.last_pull_at()?;
        let response = self.transport.pull_changes(credential, since).await?;

        for remote in &response.customers {
            Self::apply_remote_customer(store, remote)?;
        }

        let mut deferred = 0usize;
        for remote in &response.debts {
            if !Self::apply_remote_debt(store, remote)? {
                deferred += 1;
            }
        }

        // Advance to the server clock, not ours: client clock skew must not
        // shrink or stretch the next fetch window.
        store.set_last_pull_at(response.server_time)?;

        Ok(PullSummary {
            customers: response.customers.len(),
            debts: response.debts.len() - deferred,
            deferred,
        })
    }

    fn apply_remote_customer<S: LedgerStore>(store: &S, remote: &RemoteCustomer) -> Result<()> {
        if let Some(local) = store.find_customer_by_server_id(&remote.id)? {
            return store.upsert_customer(&merge_remote_customer(&local, remote));
        }

        // A record pushed earlier whose acknowledgement was lost comes back
        // under its original local id; merge instead of duplicating.
        let by_local_id = remote
            .local_id
            .as_deref()
            .and_then(|raw| raw.parse::<CustomerId>().ok())
            .map(|id| store.get_customer(&id))
            .transpose()?
            .flatten();
        if let Some(local) = by_local_id {
            return store.upsert_customer(&merge_remote_customer(&local, remote));
        }

        store.upsert_customer(&customer_from_remote(remote))
    }

    /// Returns false when the debt's owning customer is not known locally
    /// yet; the record is skipped and resolves on a later cycle.
    fn apply_remote_debt<S: LedgerStore>(store: &S, remote: &RemoteDebt) -> Result<bool> {
        if let Some(local) = store.find_debt_by_server_id(&remote.id)? {
            store.upsert_debt(&merge_remote_debt(&local, remote))?;
            return Ok(true);
        }

        let by_local_id = remote
            .local_id
            .as_deref()
            .and_then(|raw| raw.parse::<DebtId>().ok())
            .map(|id| store.get_debt(&id))
            .transpose()?
            .flatten();
        if let Some(local) = by_local_id {
            store.upsert_debt(&merge_remote_debt(&local, remote))?;
            return Ok(true);
        }

        let Some(customer) = store.find_customer_by_server_id(&remote.customer_id)? else {
            tracing::debug!(
                server_id = %remote.id,
                "deferring pulled debt: owning customer not local yet"
            );
            return Ok(false);
        };
        store.upsert_debt(&debt_from_remote(remote, customer.id))?;
        Ok(true)
    }

    /// Push, then pull; the single idempotent entry point invoked on
    /// reconnect, on foreground, and periodically.
    ///
    /// Re-entrant calls observe the in-flight guard and no-op to false.
    /// The pull decides the overall outcome: a failed push only delays
    /// those changes until the next cycle.
    pub async fn full_sync<S: LedgerStore>(&self, store: &S, credential: &str) -> bool {
        if self.sync_guard.swap(true, Ordering::SeqCst) {
            tracing::debug!("skipping full sync: already in flight");
            return false;
        }
        self.set_state(SyncState::Syncing);

        let _ = self.push(store, credential).await;
        let ok = self.pull(store, credential).await;

        self.set_state(if ok {
            SyncState::Synced
        } else if self.is_online() {
            SyncState::Error
        } else {
            SyncState::Offline
        });
        self.sync_guard.store(false, Ordering::SeqCst);
        ok
    }

    fn set_state(&self, state: SyncState) {
        self.state.store(encode_state(state), Ordering::SeqCst);
    }
}

const fn encode_state(state: SyncState) -> u8 {
    match state {
        SyncState::Idle => 0,
        SyncState::Offline => 1,
        SyncState::Syncing => 2,
        SyncState::Synced => 3,
        SyncState::Error => 4,
    }
}

const fn decode_state(raw: u8) -> SyncState {
    match raw {
        1 => SyncState::Offline,
        2 => SyncState::Syncing,
        3 => SyncState::Synced,
        4 => SyncState::Error,
        _ => SyncState::Idle,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::db::Database;
    use crate::models::CustomerFields;
    use crate::sync::protocol::{PullResponse, PushResponse};
    use crate::sync::transport::{TransportError, TransportResult};

    /// Transport that fails every request at the network layer
    struct DeadTransport;

    impl SyncTransport for DeadTransport {
        async fn push_changes(
            &self,
            _credential: &str,
            _request: &PushRequest,
        ) -> TransportResult<PushResponse> {
            Err(TransportError::Api("server unreachable (503)".to_string()))
        }

        async fn pull_changes(
            &self,
            _credential: &str,
            _since: Option<DateTime<Utc>>,
        ) -> TransportResult<PullResponse> {
            Err(TransportError::Api("server unreachable (503)".to_string()))
        }
    }

    /// Transport that must never be reached
    struct UnreachableTransport;

    impl SyncTransport for UnreachableTransport {
        async fn push_changes(
            &self,
            _credential: &str,
            _request: &PushRequest,
        ) -> TransportResult<PushResponse> {
            panic!("transport must not be contacted");
        }

        async fn pull_changes(
            &self,
            _credential: &str,
            _since: Option<DateTime<Utc>>,
        ) -> TransportResult<PullResponse> {
            panic!("transport must not be contacted");
        }
    }

    fn seed(store: &impl LedgerStore) {
        store
            .create_customer(CustomerFields {
                name: "Hassan".to_string(),
                phone: None,
                notes: None,
            })
            .unwrap();
    }

    #[tokio::test]
    async fn offline_push_returns_false_without_contacting_server() {
        let db = Database::open_in_memory().unwrap();
        let store = db.ledger();
        seed(&store);

        let engine = SyncEngine::new(UnreachableTransport);
        engine.set_online(false);

        assert!(!engine.push(&store, "token").await);
        assert_eq!(store.queue_len().unwrap(), 1);
        assert!(!engine.pull(&store, "token").await);
        assert_eq!(engine.state(), SyncState::Offline);
    }

    #[tokio::test]
    async fn transport_failure_leaves_queue_and_watermark_intact() {
        let db = Database::open_in_memory().unwrap();
        let store = db.ledger();
        seed(&store);

        let engine = SyncEngine::new(DeadTransport);
        assert!(!engine.push(&store, "token").await);
        assert_eq!(store.queue_len().unwrap(), 1);

        assert!(!engine.pull(&store, "token").await);
        assert!(store.last_pull_at().unwrap().is_none());

        assert!(!engine.full_sync(&store, "token").await);
        assert_eq!(engine.state(), SyncState::Error);
    }

    #[tokio::test]
    async fn empty_queue_push_succeeds_trivially() {
        let db = Database::open_in_memory().unwrap();
        let store = db.ledger();

        // No entries queued, so the transport is never contacted
        let engine = SyncEngine::new(UnreachableTransport);
        assert!(engine.push(&store, "token").await);
    }
}
