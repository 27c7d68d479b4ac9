//! Offline-first synchronization engine.
//!
//! Local mutations accumulate in the change queue; the push synchronizer
//! drains them to the remote store as one ordered batch, the pull
//! synchronizer merges server records changed since the last watermark, and
//! the orchestrator sequences push-then-pull behind a single-flight guard.

mod engine;
mod merge;
mod protocol;
mod transport;

pub use engine::SyncEngine;
pub use merge::{
    customer_from_remote, debt_from_remote, merge_remote_customer, merge_remote_debt,
};
pub use protocol::{
    ChangeOutcome, OutcomeStatus, PullResponse, PushRequest, PushResponse, RemoteCustomer,
    RemoteDebt, WireChange,
};
pub use transport::{HttpSyncTransport, SyncTransport, TransportError, TransportResult};
