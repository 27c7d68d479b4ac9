//! Wire types for the sync protocol.
//!
//! Timestamps travel as RFC 3339 strings, amounts as integer minor units.
//! Push responses pair one outcome with each submitted change, in request
//! order; pull responses carry both the server identifier and the record's
//! originating local identifier so the puller can match without guessing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Amount, ChangeAction, ChangeEntry, EntityKind, PaidVia};

/// One queued mutation as submitted to the change-acceptance endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireChange {
    pub action: ChangeAction,
    pub table: EntityKind,
    pub local_id: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Batch of queued mutations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRequest {
    pub changes: Vec<WireChange>,
}

impl PushRequest {
    /// Build the wire batch from queue entries, preserving FIFO order
    pub fn from_entries(entries: &[ChangeEntry]) -> Result<Self> {
        let changes = entries
            .iter()
            .map(|entry| {
                Ok(WireChange {
                    action: entry.payload.action(),
                    table: entry.payload.entity(),
                    local_id: entry.local_id.clone(),
                    data: entry.payload.to_data()?,
                    timestamp: entry.timestamp,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { changes })
    }
}

/// Per-change outcome status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Created,
    Updated,
    Deleted,
    Conflict,
}

/// Outcome for one submitted change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOutcome {
    pub local_id: String,
    #[serde(default)]
    pub server_id: Option<String>,
    pub status: OutcomeStatus,
}

impl ChangeOutcome {
    /// Server id, treating the empty string as absent
    #[must_use]
    pub fn server_id(&self) -> Option<&str> {
        self.server_id.as_deref().filter(|s| !s.is_empty())
    }
}

/// Response of the change-acceptance endpoint, one-to-one with the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushResponse {
    pub results: Vec<ChangeOutcome>,
}

/// A customer row as served by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCustomer {
    /// Server identifier
    pub id: String,
    /// Local identifier the record originated with, if any
    pub local_id: Option<String>,
    pub name: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A debt row as served by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDebt {
    /// Server identifier
    pub id: String,
    /// Local identifier the record originated with, if any
    pub local_id: Option<String>,
    /// Server identifier of the owning customer
    pub customer_id: String,
    pub amount: Amount,
    pub paid_amount: Amount,
    pub note: Option<String>,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub paid_via: Option<PaidVia>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Response of the pull endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullResponse {
    pub customers: Vec<RemoteCustomer>,
    pub debts: Vec<RemoteDebt>,
    /// Server clock at response time; becomes the next pull watermark
    pub server_time: DateTime<Utc>,
}
