//! Last-write-wins merge of pulled server records into local state.
//!
//! On pull the server is authoritative: its field values and tombstone
//! overwrite the local record's. Keeping this as a named strategy isolates
//! the policy from the transport so a stronger merge can replace it without
//! touching the engine.

use crate::models::{Customer, CustomerId, Debt, DebtId};

use super::protocol::{RemoteCustomer, RemoteDebt};

/// Fold a pulled customer into an existing local record
#[must_use]
pub fn merge_remote_customer(local: &Customer, remote: &RemoteCustomer) -> Customer {
    Customer {
        id: local.id,
        server_id: Some(remote.id.clone()),
        name: remote.name.clone(),
        phone: remote.phone.clone(),
        notes: remote.notes.clone(),
        synced: true,
        created_at: local.created_at,
        updated_at: remote.updated_at,
        deleted_at: remote.deleted_at,
    }
}

/// Materialize a server-only customer as a new local record, preferring the
/// server-declared local identifier when it parses
#[must_use]
pub fn customer_from_remote(remote: &RemoteCustomer) -> Customer {
    let id = remote
        .local_id
        .as_deref()
        .and_then(|raw| raw.parse::<CustomerId>().ok())
        .unwrap_or_default();
    Customer {
        id,
        server_id: Some(remote.id.clone()),
        name: remote.name.clone(),
        phone: remote.phone.clone(),
        notes: remote.notes.clone(),
        synced: true,
        created_at: remote.created_at,
        updated_at: remote.updated_at,
        deleted_at: remote.deleted_at,
    }
}

/// Fold a pulled debt into an existing local record; the local customer
/// linkage is kept as-is
#[must_use]
pub fn merge_remote_debt(local: &Debt, remote: &RemoteDebt) -> Debt {
    Debt {
        id: local.id,
        server_id: Some(remote.id.clone()),
        customer_id: local.customer_id,
        amount: remote.amount,
        paid_amount: remote.paid_amount,
        note: remote.note.clone(),
        is_paid: remote.is_paid,
        paid_at: remote.paid_at,
        paid_via: remote.paid_via,
        synced: true,
        created_at: local.created_at,
        updated_at: remote.updated_at,
        deleted_at: remote.deleted_at,
    }
}

/// Materialize a server-only debt under the given (already resolved) local
/// customer
#[must_use]
pub fn debt_from_remote(remote: &RemoteDebt, customer_id: CustomerId) -> Debt {
    let id = remote
        .local_id
        .as_deref()
        .and_then(|raw| raw.parse::<DebtId>().ok())
        .unwrap_or_default();
    Debt {
        id,
        server_id: Some(remote.id.clone()),
        customer_id,
        amount: remote.amount,
        paid_amount: remote.paid_amount,
        note: remote.note.clone(),
        is_paid: remote.is_paid,
        paid_at: remote.paid_at,
        paid_via: remote.paid_via,
        synced: true,
        created_at: remote.created_at,
        updated_at: remote.updated_at,
        deleted_at: remote.deleted_at,
    }
}
