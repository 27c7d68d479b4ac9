#![allow(dead_code)] // each test binary uses a different slice of this helper

//! In-memory stand-in for the remote ledger store.
//!
//! Implements the sync protocol contract the real backend exposes: ordered
//! per-change outcomes with idempotent create-conflict signaling, per-user
//! pull filtering with a server-clock watermark, and the sadaqa queue with
//! FIFO donation application. The clock is logical and advances one second
//! per request so watermark behavior is deterministic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use daftar_core::distribution::{
    distribute_donation, DonationOutcome, DonationRecord, SadaqaCandidate, SadaqaEntryId, UserId,
};
use daftar_core::models::{Amount, ChangePayload, PaidVia};
use daftar_core::sync::{
    ChangeOutcome, OutcomeStatus, PullResponse, PushRequest, PushResponse, RemoteCustomer,
    RemoteDebt, SyncTransport, TransportError, TransportResult, WireChange,
};
use daftar_core::Result;

#[derive(Debug, Clone)]
struct ServerCustomer {
    id: String,
    user_id: UserId,
    local_id: String,
    name: String,
    phone: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct ServerDebt {
    id: String,
    user_id: UserId,
    customer_id: String,
    local_id: String,
    amount: Amount,
    paid_amount: Amount,
    note: Option<String>,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    paid_via: Option<PaidVia>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ServerDebt {
    fn remaining(&self) -> Amount {
        self.amount.saturating_sub(self.paid_amount)
    }
}

#[derive(Debug, Clone)]
struct QueueRow {
    id: SadaqaEntryId,
    debt_id: String,
    user_id: UserId,
    remaining: Amount,
    eligible: bool,
    enqueued_at: DateTime<Utc>,
}

struct Inner {
    tokens: HashMap<String, UserId>,
    customers: Vec<ServerCustomer>,
    debts: Vec<ServerDebt>,
    sadaqa_queue: Vec<QueueRow>,
    donations: Vec<DonationRecord>,
    clock: DateTime<Utc>,
    next_id: u64,
}

impl Inner {
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += Duration::seconds(1);
        self.clock
    }

    fn next_server_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn user_for(&self, credential: &str) -> TransportResult<UserId> {
        self.tokens
            .get(credential)
            .copied()
            .ok_or_else(|| TransportError::Api("Invalid token (401)".to_string()))
    }

    fn accept_customer_change(&mut self, user_id: UserId, change: &WireChange) -> ChangeOutcome {
        let payload = ChangePayload::from_parts(change.table, change.action, &change.data);
        let now = self.clock;
        match payload {
            Ok(ChangePayload::CustomerCreate(fields)) => {
                // Idempotent create: a second submission of the same local
                // id conflicts and reports the existing server id
                if let Some(existing) = self
                    .customers
                    .iter()
                    .find(|c| c.user_id == user_id && c.local_id == change.local_id)
                {
                    return outcome(change, Some(existing.id.clone()), OutcomeStatus::Conflict);
                }
                let id = self.next_server_id("cust");
                self.customers.push(ServerCustomer {
                    id: id.clone(),
                    user_id,
                    local_id: change.local_id.clone(),
                    name: fields.name,
                    phone: fields.phone,
                    notes: fields.notes,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                });
                outcome(change, Some(id), OutcomeStatus::Created)
            }
            Ok(ChangePayload::CustomerUpdate(fields)) => {
                match self
                    .customers
                    .iter_mut()
                    .find(|c| c.user_id == user_id && c.local_id == change.local_id)
                {
                    Some(row) => {
                        row.name = fields.name;
                        row.phone = fields.phone;
                        row.notes = fields.notes;
                        row.updated_at = now;
                        outcome(change, Some(row.id.clone()), OutcomeStatus::Updated)
                    }
                    None => outcome(change, None, OutcomeStatus::Conflict),
                }
            }
            Ok(ChangePayload::CustomerDelete) => {
                if let Some(row) = self
                    .customers
                    .iter_mut()
                    .find(|c| c.user_id == user_id && c.local_id == change.local_id)
                {
                    row.deleted_at = Some(now);
                    row.updated_at = now;
                }
                outcome(change, None, OutcomeStatus::Deleted)
            }
            _ => outcome(change, None, OutcomeStatus::Conflict),
        }
    }

    fn accept_debt_change(&mut self, user_id: UserId, change: &WireChange) -> ChangeOutcome {
        let payload = ChangePayload::from_parts(change.table, change.action, &change.data);
        let now = self.clock;
        match payload {
            Ok(ChangePayload::DebtCreate(fields)) => {
                if let Some(existing) = self
                    .debts
                    .iter()
                    .find(|d| d.user_id == user_id && d.local_id == change.local_id)
                {
                    return outcome(change, Some(existing.id.clone()), OutcomeStatus::Conflict);
                }
                let Some(customer_id) = self
                    .customers
                    .iter()
                    .find(|c| c.user_id == user_id && c.local_id == fields.customer_local_id)
                    .map(|c| c.id.clone())
                else {
                    return outcome(change, None, OutcomeStatus::Conflict);
                };
                let id = self.next_server_id("debt");
                self.debts.push(ServerDebt {
                    id: id.clone(),
                    user_id,
                    customer_id,
                    local_id: change.local_id.clone(),
                    amount: fields.amount,
                    paid_amount: Amount::ZERO,
                    note: fields.note,
                    is_paid: false,
                    paid_at: None,
                    paid_via: None,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                });
                outcome(change, Some(id), OutcomeStatus::Created)
            }
            Ok(ChangePayload::DebtUpdate(fields)) => {
                match self
                    .debts
                    .iter_mut()
                    .find(|d| d.user_id == user_id && d.local_id == change.local_id)
                {
                    Some(row) => {
                        if let Some(paid_amount) = fields.paid_amount {
                            row.paid_amount = paid_amount;
                        }
                        if let Some(is_paid) = fields.is_paid {
                            row.is_paid = is_paid;
                        }
                        if let Some(paid_at) = fields.paid_at {
                            row.paid_at.get_or_insert(paid_at);
                        }
                        if let Some(paid_via) = fields.paid_via {
                            row.paid_via = Some(paid_via);
                        }
                        if let Some(note) = fields.note {
                            row.note = Some(note);
                        }
                        row.updated_at = now;
                        outcome(change, Some(row.id.clone()), OutcomeStatus::Updated)
                    }
                    None => outcome(change, None, OutcomeStatus::Conflict),
                }
            }
            Ok(ChangePayload::DebtDelete) => {
                if let Some(row) = self
                    .debts
                    .iter_mut()
                    .find(|d| d.user_id == user_id && d.local_id == change.local_id)
                {
                    row.deleted_at = Some(now);
                    row.updated_at = now;
                }
                outcome(change, None, OutcomeStatus::Deleted)
            }
            _ => outcome(change, None, OutcomeStatus::Conflict),
        }
    }
}

fn outcome(change: &WireChange, server_id: Option<String>, status: OutcomeStatus) -> ChangeOutcome {
    ChangeOutcome {
        local_id: change.local_id.clone(),
        server_id,
        status,
    }
}

/// Shared in-memory remote store; clones point at the same state.
#[derive(Clone)]
pub struct FakeServer {
    inner: Arc<Mutex<Inner>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                tokens: HashMap::new(),
                customers: Vec::new(),
                debts: Vec::new(),
                sadaqa_queue: Vec::new(),
                donations: Vec::new(),
                clock: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
                next_id: 0,
            })),
        }
    }

    /// Register a bearer credential and the account it authenticates
    pub fn register_user(&self, token: &str) -> UserId {
        let user_id = UserId::new();
        self.inner
            .lock()
            .unwrap()
            .tokens
            .insert(token.to_string(), user_id);
        user_id
    }

    /// Seed a server-only customer (as if created from another device)
    pub fn seed_customer(&self, user_id: UserId, name: &str) -> String {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.tick();
        let id = inner.next_server_id("cust");
        inner.customers.push(ServerCustomer {
            id: id.clone(),
            user_id,
            local_id: String::new(),
            name: name.to_string(),
            phone: None,
            notes: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });
        id
    }

    /// Seed a server-only debt under an existing server customer
    pub fn seed_debt(&self, user_id: UserId, customer_id: &str, amount: Amount) -> String {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.tick();
        let id = inner.next_server_id("debt");
        inner.debts.push(ServerDebt {
            id: id.clone(),
            user_id,
            customer_id: customer_id.to_string(),
            local_id: String::new(),
            amount,
            paid_amount: Amount::ZERO,
            note: None,
            is_paid: false,
            paid_at: None,
            paid_via: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });
        id
    }

    pub fn customer_rows(&self, user_id: UserId) -> usize {
        self.inner
            .lock()
            .unwrap()
            .customers
            .iter()
            .filter(|c| c.user_id == user_id)
            .count()
    }

    pub fn customer_is_deleted(&self, server_id: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .customers
            .iter()
            .any(|c| c.id == server_id && c.deleted_at.is_some())
    }

    /// Opt a debt into the sadaqa queue, (re)computing its remaining amount
    pub fn opt_in(&self, debt_server_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.tick();
        let Some(debt) = inner.debts.iter().find(|d| d.id == debt_server_id) else {
            panic!("unknown debt {debt_server_id}");
        };
        let (user_id, remaining) = (debt.user_id, debt.remaining());

        if let Some(row) = inner
            .sadaqa_queue
            .iter_mut()
            .find(|row| row.debt_id == debt_server_id)
        {
            row.remaining = remaining;
            row.eligible = true;
        } else {
            inner.sadaqa_queue.push(QueueRow {
                id: SadaqaEntryId::new(),
                debt_id: debt_server_id.to_string(),
                user_id,
                remaining,
                eligible: true,
                enqueued_at: now,
            });
        }
    }

    pub fn opt_out(&self, debt_server_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(row) = inner
            .sadaqa_queue
            .iter_mut()
            .find(|row| row.debt_id == debt_server_id)
        {
            row.eligible = false;
        }
    }

    /// Distribute a donation across the queue, FIFO by enqueue time, and
    /// apply the allocations to debts, queue entries, and donation history
    pub fn donate(&self, credential: &str, amount: Amount, anonymous: bool) -> Result<DonationOutcome> {
        let mut inner = self.inner.lock().unwrap();
        let donor_id = inner
            .user_for(credential)
            .map_err(daftar_core::Error::Transport)?;
        let now = inner.tick();

        let queue: Vec<SadaqaCandidate> = inner
            .sadaqa_queue
            .iter()
            .filter_map(|row| {
                let debt = inner.debts.iter().find(|d| d.id == row.debt_id)?;
                Some(SadaqaCandidate {
                    entry_id: row.id,
                    debt_id: debt.local_id.parse().unwrap_or_default(),
                    recipient_id: row.user_id,
                    enqueued_at: row.enqueued_at,
                    eligible: row.eligible,
                    remaining: row.remaining,
                    debt_amount: debt.amount,
                    debt_paid_amount: debt.paid_amount,
                })
            })
            .collect();

        let result = distribute_donation(donor_id, amount, anonymous, &queue)?;

        for allocation in &result.allocations {
            let Some(row) = inner
                .sadaqa_queue
                .iter()
                .position(|r| r.id == allocation.entry_id)
            else {
                continue;
            };
            let debt_id = inner.sadaqa_queue[row].debt_id.clone();
            inner.sadaqa_queue[row].remaining -= allocation.amount;

            if let Some(debt) = inner.debts.iter_mut().find(|d| d.id == debt_id) {
                debt.paid_amount = allocation.debt_paid_amount;
                debt.paid_via = Some(PaidVia::Sadaqa);
                if allocation.debt_paid_in_full && !debt.is_paid {
                    debt.is_paid = true;
                    debt.paid_at = Some(now);
                }
                debt.updated_at = now;
            }
        }
        inner.donations.extend(result.donations.iter().cloned());

        Ok(result)
    }

    pub fn donation_records(&self) -> Vec<DonationRecord> {
        self.inner.lock().unwrap().donations.clone()
    }
}

impl Default for FakeServer {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncTransport for FakeServer {
    async fn push_changes(
        &self,
        credential: &str,
        request: &PushRequest,
    ) -> TransportResult<PushResponse> {
        let mut inner = self.inner.lock().unwrap();
        let user_id = inner.user_for(credential)?;
        inner.tick();

        let results = request
            .changes
            .iter()
            .map(|change| match change.table {
                daftar_core::models::EntityKind::Customers => {
                    inner.accept_customer_change(user_id, change)
                }
                daftar_core::models::EntityKind::Debts => {
                    inner.accept_debt_change(user_id, change)
                }
            })
            .collect();

        Ok(PushResponse { results })
    }

    async fn pull_changes(
        &self,
        credential: &str,
        since: Option<DateTime<Utc>>,
    ) -> TransportResult<PullResponse> {
        let mut inner = self.inner.lock().unwrap();
        let user_id = inner.user_for(credential)?;
        let server_time = inner.tick();
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        let since = since.unwrap_or(epoch);

        let customers = inner
            .customers
            .iter()
            .filter(|c| c.user_id == user_id)
            .filter(|c| c.updated_at > since || c.deleted_at.is_some_and(|d| d > since))
            .map(|c| RemoteCustomer {
                id: c.id.clone(),
                local_id: (!c.local_id.is_empty()).then(|| c.local_id.clone()),
                name: c.name.clone(),
                phone: c.phone.clone(),
                notes: c.notes.clone(),
                created_at: c.created_at,
                updated_at: c.updated_at,
                deleted_at: c.deleted_at,
            })
            .collect();

        let debts = inner
            .debts
            .iter()
            .filter(|d| d.user_id == user_id)
            .filter(|d| d.updated_at > since || d.deleted_at.is_some_and(|t| t > since))
            .map(|d| RemoteDebt {
                id: d.id.clone(),
                local_id: (!d.local_id.is_empty()).then(|| d.local_id.clone()),
                customer_id: d.customer_id.clone(),
                amount: d.amount,
                paid_amount: d.paid_amount,
                note: d.note.clone(),
                is_paid: d.is_paid,
                paid_at: d.paid_at,
                paid_via: d.paid_via,
                created_at: d.created_at,
                updated_at: d.updated_at,
                deleted_at: d.deleted_at,
            })
            .collect();

        Ok(PullResponse {
            customers,
            debts,
            server_time,
        })
    }
}
