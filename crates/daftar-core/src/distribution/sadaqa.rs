//! Cross-user sadaqa donation distribution.
//!
//! A donation walks the global FIFO queue of opted-in debts (oldest
//! enqueued first, across all users) and pays them down until the amount
//! runs out. Pure function over a queue snapshot; the caller (the remote
//! store) applies the resulting allocations and persists the donation
//! records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Amount, DebtId};

/// A unique identifier for a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A unique identifier for a sadaqa queue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SadaqaEntryId(Uuid);

impl SadaqaEntryId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SadaqaEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SadaqaEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One opted-in debt as seen by the distributor: the queue entry joined
/// with the debt figures it pays against. A debt has at most one active
/// entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SadaqaCandidate {
    pub entry_id: SadaqaEntryId,
    pub debt_id: DebtId,
    /// Owner of the debt (the donation's recipient)
    pub recipient_id: UserId,
    /// FIFO key: when the debt was opted into the queue
    pub enqueued_at: DateTime<Utc>,
    pub eligible: bool,
    /// Remaining donation-eligible amount on the queue entry; lags the
    /// debt's own remainder when an earlier donation partially covered it
    pub remaining: Amount,
    pub debt_amount: Amount,
    pub debt_paid_amount: Amount,
}

impl SadaqaCandidate {
    fn debt_remaining(&self) -> Amount {
        self.debt_amount.saturating_sub(self.debt_paid_amount)
    }
}

/// One applied slice of a donation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SadaqaAllocation {
    pub entry_id: SadaqaEntryId,
    pub debt_id: DebtId,
    pub recipient_id: UserId,
    pub amount: Amount,
    /// Cumulative paid amount on the debt after this allocation
    pub debt_paid_amount: Amount,
    /// Whether this allocation settled the debt
    pub debt_paid_in_full: bool,
}

/// Donation event to persist for history and receipts.
///
/// For anonymous donations the donor identity is withheld entirely; no
/// external surface can attribute the payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationRecord {
    pub donor_id: Option<UserId>,
    pub debt_id: DebtId,
    pub amount: Amount,
    pub anonymous: bool,
}

/// Result of distributing one donation.
///
/// `total_donated + leftover` always equals the donated amount exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationOutcome {
    pub allocations: Vec<SadaqaAllocation>,
    pub donations: Vec<DonationRecord>,
    pub total_donated: Amount,
    pub leftover: Amount,
}

/// Distribute `amount` from `donor_id` across the eligible queue.
///
/// The queue is walked globally oldest-enqueued-first (ties broken by entry
/// id). Entries that are ineligible, exhausted, or belong to the donor are
/// skipped even though the caller's contract is to pre-filter them. Each
/// applied slice decrements the entry's remaining amount and the debt's
/// remainder together and yields one donation record.
pub fn distribute_donation(
    donor_id: UserId,
    amount: Amount,
    anonymous: bool,
    queue: &[SadaqaCandidate],
) -> Result<DonationOutcome> {
    if !amount.is_positive() {
        return Err(Error::InvalidAmount(format!(
            "donation must be positive, got {amount}"
        )));
    }

    let mut ordered: Vec<&SadaqaCandidate> = queue
        .iter()
        .filter(|c| c.eligible && c.remaining.is_positive() && c.recipient_id != donor_id)
        .collect();
    ordered.sort_by_key(|c| (c.enqueued_at, c.entry_id));

    let mut remaining_donation = amount;
    let mut allocations = Vec::new();
    let mut donations = Vec::new();

    for candidate in ordered {
        if remaining_donation.is_zero() {
            break;
        }

        // Never pay past the debt itself, even if the queue entry is stale
        let applied = remaining_donation
            .min(candidate.remaining)
            .min(candidate.debt_remaining());
        if !applied.is_positive() {
            continue;
        }

        let debt_paid_amount = candidate.debt_paid_amount + applied;
        allocations.push(SadaqaAllocation {
            entry_id: candidate.entry_id,
            debt_id: candidate.debt_id,
            recipient_id: candidate.recipient_id,
            amount: applied,
            debt_paid_amount,
            debt_paid_in_full: debt_paid_amount >= candidate.debt_amount,
        });
        donations.push(DonationRecord {
            donor_id: (!anonymous).then_some(donor_id),
            debt_id: candidate.debt_id,
            amount: applied,
            anonymous,
        });
        remaining_donation -= applied;
    }

    Ok(DonationOutcome {
        total_donated: amount - remaining_donation,
        leftover: remaining_donation,
        allocations,
        donations,
    })
}
