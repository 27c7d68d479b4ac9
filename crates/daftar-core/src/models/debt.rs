//! Debt model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Amount, CustomerId};

/// A unique identifier for a debt, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DebtId(Uuid);

impl DebtId {
    /// Create a new unique debt ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for DebtId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DebtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DebtId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// How a debt was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaidVia {
    /// The customer settled the debt directly
    Customer,
    /// Settled through one or more partial payments
    Partial,
    /// Settled by a sadaqa donation from another user
    Sadaqa,
}

impl PaidVia {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Partial => "partial",
            Self::Sadaqa => "sadaqa",
        }
    }
}

impl FromStr for PaidVia {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "partial" => Ok(Self::Partial),
            "sadaqa" => Ok(Self::Sadaqa),
            other => Err(format!("unknown paid_via value: {other}")),
        }
    }
}

/// A single debt owed by a customer.
///
/// `amount` is fixed at creation; repayment only ever increases
/// `paid_amount`. `paid_at` is set exactly once, when `is_paid` first
/// becomes true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debt {
    /// Client-generated identifier, stable across devices
    pub id: DebtId,
    /// Identifier assigned by the remote store on first successful sync
    pub server_id: Option<String>,
    /// Owning customer (local identifier)
    pub customer_id: CustomerId,
    /// Original obligation, immutable after creation
    pub amount: Amount,
    /// Cumulative repayment, `0 <= paid_amount <= amount`
    pub paid_amount: Amount,
    pub note: Option<String>,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub paid_via: Option<PaidVia>,
    /// Whether the current local state has been acknowledged by the server
    pub synced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete tombstone
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Debt {
    /// Create a new local debt record (unsynced, nothing paid yet)
    #[must_use]
    pub fn new(customer_id: CustomerId, amount: Amount, note: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: DebtId::new(),
            server_id: None,
            customer_id,
            amount,
            paid_amount: Amount::ZERO,
            note,
            is_paid: false,
            paid_at: None,
            paid_via: None,
            synced: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Outstanding amount still owed
    #[must_use]
    pub fn remaining(&self) -> Amount {
        self.amount.saturating_sub(self.paid_amount)
    }

    /// Whether this record carries a deletion tombstone
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether the debt can still receive payments
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.is_paid && !self.is_deleted() && self.remaining().is_positive()
    }

    /// Apply a repayment of `applied` through `via`.
    ///
    /// `applied` must be positive and must not exceed the remaining amount.
    /// Flips `is_paid` and stamps `paid_at` (once) when the cumulative paid
    /// amount reaches the obligation.
    pub fn apply_payment(&mut self, applied: Amount, via: PaidVia, now: DateTime<Utc>) -> Result<()> {
        if !applied.is_positive() {
            return Err(Error::InvalidAmount(format!(
                "payment must be positive, got {applied}"
            )));
        }
        if self.is_deleted() {
            return Err(Error::InvalidInput(format!("debt {} is deleted", self.id)));
        }
        if applied > self.remaining() {
            return Err(Error::InvalidAmount(format!(
                "payment {applied} exceeds remaining {}",
                self.remaining()
            )));
        }

        self.paid_amount += applied;
        self.paid_via = Some(via);
        if self.paid_amount >= self.amount && !self.is_paid {
            self.is_paid = true;
            self.paid_at = Some(now);
        }
        self.updated_at = now;
        self.synced = false;
        Ok(())
    }
}
