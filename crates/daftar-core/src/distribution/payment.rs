//! FIFO partial-payment allocation.
//!
//! Pure function over an in-memory snapshot of one customer's open debts.
//! The caller turns the resulting plan into local mutations (and queue
//! entries) itself; nothing here touches storage.

use crate::error::{Error, Result};
use crate::models::{Amount, Debt, DebtId};

/// One debt's share of a payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSplit {
    pub debt_id: DebtId,
    pub amount: Amount,
}

/// Result of allocating a payment across open debts.
///
/// `sum(splits) + leftover` always equals the payment exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentPlan {
    /// Per-debt allocations, oldest debt first; debts the payment never
    /// reached have no entry
    pub splits: Vec<PaymentSplit>,
    /// Unallocated surplus once every debt is covered; disposition is the
    /// caller's decision
    pub leftover: Amount,
}

impl PaymentPlan {
    #[must_use]
    pub fn total_allocated(&self) -> Amount {
        self.splits.iter().map(|s| s.amount).sum()
    }
}

/// Allocate `payment` across `open_debts`, oldest first.
///
/// Debts are ordered by creation time, ties broken by id so the plan is
/// deterministic. Each debt receives `min(remaining payment, remaining
/// debt)`. Already-settled or tombstoned debts are skipped. A non-positive
/// payment is a validation failure, not a degenerate success.
pub fn allocate_payment(payment: Amount, open_debts: &[Debt]) -> Result<PaymentPlan> {
    if !payment.is_positive() {
        return Err(Error::InvalidAmount(format!(
            "payment must be positive, got {payment}"
        )));
    }

    let mut ordered: Vec<&Debt> = open_debts.iter().filter(|d| d.is_open()).collect();
    ordered.sort_by_key(|d| (d.created_at, d.id));

    let mut remaining = payment;
    let mut splits = Vec::new();

    for debt in ordered {
        if remaining.is_zero() {
            break;
        }
        let applied = remaining.min(debt.remaining());
        splits.push(PaymentSplit {
            debt_id: debt.id,
            amount: applied,
        });
        remaining -= applied;
    }

    Ok(PaymentPlan {
        splits,
        leftover: remaining,
    })
}
