//! FIFO distribution algorithms.
//!
//! Both distributors operate purely on in-memory snapshots and report
//! exact leftovers; turning their output into mutations is the caller's
//! job.

mod payment;
mod sadaqa;

pub use payment::{allocate_payment, PaymentPlan, PaymentSplit};
pub use sadaqa::{
    distribute_donation, DonationOutcome, DonationRecord, SadaqaAllocation, SadaqaCandidate,
    SadaqaEntryId, UserId,
};
