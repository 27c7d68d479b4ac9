//! Data models for Daftar

mod change;
mod customer;
mod debt;
mod money;

pub use change::{
    ChangeAction, ChangeEntry, ChangePayload, CustomerFields, DebtCreateFields, DebtUpdateFields,
    EntityKind,
};
pub use customer::{Customer, CustomerId};
pub use debt::{Debt, DebtId, PaidVia};
pub use money::{Amount, ParseAmountError};
