//! Change queue model
//!
//! Every mutation on the normal write path appends one entry; entries drain
//! to the server in FIFO order so that, for a given record, a create always
//! reaches the server before a later update of the same local id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Amount, PaidVia};

/// Mutation kind carried by a queue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl ChangeAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(Error::InvalidInput(format!("unknown change action: {other}"))),
        }
    }
}

/// Entity table a queue entry targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Customers,
    Debts,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Debts => "debts",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "customers" => Ok(Self::Customers),
            "debts" => Ok(Self::Debts),
            other => Err(Error::InvalidInput(format!("unknown entity table: {other}"))),
        }
    }
}

/// Customer fields carried by create/update changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerFields {
    pub name: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// Debt fields carried by a create change.
///
/// The owning customer travels as its *local* id; FIFO draining guarantees
/// the customer's own create reaches the server first, so the server can
/// resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtCreateFields {
    pub customer_local_id: String,
    pub amount: Amount,
    pub note: Option<String>,
}

/// Debt fields carried by an update change; absent fields are left
/// untouched by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DebtUpdateFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_paid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_via: Option<PaidVia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Statically-typed change payload, one variant per `{table, action}` pair.
///
/// Deletes carry no data; the tombstone timestamp is the entry's own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangePayload {
    CustomerCreate(CustomerFields),
    CustomerUpdate(CustomerFields),
    CustomerDelete,
    DebtCreate(DebtCreateFields),
    DebtUpdate(DebtUpdateFields),
    DebtDelete,
}

impl ChangePayload {
    #[must_use]
    pub const fn action(&self) -> ChangeAction {
        match self {
            Self::CustomerCreate(_) | Self::DebtCreate(_) => ChangeAction::Create,
            Self::CustomerUpdate(_) | Self::DebtUpdate(_) => ChangeAction::Update,
            Self::CustomerDelete | Self::DebtDelete => ChangeAction::Delete,
        }
    }

    #[must_use]
    pub const fn entity(&self) -> EntityKind {
        match self {
            Self::CustomerCreate(_) | Self::CustomerUpdate(_) | Self::CustomerDelete => {
                EntityKind::Customers
            }
            Self::DebtCreate(_) | Self::DebtUpdate(_) | Self::DebtDelete => EntityKind::Debts,
        }
    }

    /// Wire `data` object for this payload (`Null` for deletes)
    pub fn to_data(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Self::CustomerCreate(fields) | Self::CustomerUpdate(fields) => {
                serde_json::to_value(fields)?
            }
            Self::DebtCreate(fields) => serde_json::to_value(fields)?,
            Self::DebtUpdate(fields) => serde_json::to_value(fields)?,
            Self::CustomerDelete | Self::DebtDelete => serde_json::Value::Null,
        })
    }

    /// Reassemble a payload from its stored `{table, action, data}` parts
    pub fn from_parts(
        entity: EntityKind,
        action: ChangeAction,
        data: &serde_json::Value,
    ) -> Result<Self> {
        Ok(match (entity, action) {
            (EntityKind::Customers, ChangeAction::Create) => {
                Self::CustomerCreate(serde_json::from_value(data.clone())?)
            }
            (EntityKind::Customers, ChangeAction::Update) => {
                Self::CustomerUpdate(serde_json::from_value(data.clone())?)
            }
            (EntityKind::Customers, ChangeAction::Delete) => Self::CustomerDelete,
            (EntityKind::Debts, ChangeAction::Create) => {
                Self::DebtCreate(serde_json::from_value(data.clone())?)
            }
            (EntityKind::Debts, ChangeAction::Update) => {
                Self::DebtUpdate(serde_json::from_value(data.clone())?)
            }
            (EntityKind::Debts, ChangeAction::Delete) => Self::DebtDelete,
        })
    }
}

/// A pending mutation waiting to be pushed to the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    /// Queue row id; drain order is ascending id (FIFO)
    pub id: i64,
    /// Local identifier of the affected record
    pub local_id: String,
    pub payload: ChangePayload,
    pub timestamp: DateTime<Utc>,
}
