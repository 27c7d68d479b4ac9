//! Customer model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for a customer, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CustomerId(Uuid);

impl CustomerId {
    /// Create a new unique customer ID using UUID v7
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

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CustomerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A customer in the merchant's ledger.
///
/// The local id is generated at creation time and stays stable for the
/// lifetime of the record; the server id arrives on first successful sync.
/// Deletion is a tombstone (`deleted_at`), never a physical removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Client-generated identifier, stable across devices
    pub id: CustomerId,
    /// Identifier assigned by the remote store on first successful sync
    pub server_id: Option<String>,
    pub name: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    /// Whether the current local state has been acknowledged by the server
    pub synced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete tombstone
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Customer {
    /// Create a new local customer record (unsynced, no server id yet)
    #[must_use]
    pub fn new(name: impl Into<String>, phone: Option<String>, notes: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CustomerId::new(),
            server_id: None,
            name: name.into(),
            phone,
            notes,
            synced: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Whether this record carries a deletion tombstone
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_id_unique() {
        let id1 = CustomerId::new();
        let id2 = CustomerId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_customer_id_parse() {
        let id = CustomerId::new();
        let parsed: CustomerId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_customer_new() {
        let customer = Customer::new("Hassan", Some("0612345678".to_string()), None);
        assert_eq!(customer.name, "Hassan");
        assert!(!customer.synced);
        assert!(customer.server_id.is_none());
        assert!(!customer.is_deleted());
        assert_eq!(customer.created_at, customer.updated_at);
    }
}
