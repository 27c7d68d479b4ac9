//! Shared sync state types.

/// Unified sync state surfaced to clients for their status indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// No sync attempted yet
    Idle,
    /// Connectivity reported as down
    Offline,
    /// A full sync is in flight
    Syncing,
    /// Last full sync completed
    Synced,
    /// Last full sync failed
    Error,
}

impl SyncState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Offline => "offline",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}
