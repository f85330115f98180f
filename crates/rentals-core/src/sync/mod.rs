//! Offline-first synchronization between the local cache and the listings API.

mod engine;

use std::fmt;

use serde::Serialize;

use crate::models::ListingId;
use crate::queue::MutationKind;

pub use engine::{SyncEngine, SyncOptions};

/// The engine's belief about reachability of the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectivityState {
    /// Mutations go straight to the server
    Online,
    /// Inferred from a failed probe or request; mutations are queued
    ServerDown,
    /// Explicitly requested by the operator; sticky until cleared
    OperatorOffline,
    /// Replaying the offline queue
    Syncing,
}

impl ConnectivityState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::ServerDown => "server-down",
            Self::OperatorOffline => "operator-offline",
            Self::Syncing => "syncing",
        }
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Notifications published by the engine so callers can tell "saved" from
/// "queued" and learn about mutations that will never apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    StateChanged {
        from: ConnectivityState,
        to: ConnectivityState,
    },
    Queued {
        kind: MutationKind,
        listing: ListingId,
        pending: usize,
    },
    Replayed {
        kind: MutationKind,
        listing: ListingId,
    },
    DeadLettered {
        kind: MutationKind,
        listing: ListingId,
        reason: String,
    },
    DrainFinished {
        applied: usize,
        dead_lettered: usize,
        remaining: usize,
    },
}
