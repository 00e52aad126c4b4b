//! Read-only entity state snapshots.

use serde::Serialize;

/// Point-in-time view of one entity's mutable state.
///
/// Produced on demand for external metrics collectors; taking a snapshot
/// never mutates the entity, and a snapshot does not track later changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EntitySnapshot {
    Service {
        is_down: bool,
        active_requests: u32,
        queued_requests: usize,
    },
    Database {
        is_down: bool,
        active_connections: u32,
        queued_requests: usize,
    },
    NetworkLink {
        is_down: bool,
        in_flight: u32,
    },
}

impl EntitySnapshot {
    /// Whether the entity was down when the snapshot was taken.
    pub fn is_down(&self) -> bool {
        match self {
            EntitySnapshot::Service { is_down, .. }
            | EntitySnapshot::Database { is_down, .. }
            | EntitySnapshot::NetworkLink { is_down, .. } => *is_down,
        }
    }
}
