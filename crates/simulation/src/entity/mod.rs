//! Entity state machines.
//!
//! Every entity is an immutable `Context` (parameters fixed at build time)
//! plus a mutable `State`. Handlers are synchronous and deterministic:
//! one event in, state mutated, zero or more follow-up events out through
//! the scheduler. A handler touches only its own entity's state; reaching
//! another entity always means scheduling an event addressed to it.

mod database;
mod link;
mod service;

pub use database::{DatabaseContext, DatabaseState};
pub use link::{LinkContext, LinkState};
pub use service::{ServiceContext, ServiceState};

use crate::latency::LatencyAnalyzer;
use crate::sampler::Sampler;
use crate::stats::RunStats;
use loadsim_core::{Event, ScheduleError, Scheduler};
use loadsim_types::EntitySnapshot;
use tracing::warn;

/// Everything a handler may touch besides its own entity's state.
pub(crate) struct HandlerEnv<'a> {
    pub scheduler: Scheduler<'a>,
    pub sampler: Sampler<'a>,
    pub stats: &'a mut RunStats,
    pub latency: Option<&'a mut LatencyAnalyzer>,
    /// Optional bound on every wait line; `None` means unbounded.
    pub max_queue_depth: Option<usize>,
}

/// A live topology entity: immutable context plus mutable state.
///
/// The kind set is closed, so dispatch is a match rather than a virtual
/// call, and contexts/states live directly in the topology arena.
#[derive(Debug, PartialEq)]
pub enum Entity {
    Service {
        context: ServiceContext,
        state: ServiceState,
    },
    Database {
        context: DatabaseContext,
        state: DatabaseState,
    },
    NetworkLink {
        context: LinkContext,
        state: LinkState,
    },
}

impl Entity {
    /// Consume one event, mutating this entity's state and possibly
    /// scheduling follow-up events.
    pub(crate) fn handle(
        &mut self,
        event: &Event,
        env: &mut HandlerEnv<'_>,
    ) -> Result<(), ScheduleError> {
        match self {
            Entity::Service { context, state } => service::handle(context, state, event, env),
            Entity::Database { context, state } => database::handle(context, state, event, env),
            Entity::NetworkLink { context, state } => link::handle(context, state, event, env),
        }
    }

    /// Read-only view of the current state.
    pub fn snapshot(&self) -> EntitySnapshot {
        match self {
            Entity::Service { state, .. } => EntitySnapshot::Service {
                is_down: state.is_down,
                active_requests: state.active_requests,
                queued_requests: state.queued.len(),
            },
            Entity::Database { state, .. } => EntitySnapshot::Database {
                is_down: state.is_down,
                active_connections: state.active_connections,
                queued_requests: state.queued.len(),
            },
            Entity::NetworkLink { state, .. } => EntitySnapshot::NetworkLink {
                is_down: state.is_down,
                in_flight: state.in_flight,
            },
        }
    }
}

/// Record an event kind the target entity has no transition for.
///
/// Not fatal: a mis-addressed kind is a modeling oddity worth surfacing,
/// not a structural defect.
pub(crate) fn unhandled(entity_kind: &'static str, event: &Event, env: &mut HandlerEnv<'_>) {
    env.stats.unhandled_events += 1;
    warn!(
        target_entity = %event.target,
        entity_kind,
        kind = ?event.kind,
        "Event kind has no transition for this entity"
    );
}
