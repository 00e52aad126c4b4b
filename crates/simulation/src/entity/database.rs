//! Database entity: connection admission and queueing.
//!
//! Structurally the same machine as a service, but the bound is named
//! `max_connections` and occupancy counts connections, matching how the
//! component is configured in the infrastructure description.

use super::{unhandled, HandlerEnv};
use loadsim_core::{Event, EventKind, ScheduleError};
use loadsim_types::{EntityId, Outcome};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::trace;

/// Immutable database parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseContext {
    /// Maximum concurrent connections.
    pub max_connections: u32,
    /// Mean query processing time in seconds.
    pub latency_mean: f64,
    /// Probability that an admitted query fails.
    pub failure_prob: f64,
    /// Links whose `from` endpoint is this database.
    pub downstream: Vec<EntityId>,
}

/// Mutable database state.
#[derive(Debug, Default, PartialEq)]
pub struct DatabaseState {
    pub is_down: bool,
    pub active_connections: u32,
    pub queued: VecDeque<Duration>,
}

pub(super) fn handle(
    context: &DatabaseContext,
    state: &mut DatabaseState,
    event: &Event,
    env: &mut HandlerEnv<'_>,
) -> Result<(), ScheduleError> {
    match event.kind {
        EventKind::Arrival => on_arrival(context, state, event, env),
        EventKind::Completion { outcome } => on_completion(context, state, event, outcome, env),
        EventKind::Fail => {
            state.is_down = true;
            env.stats.faults += 1;
            trace!(target_entity = %event.target, "Database down");
            Ok(())
        }
        EventKind::Recover => {
            state.is_down = false;
            env.stats.recoveries += 1;
            trace!(target_entity = %event.target, "Database recovered");
            Ok(())
        }
        EventKind::LinkArrive | EventKind::LinkDepart { .. } => {
            unhandled("database", event, env);
            Ok(())
        }
    }
}

fn on_arrival(
    context: &DatabaseContext,
    state: &mut DatabaseState,
    event: &Event,
    env: &mut HandlerEnv<'_>,
) -> Result<(), ScheduleError> {
    if state.is_down {
        env.stats.rejected_down += 1;
        trace!(target_entity = %event.target, "Arrival rejected: database down");
        return Ok(());
    }

    if state.active_connections < context.max_connections {
        return admit(context, state, &event.target, env);
    }

    let line_open = env
        .max_queue_depth
        .map_or(true, |depth| state.queued.len() < depth);
    if line_open {
        state.queued.push_back(env.scheduler.now());
        env.stats.arrivals_queued += 1;
    } else {
        env.stats.rejected_full += 1;
    }
    Ok(())
}

fn admit(
    context: &DatabaseContext,
    state: &mut DatabaseState,
    target: &EntityId,
    env: &mut HandlerEnv<'_>,
) -> Result<(), ScheduleError> {
    state.active_connections += 1;
    let delay = env.sampler.delay(context.latency_mean);
    let outcome = env.sampler.outcome(context.failure_prob);
    env.stats.arrivals_admitted += 1;
    if let Some(latency) = env.latency.as_deref_mut() {
        latency.record_processing(delay);
    }
    env.scheduler
        .schedule_after(delay, target.clone(), EventKind::Completion { outcome })
}

fn on_completion(
    context: &DatabaseContext,
    state: &mut DatabaseState,
    event: &Event,
    outcome: Outcome,
    env: &mut HandlerEnv<'_>,
) -> Result<(), ScheduleError> {
    debug_assert!(state.active_connections > 0, "completion without admission");
    state.active_connections = state.active_connections.saturating_sub(1);

    let now = env.scheduler.now();
    match outcome {
        Outcome::Success => {
            env.stats.completions_ok += 1;
            for link in &context.downstream {
                env.scheduler
                    .schedule(now, link.clone(), EventKind::LinkArrive)?;
            }
        }
        Outcome::Failure => {
            env.stats.completions_failed += 1;
        }
    }

    if let Some(arrived) = state.queued.pop_front() {
        let waited = now.saturating_sub(arrived);
        if let Some(latency) = env.latency.as_deref_mut() {
            latency.record_waiting(waited);
        }
        admit(context, state, &event.target, env)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{Sampler, SamplingPolicy};
    use crate::stats::RunStats;
    use loadsim_core::{BinaryHeapQueue, EventQueue, Scheduler};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_connection_bound_holds() {
        let context = DatabaseContext {
            max_connections: 2,
            latency_mean: 0.01,
            failure_prob: 0.0,
            downstream: Vec::new(),
        };
        let mut state = DatabaseState::default();
        let mut queue = BinaryHeapQueue::new();
        let mut sequence = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut stats = RunStats::default();

        for _ in 0..5 {
            let event = Event {
                time: Duration::ZERO,
                sequence: 1,
                target: EntityId::from("db"),
                kind: EventKind::Arrival,
            };
            let mut env = HandlerEnv {
                scheduler: Scheduler::new(&mut queue, Duration::ZERO, &mut sequence),
                sampler: Sampler::new(&mut rng, SamplingPolicy::Fixed),
                stats: &mut stats,
                latency: None,
                max_queue_depth: None,
            };
            handle(&context, &mut state, &event, &mut env).unwrap();
        }

        assert_eq!(state.active_connections, 2);
        assert_eq!(state.queued.len(), 3);
        assert_eq!(queue.len(), 2, "Only admitted connections have completions");
    }
}
