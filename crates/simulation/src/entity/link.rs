//! Network link entity: in-transit propagation between two endpoints.

use super::{unhandled, HandlerEnv};
use loadsim_core::{Event, EventKind, ScheduleError};
use loadsim_types::{EntityId, Outcome};
use tracing::trace;

/// Immutable link parameters.
///
/// Endpoints are stored as id lookups into the topology, never as direct
/// references, so the topology stays a flat owned mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkContext {
    pub from: EntityId,
    pub to: EntityId,
    /// Mean transit time in seconds.
    pub latency_mean: f64,
    /// Probability that a transiting unit is dropped.
    pub failure_prob: f64,
}

/// Mutable link state.
#[derive(Debug, Default, PartialEq)]
pub struct LinkState {
    pub is_down: bool,
    pub in_flight: u32,
}

pub(super) fn handle(
    context: &LinkContext,
    state: &mut LinkState,
    event: &Event,
    env: &mut HandlerEnv<'_>,
) -> Result<(), ScheduleError> {
    match event.kind {
        // A bare arrival addressed to a link (link chains, generator links)
        // means the same thing as entering it at `from`.
        EventKind::LinkArrive | EventKind::Arrival => on_enter(context, state, event, env),
        EventKind::LinkDepart { outcome } => on_depart(context, state, outcome, env),
        EventKind::Fail => {
            state.is_down = true;
            env.stats.faults += 1;
            trace!(target_entity = %event.target, "Link down");
            Ok(())
        }
        EventKind::Recover => {
            state.is_down = false;
            env.stats.recoveries += 1;
            trace!(target_entity = %event.target, "Link recovered");
            Ok(())
        }
        EventKind::Completion { .. } => {
            unhandled("network link", event, env);
            Ok(())
        }
    }
}

fn on_enter(
    context: &LinkContext,
    state: &mut LinkState,
    event: &Event,
    env: &mut HandlerEnv<'_>,
) -> Result<(), ScheduleError> {
    if state.is_down {
        // Dropped on entry; nothing is scheduled for the unit.
        env.stats.link_dropped_down += 1;
        trace!(target_entity = %event.target, "Unit dropped: link down");
        return Ok(());
    }

    state.in_flight += 1;
    let delay = env.sampler.delay(context.latency_mean);
    let outcome = env.sampler.outcome(context.failure_prob);
    env.stats.link_transits += 1;
    if let Some(latency) = env.latency.as_deref_mut() {
        latency.record_transit(delay);
    }
    env.scheduler.schedule_after(
        delay,
        event.target.clone(),
        EventKind::LinkDepart { outcome },
    )
}

fn on_depart(
    context: &LinkContext,
    state: &mut LinkState,
    outcome: Outcome,
    env: &mut HandlerEnv<'_>,
) -> Result<(), ScheduleError> {
    debug_assert!(state.in_flight > 0, "departure without entry");
    state.in_flight = state.in_flight.saturating_sub(1);

    let now = env.scheduler.now();
    match outcome {
        Outcome::Success => {
            env.stats.link_delivered += 1;
            env.scheduler
                .schedule(now, context.to.clone(), EventKind::Arrival)?;
        }
        Outcome::Failure => {
            // Dropped in transit: recorded, nothing forwarded.
            env.stats.link_dropped_loss += 1;
        }
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
    use std::time::Duration;

    fn context(failure_prob: f64) -> LinkContext {
        LinkContext {
            from: EntityId::from("api"),
            to: EntityId::from("db"),
            latency_mean: 0.02,
            failure_prob,
        }
    }

    fn step(
        context: &LinkContext,
        state: &mut LinkState,
        event: &Event,
        queue: &mut dyn EventQueue,
        sequence: &mut u64,
        rng: &mut ChaCha8Rng,
        stats: &mut RunStats,
    ) {
        let mut env = HandlerEnv {
            scheduler: Scheduler::new(queue, event.time, sequence),
            sampler: Sampler::new(rng, SamplingPolicy::Fixed),
            stats,
            latency: None,
            max_queue_depth: None,
        };
        handle(context, state, event, &mut env).expect("handler should not fail");
    }

    fn link_arrive(target: &str, time: Duration) -> Event {
        Event {
            time,
            sequence: 1,
            target: EntityId::from(target),
            kind: EventKind::LinkArrive,
        }
    }

    #[test]
    fn test_transit_schedules_departure_on_self() {
        let context = context(0.0);
        let mut state = LinkState::default();
        let mut queue = BinaryHeapQueue::new();
        let mut sequence = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut stats = RunStats::default();

        let event = link_arrive("l0", Duration::ZERO);
        step(&context, &mut state, &event, &mut queue, &mut sequence, &mut rng, &mut stats);

        assert_eq!(state.in_flight, 1);
        let depart = queue.pop().unwrap();
        assert_eq!(depart.target, EntityId::from("l0"));
        assert_eq!(depart.time, Duration::from_secs_f64(0.02));
        assert!(matches!(
            depart.kind,
            EventKind::LinkDepart {
                outcome: Outcome::Success
            }
        ));
    }

    #[test]
    fn test_delivery_forwards_arrival_to_endpoint() {
        let context = context(0.0);
        let mut state = LinkState {
            in_flight: 1,
            ..Default::default()
        };
        let mut queue = BinaryHeapQueue::new();
        let mut sequence = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut stats = RunStats::default();

        let depart = Event {
            time: Duration::from_millis(20),
            sequence: 2,
            target: EntityId::from("l0"),
            kind: EventKind::LinkDepart {
                outcome: Outcome::Success,
            },
        };
        step(&context, &mut state, &depart, &mut queue, &mut sequence, &mut rng, &mut stats);

        assert_eq!(state.in_flight, 0);
        assert_eq!(stats.link_delivered, 1);
        let forwarded = queue.pop().unwrap();
        assert_eq!(forwarded.target, EntityId::from("db"));
        assert_eq!(forwarded.time, Duration::from_millis(20));
        assert!(matches!(forwarded.kind, EventKind::Arrival));
    }

    #[test]
    fn test_always_dropping_link_never_forwards() {
        let context = context(1.0);
        let mut state = LinkState::default();
        let mut queue = BinaryHeapQueue::new();
        let mut sequence = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut stats = RunStats::default();

        for round in 0..10u64 {
            let event = link_arrive("l0", Duration::from_millis(round * 100));
            step(&context, &mut state, &event, &mut queue, &mut sequence, &mut rng, &mut stats);

            let depart = queue.pop().unwrap();
            assert!(
                matches!(
                    depart.kind,
                    EventKind::LinkDepart {
                        outcome: Outcome::Failure
                    }
                ),
                "Every transit must carry a dropped outcome"
            );
            step(&context, &mut state, &depart, &mut queue, &mut sequence, &mut rng, &mut stats);
            assert!(queue.is_empty(), "Nothing may be forwarded to the endpoint");
        }

        assert_eq!(stats.link_dropped_loss, 10);
        assert_eq!(stats.link_delivered, 0);
    }

    #[test]
    fn test_down_link_drops_on_entry() {
        let context = context(0.0);
        let mut state = LinkState {
            is_down: true,
            ..Default::default()
        };
        let mut queue = BinaryHeapQueue::new();
        let mut sequence = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut stats = RunStats::default();

        let event = link_arrive("l0", Duration::ZERO);
        step(&context, &mut state, &event, &mut queue, &mut sequence, &mut rng, &mut stats);

        assert_eq!(state.in_flight, 0);
        assert_eq!(stats.link_dropped_down, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_in_flight_units_finish_after_fail() {
        let context = context(0.0);
        let mut state = LinkState::default();
        let mut queue = BinaryHeapQueue::new();
        let mut sequence = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut stats = RunStats::default();

        let event = link_arrive("l0", Duration::ZERO);
        step(&context, &mut state, &event, &mut queue, &mut sequence, &mut rng, &mut stats);

        let fail = Event {
            time: Duration::from_millis(1),
            sequence: 3,
            target: EntityId::from("l0"),
            kind: EventKind::Fail,
        };
        step(&context, &mut state, &fail, &mut queue, &mut sequence, &mut rng, &mut stats);

        // The already-scheduled departure still fires and delivers.
        let depart = queue.pop().unwrap();
        step(&context, &mut state, &depart, &mut queue, &mut sequence, &mut rng, &mut stats);
        assert_eq!(stats.link_delivered, 1);
    }
}
