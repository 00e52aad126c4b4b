//! Service entity: admission, queueing, and completion of requests.

use super::{unhandled, HandlerEnv};
use loadsim_core::{Event, EventKind, ScheduleError};
use loadsim_types::{EntityId, Outcome};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::trace;

/// Immutable service parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceContext {
    /// Maximum concurrent admissions.
    pub capacity: u32,
    /// Mean processing time in seconds.
    pub latency_mean: f64,
    /// Probability that an admitted request fails rather than succeeds.
    pub failure_prob: f64,
    /// Links whose `from` endpoint is this service. Successful completions
    /// are forwarded onto every one of them.
    pub downstream: Vec<EntityId>,
}

/// Mutable service state.
///
/// `active_requests` stays within `0..=capacity` between dispatches; the
/// wait line holds the arrival timestamp of each queued request, FIFO.
#[derive(Debug, Default, PartialEq)]
pub struct ServiceState {
    pub is_down: bool,
    pub active_requests: u32,
    pub queued: VecDeque<Duration>,
}

pub(super) fn handle(
    context: &ServiceContext,
    state: &mut ServiceState,
    event: &Event,
    env: &mut HandlerEnv<'_>,
) -> Result<(), ScheduleError> {
    match event.kind {
        EventKind::Arrival => on_arrival(context, state, event, env),
        EventKind::Completion { outcome } => on_completion(context, state, event, outcome, env),
        EventKind::Fail => {
            state.is_down = true;
            env.stats.faults += 1;
            trace!(target_entity = %event.target, "Service down");
            Ok(())
        }
        EventKind::Recover => {
            state.is_down = false;
            env.stats.recoveries += 1;
            trace!(target_entity = %event.target, "Service recovered");
            Ok(())
        }
        EventKind::LinkArrive | EventKind::LinkDepart { .. } => {
            unhandled("service", event, env);
            Ok(())
        }
    }
}

fn on_arrival(
    context: &ServiceContext,
    state: &mut ServiceState,
    event: &Event,
    env: &mut HandlerEnv<'_>,
) -> Result<(), ScheduleError> {
    if state.is_down {
        // Immediate modeled failure; occupancy untouched.
        env.stats.rejected_down += 1;
        trace!(target_entity = %event.target, "Arrival rejected: service down");
        return Ok(());
    }

    if state.active_requests < context.capacity {
        return admit(context, state, &event.target, env);
    }

    let line_open = env
        .max_queue_depth
        .map_or(true, |depth| state.queued.len() < depth);
    if line_open {
        state.queued.push_back(env.scheduler.now());
        env.stats.arrivals_queued += 1;
        trace!(
            target_entity = %event.target,
            queued = state.queued.len(),
            "Arrival queued at capacity"
        );
    } else {
        env.stats.rejected_full += 1;
        trace!(target_entity = %event.target, "Arrival rejected: wait line full");
    }
    Ok(())
}

/// Admit one request: occupy a slot, sample its processing delay and
/// outcome, and schedule the matching completion.
fn admit(
    context: &ServiceContext,
    state: &mut ServiceState,
    target: &EntityId,
    env: &mut HandlerEnv<'_>,
) -> Result<(), ScheduleError> {
    state.active_requests += 1;
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
    context: &ServiceContext,
    state: &mut ServiceState,
    event: &Event,
    outcome: Outcome,
    env: &mut HandlerEnv<'_>,
) -> Result<(), ScheduleError> {
    debug_assert!(state.active_requests > 0, "completion without admission");
    state.active_requests = state.active_requests.saturating_sub(1);

    let now = env.scheduler.now();
    match outcome {
        Outcome::Success => {
            env.stats.completions_ok += 1;
            // The unit travels onward over every outgoing link, at the
            // current time (transit delay is the link's to model).
            for link in &context.downstream {
                env.scheduler
                    .schedule(now, link.clone(), EventKind::LinkArrive)?;
            }
        }
        Outcome::Failure => {
            env.stats.completions_failed += 1;
        }
    }

    // FIFO re-admission: the head of the line enters exactly like a fresh
    // admission, with its own sampled delay and outcome.
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

    fn context(capacity: u32, failure_prob: f64) -> ServiceContext {
        ServiceContext {
            capacity,
            latency_mean: 0.05,
            failure_prob,
            downstream: Vec::new(),
        }
    }

    fn arrival(target: &str) -> Event {
        Event {
            time: Duration::ZERO,
            sequence: 1,
            target: EntityId::from(target),
            kind: EventKind::Arrival,
        }
    }

    /// Drive one event through the handler with a fresh environment.
    fn step(
        context: &ServiceContext,
        state: &mut ServiceState,
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

    #[test]
    fn test_arrival_admits_below_capacity() {
        let context = context(2, 0.0);
        let mut state = ServiceState::default();
        let mut queue = BinaryHeapQueue::new();
        let mut sequence = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut stats = RunStats::default();

        let event = arrival("svc");
        step(&context, &mut state, &event, &mut queue, &mut sequence, &mut rng, &mut stats);

        assert_eq!(state.active_requests, 1);
        assert!(state.queued.is_empty());
        assert_eq!(stats.arrivals_admitted, 1);

        let completion = queue.pop().expect("a completion must be scheduled");
        assert_eq!(completion.target, EntityId::from("svc"));
        assert!(matches!(
            completion.kind,
            EventKind::Completion {
                outcome: Outcome::Success
            }
        ));
        assert_eq!(completion.time, Duration::from_secs_f64(0.05));
    }

    #[test]
    fn test_arrival_queues_at_capacity() {
        let context = context(1, 0.0);
        let mut state = ServiceState::default();
        let mut queue = BinaryHeapQueue::new();
        let mut sequence = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut stats = RunStats::default();

        for _ in 0..3 {
            let event = arrival("svc");
            step(&context, &mut state, &event, &mut queue, &mut sequence, &mut rng, &mut stats);
        }

        assert_eq!(state.active_requests, 1, "Capacity bound must hold");
        assert_eq!(state.queued.len(), 2);
        assert_eq!(stats.arrivals_admitted, 1);
        assert_eq!(stats.arrivals_queued, 2);
        assert_eq!(queue.len(), 1, "Queued requests get no event yet");
    }

    #[test]
    fn test_arrival_while_down_fails_immediately() {
        let context = context(4, 0.0);
        let mut state = ServiceState {
            is_down: true,
            ..Default::default()
        };
        let mut queue = BinaryHeapQueue::new();
        let mut sequence = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut stats = RunStats::default();

        let event = arrival("svc");
        step(&context, &mut state, &event, &mut queue, &mut sequence, &mut rng, &mut stats);

        assert_eq!(state.active_requests, 0, "Occupancy must be untouched");
        assert_eq!(stats.rejected_down, 1);
        assert!(queue.is_empty(), "Nothing is scheduled for a rejected unit");
    }

    #[test]
    fn test_completion_readmits_fifo_head() {
        let context = context(1, 0.0);
        let mut state = ServiceState::default();
        let mut queue = BinaryHeapQueue::new();
        let mut sequence = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut stats = RunStats::default();

        for _ in 0..2 {
            let event = arrival("svc");
            step(&context, &mut state, &event, &mut queue, &mut sequence, &mut rng, &mut stats);
        }
        assert_eq!(state.queued.len(), 1);

        let completion = queue.pop().unwrap();
        step(&context, &mut state, &completion, &mut queue, &mut sequence, &mut rng, &mut stats);

        assert_eq!(stats.completions_ok, 1);
        assert_eq!(state.queued.len(), 0, "Head of line must be admitted");
        assert_eq!(state.active_requests, 1);
        assert_eq!(stats.arrivals_admitted, 2);
        assert_eq!(queue.len(), 1, "The re-admitted unit gets its own completion");
    }

    #[test]
    fn test_fail_then_recover_toggles_admission() {
        let context = context(1, 0.0);
        let mut state = ServiceState::default();
        let mut queue = BinaryHeapQueue::new();
        let mut sequence = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut stats = RunStats::default();

        let fail = Event {
            kind: EventKind::Fail,
            ..arrival("svc")
        };
        step(&context, &mut state, &fail, &mut queue, &mut sequence, &mut rng, &mut stats);
        assert!(state.is_down);

        step(&context, &mut state, &arrival("svc"), &mut queue, &mut sequence, &mut rng, &mut stats);
        assert_eq!(stats.rejected_down, 1);

        let recover = Event {
            kind: EventKind::Recover,
            ..arrival("svc")
        };
        step(&context, &mut state, &recover, &mut queue, &mut sequence, &mut rng, &mut stats);
        assert!(!state.is_down);

        step(&context, &mut state, &arrival("svc"), &mut queue, &mut sequence, &mut rng, &mut stats);
        assert_eq!(state.active_requests, 1);
    }

    #[test]
    fn test_bounded_wait_line_rejects_overflow() {
        let context = context(1, 0.0);
        let mut state = ServiceState::default();
        let mut queue = BinaryHeapQueue::new();
        let mut sequence = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut stats = RunStats::default();

        for _ in 0..4 {
            let event = arrival("svc");
            let mut env = HandlerEnv {
                scheduler: Scheduler::new(&mut queue, event.time, &mut sequence),
                sampler: Sampler::new(&mut rng, SamplingPolicy::Fixed),
                stats: &mut stats,
                latency: None,
                max_queue_depth: Some(1),
            };
            handle(&context, &mut state, &event, &mut env).unwrap();
        }

        assert_eq!(stats.arrivals_admitted, 1);
        assert_eq!(stats.arrivals_queued, 1);
        assert_eq!(stats.rejected_full, 2);
        assert_eq!(state.queued.len(), 1);
    }

    #[test]
    fn test_successful_completion_forwards_downstream() {
        let context = ServiceContext {
            downstream: vec![EntityId::from("l0"), EntityId::from("l1")],
            ..context(1, 0.0)
        };
        let mut state = ServiceState {
            active_requests: 1,
            ..Default::default()
        };
        let mut queue = BinaryHeapQueue::new();
        let mut sequence = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut stats = RunStats::default();

        let completion = Event {
            time: Duration::from_secs(1),
            sequence: 5,
            target: EntityId::from("svc"),
            kind: EventKind::Completion {
                outcome: Outcome::Success,
            },
        };
        step(&context, &mut state, &completion, &mut queue, &mut sequence, &mut rng, &mut stats);

        let first = queue.pop().unwrap();
        let second = queue.pop().unwrap();
        assert_eq!(first.target, EntityId::from("l0"));
        assert_eq!(second.target, EntityId::from("l1"));
        assert_eq!(first.time, Duration::from_secs(1), "Forwarding adds no delay");
        assert!(matches!(first.kind, EventKind::LinkArrive));
    }

    #[test]
    fn test_failed_completion_forwards_nothing() {
        let context = ServiceContext {
            downstream: vec![EntityId::from("l0")],
            ..context(1, 0.0)
        };
        let mut state = ServiceState {
            active_requests: 1,
            ..Default::default()
        };
        let mut queue = BinaryHeapQueue::new();
        let mut sequence = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut stats = RunStats::default();

        let completion = Event {
            time: Duration::from_secs(1),
            sequence: 5,
            target: EntityId::from("svc"),
            kind: EventKind::Completion {
                outcome: Outcome::Failure,
            },
        };
        step(&context, &mut state, &completion, &mut queue, &mut sequence, &mut rng, &mut stats);

        assert_eq!(stats.completions_failed, 1);
        assert!(queue.is_empty(), "Failed units terminate in place");
    }
}
