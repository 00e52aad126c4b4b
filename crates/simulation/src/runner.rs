//! The simulation run loop.

use crate::entity::HandlerEnv;
use crate::latency::{LatencyAnalyzer, LatencyReport};
use crate::sampler::{Sampler, SamplingPolicy};
use crate::stats::RunStats;
use crate::topology::Topology;
use loadsim_core::{Event, EventKind, EventQueue, QueueStrategy, ScheduleError, Scheduler};
use loadsim_types::{EntityId, EntitySnapshot};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Structural run-time errors.
///
/// These indicate an internal defect (or API misuse), never a modeled
/// failure: request failures, drops, and down entities are ordinary data
/// in [`RunStats`] and never abort a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    /// A component scheduled an event into the past.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// The queue produced an event older than the clock. Can only happen
    /// if a queue implementation violates its ordering contract.
    #[error("clock regressed from {from:?} to {to:?}")]
    ClockRegression { from: Duration, to: Duration },

    /// An event was dispatched to an id absent from the topology. The
    /// build phase prevents this; hitting it means a factory defect.
    #[error("event dispatched to unknown entity {0}")]
    DanglingReference(EntityId),

    /// An id passed to a pre-run API does not resolve in the topology.
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// `run` was called again after the simulator drained.
    #[error("simulation already drained")]
    AlreadyDrained,
}

/// Lifecycle of a simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Constructed, not yet run.
    Idle,
    /// Inside `run`.
    Running,
    /// `run` returned. Terminal; a simulator never runs twice.
    Drained,
}

/// Why a run stopped. Hitting a configured bound is a normal stop
/// condition, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The queue emptied.
    Drained,
    /// The next event lay beyond `max_time`.
    TimeLimit,
    /// `max_events` events were dispatched.
    EventLimit,
}

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Seed for the run RNG. The same seed over the same topology
    /// reproduces the run exactly.
    pub seed: u64,
    /// Stop once the next event would fire after this time.
    pub max_time: Option<Duration>,
    /// Stop after this many dispatched events.
    pub max_events: Option<u64>,
    /// Pending-event queue strategy.
    pub queue: QueueStrategy,
    /// How delays are drawn from `latency_mean`.
    pub sampling: SamplingPolicy,
    /// Optional bound on every wait line.
    pub max_queue_depth: Option<usize>,
    /// Record the dispatched event sequence into the run result.
    pub record_trace: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_time: None,
            max_events: None,
            queue: QueueStrategy::default(),
            sampling: SamplingPolicy::default(),
            max_queue_depth: None,
            record_trace: false,
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub stop: StopReason,
    /// Clock value when the run stopped.
    pub final_time: Duration,
    pub stats: RunStats,
    /// The dispatched event sequence, empty unless trace recording was
    /// enabled. With a fixed seed this is identical across runs.
    pub trace: Vec<Event>,
}

/// Owns the queue, the topology, and the clock, and drives the run loop.
///
/// Exactly one event handler executes at a time, to completion. Within a
/// dispatch the handler holds exclusive mutable access to its own entity's
/// state only; every effect on another entity travels as a newly scheduled
/// event. This single-writer discipline is what makes the loop safe
/// without locks.
pub struct Simulator {
    topology: Topology,
    queue: Box<dyn EventQueue>,
    /// Global insertion counter backing the queue's tie-break.
    sequence: u64,
    now: Duration,
    rng: ChaCha8Rng,
    stats: RunStats,
    state: RunState,
    config: SimConfig,
    latency: Option<LatencyAnalyzer>,
    trace: Vec<Event>,
}

impl Simulator {
    /// Create a simulator over a built topology and seed the initial
    /// arrivals: one per generator, at time zero, in description order.
    pub fn new(topology: Topology, config: SimConfig) -> Self {
        let mut simulator = Self {
            queue: config.queue.build(),
            sequence: 0,
            now: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            stats: RunStats::default(),
            state: RunState::Idle,
            latency: None,
            trace: Vec::new(),
            config,
            topology,
        };

        for id in simulator.topology.generators().to_vec() {
            simulator
                .schedule_event(Duration::ZERO, id, EventKind::Arrival)
                .expect("seeding at time zero cannot violate causality");
        }

        info!(
            num_entities = simulator.topology.len(),
            num_generators = simulator.topology.generators().len(),
            seed = simulator.config.seed,
            "Created simulator"
        );
        simulator
    }

    // ─── Pre-run Setup ───

    /// Seed an open-loop Poisson arrival stream for every generator:
    /// exponential inter-arrival gaps at `rate_per_sec`, up to `horizon`.
    ///
    /// Draws from the run RNG, so the stream is reproducible under a
    /// fixed seed.
    pub fn seed_poisson_arrivals(&mut self, rate_per_sec: f64, horizon: Duration) {
        if rate_per_sec <= 0.0 || !rate_per_sec.is_finite() {
            return;
        }
        let mean_gap = 1.0 / rate_per_sec;
        let mut seeded = 0u64;
        for id in self.topology.generators().to_vec() {
            // Streams start at the clock, so seeding is also valid mid-run.
            let mut at = self.now;
            loop {
                let gap =
                    Sampler::new(&mut self.rng, SamplingPolicy::Exponential).delay(mean_gap);
                at += gap;
                if at >= horizon {
                    break;
                }
                self.schedule_event(at, id.clone(), EventKind::Arrival)
                    .expect("seeding ahead of the clock cannot violate causality");
                seeded += 1;
            }
        }
        debug!(rate_per_sec, ?horizon, seeded, "Seeded arrival stream");
    }

    /// Schedule a single exogenous arrival at an absolute time.
    pub fn schedule_arrival(
        &mut self,
        id: &EntityId,
        at: Duration,
    ) -> Result<(), SimulationError> {
        if !self.topology.contains(id) {
            return Err(SimulationError::UnknownEntity(id.clone()));
        }
        self.schedule_event(at, id.clone(), EventKind::Arrival)?;
        Ok(())
    }

    /// Schedule an outage window: `Fail` at `at`, `Recover` at
    /// `at + outage`.
    pub fn inject_fault(
        &mut self,
        id: &EntityId,
        at: Duration,
        outage: Duration,
    ) -> Result<(), SimulationError> {
        if !self.topology.contains(id) {
            return Err(SimulationError::UnknownEntity(id.clone()));
        }
        self.schedule_event(at, id.clone(), EventKind::Fail)?;
        self.schedule_event(at + outage, id.clone(), EventKind::Recover)?;
        debug!(entity = %id, ?at, ?outage, "Scheduled outage window");
        Ok(())
    }

    /// Attach a latency analyzer to this run.
    pub fn enable_latency_analysis(&mut self) {
        if self.latency.is_none() {
            self.latency = Some(LatencyAnalyzer::new());
        }
    }

    // ─── Run Loop ───

    /// Drive the simulation until the queue drains or a configured bound
    /// is reached, whichever comes first.
    pub fn run(&mut self) -> Result<RunResult, SimulationError> {
        if self.state == RunState::Drained {
            return Err(SimulationError::AlreadyDrained);
        }
        self.state = RunState::Running;

        let stop = loop {
            if let Some(max_events) = self.config.max_events {
                if self.stats.events_processed >= max_events {
                    break StopReason::EventLimit;
                }
            }

            let Some(event) = self.queue.pop() else {
                break StopReason::Drained;
            };

            if let Some(max_time) = self.config.max_time {
                if event.time > max_time {
                    debug!(remaining_events = self.queue.len() + 1, "Time limit reached");
                    break StopReason::TimeLimit;
                }
            }

            if event.time < self.now {
                return Err(SimulationError::ClockRegression {
                    from: self.now,
                    to: event.time,
                });
            }
            self.now = event.time;

            self.dispatch(event)?;
        };

        self.state = RunState::Drained;
        info!(
            ?stop,
            final_time = ?self.now,
            events_processed = self.stats.events_processed,
            "Simulation stopped"
        );
        Ok(RunResult {
            stop,
            final_time: self.now,
            stats: self.stats.clone(),
            trace: std::mem::take(&mut self.trace),
        })
    }

    fn dispatch(&mut self, event: Event) -> Result<(), SimulationError> {
        self.stats.events_processed += 1;
        self.stats.events_by_kind[event.kind.index()] += 1;
        if self.config.record_trace {
            self.trace.push(event.clone());
        }
        trace!(
            time = ?self.now,
            target_entity = %event.target,
            kind = ?event.kind,
            "Dispatching event"
        );

        let Some(entity) = self.topology.entity_mut(&event.target) else {
            return Err(SimulationError::DanglingReference(event.target.clone()));
        };
        let mut env = HandlerEnv {
            scheduler: Scheduler::new(self.queue.as_mut(), self.now, &mut self.sequence),
            sampler: Sampler::new(&mut self.rng, self.config.sampling),
            stats: &mut self.stats,
            latency: self.latency.as_mut(),
            max_queue_depth: self.config.max_queue_depth,
        };
        entity.handle(&event, &mut env)?;
        Ok(())
    }

    fn schedule_event(
        &mut self,
        time: Duration,
        target: EntityId,
        kind: EventKind,
    ) -> Result<(), ScheduleError> {
        Scheduler::new(self.queue.as_mut(), self.now, &mut self.sequence)
            .schedule(time, target, kind)
    }

    // ─── Snapshot Queries ───

    /// Current simulation time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Statistics collected so far.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// The topology under simulation.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Read-only snapshot of one entity's state.
    pub fn snapshot(&self, id: &EntityId) -> Option<EntitySnapshot> {
        self.topology.snapshot(id)
    }

    /// Latency percentile report, if analysis was enabled.
    pub fn latency_report(&self) -> Option<LatencyReport> {
        self.latency.as_ref().map(LatencyAnalyzer::report)
    }
}
