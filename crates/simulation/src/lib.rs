//! Discrete-event simulation engine for infrastructure topologies.
//!
//! This crate turns a resolved topology description (services, databases,
//! network links) into a live entity graph and drives request traffic
//! through it. Given the same seed, it produces identical results every
//! run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                       Simulator                         │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Event queue (heap or calendar buckets)         │ │
//! │  │     Ordered by: time, then insertion sequence      │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Topology: id → entity (service/db/link)        │ │
//! │  │     One handler runs at a time, to completion      │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Follow-up events via the Scheduler facade      │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The loop is single-threaded, cooperative, and non-preemptive: exactly
//! one event handler executes at a time, and a handler mutates only its
//! own entity's state. Any effect on another entity travels as a newly
//! scheduled event addressed to it, which is what makes the design safe
//! without locks.

mod entity;
mod factory;
mod latency;
mod runner;
mod sampler;
mod stats;
mod topology;

pub use entity::{
    DatabaseContext, DatabaseState, Entity, LinkContext, LinkState, ServiceContext, ServiceState,
};
pub use factory::{BuildError, EntityFactory};
pub use latency::{LatencyAnalyzer, LatencyReport, LatencySummary};
pub use runner::{RunResult, RunState, SimConfig, SimulationError, Simulator, StopReason};
pub use sampler::{Sampler, SamplingPolicy};
pub use stats::RunStats;
pub use topology::Topology;
