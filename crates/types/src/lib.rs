//! Core types for the loadsim topology simulator.
//!
//! This crate provides the foundational types used throughout the
//! simulation engine:
//!
//! - **Identifiers**: [`EntityId`], the topology-wide entity namespace
//! - **Node specs**: [`NodeSpec`] and [`NodeKind`], the resolved form of an
//!   infrastructure description node
//! - **Outcomes**: [`Outcome`], the modeled success/failure result carried
//!   by completion and link-departure events
//! - **Snapshots**: [`EntitySnapshot`], read-only entity state for external
//!   metrics collectors
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not
//! depend on any other workspace crates, making it the foundation layer.

mod identifiers;
mod outcome;
mod snapshot;
mod spec;

pub use identifiers::EntityId;
pub use outcome::Outcome;
pub use snapshot::EntitySnapshot;
pub use spec::{KindParseError, NodeKind, NodeSpec};
