//! Event, queue, and scheduler primitives for the loadsim engine.
//!
//! Everything in this crate is about *when* things happen, not *what*
//! happens: events are passive records ordered by `(time, sequence)`, the
//! queue hands them out in that order, and the scheduler is the narrow
//! write-only surface through which entity handlers create future events.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Simulator                       │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │   EventQueue (binary heap / calendar buckets)  │  │
//! │  │   Ordered by: time, then insertion sequence    │  │
//! │  └───────────────────────┬────────────────────────┘  │
//! │                          │ pop                       │
//! │                          ▼                           │
//! │             entity handler (one at a time)           │
//! │                          │ schedule                  │
//! │                          ▼                           │
//! │              Scheduler (write-only facade)           │
//! └──────────────────────────────────────────────────────┘
//! ```

mod event;
mod queue;
mod scheduler;

pub use event::{Event, EventKey, EventKind, KIND_COUNT};
pub use queue::{BinaryHeapQueue, CalendarQueue, EventQueue, QueueStrategy};
pub use scheduler::{ScheduleError, Scheduler};
