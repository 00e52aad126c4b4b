//! Write-only scheduling facade.

use crate::event::{Event, EventKind};
use crate::queue::EventQueue;
use loadsim_types::EntityId;
use std::time::Duration;

/// Error raised by the scheduler's causality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// An event was scheduled at a time earlier than the current clock.
    /// This is an internal defect of the scheduling component, never a
    /// modeled failure.
    #[error("event scheduled at {scheduled:?}, before current time {now:?}")]
    CausalityViolation { scheduled: Duration, now: Duration },
}

/// Narrow facade over the event queue, handed to entity handlers.
///
/// Handlers can create future events but cannot inspect or reorder the
/// pending set: state transitions are driven solely by the dispatch loop,
/// never by entity-to-entity side channels. The facade also assigns the
/// global insertion sequence, which the queue uses as its tie-break.
pub struct Scheduler<'a> {
    queue: &'a mut dyn EventQueue,
    now: Duration,
    sequence: &'a mut u64,
}

impl<'a> Scheduler<'a> {
    /// Create a scheduler view over the queue at the given clock value.
    pub fn new(queue: &'a mut dyn EventQueue, now: Duration, sequence: &'a mut u64) -> Self {
        Self {
            queue,
            now,
            sequence,
        }
    }

    /// The current simulation time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule an event at an absolute simulated time.
    ///
    /// Fails with [`ScheduleError::CausalityViolation`] if `time` is before
    /// the current clock.
    pub fn schedule(
        &mut self,
        time: Duration,
        target: EntityId,
        kind: EventKind,
    ) -> Result<(), ScheduleError> {
        if time < self.now {
            return Err(ScheduleError::CausalityViolation {
                scheduled: time,
                now: self.now,
            });
        }
        *self.sequence += 1;
        self.queue.push(Event {
            time,
            sequence: *self.sequence,
            target,
            kind,
        });
        Ok(())
    }

    /// Schedule an event `delay` after the current time.
    pub fn schedule_after(
        &mut self,
        delay: Duration,
        target: EntityId,
        kind: EventKind,
    ) -> Result<(), ScheduleError> {
        self.schedule(self.now + delay, target, kind)
    }
}
