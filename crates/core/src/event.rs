//! Simulation events.

use loadsim_types::{EntityId, Outcome};
use std::cmp::Ordering;
use std::time::Duration;

/// Number of event kinds, for per-kind counters.
pub const KIND_COUNT: usize = 6;

/// What a dispatched event means to its target entity.
///
/// Events are **passive data**: they describe a future occurrence. All
/// behavior lives in the entity handlers that consume them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A unit of work arrives at a service or database (or enters a link
    /// when the target is one).
    Arrival,
    /// An admitted unit finishes processing, carrying the outcome that was
    /// decided at admission time.
    Completion { outcome: Outcome },
    /// A unit enters a network link at its `from` endpoint.
    LinkArrive,
    /// A transiting unit leaves the link, carrying whether it was delivered
    /// or dropped.
    LinkDepart { outcome: Outcome },
    /// The target entity goes down.
    Fail,
    /// The target entity comes back up.
    Recover,
}

impl EventKind {
    /// Stable index of this kind, for per-kind statistics.
    pub fn index(self) -> usize {
        match self {
            EventKind::Arrival => 0,
            EventKind::Completion { .. } => 1,
            EventKind::LinkArrive => 2,
            EventKind::LinkDepart { .. } => 3,
            EventKind::Fail => 4,
            EventKind::Recover => 5,
        }
    }
}

/// A future occurrence addressed to one entity.
///
/// `sequence` is the global insertion counter: it is used purely to break
/// ties between equal-time events, so that two runs built from identical
/// input dispatch events in an identical total order.
///
/// An event is owned by the queue until popped, then by the dispatching
/// step for the duration of the handler call, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Simulated timestamp at which the event fires.
    pub time: Duration,
    /// Global insertion counter, tie-break only.
    pub sequence: u64,
    /// Entity this event is addressed to.
    pub target: EntityId,
    /// What happens when it fires.
    pub kind: EventKind,
}

/// Ordering key of an event in the queue.
///
/// Events are ordered by:
/// 1. Time (earlier first)
/// 2. Insertion sequence (FIFO for equal times)
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EventKey {
    pub time: Duration,
    pub sequence: u64,
}

impl Event {
    /// The ordering key of this event.
    pub fn key(&self) -> EventKey {
        EventKey {
            time: self.time,
            sequence: self.sequence,
        }
    }
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Order by time first
        match self.time.cmp(&other.time) {
            Ordering::Equal => {}
            ord => return ord,
        }

        // Then by sequence (FIFO)
        self.sequence.cmp(&other.sequence)
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_key_ordering() {
        let earlier = EventKey {
            time: Duration::from_secs(1),
            sequence: 9,
        };
        let later = EventKey {
            time: Duration::from_secs(2),
            sequence: 1,
        };
        assert!(earlier < later, "Time dominates sequence");
    }

    #[test]
    fn test_sequence_breaks_ties_at_same_time() {
        let first = EventKey {
            time: Duration::from_secs(1),
            sequence: 1,
        };
        let second = EventKey {
            time: Duration::from_secs(1),
            sequence: 2,
        };
        assert!(
            first < second,
            "Earlier insertion should dispatch first at equal times"
        );
    }
}
