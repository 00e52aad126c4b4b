//! Pending-event queues with deterministic ordering.
//!
//! All implementations honor the same contract: `pop` returns the event
//! with the smallest `(time, sequence)` key, so callers can swap the
//! strategy at configuration time without observable differences beyond
//! performance.

use crate::event::{Event, EventKey};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};
use std::time::Duration;

/// Ordered set of pending events.
///
/// `push` inserts in O(log n) (amortized O(1) for the calendar strategy
/// under uniformly distributed times); `pop` removes and returns the event
/// with the smallest `(time, sequence)` key; `is_empty`/`len` are pure
/// queries. There is no cancel-by-id operation; cancellation is handled
/// at the entity level via down-state checks at dispatch time.
pub trait EventQueue {
    fn push(&mut self, event: Event);
    fn pop(&mut self) -> Option<Event>;
    fn is_empty(&self) -> bool;
    fn len(&self) -> usize;
}

/// Queue strategy, selected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStrategy {
    /// Binary min-heap. The default; O(log n) push and pop.
    BinaryHeap,
    /// Calendar queue: events bucketed by fixed-width time ranges.
    /// Amortized O(1) insertion when event times are spread uniformly.
    Calendar {
        /// Width of one time bucket.
        bucket_width: Duration,
    },
}

impl Default for QueueStrategy {
    fn default() -> Self {
        QueueStrategy::BinaryHeap
    }
}

impl QueueStrategy {
    /// Instantiate the queue for this strategy.
    pub fn build(self) -> Box<dyn EventQueue> {
        match self {
            QueueStrategy::BinaryHeap => Box::new(BinaryHeapQueue::new()),
            QueueStrategy::Calendar { bucket_width } => {
                Box::new(CalendarQueue::new(bucket_width))
            }
        }
    }
}

/// Heap entry ordered by the event key alone.
struct HeapEntry(Event);

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.0.key() == other.0.key()
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.key().cmp(&other.0.key())
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Binary min-heap queue.
#[derive(Default)]
pub struct BinaryHeapQueue {
    heap: BinaryHeap<Reverse<HeapEntry>>,
}

impl BinaryHeapQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }
}

impl EventQueue for BinaryHeapQueue {
    fn push(&mut self, event: Event) {
        self.heap.push(Reverse(HeapEntry(event)));
    }

    fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(HeapEntry(event))| event)
    }

    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Calendar queue: pending events bucketed by time range.
///
/// Buckets are keyed by `time / bucket_width`; within a bucket the minimum
/// key is located by scan on pop. With bucket widths on the order of the
/// mean inter-event gap, buckets stay small and both operations are
/// amortized O(1).
pub struct CalendarQueue {
    bucket_width_nanos: u128,
    buckets: BTreeMap<u128, Vec<Event>>,
    len: usize,
}

impl CalendarQueue {
    /// Create a calendar queue with the given bucket width.
    ///
    /// A zero width collapses to a single-nanosecond bucket rather than
    /// dividing by zero.
    pub fn new(bucket_width: Duration) -> Self {
        Self {
            bucket_width_nanos: bucket_width.as_nanos().max(1),
            buckets: BTreeMap::new(),
            len: 0,
        }
    }

    fn bucket_for(&self, time: Duration) -> u128 {
        time.as_nanos() / self.bucket_width_nanos
    }
}

impl EventQueue for CalendarQueue {
    fn push(&mut self, event: Event) {
        let bucket = self.bucket_for(event.time);
        self.buckets.entry(bucket).or_default().push(event);
        self.len += 1;
    }

    fn pop(&mut self) -> Option<Event> {
        let (&bucket, events) = self.buckets.iter_mut().next()?;
        let min_index = events
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.key())
            .map(|(i, _)| i)?;
        let event = events.swap_remove(min_index);
        if events.is_empty() {
            self.buckets.remove(&bucket);
        }
        self.len -= 1;
        Some(event)
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn len(&self) -> usize {
        self.len
    }
}
