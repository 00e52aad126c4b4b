//! Run statistics.

use loadsim_core::KIND_COUNT;
use serde::Serialize;

/// Counters collected while the simulation runs.
///
/// Modeled failures land here: a failed request or a dropped transit is
/// recorded and the run continues. Only structural defects abort a run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Total events dispatched.
    pub events_processed: u64,
    /// Events dispatched by kind, indexed by `EventKind::index()`.
    pub events_by_kind: [u64; KIND_COUNT],

    /// Arrivals admitted into an active slot.
    pub arrivals_admitted: u64,
    /// Arrivals that entered a wait line.
    pub arrivals_queued: u64,
    /// Arrivals rejected because the target was down.
    pub rejected_down: u64,
    /// Arrivals rejected because the wait line was at its configured bound.
    pub rejected_full: u64,

    /// Units that completed successfully.
    pub completions_ok: u64,
    /// Units whose modeled outcome was failure.
    pub completions_failed: u64,

    /// Units that entered a link.
    pub link_transits: u64,
    /// Units a link delivered to its `to` endpoint.
    pub link_delivered: u64,
    /// Units dropped in transit (modeled loss).
    pub link_dropped_loss: u64,
    /// Units dropped because the link was down on entry.
    pub link_dropped_down: u64,

    /// `Fail` events applied.
    pub faults: u64,
    /// `Recover` events applied.
    pub recoveries: u64,

    /// Events whose kind the target entity has no transition for.
    pub unhandled_events: u64,
}

impl RunStats {
    /// Total units dropped by links (loss + down).
    pub fn link_dropped(&self) -> u64 {
        self.link_dropped_loss + self.link_dropped_down
    }

    /// Link delivery rate (delivered / entered). 1.0 when no transits.
    pub fn delivery_rate(&self) -> f64 {
        let total = self.link_delivered + self.link_dropped();
        if total == 0 {
            1.0
        } else {
            self.link_delivered as f64 / total as f64
        }
    }

    /// Completion success rate. 1.0 when nothing completed.
    pub fn success_rate(&self) -> f64 {
        let total = self.completions_ok + self.completions_failed;
        if total == 0 {
            1.0
        } else {
            self.completions_ok as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_default_to_one_when_idle() {
        let stats = RunStats::default();
        assert_eq!(stats.delivery_rate(), 1.0);
        assert_eq!(stats.success_rate(), 1.0);
    }

    #[test]
    fn test_delivery_rate_counts_both_drop_causes() {
        let stats = RunStats {
            link_delivered: 6,
            link_dropped_loss: 3,
            link_dropped_down: 1,
            ..Default::default()
        };
        assert_eq!(stats.link_dropped(), 4);
        assert_eq!(stats.delivery_rate(), 0.6);
    }
}
