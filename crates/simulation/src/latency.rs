//! Latency analysis for simulation runs.
//!
//! An optional analyzer attached to the simulator records three delay
//! populations as they are sampled:
//!
//! - **processing** - service/database processing delays
//! - **waiting** - time spent in a wait line before admission
//! - **transit** - link transit delays
//!
//! Use [`LatencyAnalyzer::report`] (or `Simulator::latency_report`) at the
//! end of a run to get percentile summaries.

use hdrhistogram::Histogram;
use std::time::Duration;

/// Records delay distributions during a run.
pub struct LatencyAnalyzer {
    processing: Histogram<u64>,
    waiting: Histogram<u64>,
    transit: Histogram<u64>,
}

impl LatencyAnalyzer {
    pub fn new() -> Self {
        Self {
            processing: new_histogram(),
            waiting: new_histogram(),
            transit: new_histogram(),
        }
    }

    pub(crate) fn record_processing(&mut self, delay: Duration) {
        self.processing.saturating_record(as_micros(delay));
    }

    pub(crate) fn record_waiting(&mut self, delay: Duration) {
        self.waiting.saturating_record(as_micros(delay));
    }

    pub(crate) fn record_transit(&mut self, delay: Duration) {
        self.transit.saturating_record(as_micros(delay));
    }

    /// Summarize everything recorded so far.
    pub fn report(&self) -> LatencyReport {
        LatencyReport {
            processing: LatencySummary::from_histogram(&self.processing),
            waiting: LatencySummary::from_histogram(&self.waiting),
            transit: LatencySummary::from_histogram(&self.transit),
        }
    }
}

impl Default for LatencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Three significant figures covers the microsecond-to-hours range the
/// simulation produces.
fn new_histogram() -> Histogram<u64> {
    Histogram::new(3).expect("histogram creation should succeed")
}

fn as_micros(delay: Duration) -> u64 {
    u64::try_from(delay.as_micros()).unwrap_or(u64::MAX)
}

/// Percentile summary of one delay population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencySummary {
    pub count: u64,
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
    pub max: Duration,
}

impl LatencySummary {
    fn from_histogram(histogram: &Histogram<u64>) -> Self {
        Self {
            count: histogram.len(),
            p50: Duration::from_micros(histogram.value_at_quantile(0.50)),
            p90: Duration::from_micros(histogram.value_at_quantile(0.90)),
            p99: Duration::from_micros(histogram.value_at_quantile(0.99)),
            max: Duration::from_micros(histogram.max()),
        }
    }
}

/// Report over all recorded delay populations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyReport {
    pub processing: LatencySummary,
    pub waiting: LatencySummary,
    pub transit: LatencySummary,
}

impl LatencyReport {
    /// Print a human-readable summary.
    pub fn print_summary(&self) {
        println!("\n=== Latency Report ===");
        Self::print_row("processing", &self.processing);
        Self::print_row("waiting", &self.waiting);
        Self::print_row("transit", &self.transit);
    }

    fn print_row(label: &str, summary: &LatencySummary) {
        if summary.count == 0 {
            println!("  {label:<12} (no samples)");
            return;
        }
        println!(
            "  {label:<12} n={:<8} p50={:<12?} p90={:<12?} p99={:<12?} max={:?}",
            summary.count, summary.p50, summary.p90, summary.p99, summary.max
        );
    }
}
