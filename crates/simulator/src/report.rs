//! Human-readable run reports.

use loadsim_simulation::{RunResult, Simulator};

/// Print a run summary plus the final state of every entity.
pub fn print_summary(result: &RunResult, simulator: &Simulator) {
    let stats = &result.stats;

    println!("\n=== Run Summary ===");
    println!("Stop reason:       {:?}", result.stop);
    println!("Final time:        {:?}", result.final_time);
    println!("Events processed:  {}", stats.events_processed);
    println!();
    println!("Arrivals admitted: {}", stats.arrivals_admitted);
    println!("Arrivals queued:   {}", stats.arrivals_queued);
    println!("Rejected (down):   {}", stats.rejected_down);
    println!("Rejected (full):   {}", stats.rejected_full);
    println!("Completions ok:    {}", stats.completions_ok);
    println!("Completions failed:{}", stats.completions_failed);
    println!("Success rate:      {:.2}%", stats.success_rate() * 100.0);
    println!();
    println!("Link transits:     {}", stats.link_transits);
    println!("Link delivered:    {}", stats.link_delivered);
    println!("Dropped (loss):    {}", stats.link_dropped_loss);
    println!("Dropped (down):    {}", stats.link_dropped_down);
    println!("Delivery rate:     {:.2}%", stats.delivery_rate() * 100.0);

    if result.final_time.as_secs_f64() > 0.0 {
        let throughput = stats.completions_ok as f64 / result.final_time.as_secs_f64();
        println!();
        println!("Throughput:        {throughput:.1} completions/sec");
    }

    println!("\n=== Final Entity States ===");
    for (id, snapshot) in simulator.topology().snapshots() {
        println!("  {id}: {snapshot:?}");
    }
}
