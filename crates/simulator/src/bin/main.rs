//! Loadsim CLI
//!
//! Synthesize a tiered service/database topology and run a deterministic
//! load simulation through it.
//!
//! # Example
//!
//! ```bash
//! # Two tiers of three services, fixed seed, 60 simulated seconds
//! loadsim --seed 42 -t 2 -s 3 -d 60 --tps 500
//!
//! # Inject a one-second outage on a mid-tier service
//! loadsim -t 2 -s 3 --fail svc-1-0 --fail-at 10 --fail-for 1
//! ```

use clap::Parser;
use loadsim_core::QueueStrategy;
use loadsim_simulation::{EntityFactory, SimConfig, Simulator};
use loadsim_simulator::{print_summary, synthesize, SimulatorConfig, WorkloadConfig};
use loadsim_types::EntityId;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Loadsim
///
/// Runs deterministic load simulations over synthesized infrastructure
/// topologies. Single-threaded, reproducible when the same seed is used.
#[derive(Parser, Debug)]
#[command(name = "loadsim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of service tiers
    #[arg(short = 't', long, default_value = "2")]
    tiers: u32,

    /// Number of services per tier
    #[arg(short = 's', long, default_value = "3")]
    services: u32,

    /// Number of databases behind the last tier
    #[arg(long, default_value = "1")]
    databases: u32,

    /// Concurrent-request capacity of every service
    #[arg(short = 'c', long, default_value = "4")]
    capacity: u32,

    /// Simulated workload duration in seconds
    #[arg(short = 'd', long, default_value = "30")]
    duration: u64,

    /// Poisson arrival rate per generator (requests per second)
    #[arg(long, default_value = "100")]
    tps: f64,

    /// Per-request failure probability for services and databases (0.0-1.0)
    #[arg(long, default_value = "0.0")]
    failure_prob: f64,

    /// Per-transit drop probability for links (0.0-1.0)
    #[arg(long, default_value = "0.0")]
    drop_prob: f64,

    /// Random seed for reproducible results. When omitted, a random seed is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Use a calendar queue with this bucket width (milliseconds) instead
    /// of the default binary heap
    #[arg(long)]
    calendar_bucket_ms: Option<u64>,

    /// Stop after this many dispatched events
    #[arg(long)]
    max_events: Option<u64>,

    /// Bound every wait line at this depth (unbounded when omitted)
    #[arg(long)]
    max_queue_depth: Option<usize>,

    /// Collect and print latency percentiles
    #[arg(long)]
    latency_analysis: bool,

    /// Entity to take down mid-run
    #[arg(long)]
    fail: Option<String>,

    /// When the outage starts, in simulated seconds
    #[arg(long, default_value = "0")]
    fail_at: f64,

    /// How long the outage lasts, in simulated seconds
    #[arg(long, default_value = "1")]
    fail_for: f64,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,loadsim=info,loadsim_simulation=info")),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let duration = Duration::from_secs(args.duration);

    let config = SimulatorConfig::new(args.tiers, args.services)
        .with_databases(args.databases)
        .with_capacity(args.capacity)
        .with_failure_prob(args.failure_prob)
        .with_link_drop_prob(args.drop_prob)
        .with_seed(seed)
        .with_workload(WorkloadConfig::constant_rate(args.tps, duration));

    info!(
        tiers = config.tiers,
        services_per_tier = config.services_per_tier,
        databases = config.databases,
        duration_secs = args.duration,
        tps = args.tps,
        seed,
        "Starting simulation"
    );

    let nodes = synthesize(&config);
    let topology = EntityFactory::build(&nodes).expect("synthesized topology must build");

    let queue = match args.calendar_bucket_ms {
        Some(ms) => QueueStrategy::Calendar {
            bucket_width: Duration::from_millis(ms),
        },
        None => QueueStrategy::BinaryHeap,
    };

    let mut simulator = Simulator::new(
        topology,
        SimConfig {
            seed,
            // Hard stop at the workload horizon, no ramp-down.
            max_time: Some(duration),
            max_events: args.max_events,
            queue,
            max_queue_depth: args.max_queue_depth,
            ..Default::default()
        },
    );

    if args.latency_analysis {
        simulator.enable_latency_analysis();
    }

    if let Some(id) = &args.fail {
        let id = EntityId::from(id.as_str());
        simulator
            .inject_fault(
                &id,
                Duration::from_secs_f64(args.fail_at),
                Duration::from_secs_f64(args.fail_for),
            )
            .expect("outage target must exist in the topology");
    }

    simulator.seed_poisson_arrivals(args.tps, duration);

    let result = simulator.run().expect("simulation failed");

    print_summary(&result, &simulator);

    if args.latency_analysis {
        if let Some(report) = simulator.latency_report() {
            report.print_summary();
        }
    }
}
