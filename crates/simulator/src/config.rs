//! Configuration types for the simulator harness.

use std::time::Duration;

/// Configuration for a synthesized topology and its run.
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    /// Number of service tiers.
    pub tiers: u32,

    /// Number of services per tier.
    pub services_per_tier: u32,

    /// Number of databases behind the last tier.
    pub databases: u32,

    /// Concurrent-request capacity of every service.
    pub capacity: u32,

    /// Mean service processing time in seconds.
    pub service_latency: f64,

    /// Per-request failure probability of every service.
    pub service_failure_prob: f64,

    /// Connection bound of every database.
    pub db_connections: u32,

    /// Mean database query time in seconds.
    pub db_latency: f64,

    /// Per-query failure probability of every database.
    pub db_failure_prob: f64,

    /// Mean link transit time in seconds.
    pub link_latency: f64,

    /// Per-transit drop probability of every link.
    pub link_drop_prob: f64,

    /// Random seed for deterministic simulation.
    pub seed: u64,

    /// Workload configuration.
    pub workload: WorkloadConfig,
}

impl SimulatorConfig {
    /// Create a configuration for `tiers` tiers of `services_per_tier`
    /// services each. Zero values are clamped to one.
    pub fn new(tiers: u32, services_per_tier: u32) -> Self {
        Self {
            tiers: tiers.max(1),
            services_per_tier: services_per_tier.max(1),
            databases: 1,
            capacity: 4,
            service_latency: 0.020,
            service_failure_prob: 0.0,
            db_connections: 16,
            db_latency: 0.005,
            db_failure_prob: 0.0,
            link_latency: 0.001,
            link_drop_prob: 0.0,
            seed: 12345,
            workload: WorkloadConfig::default(),
        }
    }

    /// Set the number of databases.
    pub fn with_databases(mut self, databases: u32) -> Self {
        self.databases = databases.max(1);
        self
    }

    /// Set the per-service capacity.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set service and database failure probabilities.
    pub fn with_failure_prob(mut self, prob: f64) -> Self {
        self.service_failure_prob = prob;
        self.db_failure_prob = prob;
        self
    }

    /// Set the link drop probability.
    pub fn with_link_drop_prob(mut self, prob: f64) -> Self {
        self.link_drop_prob = prob;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the workload configuration.
    pub fn with_workload(mut self, workload: WorkloadConfig) -> Self {
        self.workload = workload;
        self
    }

    /// Total number of services across all tiers.
    pub fn total_services(&self) -> u32 {
        self.tiers * self.services_per_tier
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new(2, 3)
    }
}

/// Workload configuration.
#[derive(Clone, Debug)]
pub struct WorkloadConfig {
    /// Poisson arrival rate per generator, in requests per second.
    pub arrival_rate: f64,

    /// Horizon over which arrivals are seeded (simulated time).
    pub duration: Duration,
}

impl WorkloadConfig {
    /// A constant-rate open-loop workload.
    pub fn constant_rate(arrival_rate: f64, duration: Duration) -> Self {
        Self {
            arrival_rate,
            duration,
        }
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            arrival_rate: 100.0,
            duration: Duration::from_secs(30),
        }
    }
}
