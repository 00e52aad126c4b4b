//! Deterministic sampling of delays and outcomes.

use loadsim_types::Outcome;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// How processing and transit delays are drawn from `latency_mean`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingPolicy {
    /// Exponential distribution with rate `1 / latency_mean`, the standard
    /// queueing-model default.
    #[default]
    Exponential,
    /// Every delay is exactly `latency_mean`. Useful for tests and for
    /// scenarios where variance is not under study.
    Fixed,
}

/// Draws delays and modeled outcomes from the run's seeded RNG.
///
/// All randomness in a run flows through one `ChaCha8Rng`, so a fixed seed
/// reproduces every sample in the same order.
pub struct Sampler<'a> {
    rng: &'a mut ChaCha8Rng,
    policy: SamplingPolicy,
}

impl<'a> Sampler<'a> {
    pub fn new(rng: &'a mut ChaCha8Rng, policy: SamplingPolicy) -> Self {
        Self { rng, policy }
    }

    /// Sample a delay distributed around `mean_secs`.
    pub fn delay(&mut self, mean_secs: f64) -> Duration {
        if mean_secs <= 0.0 || !mean_secs.is_finite() {
            return Duration::ZERO;
        }
        match self.policy {
            SamplingPolicy::Exponential => {
                // Inverse-transform sampling: u ∈ [0, 1), so 1 - u ∈ (0, 1]
                // and the log is finite and non-positive.
                let u: f64 = self.rng.gen();
                Duration::from_secs_f64(-mean_secs * (1.0 - u).ln())
            }
            SamplingPolicy::Fixed => Duration::from_secs_f64(mean_secs),
        }
    }

    /// Sample a Bernoulli outcome with the given failure probability.
    ///
    /// A probability of zero consumes no randomness, so topologies without
    /// failure modeling keep the RNG stream aligned across configurations.
    pub fn outcome(&mut self, failure_prob: f64) -> Outcome {
        if failure_prob > 0.0 && self.rng.gen::<f64>() < failure_prob {
            Outcome::Failure
        } else {
            Outcome::Success
        }
    }
}
