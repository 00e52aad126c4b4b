//! Modeled request outcomes.

use serde::{Deserialize, Serialize};

/// The modeled result of a unit of work.
///
/// Outcomes are **data**, not errors: a failed request or a dropped packet
/// is part of the simulated domain and is recorded into statistics rather
/// than raised. Only structural defects (causality violations, dangling
/// references) surface as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The unit completed (or was delivered) successfully.
    Success,
    /// The unit failed (or was dropped in transit).
    Failure,
}

impl Outcome {
    /// Whether this outcome is a success.
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success)
    }
}
