//! Loadsim CLI harness.
//!
//! Stands in for the excluded compiler/transport layers: it synthesizes a
//! tiered topology description from command-line parameters, builds it,
//! drives a load simulation, and prints a report. No IR files are parsed
//! here; node specs are constructed programmatically.
//!
//! # Example
//!
//! ```ignore
//! use loadsim_simulator::{SimulatorConfig, WorkloadConfig};
//! use loadsim_simulation::{EntityFactory, SimConfig, Simulator};
//!
//! let config = SimulatorConfig::new(2, 3).with_seed(42);
//! let nodes = loadsim_simulator::synthesize(&config);
//! let topology = EntityFactory::build(&nodes)?;
//! ```

mod config;
mod report;
mod scenario;

pub use config::{SimulatorConfig, WorkloadConfig};
pub use report::print_summary;
pub use scenario::synthesize;
