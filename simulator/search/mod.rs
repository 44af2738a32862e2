//! Search simulator module
//!
//! Discrete-event harness around the `p2p_search` protocol core:
//! - Static overlays (ring, random k-out, fully connected, custom edges)
//! - A virtual clock with a (time, sequence) ordered delivery queue
//! - Query batches injected at their origins
//! - Multi-run experiments with per-run stats and CSV export

pub mod config;
pub mod driver;
pub mod export;
pub mod runner;
pub mod scheduler;
pub mod topology;

#[allow(unused_imports)]
pub use config::{QueryBatchConfig, ScenarioFile, SearchSimConfig, TopologyConfig, TopologyMode};
#[allow(unused_imports)]
pub use runner::{run_experiment, RunReport, SearchRunner};
