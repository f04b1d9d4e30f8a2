//! Discrete-time simulator for networks of EV charging stations.

pub mod config;
pub mod devices;
pub mod error;
/// CSV export of step records and session summaries.
pub mod io;
/// Simulation engine, network, constraints, and scheduling.
pub mod sim;
pub mod workload;

pub use error::{Result, SimError};
