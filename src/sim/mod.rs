/// Simulation clock for time-index management.
pub mod clock;
pub mod constraint;
pub mod engine;
/// Warning and info events recorded during a run.
pub mod event;
/// Station registry and network-wide aggregates.
pub mod network;
pub mod phasor;
pub mod report;
/// Scheduler contract and baseline schedulers.
pub mod scheduler;
pub mod types;
