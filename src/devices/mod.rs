//! Charging station and vehicle session models.

/// Vehicle charging session.
pub mod ev;
/// Charging station (EVSE) state machine.
pub mod evse;
pub mod models;
/// Pilot-signal rate domains.
pub mod rates;

// Re-export the main types for convenience
pub use ev::VehicleSession;
pub use evse::ChargingStation;
pub use models::{DEFAULT_MODEL, StationModels};
pub use rates::RateDomain;
