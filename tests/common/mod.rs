//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use acn_sim::devices::{ChargingStation, RateDomain, VehicleSession};
use acn_sim::sim::network::ChargingNetwork;
use acn_sim::sim::types::SimConfig;

/// Station ids of the three-station fixture network.
pub const STATIONS: [&str; 3] = ["A", "B", "C"];

/// Default simulation configuration (12 steps of 5 minutes at 240 V).
pub fn default_config() -> SimConfig {
    SimConfig::new(12, 5.0, 240.0)
}

/// Three continuous 32 A stations on one single-phase constraint named `main`.
pub fn three_station_network(limit: f64) -> ChargingNetwork {
    let mut net = ChargingNetwork::new();
    for id in STATIONS {
        net.register(ChargingStation::new(id, RateDomain::continuous(32.0)));
    }
    net.add_constraint(STATIONS.map(|id| (id, 1.0)), limit, Some("main"));
    net
}

/// One session per fixture station, all present for the whole default horizon.
pub fn default_sessions() -> Vec<VehicleSession> {
    STATIONS
        .iter()
        .enumerate()
        .map(|(k, id)| VehicleSession::new(format!("s{k}"), *id, 0, 12, 20.0, 32.0))
        .collect()
}
