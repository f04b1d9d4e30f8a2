//! Scheduler contract and baseline schedulers.

use crate::devices::VehicleSession;

use super::network::{ChargingNetwork, PilotTable};

/// Everything a scheduler sees at one time index.
///
/// `active_sessions[k]` is plugged into `active_station_ids[k]`.
pub struct SchedulerInput<'a> {
    pub time_index: usize,
    pub active_sessions: Vec<&'a VehicleSession>,
    pub active_station_ids: Vec<&'a str>,
    pub network: &'a ChargingNetwork,
}

impl<'a> SchedulerInput<'a> {
    /// Snapshot of `network` at `time_index`.
    pub fn new(network: &'a ChargingNetwork, time_index: usize) -> Self {
        Self {
            time_index,
            active_sessions: network.active_sessions(),
            active_station_ids: network.active_station_ids(),
            network,
        }
    }
}

/// A charging-rate scheduling algorithm.
///
/// The returned table maps station ids to pilot sequences relative to the
/// current index: entry 0 is the pilot for `input.time_index`, entry 1 for
/// the next index, and so on. Stations left out are driven at 0. Every pilot
/// must be in the station's allowed domain; the engine treats anything else
/// as fatal.
pub trait Scheduler {
    fn schedule(&mut self, input: &SchedulerInput<'_>) -> PilotTable;

    /// Short name for logs and reports.
    fn name(&self) -> &'static str;
}

/// Never energizes anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleScheduler;

impl Scheduler for IdleScheduler {
    fn schedule(&mut self, _input: &SchedulerInput<'_>) -> PilotTable {
        PilotTable::new()
    }

    fn name(&self) -> &'static str {
        "idle"
    }
}

/// Charges every active vehicle as fast as the station and vehicle allow,
/// ignoring network constraints.
#[derive(Debug, Default, Clone, Copy)]
pub struct UncontrolledScheduler;

impl Scheduler for UncontrolledScheduler {
    fn schedule(&mut self, input: &SchedulerInput<'_>) -> PilotTable {
        let mut table = PilotTable::new();
        for (session, station_id) in input.active_sessions.iter().zip(&input.active_station_ids) {
            let Some(station) = input.network.station(station_id) else {
                continue;
            };
            let pilot = station.rate_domain().floor(session.max_rate());
            let horizon = session.departure().saturating_sub(input.time_index).max(1);
            table.insert(station_id.to_string(), vec![pilot; horizon]);
        }
        table
    }

    fn name(&self) -> &'static str {
        "uncontrolled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{ChargingStation, RateDomain};

    fn network() -> ChargingNetwork {
        let mut net = ChargingNetwork::new();
        net.register(ChargingStation::new(
            "A",
            RateDomain::discretized([8.0, 16.0, 24.0, 32.0]),
        ));
        net.register(ChargingStation::new("B", RateDomain::deadband(6.0, 16.0)));
        net.register(ChargingStation::new("C", RateDomain::unbounded()));
        net
    }

    #[test]
    fn idle_returns_empty_table() {
        let net = network();
        let input = SchedulerInput::new(&net, 0);
        assert!(IdleScheduler.schedule(&input).is_empty());
    }

    #[test]
    fn uncontrolled_snaps_to_allowed_rates() {
        let mut net = network();
        net.plugin(VehicleSession::new("s1", "A", 0, 4, 50.0, 20.0), "A").unwrap();
        net.plugin(VehicleSession::new("s2", "B", 0, 4, 50.0, 32.0), "B").unwrap();
        let input = SchedulerInput::new(&net, 1);
        let table = UncontrolledScheduler.schedule(&input);

        assert_eq!(table.get("A"), Some(&vec![16.0; 3]));
        assert_eq!(table.get("B"), Some(&vec![16.0; 3]));
        assert!(!table.contains_key("C"));
    }

    #[test]
    fn input_views_line_up() {
        let mut net = network();
        net.plugin(VehicleSession::new("s3", "C", 0, 4, 5.0, 32.0), "C").unwrap();
        let input = SchedulerInput::new(&net, 0);
        assert_eq!(input.active_station_ids, vec!["C"]);
        assert_eq!(input.active_sessions[0].session_id(), "s3");
    }
}
