//! Post-run report built from finished sessions and the event log.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::devices::VehicleSession;

use super::event::{Severity, SimEvent};
use super::types::StepResult;

/// Outcome of one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub station_id: String,
    pub arrival: usize,
    pub departure: usize,
    /// kWh
    pub energy_requested: f64,
    /// kWh
    pub energy_delivered: f64,
}

impl SessionSummary {
    /// Share of the request that was met, in `[0, 1]`. A zero request counts as met.
    pub fn fraction_delivered(&self) -> f64 {
        if self.energy_requested > 0.0 {
            (self.energy_delivered / self.energy_requested).min(1.0)
        } else {
            1.0
        }
    }
}

impl From<&VehicleSession> for SessionSummary {
    fn from(s: &VehicleSession) -> Self {
        Self {
            session_id: s.session_id().to_string(),
            station_id: s.station_id().to_string(),
            arrival: s.arrival(),
            departure: s.departure(),
            energy_requested: s.requested_energy(),
            energy_delivered: s.energy_delivered(),
        }
    }
}

/// One interval `[plugged_in, unplugged)` during which a station held a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occupancy {
    pub session_id: String,
    pub plugged_in: usize,
    pub unplugged: usize,
}

/// Aggregate results of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub scheduler: String,
    /// Time indices actually simulated.
    pub steps_simulated: usize,
    /// Simulated time covered, in minutes.
    pub duration_minutes: f64,
    /// Every session of the workload, sorted by session id.
    pub sessions: Vec<SessionSummary>,
    /// Station id → number of warnings tagged with that station.
    pub warnings_by_station: BTreeMap<String, usize>,
    /// Station id → occupancy intervals ordered by plug-in time.
    pub occupancy: BTreeMap<String, Vec<Occupancy>>,
    pub events: Vec<SimEvent>,
    #[serde(skip)]
    pub results: Vec<StepResult>,
}

impl SimReport {
    pub fn new(
        scheduler: &str,
        steps_simulated: usize,
        duration_minutes: f64,
        sessions: Vec<VehicleSession>,
        events: Vec<SimEvent>,
        mut occupancy: BTreeMap<String, Vec<Occupancy>>,
        results: Vec<StepResult>,
    ) -> Self {
        let mut summaries: Vec<SessionSummary> = sessions.iter().map(SessionSummary::from).collect();
        summaries.sort_by(|a, b| a.session_id.cmp(&b.session_id));

        let mut warnings_by_station = BTreeMap::new();
        for event in events.iter().filter(|e| e.severity == Severity::Warning) {
            if let Some(station_id) = &event.station_id {
                *warnings_by_station.entry(station_id.clone()).or_insert(0) += 1;
            }
        }

        for intervals in occupancy.values_mut() {
            intervals.sort_by_key(|o| o.plugged_in);
        }

        Self {
            scheduler: scheduler.to_string(),
            steps_simulated,
            duration_minutes,
            sessions: summaries,
            warnings_by_station,
            occupancy,
            events,
            results,
        }
    }

    pub fn warning_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.severity == Severity::Warning)
            .count()
    }

    /// Time indices at which the network was infeasible.
    pub fn infeasible_steps(&self) -> Vec<usize> {
        self.results
            .iter()
            .filter(|r| !r.feasible)
            .map(|r| r.time_index)
            .collect()
    }

    pub fn total_energy_requested(&self) -> f64 {
        self.sessions.iter().map(|s| s.energy_requested).sum()
    }

    pub fn total_energy_delivered(&self) -> f64 {
        self.sessions.iter().map(|s| s.energy_delivered).sum()
    }

    /// Delivered over requested energy across all sessions.
    pub fn proportion_delivered(&self) -> f64 {
        let requested = self.total_energy_requested();
        if requested > 0.0 {
            self.total_energy_delivered() / requested
        } else {
            0.0
        }
    }

    pub fn session(&self, session_id: &str) -> Option<&SessionSummary> {
        self.sessions.iter().find(|s| s.session_id == session_id)
    }
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Simulation Report ({}) ---", self.scheduler)?;
        writeln!(
            f,
            "Steps simulated:     {} ({:.0} min)",
            self.steps_simulated, self.duration_minutes
        )?;
        writeln!(f, "Sessions:            {}", self.sessions.len())?;
        writeln!(
            f,
            "Energy delivered:    {:.2} / {:.2} kWh ({:.1}%)",
            self.total_energy_delivered(),
            self.total_energy_requested(),
            self.proportion_delivered() * 100.0
        )?;
        writeln!(f, "Infeasible steps:    {}", self.infeasible_steps().len())?;
        write!(f, "Warnings:            {}", self.warning_count())?;
        for (station_id, count) in &self.warnings_by_station {
            write!(f, "\n  {station_id}: {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(severity: Severity, station: Option<&str>) -> SimEvent {
        SimEvent {
            severity,
            time_index: 0,
            message: String::new(),
            station_id: station.map(str::to_string),
            session_id: None,
        }
    }

    fn charged(id: &str, station: &str, arrival: usize, energy: f64, delivered_at: f64) -> VehicleSession {
        let mut s = VehicleSession::new(id, station, arrival, arrival + 10, energy, 32.0);
        s.charge(delivered_at, 1000.0, 60.0);
        s
    }

    fn interval(session_id: &str, plugged_in: usize, unplugged: usize) -> Occupancy {
        Occupancy {
            session_id: session_id.to_string(),
            plugged_in,
            unplugged,
        }
    }

    #[test]
    fn aggregates_energy_and_warnings() {
        let sessions = vec![charged("b", "A", 4, 10.0, 5.0), charged("a", "A", 0, 10.0, 10.0)];
        let events = vec![
            event(Severity::Warning, Some("A")),
            event(Severity::Warning, None),
            event(Severity::Info, Some("A")),
        ];
        let occupancy = BTreeMap::from([(
            "A".to_string(),
            vec![interval("b", 4, 14), interval("a", 0, 3)],
        )]);
        let report = SimReport::new("test", 20, 100.0, sessions, events, occupancy, Vec::new());

        assert_eq!(report.sessions[0].session_id, "a");
        assert!((report.total_energy_delivered() - 15.0).abs() < 1e-9);
        assert!((report.proportion_delivered() - 0.75).abs() < 1e-9);
        assert_eq!(report.warning_count(), 2);
        assert_eq!(report.warnings_by_station.get("A"), Some(&1));

        let timeline = &report.occupancy["A"];
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0], interval("a", 0, 3));
    }

    #[test]
    fn sessions_that_never_arrived_have_no_occupancy() {
        let sessions = vec![VehicleSession::new("late", "A", 50, 60, 1.0, 32.0)];
        let report = SimReport::new("test", 10, 50.0, sessions, Vec::new(), BTreeMap::new(), Vec::new());
        assert!(report.occupancy.is_empty());
        assert_eq!(report.session("late").map(|s| s.energy_delivered), Some(0.0));
    }

    #[test]
    fn fraction_delivered_handles_zero_request() {
        let s = SessionSummary::from(&VehicleSession::new("z", "A", 0, 1, 0.0, 32.0));
        assert_eq!(s.fraction_delivered(), 1.0);
    }

    #[test]
    fn display_lists_station_warnings() {
        let report = SimReport::new(
            "test",
            1,
            5.0,
            Vec::new(),
            vec![event(Severity::Warning, Some("CA-303"))],
            BTreeMap::new(),
            Vec::new(),
        );
        assert!(report.to_string().contains("CA-303: 1"));
    }
}
