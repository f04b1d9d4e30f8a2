//! Simulation engine that steps the charging network through time.

use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, info};

use crate::devices::VehicleSession;
use crate::error::Result;

use super::clock::Clock;
use super::constraint::{FEASIBILITY_TOLERANCE, LoadCurrents};
use super::event::EventLog;
use super::network::{ChargingNetwork, PilotTable};
use super::report::{Occupancy, SimReport};
use super::scheduler::{Scheduler, SchedulerInput};
use super::types::{SimConfig, StepResult};

/// Simulation engine owning the network, the scheduler, and the workload.
///
/// Generic over `S: Scheduler` for static dispatch, like the rest of the
/// engine's collaborators. Sessions are plugged in at their arrival index and
/// unplugged at their departure index; in between the scheduler decides the
/// pilots.
pub struct Engine<S: Scheduler> {
    config: SimConfig,
    network: ChargingNetwork,
    scheduler: S,
    clock: Clock,
    /// Sessions not yet arrived, ordered by arrival.
    pending: VecDeque<VehicleSession>,
    /// Absolute pilot history: entry `k` is the pilot for time index `k`.
    schedule: PilotTable,
    events: EventLog,
    finished: Vec<VehicleSession>,
    /// Station id → actual plug-in/unplug intervals.
    occupancy: BTreeMap<String, Vec<Occupancy>>,
}

impl<S: Scheduler> Engine<S> {
    /// Creates an engine over `network` for the given workload.
    ///
    /// # Arguments
    ///
    /// * `config` - Horizon, period length, voltage, feasibility mode
    /// * `network` - Registered stations and constraints
    /// * `scheduler` - Pilot-signal source
    /// * `sessions` - Workload, in any order
    pub fn new(
        config: SimConfig,
        network: ChargingNetwork,
        scheduler: S,
        mut sessions: Vec<VehicleSession>,
    ) -> Self {
        sessions.sort_by_key(VehicleSession::arrival);
        let clock = Clock::new(config.horizon, config.period_minutes);
        Self {
            config,
            network,
            scheduler,
            clock,
            pending: sessions.into(),
            schedule: PilotTable::new(),
            events: EventLog::new(),
            finished: Vec::new(),
            occupancy: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn network(&self) -> &ChargingNetwork {
        &self.network
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Absolute pilot history recorded so far.
    pub fn schedule(&self) -> &PilotTable {
        &self.schedule
    }

    /// `true` once no session is pending or still needs energy.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.network.active_sessions().is_empty()
    }

    /// Stops the run after the current index. State is kept as is.
    pub fn halt(&mut self) {
        self.clock.halt();
    }

    fn process_departures(&mut self, i: usize) -> Result<()> {
        let departing: Vec<String> = self
            .network
            .stations()
            .filter(|st| st.occupant().is_some_and(|s| s.departure() <= i))
            .map(|st| st.station_id().to_string())
            .collect();
        for station_id in departing {
            if let Some(session) = self.network.unplug(&station_id)? {
                self.events.info(
                    i,
                    format!("session {} departed", session.session_id()),
                    Some(&station_id),
                    Some(session.session_id()),
                );
                self.close_occupancy(&station_id, session.session_id(), i);
                self.finished.push(session);
            }
        }
        Ok(())
    }

    /// Ends the open interval of `session_id` on `station_id` at `i`.
    fn close_occupancy(&mut self, station_id: &str, session_id: &str, i: usize) {
        if let Some(last) = self
            .occupancy
            .get_mut(station_id)
            .and_then(|intervals| intervals.last_mut())
            .filter(|o| o.session_id == session_id)
        {
            last.unplugged = i;
        }
    }

    fn process_arrivals(&mut self, i: usize) -> Result<()> {
        while self.pending.front().is_some_and(|s| s.arrival() <= i) {
            let Some(session) = self.pending.pop_front() else {
                break;
            };
            let station_id = session.station_id().to_string();
            let session_id = session.session_id().to_string();
            if session.departure() <= i {
                self.events.info(
                    i,
                    format!("session {session_id} departed before it could plug in"),
                    Some(&station_id),
                    Some(&session_id),
                );
                self.finished.push(session);
                continue;
            }
            self.network.plugin(session, &station_id)?;
            // `unplugged` is set when the session leaves
            self.occupancy
                .entry(station_id.clone())
                .or_default()
                .push(Occupancy {
                    session_id: session_id.clone(),
                    plugged_in: i,
                    unplugged: i,
                });
            self.events.info(
                i,
                format!("session {session_id} plugged in"),
                Some(&station_id),
                Some(&session_id),
            );
        }
        Ok(())
    }

    /// Folds a scheduler answer (relative to `i`) into the absolute history.
    ///
    /// Future pilots from earlier answers are discarded, so a station the
    /// scheduler leaves out this time reads as 0 at `i`.
    fn merge_schedule(&mut self, answer: PilotTable, i: usize) {
        for seq in self.schedule.values_mut() {
            seq.truncate(i);
        }
        for (station_id, pilots) in answer {
            let seq = self.schedule.entry(station_id).or_default();
            seq.resize(i, 0.0);
            seq.extend(pilots);
        }
    }

    /// Checks pilot changes on the stations in `active`, those whose
    /// occupant still needed energy when the scheduler was asked.
    fn check_ramps(&mut self, previous: &LoadCurrents, active: &[String], i: usize) {
        let mut violations = Vec::new();
        for station_id in active {
            let Some(station) = self.network.station(station_id) else {
                continue;
            };
            let (Some(limit), Some(session)) = (station.ramp_limit(), station.occupant()) else {
                continue;
            };
            let before = previous.get(station.station_id()).copied().unwrap_or(0.0);
            if (station.current_pilot() - before).abs() > limit + FEASIBILITY_TOLERANCE {
                violations.push((
                    station.station_id().to_string(),
                    session.session_id().to_string(),
                ));
            }
        }
        for (station_id, session_id) in violations {
            self.events.warning(
                i,
                format!("wrong increase/decrease of pilot signal for station {station_id}"),
                Some(&station_id),
                Some(&session_id),
            );
        }
    }

    /// Executes time index `i` and returns its record.
    ///
    /// # Errors
    ///
    /// Device-contract and configuration errors, wrapped with `i`. Network
    /// infeasibility is not an error; it is logged as a warning.
    pub fn step(&mut self, i: usize) -> Result<StepResult> {
        self.step_inner(i).map_err(|e| e.at(i))
    }

    fn step_inner(&mut self, i: usize) -> Result<StepResult> {
        // 1. Workload changes
        self.process_departures(i)?;
        self.process_arrivals(i)?;

        // 2. Scheduler decision
        let previous = self.network.current_pilots();
        let (answer, active) = {
            let input = SchedulerInput::new(&self.network, i);
            let active: Vec<String> = input
                .active_station_ids
                .iter()
                .map(|id| id.to_string())
                .collect();
            (self.scheduler.schedule(&input), active)
        };
        self.merge_schedule(answer, i);

        // 3. Device-level validation and charging
        self.network.apply_schedule(
            &self.schedule,
            i,
            self.config.voltage,
            self.config.period_minutes,
        )?;
        self.check_ramps(&previous, &active, i);

        // 4. Network feasibility, after every station has been updated
        let draw = self.network.current_draw();
        let linear = self.config.linear_feasibility;
        let feasible = self.network.is_feasible(&draw, i, linear);
        let violated_constraint = if feasible {
            None
        } else {
            let name = self
                .network
                .constraints()
                .first_violation(&draw, linear)
                .map(str::to_string);
            self.events.warning(
                i,
                format!(
                    "infeasible charging rates: constraint {} violated",
                    name.as_deref().unwrap_or("?")
                ),
                None,
                None,
            );
            name
        };

        let result = StepResult {
            time_index: i,
            pilots: self.network.current_pilots(),
            total_draw: draw.values().sum(),
            draw,
            active_sessions: self.network.active_sessions().len(),
            feasible,
            violated_constraint,
        };
        debug!(
            time_index = i,
            total_draw = result.total_draw,
            active = result.active_sessions,
            "step complete"
        );
        Ok(result)
    }

    /// Runs until the horizon, until the workload is exhausted, or until
    /// `keep_going` returns `false` for a completed step.
    ///
    /// Sessions still plugged in at the end are unplugged into the report.
    ///
    /// # Errors
    ///
    /// The first fatal error from [`Self::step`]. State up to that point is
    /// kept; nothing is rolled back.
    pub fn run_while(&mut self, mut keep_going: impl FnMut(&StepResult) -> bool) -> Result<SimReport> {
        let mut results = Vec::with_capacity(self.config.horizon);
        while let Some(i) = self.clock.tick() {
            let result = self.step(i)?;
            let proceed = keep_going(&result);
            results.push(result);
            if !proceed || self.is_idle() {
                self.clock.halt();
            }
        }

        let end = self.clock.steps_taken();
        let station_ids: Vec<String> = self
            .network
            .station_ids()
            .into_iter()
            .map(str::to_string)
            .collect();
        for station_id in station_ids {
            if let Some(session) = self.network.unplug(&station_id)? {
                self.close_occupancy(&station_id, session.session_id(), end);
                self.finished.push(session);
            }
        }

        info!(
            scheduler = self.scheduler.name(),
            steps = end,
            warnings = self.events.warning_count(),
            "simulation finished"
        );

        let mut sessions = std::mem::take(&mut self.finished);
        sessions.extend(self.pending.drain(..));
        Ok(SimReport::new(
            self.scheduler.name(),
            end,
            self.clock.elapsed_minutes(),
            sessions,
            std::mem::take(&mut self.events).into_events(),
            std::mem::take(&mut self.occupancy),
            results,
        ))
    }

    /// Runs to completion; see [`Self::run_while`].
    pub fn run(&mut self) -> Result<SimReport> {
        self.run_while(|_| true)
    }
}
