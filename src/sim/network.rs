//! Station registry and network-wide views.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::devices::{ChargingStation, DEFAULT_MODEL, RateDomain, StationModels, VehicleSession};
use crate::error::{Result, SimError};

use super::constraint::{ConstraintSet, LoadCurrents};

/// Station id → pilot sequence. Entry `k` of a sequence is the pilot for
/// absolute time index `k`.
pub type PilotTable = HashMap<String, Vec<f64>>;

/// The charging network: all registered stations plus the constraint set
/// that limits their combined draw.
///
/// Stations are kept in registration order. The network owns the only
/// [`ConstraintSet`]; anything that evaluates feasibility borrows it from
/// here.
#[derive(Debug, Clone, Default)]
pub struct ChargingNetwork {
    stations: IndexMap<String, ChargingStation>,
    constraints: ConstraintSet,
    models: StationModels,
}

impl ChargingNetwork {
    /// An empty network using the built-in station models.
    pub fn new() -> Self {
        Self::with_models(StationModels::builtin())
    }

    /// An empty network resolving station models against `models`.
    pub fn with_models(models: StationModels) -> Self {
        Self {
            stations: IndexMap::new(),
            constraints: ConstraintSet::new(),
            models,
        }
    }

    /// Registers `station`, replacing any station with the same id.
    pub fn register(&mut self, station: ChargingStation) {
        self.stations
            .insert(station.station_id().to_string(), station);
    }

    pub fn station(&self, station_id: &str) -> Option<&ChargingStation> {
        self.stations.get(station_id)
    }

    pub fn stations(&self) -> impl Iterator<Item = &ChargingStation> {
        self.stations.values()
    }

    /// Ids of all registered stations, in registration order.
    pub fn station_ids(&self) -> Vec<&str> {
        self.stations.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    fn station_mut(&mut self, station_id: &str) -> Result<&mut ChargingStation> {
        self.stations
            .get_mut(station_id)
            .ok_or_else(|| SimError::UnknownStation(station_id.to_string()))
    }

    /// Allowed rates of `station_id`, registering a default-model station
    /// first if the id is unknown.
    pub fn allowed_rates_or_register(&mut self, station_id: &str) -> Vec<f64> {
        if !self.stations.contains_key(station_id) {
            let station = self
                .models
                .build(station_id, DEFAULT_MODEL)
                .unwrap_or_else(|| ChargingStation::new(station_id, RateDomain::unbounded()));
            self.register(station);
        }
        self.stations
            .get(station_id)
            .map(ChargingStation::allowed_rates)
            .unwrap_or_default()
    }

    /// Plugs `session` into `station_id`.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownStation`] for an unregistered id,
    /// [`SimError::Occupied`] if the station already has an occupant.
    pub fn plugin(&mut self, session: VehicleSession, station_id: &str) -> Result<()> {
        self.station_mut(station_id)?.plugin(session)
    }

    /// Unplugs whatever is attached to `station_id` and returns it.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownStation`] for an unregistered id.
    pub fn unplug(&mut self, station_id: &str) -> Result<Option<VehicleSession>> {
        Ok(self.station_mut(station_id)?.unplug())
    }

    /// The session attached to `station_id`, if any.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownStation`] for an unregistered id.
    pub fn get_occupant(&self, station_id: &str) -> Result<Option<&VehicleSession>> {
        self.stations
            .get(station_id)
            .map(ChargingStation::occupant)
            .ok_or_else(|| SimError::UnknownStation(station_id.to_string()))
    }

    fn active_stations(&self) -> impl Iterator<Item = (&str, &VehicleSession)> {
        self.stations.iter().filter_map(|(id, station)| {
            station
                .occupant()
                .filter(|s| !s.fully_charged())
                .map(|s| (id.as_str(), s))
        })
    }

    /// Plugged-in sessions that still need energy.
    pub fn active_sessions(&self) -> Vec<&VehicleSession> {
        self.active_stations().map(|(_, s)| s).collect()
    }

    /// Station ids matching [`Self::active_sessions`] one-to-one.
    pub fn active_station_ids(&self) -> Vec<&str> {
        self.active_stations().map(|(id, _)| id).collect()
    }

    /// Plugged-in sessions, charged or not.
    pub fn occupants(&self) -> impl Iterator<Item = &VehicleSession> {
        self.stations.values().filter_map(ChargingStation::occupant)
    }

    /// Station id → occupant's realised rate (0 when empty), for every station.
    pub fn current_draw(&self) -> LoadCurrents {
        self.stations
            .iter()
            .map(|(id, station)| (id.clone(), station.current_draw()))
            .collect()
    }

    /// Sum of [`Self::current_draw`] over all stations.
    pub fn total_draw(&self) -> f64 {
        self.stations.values().map(ChargingStation::current_draw).sum()
    }

    /// Station id → last accepted pilot.
    pub fn current_pilots(&self) -> LoadCurrents {
        self.stations
            .iter()
            .map(|(id, station)| (id.clone(), station.current_pilot()))
            .collect()
    }

    /// Applies entry `time_index` of `table` to every registered station.
    ///
    /// Stations missing from the table, or whose sequence is too short,
    /// receive a pilot of 0. Ids in the table that are not registered are
    /// ignored. Stations are updated in registration order; an error stops
    /// the pass and leaves earlier stations updated.
    ///
    /// # Errors
    ///
    /// The first [`SimError::InvalidRate`] raised by a station.
    pub fn apply_schedule(
        &mut self,
        table: &PilotTable,
        time_index: usize,
        voltage: f64,
        period_minutes: f64,
    ) -> Result<()> {
        for (station_id, station) in &mut self.stations {
            let pilot = table
                .get(station_id)
                .and_then(|seq| seq.get(time_index))
                .copied()
                .unwrap_or(0.0);
            station.set_pilot(pilot, voltage, period_minutes)?;
        }
        Ok(())
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// See [`ConstraintSet::add_constraint`].
    pub fn add_constraint<I, K>(&mut self, coefficients: I, limit: f64, name: Option<&str>) -> String
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        self.constraints.add_constraint(coefficients, limit, name)
    }

    /// See [`ConstraintSet::register_phase`].
    pub fn register_phase(&mut self, load: impl Into<String>, angle_deg: f64) {
        self.constraints.register_phase(load, angle_deg);
    }

    /// See [`ConstraintSet::is_feasible`].
    pub fn is_feasible(&self, loads: &LoadCurrents, time_index: usize, linear: bool) -> bool {
        self.constraints.is_feasible(loads, time_index, linear)
    }
}
