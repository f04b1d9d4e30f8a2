//! TOML-based scenario configuration and preset definitions.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::devices::{ChargingStation, RateDomain, StationModels, VehicleSession};
use crate::sim::network::ChargingNetwork;
use crate::sim::types::SimConfig;
use crate::workload::SyntheticWorkload;

/// Top-level scenario configuration parsed from TOML.
///
/// Every section has a default, so a file only needs to name what differs.
/// Load from TOML with [`ScenarioConfig::from_toml_file`] or pick one of
/// [`ScenarioConfig::PRESETS`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation timing and global parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Charging stations, in registration order.
    #[serde(default)]
    pub stations: Vec<StationConfig>,
    /// Network capacity constraints.
    #[serde(default)]
    pub constraints: Vec<ConstraintConfig>,
    /// Phase angles for loads not given one inline.
    #[serde(default)]
    pub phases: Vec<PhaseConfig>,
    /// Explicit sessions to replay.
    #[serde(default)]
    pub sessions: Vec<SessionConfig>,
    /// Synthetic sessions, drawn with `simulation.seed`.
    #[serde(default)]
    pub workload: Option<WorkloadConfig>,
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of time indices to simulate (must be > 0).
    pub horizon_steps: usize,
    /// Minutes per time index (must be > 0).
    pub period_minutes: f64,
    /// Supply voltage (V).
    pub voltage: f64,
    /// Use the linear bound for feasibility checks.
    pub linear_feasibility: bool,
    /// Master random seed.
    pub seed: u64,
    /// Scheduler: `"uncontrolled"` or `"idle"`.
    pub scheduler: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon_steps: 288,
            period_minutes: 5.0,
            voltage: 240.0,
            linear_feasibility: false,
            seed: 42,
            scheduler: "uncontrolled".to_string(),
        }
    }
}

/// How a station's allowed rates are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationKind {
    Continuous,
    Deadband,
    Discretized,
    Model,
}

/// One `[[stations]]` entry.
///
/// Which of `max_rate`, `min_rate`, `rates` and `model` are required depends
/// on `kind`; [`ScenarioConfig::validate`] reports missing ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StationConfig {
    pub id: String,
    pub kind: StationKind,
    #[serde(default)]
    pub max_rate: Option<f64>,
    #[serde(default)]
    pub min_rate: Option<f64>,
    #[serde(default)]
    pub rates: Option<Vec<f64>>,
    #[serde(default)]
    pub model: Option<String>,
    /// Largest pilot change between consecutive indices (A).
    #[serde(default)]
    pub ramp_limit: Option<f64>,
    /// Phase angle of this station's current (degrees).
    #[serde(default)]
    pub phase_angle: Option<f64>,
}

impl StationConfig {
    fn new(id: impl Into<String>, kind: StationKind) -> Self {
        Self {
            id: id.into(),
            kind,
            max_rate: None,
            min_rate: None,
            rates: None,
            model: None,
            ramp_limit: None,
            phase_angle: None,
        }
    }

    /// A continuous `[0, max_rate]` station.
    pub fn continuous(id: impl Into<String>, max_rate: f64) -> Self {
        Self {
            max_rate: Some(max_rate),
            ..Self::new(id, StationKind::Continuous)
        }
    }

    /// A station built from a registered model.
    pub fn model(id: impl Into<String>, model: &str) -> Self {
        Self {
            model: Some(model.to_string()),
            ..Self::new(id, StationKind::Model)
        }
    }

    fn rate_domain(&self, models: &StationModels) -> Option<RateDomain> {
        match self.kind {
            StationKind::Continuous => self.max_rate.map(RateDomain::continuous),
            StationKind::Deadband => Some(RateDomain::deadband(self.min_rate?, self.max_rate?)),
            StationKind::Discretized => self
                .rates
                .as_ref()
                .map(|r| RateDomain::discretized(r.iter().copied())),
            StationKind::Model => models.get(self.model.as_deref()?).cloned(),
        }
    }
}

/// One `[[constraints]]` entry: `|Σ coefficient × current| ≤ limit`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintConfig {
    /// Generated as `_const_N` when omitted.
    #[serde(default)]
    pub name: Option<String>,
    /// Magnitude limit (A).
    pub limit: f64,
    /// Station id → coefficient.
    pub loads: BTreeMap<String, f64>,
}

/// One `[[phases]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseConfig {
    pub load: String,
    /// Degrees.
    pub angle: f64,
}

/// One `[[sessions]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    pub id: String,
    pub station: String,
    pub arrival: usize,
    pub departure: usize,
    /// Requested energy (kWh).
    pub energy_kwh: f64,
    /// Vehicle current limit (A).
    #[serde(default = "default_max_rate")]
    pub max_rate: f64,
}

fn default_max_rate() -> f64 {
    32.0
}

impl SessionConfig {
    fn to_session(&self) -> VehicleSession {
        VehicleSession::new(
            self.id.clone(),
            self.station.clone(),
            self.arrival,
            self.departure,
            self.energy_kwh,
            self.max_rate,
        )
    }
}

/// Synthetic workload parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadConfig {
    /// Number of sessions to attempt.
    pub sessions: usize,
    /// Minimum requested energy (kWh).
    pub energy_kwh_min: f64,
    /// Maximum requested energy (kWh).
    pub energy_kwh_max: f64,
    /// Minimum dwell (time indices).
    pub dwell_steps_min: usize,
    /// Maximum dwell (time indices).
    pub dwell_steps_max: usize,
    /// Vehicle current limit (A).
    pub max_rate: f64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            sessions: 20,
            energy_kwh_min: 4.0,
            energy_kwh_max: 20.0,
            dwell_steps_min: 12,
            dwell_steps_max: 96,
            max_rate: 32.0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.horizon_steps"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A validated scenario ready to hand to the engine.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub config: SimConfig,
    pub network: ChargingNetwork,
    pub sessions: Vec<VehicleSession>,
    pub scheduler: String,
}

const CALTECH_PHASES: [f64; 3] = [0.0, -120.0, 120.0];

impl ScenarioConfig {
    /// Three 32 A stations sharing a single 40 A circuit.
    pub fn demo() -> Self {
        let session = |id: &str, station: &str, arrival, departure, energy_kwh| SessionConfig {
            id: id.to_string(),
            station: station.to_string(),
            arrival,
            departure,
            energy_kwh,
            max_rate: 32.0,
        };
        Self {
            simulation: SimulationConfig {
                horizon_steps: 48,
                ..SimulationConfig::default()
            },
            stations: ["EVSE-1", "EVSE-2", "EVSE-3"]
                .into_iter()
                .map(|id| StationConfig::continuous(id, 32.0))
                .collect(),
            constraints: vec![ConstraintConfig {
                name: Some("main".to_string()),
                limit: 40.0,
                loads: ["EVSE-1", "EVSE-2", "EVSE-3"]
                    .into_iter()
                    .map(|id| (id.to_string(), 1.0))
                    .collect(),
            }],
            phases: Vec::new(),
            sessions: vec![
                session("ev-1", "EVSE-1", 0, 24, 5.0),
                session("ev-2", "EVSE-2", 4, 30, 8.0),
                session("ev-3", "EVSE-3", 10, 40, 6.0),
            ],
            workload: None,
        }
    }

    /// The Caltech parking garage: 53 AeroVironment and ClipperCreek
    /// stations spread over three phases, one limit per phase plus a
    /// transformer limit over the phasor sum.
    pub fn caltech() -> Self {
        let mut ids: Vec<(String, &str)> = ["CA-148", "CA-149", "CA-212", "CA-213"]
            .into_iter()
            .map(|id| (id.to_string(), "AeroVironment"))
            .collect();
        for (range, clipper) in [(303..=327, 320..=323), (489..=512, 493..=496)] {
            for n in range {
                let model = if clipper.contains(&n) {
                    "ClipperCreek"
                } else {
                    "AeroVironment"
                };
                ids.push((format!("CA-{n}"), model));
            }
        }

        let mut stations = Vec::with_capacity(ids.len());
        let mut per_phase: [BTreeMap<String, f64>; 3] = Default::default();
        for (k, (id, model)) in ids.into_iter().enumerate() {
            let phase = k % CALTECH_PHASES.len();
            per_phase[phase].insert(id.clone(), 1.0);
            stations.push(StationConfig {
                phase_angle: Some(CALTECH_PHASES[phase]),
                ..StationConfig::model(id, model)
            });
        }

        let mut constraints: Vec<ConstraintConfig> = per_phase
            .iter()
            .zip(["phase-a", "phase-b", "phase-c"])
            .map(|(loads, name)| ConstraintConfig {
                name: Some(name.to_string()),
                limit: 280.0,
                loads: loads.clone(),
            })
            .collect();
        constraints.push(ConstraintConfig {
            name: Some("transformer".to_string()),
            limit: 420.0,
            loads: stations.iter().map(|s| (s.id.clone(), 1.0)).collect(),
        });

        Self {
            simulation: SimulationConfig {
                voltage: 220.0,
                ..SimulationConfig::default()
            },
            stations,
            constraints,
            phases: Vec::new(),
            sessions: Vec::new(),
            workload: Some(WorkloadConfig {
                sessions: 80,
                energy_kwh_min: 5.0,
                energy_kwh_max: 25.0,
                dwell_steps_min: 24,
                dwell_steps_max: 120,
                max_rate: 32.0,
            }),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["demo", "caltech"];

    /// Available scheduler names.
    pub const SCHEDULERS: &[&str] = &["uncontrolled", "idle"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "demo" => Ok(Self::demo()),
            "caltech" => Ok(Self::caltech()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.horizon_steps == 0 {
            errors.push(ConfigError::new("simulation.horizon_steps", "must be > 0"));
        }
        if !(s.period_minutes > 0.0) {
            errors.push(ConfigError::new("simulation.period_minutes", "must be > 0"));
        }
        if !(s.voltage > 0.0) {
            errors.push(ConfigError::new("simulation.voltage", "must be > 0"));
        }
        if !Self::SCHEDULERS.contains(&s.scheduler.as_str()) {
            errors.push(ConfigError::new(
                "simulation.scheduler",
                format!(
                    "must be one of {}, got \"{}\"",
                    Self::SCHEDULERS.join(", "),
                    s.scheduler
                ),
            ));
        }

        let models = StationModels::builtin();
        let mut station_ids = HashSet::new();
        for (k, st) in self.stations.iter().enumerate() {
            validate_station(k, st, &models, &mut errors);
            if !station_ids.insert(st.id.as_str()) {
                errors.push(ConfigError::new(
                    format!("stations[{k}].id"),
                    format!("duplicate station \"{}\"", st.id),
                ));
            }
        }

        for (k, c) in self.constraints.iter().enumerate() {
            if !(c.limit >= 0.0) {
                errors.push(ConfigError::new(format!("constraints[{k}].limit"), "must be >= 0"));
            }
            if c.loads.is_empty() {
                errors.push(ConfigError::new(format!("constraints[{k}].loads"), "must not be empty"));
            }
            for (load, coef) in &c.loads {
                if !station_ids.contains(load.as_str()) {
                    errors.push(ConfigError::new(
                        format!("constraints[{k}].loads"),
                        format!("unknown station \"{load}\""),
                    ));
                }
                if !coef.is_finite() {
                    errors.push(ConfigError::new(
                        format!("constraints[{k}].loads.{load}"),
                        "must be finite",
                    ));
                }
            }
        }

        for (k, p) in self.phases.iter().enumerate() {
            if !station_ids.contains(p.load.as_str()) {
                errors.push(ConfigError::new(
                    format!("phases[{k}].load"),
                    format!("unknown station \"{}\"", p.load),
                ));
            }
            if !p.angle.is_finite() {
                errors.push(ConfigError::new(format!("phases[{k}].angle"), "must be finite"));
            }
        }

        let mut session_ids = HashSet::new();
        for (k, ev) in self.sessions.iter().enumerate() {
            if !session_ids.insert(ev.id.as_str()) {
                errors.push(ConfigError::new(
                    format!("sessions[{k}].id"),
                    format!("duplicate session \"{}\"", ev.id),
                ));
            }
            if !station_ids.contains(ev.station.as_str()) {
                errors.push(ConfigError::new(
                    format!("sessions[{k}].station"),
                    format!("unknown station \"{}\"", ev.station),
                ));
            }
            if ev.departure < ev.arrival {
                errors.push(ConfigError::new(
                    format!("sessions[{k}].departure"),
                    "must be >= arrival",
                ));
            }
            if !(ev.energy_kwh >= 0.0) {
                errors.push(ConfigError::new(format!("sessions[{k}].energy_kwh"), "must be >= 0"));
            }
            if !(ev.max_rate >= 0.0) {
                errors.push(ConfigError::new(format!("sessions[{k}].max_rate"), "must be >= 0"));
            }
        }

        // A station holds one vehicle at a time; empty stays never plug in.
        for (k, b) in self.sessions.iter().enumerate() {
            let clash = self.sessions[..k].iter().find(|a| {
                a.station == b.station
                    && a.arrival < a.departure
                    && b.arrival < b.departure
                    && a.arrival < b.departure
                    && b.arrival < a.departure
            });
            if let Some(a) = clash {
                errors.push(ConfigError::new(
                    format!("sessions[{k}].arrival"),
                    format!(
                        "station \"{}\" is already booked by session \"{}\" over [{}, {})",
                        b.station, a.id, a.arrival, a.departure
                    ),
                ));
            }
        }

        if let Some(w) = &self.workload {
            if !(w.energy_kwh_min >= 0.0) {
                errors.push(ConfigError::new("workload.energy_kwh_min", "must be >= 0"));
            }
            if !(w.energy_kwh_max >= w.energy_kwh_min) {
                errors.push(ConfigError::new(
                    "workload.energy_kwh_min",
                    "must be <= workload.energy_kwh_max",
                ));
            }
            if w.dwell_steps_min == 0 {
                errors.push(ConfigError::new("workload.dwell_steps_min", "must be > 0"));
            }
            if w.dwell_steps_min > w.dwell_steps_max {
                errors.push(ConfigError::new(
                    "workload.dwell_steps_min",
                    "must be <= workload.dwell_steps_max",
                ));
            }
            if !(w.max_rate >= 0.0) {
                errors.push(ConfigError::new("workload.max_rate", "must be >= 0"));
            }
            if self.stations.is_empty() && w.sessions > 0 {
                errors.push(ConfigError::new("workload", "needs at least one station"));
            }
        }

        errors
    }

    /// Engine parameters from the `[simulation]` section.
    ///
    /// # Panics
    ///
    /// Panics on an invalid `[simulation]` section; call [`Self::validate`] first
    /// or use [`Self::build`].
    pub fn sim_config(&self) -> SimConfig {
        let s = &self.simulation;
        SimConfig::new(s.horizon_steps, s.period_minutes, s.voltage)
            .with_linear_feasibility(s.linear_feasibility)
    }

    /// Validates the scenario and builds the network and workload.
    ///
    /// Explicit sessions come first, followed by synthetic ones drawn from
    /// `simulation.seed`. Synthetic sessions only use stations that no
    /// explicit session names.
    ///
    /// # Errors
    ///
    /// Every validation error, when there is at least one.
    pub fn build(&self) -> Result<Scenario, Vec<ConfigError>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }

        let models = StationModels::builtin();
        let mut network = ChargingNetwork::with_models(models.clone());
        for st in &self.stations {
            let Some(rates) = st.rate_domain(&models) else {
                continue;
            };
            let mut station = ChargingStation::new(st.id.clone(), rates);
            if let Some(limit) = st.ramp_limit {
                station = station.with_ramp_limit(limit);
            }
            network.register(station);
            if let Some(angle) = st.phase_angle {
                network.register_phase(st.id.clone(), angle);
            }
        }
        for p in &self.phases {
            network.register_phase(p.load.clone(), p.angle);
        }
        for c in &self.constraints {
            network.add_constraint(
                c.loads.iter().map(|(load, coef)| (load.clone(), *coef)),
                c.limit,
                c.name.as_deref(),
            );
        }

        let config = self.sim_config();
        let mut sessions: Vec<VehicleSession> =
            self.sessions.iter().map(SessionConfig::to_session).collect();
        if let Some(w) = &self.workload {
            let mut generator = SyntheticWorkload::new(
                w.sessions,
                w.energy_kwh_min,
                w.energy_kwh_max,
                w.dwell_steps_min,
                w.dwell_steps_max,
                w.max_rate,
                self.simulation.seed,
            );
            let free: Vec<&str> = self
                .stations
                .iter()
                .map(|s| s.id.as_str())
                .filter(|id| !self.sessions.iter().any(|ev| ev.station == *id))
                .collect();
            sessions.extend(generator.generate(&free, config.horizon));
        }

        Ok(Scenario {
            config,
            network,
            sessions,
            scheduler: self.simulation.scheduler.clone(),
        })
    }
}

fn validate_station(k: usize, st: &StationConfig, models: &StationModels, errors: &mut Vec<ConfigError>) {
    let field = |name: &str| format!("stations[{k}].{name}");
    let non_negative = |v: Option<f64>| v.is_some_and(|x| x >= 0.0);

    if st.id.is_empty() {
        errors.push(ConfigError::new(field("id"), "must not be empty"));
    }
    match st.kind {
        StationKind::Continuous => {
            if !non_negative(st.max_rate) {
                errors.push(ConfigError::new(field("max_rate"), "required, must be >= 0"));
            }
        }
        StationKind::Deadband => {
            if !non_negative(st.min_rate) {
                errors.push(ConfigError::new(field("min_rate"), "required, must be >= 0"));
            }
            if !non_negative(st.max_rate) {
                errors.push(ConfigError::new(field("max_rate"), "required, must be >= 0"));
            }
            match (st.min_rate, st.max_rate) {
                (Some(lo), Some(hi)) if lo > hi => {
                    errors.push(ConfigError::new(field("min_rate"), "must be <= max_rate"));
                }
                _ => {}
            }
        }
        StationKind::Discretized => match &st.rates {
            None => errors.push(ConfigError::new(field("rates"), "required")),
            Some(rates) if rates.iter().any(|r| !(r.is_finite() && *r >= 0.0)) => {
                errors.push(ConfigError::new(field("rates"), "must be finite and >= 0"));
            }
            Some(_) => {}
        },
        StationKind::Model => match st.model.as_deref() {
            None => errors.push(ConfigError::new(field("model"), "required")),
            Some(m) if !models.contains(m) => errors.push(ConfigError::new(
                field("model"),
                format!(
                    "unknown model \"{m}\", available: {}",
                    models.names().collect::<Vec<_>>().join(", ")
                ),
            )),
            Some(_) => {}
        },
    }
    if st.ramp_limit.is_some_and(|r| !(r >= 0.0)) {
        errors.push(ConfigError::new(field("ramp_limit"), "must be >= 0"));
    }
    if st.phase_angle.is_some_and(|a| !a.is_finite()) {
        errors.push(ConfigError::new(field("phase_angle"), "must be finite"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_preset_valid() {
        let errors = ScenarioConfig::demo().validate();
        assert!(errors.is_empty(), "demo should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn caltech_layout() {
        let cfg = ScenarioConfig::caltech();
        assert_eq!(cfg.stations.len(), 53);
        let clipper = cfg
            .stations
            .iter()
            .filter(|s| s.model.as_deref() == Some("ClipperCreek"))
            .count();
        assert_eq!(clipper, 8);
        assert!(cfg.stations.iter().any(|s| s.id == "CA-512"));
        assert!(!cfg.stations.iter().any(|s| s.id == "CA-513"));

        let scenario = cfg.build().unwrap();
        assert_eq!(scenario.network.len(), 53);
        assert_eq!(scenario.network.constraints().len(), 4);
        assert_eq!(
            scenario.network.station("CA-320").map(|s| s.allowed_rates()),
            Some(vec![0.0, 8.0, 16.0, 24.0, 32.0])
        );
        assert_eq!(scenario.network.constraints().phase_angle("CA-149"), -120.0);
    }

    #[test]
    fn valid_toml_parses_and_builds() {
        let toml = r#"
[simulation]
horizon_steps = 12
period_minutes = 5.0
voltage = 208.0
scheduler = "idle"

[[stations]]
id = "A"
kind = "continuous"
max_rate = 32.0
ramp_limit = 8.0

[[stations]]
id = "B"
kind = "deadband"
min_rate = 6.0
max_rate = 32.0

[[stations]]
id = "C"
kind = "discretized"
rates = [16.0, 8.0]

[[stations]]
id = "D"
kind = "model"
model = "ClipperCreek"
phase_angle = 120.0

[[constraints]]
name = "main"
limit = 80.0
loads = { A = 1.0, B = 1.0, C = 1.0, D = 1.0 }

[[phases]]
load = "A"
angle = -120.0

[[sessions]]
id = "s1"
station = "A"
arrival = 0
departure = 6
energy_kwh = 5.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let scenario = cfg.unwrap().build().unwrap();

        assert_eq!(scenario.config.horizon, 12);
        assert_eq!(scenario.scheduler, "idle");
        assert_eq!(scenario.network.station_ids(), vec!["A", "B", "C", "D"]);
        assert_eq!(
            scenario.network.station("C").map(|s| s.allowed_rates()),
            Some(vec![0.0, 8.0, 16.0])
        );
        assert_eq!(scenario.network.station("A").and_then(|s| s.ramp_limit()), Some(8.0));
        assert_eq!(scenario.network.constraints().phase_angle("A"), -120.0);
        assert_eq!(scenario.network.constraints().phase_angle("D"), 120.0);
        assert_eq!(scenario.sessions.len(), 1);
        assert_eq!(scenario.sessions[0].max_rate(), 32.0);
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
horizon_steps = 24
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[simulation]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        // seed overridden
        assert_eq!(cfg.as_ref().map(|c| c.simulation.seed), Some(99));
        // horizon kept default
        assert_eq!(cfg.as_ref().map(|c| c.simulation.horizon_steps), Some(288));
        assert_eq!(cfg.as_ref().map(|c| c.stations.len()), Some(0));
    }

    #[test]
    fn validation_collects_every_error() {
        let mut cfg = ScenarioConfig::demo();
        cfg.simulation.horizon_steps = 0;
        cfg.simulation.scheduler = "bogus".to_string();
        cfg.sessions[0].station = "nowhere".to_string();
        cfg.stations.push(StationConfig::model("EVSE-4", "Tesla"));
        let errors = cfg.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"simulation.horizon_steps"));
        assert!(fields.contains(&"simulation.scheduler"));
        assert!(fields.contains(&"sessions[0].station"));
        assert!(fields.contains(&"stations[3].model"));
    }

    #[test]
    fn validation_catches_missing_kind_parameters() {
        let mut cfg = ScenarioConfig::default();
        cfg.stations.push(StationConfig::new("X", StationKind::Deadband));
        cfg.stations.push(StationConfig::new("Y", StationKind::Discretized));
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "stations[0].min_rate"));
        assert!(errors.iter().any(|e| e.field == "stations[1].rates"));
    }

    #[test]
    fn validation_catches_duplicates_and_unknown_loads() {
        let mut cfg = ScenarioConfig::demo();
        cfg.stations.push(StationConfig::continuous("EVSE-1", 16.0));
        cfg.constraints[0].loads.insert("ghost".to_string(), 1.0);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "stations[3].id"));
        assert!(errors.iter().any(|e| e.message.contains("ghost")));
    }

    #[test]
    fn validation_catches_overlapping_sessions() {
        let mut cfg = ScenarioConfig::demo();
        cfg.sessions.push(SessionConfig {
            id: "clash".to_string(),
            station: "EVSE-1".to_string(),
            arrival: 5,
            departure: 10,
            energy_kwh: 1.0,
            max_rate: 32.0,
        });
        let errors = cfg.validate();
        let clash: Vec<&ConfigError> = errors
            .iter()
            .filter(|e| e.field == "sessions[3].arrival")
            .collect();
        assert_eq!(clash.len(), 1, "{errors:?}");
        assert!(clash[0].message.contains("ev-1"));
        assert!(cfg.build().is_err());
    }

    #[test]
    fn back_to_back_sessions_do_not_overlap() {
        let mut cfg = ScenarioConfig::demo();
        // ev-1 holds EVSE-1 over [0, 24)
        cfg.sessions.push(SessionConfig {
            id: "next".to_string(),
            station: "EVSE-1".to_string(),
            arrival: 24,
            departure: 30,
            energy_kwh: 1.0,
            max_rate: 32.0,
        });
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn workload_skips_stations_with_explicit_sessions() {
        let mut cfg = ScenarioConfig::demo();
        cfg.sessions.truncate(1);
        cfg.workload = Some(WorkloadConfig {
            sessions: 30,
            dwell_steps_min: 2,
            dwell_steps_max: 6,
            ..WorkloadConfig::default()
        });
        let scenario = cfg.build().unwrap();
        assert!(scenario.sessions.len() > 1);
        for s in &scenario.sessions[1..] {
            assert_ne!(s.station_id(), "EVSE-1", "{}", s.session_id());
        }
    }

    #[test]
    fn build_refuses_invalid_config() {
        let mut cfg = ScenarioConfig::demo();
        cfg.simulation.period_minutes = 0.0;
        let errors = cfg.build().unwrap_err();
        assert_eq!(errors[0].field, "simulation.period_minutes");
    }

    #[test]
    fn workload_is_seeded() {
        let a = ScenarioConfig::caltech().build().unwrap();
        let b = ScenarioConfig::caltech().build().unwrap();
        assert!(!a.sessions.is_empty());
        let ids = |s: &Scenario| {
            s.sessions
                .iter()
                .map(|v| (v.session_id().to_string(), v.station_id().to_string(), v.arrival()))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&a), ids(&b));
    }
}
