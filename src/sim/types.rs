//! Core simulation types: configuration and per-step records.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

/// Engine-wide simulation parameters.
///
/// # Examples
///
/// ```
/// use acn_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(288, 5.0, 240.0);
/// assert_eq!(cfg.duration_minutes(), 1440.0);
/// assert!(!cfg.linear_feasibility);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct SimConfig {
    /// Number of time indices to simulate.
    pub horizon: usize,
    /// Length of one time index in minutes.
    pub period_minutes: f64,
    /// Supply voltage used for energy integration (V).
    pub voltage: f64,
    /// Check feasibility with the linear (phase-blind) bound instead of phasor sums.
    pub linear_feasibility: bool,
}

impl SimConfig {
    /// Creates a configuration with phasor-sum feasibility checks.
    ///
    /// # Panics
    ///
    /// Panics if `horizon` is zero or `period_minutes`/`voltage` is not positive.
    pub fn new(horizon: usize, period_minutes: f64, voltage: f64) -> Self {
        assert!(horizon > 0, "horizon must be > 0");
        assert!(period_minutes > 0.0, "period_minutes must be > 0");
        assert!(voltage > 0.0, "voltage must be > 0");
        Self {
            horizon,
            period_minutes,
            voltage,
            linear_feasibility: false,
        }
    }

    /// Switches feasibility checks to the linear bound.
    pub fn with_linear_feasibility(mut self, linear: bool) -> Self {
        self.linear_feasibility = linear;
        self
    }

    /// Full horizon length in minutes.
    pub fn duration_minutes(&self) -> f64 {
        self.horizon as f64 * self.period_minutes
    }
}

/// Record of one simulated time index.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub time_index: usize,
    /// Station id → applied pilot (A), every registered station.
    pub pilots: IndexMap<String, f64>,
    /// Station id → realised draw (A), every registered station.
    pub draw: IndexMap<String, f64>,
    /// Sum of `draw`.
    pub total_draw: f64,
    /// Number of plugged-in sessions still needing energy after this step.
    pub active_sessions: usize,
    /// Whether `draw` satisfied every network constraint.
    pub feasible: bool,
    /// First violated constraint when infeasible.
    pub violated_constraint: Option<String>,
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>4} | draw={:>8.2} A | active={:>3} | feasible={}",
            self.time_index, self.total_draw, self.active_sessions, self.feasible
        )?;
        if let Some(name) = &self.violated_constraint {
            write!(f, " ({name})")?;
        }
        Ok(())
    }
}
