//! Network capacity constraints evaluated as phasor sums.
//!
//! Each constraint bounds the magnitude of a weighted sum of load currents.
//! Loads carry a phase angle, so the sum is taken over complex phasors: two
//! 16 A loads 120° apart combine to 16 A, not 32 A. The `linear` mode drops
//! the phase information and adds magnitudes, which is never less than the
//! phasor sum and therefore a safe over-estimate.

use indexmap::IndexMap;
use tracing::debug;

use super::phasor::Phasor;

/// Absolute slack (A) allowed when comparing against a limit.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-7;

/// Load name → current magnitude (A).
pub type LoadCurrents = IndexMap<String, f64>;

/// A single capacity constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Load name → per-unit contribution. Loads not listed contribute zero.
    pub coefficients: IndexMap<String, f64>,
    /// Magnitude limit (A).
    pub limit: f64,
}

/// Ordered, named collection of capacity constraints plus load phase angles.
///
/// Constraints refer to loads by name only, so they can be declared before
/// the stations they mention exist.
///
/// # Examples
///
/// ```
/// use acn_sim::sim::constraint::{ConstraintSet, LoadCurrents};
///
/// let mut set = ConstraintSet::new();
/// set.add_constraint([("A", 1.0), ("B", 1.0)], 32.0, Some("feeder"));
/// set.register_phase("B", 180.0);
///
/// let loads = LoadCurrents::from([("A".to_string(), 30.0), ("B".to_string(), 10.0)]);
/// assert!(set.is_feasible(&loads, 0, false)); // |30 - 10| = 20
/// assert!(!set.is_feasible(&loads, 0, true)); // 30 + 10 = 40
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    constraints: IndexMap<String, Constraint>,
    angles: IndexMap<String, f64>,
    next_auto_id: usize,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `load` with a phase angle in degrees, replacing any
    /// previous angle.
    pub fn register_phase(&mut self, load: impl Into<String>, angle_deg: f64) {
        self.angles.insert(load.into(), angle_deg);
    }

    /// Phase angle of `load` in degrees; unregistered loads sit at 0°.
    pub fn phase_angle(&self, load: &str) -> f64 {
        self.angles.get(load).copied().unwrap_or(0.0)
    }

    /// Adds a constraint and returns its name.
    ///
    /// Without a name, one of the form `_const_N` is generated. A constraint
    /// with an existing name replaces the old one in place.
    pub fn add_constraint<I, K>(&mut self, coefficients: I, limit: f64, name: Option<&str>) -> String
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let name = match name {
            Some(n) => n.to_string(),
            None => self.auto_name(),
        };
        let coefficients = coefficients
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        self.constraints.insert(
            name.clone(),
            Constraint {
                coefficients,
                limit,
            },
        );
        name
    }

    fn auto_name(&mut self) -> String {
        loop {
            let candidate = format!("_const_{}", self.next_auto_id);
            self.next_auto_id += 1;
            if !self.constraints.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Constraint> {
        self.constraints.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constraints.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Combined current through `constraint` for the given loads.
    fn combined_current(&self, constraint: &Constraint, loads: &LoadCurrents, linear: bool) -> f64 {
        if linear {
            return constraint
                .coefficients
                .iter()
                .map(|(load, coef)| coef.abs() * loads.get(load).map_or(0.0, |m| m.abs()))
                .sum();
        }
        let mut sum = Phasor::ZERO;
        for (load, coef) in &constraint.coefficients {
            let magnitude = loads.get(load).copied().unwrap_or(0.0);
            sum += Phasor::from_polar_deg(magnitude, self.phase_angle(load)) * *coef;
        }
        sum.magnitude()
    }

    /// Combined current for every constraint, in declaration order.
    pub fn constraint_currents(&self, loads: &LoadCurrents, linear: bool) -> IndexMap<String, f64> {
        self.constraints
            .iter()
            .map(|(name, c)| (name.clone(), self.combined_current(c, loads, linear)))
            .collect()
    }

    /// Name of the first violated constraint, or `None` if all hold.
    pub fn first_violation(&self, loads: &LoadCurrents, linear: bool) -> Option<&str> {
        self.constraints
            .iter()
            .find(|(_, c)| self.combined_current(c, loads, linear) > c.limit + FEASIBILITY_TOLERANCE)
            .map(|(name, _)| name.as_str())
    }

    /// Returns `true` when every constraint holds for `loads`.
    ///
    /// Stops at the first violated constraint. Constraints are the same at
    /// every time index; `time_index` only tags diagnostics.
    pub fn is_feasible(&self, loads: &LoadCurrents, time_index: usize, linear: bool) -> bool {
        match self.first_violation(loads, linear) {
            Some(name) => {
                debug!(time_index, constraint = name, linear, "constraint violated");
                false
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loads(pairs: &[(&str, f64)]) -> LoadCurrents {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn shared_40a() -> ConstraintSet {
        let mut set = ConstraintSet::new();
        set.add_constraint([("A", 1.0), ("B", 1.0), ("C", 1.0)], 40.0, Some("main"));
        for load in ["A", "B", "C"] {
            set.register_phase(load, 0.0);
        }
        set
    }

    #[test]
    fn three_stations_over_limit() {
        let set = shared_40a();
        let l = loads(&[("A", 20.0), ("B", 15.0), ("C", 10.0)]);
        assert!(!set.is_feasible(&l, 0, false));
        assert!(!set.is_feasible(&l, 0, true));
        assert_eq!(set.first_violation(&l, false), Some("main"));
    }

    #[test]
    fn three_stations_under_limit() {
        let set = shared_40a();
        let l = loads(&[("A", 10.0), ("B", 10.0), ("C", 10.0)]);
        assert!(set.is_feasible(&l, 0, false));
        assert!(set.is_feasible(&l, 0, true));
    }

    #[test]
    fn exactly_at_limit_is_feasible() {
        let set = shared_40a();
        let l = loads(&[("A", 20.0), ("B", 20.0)]);
        assert!(set.is_feasible(&l, 0, false));
    }

    #[test]
    fn missing_loads_contribute_zero() {
        let set = shared_40a();
        assert!(set.is_feasible(&loads(&[("A", 40.0)]), 0, false));
        assert!(set.is_feasible(&LoadCurrents::new(), 0, false));
    }

    #[test]
    fn unknown_loads_are_ignored() {
        let set = shared_40a();
        assert!(set.is_feasible(&loads(&[("Z", 500.0)]), 0, false));
    }

    #[test]
    fn phase_separation_relaxes_nonlinear_check() {
        let mut set = ConstraintSet::new();
        set.add_constraint([("A", 1.0), ("B", 1.0), ("C", 1.0)], 20.0, None);
        set.register_phase("A", 0.0);
        set.register_phase("B", -120.0);
        set.register_phase("C", 120.0);
        let l = loads(&[("A", 16.0), ("B", 16.0), ("C", 16.0)]);
        assert!(set.is_feasible(&l, 0, false));
        assert!(!set.is_feasible(&l, 0, true));
    }

    #[test]
    fn line_current_of_delta_connection() {
        // Line current A = I_ab - I_ca for a delta-connected load pair.
        let mut set = ConstraintSet::new();
        set.add_constraint([("AB", 1.0), ("CA", -1.0)], 30.0, Some("line_a"));
        set.register_phase("AB", 30.0);
        set.register_phase("CA", 150.0);
        let currents = set.constraint_currents(&loads(&[("AB", 16.0), ("CA", 16.0)]), false);
        let expected = 16.0 * 3f64.sqrt();
        assert!((currents["line_a"] - expected).abs() < 1e-9);
    }

    #[test]
    fn register_phase_overwrites() {
        let mut set = ConstraintSet::new();
        set.register_phase("A", 30.0);
        set.register_phase("A", -90.0);
        assert_eq!(set.phase_angle("A"), -90.0);
        assert_eq!(set.phase_angle("unregistered"), 0.0);
    }

    #[test]
    fn auto_names_are_sequential_and_duplicates_overwrite() {
        let mut set = ConstraintSet::new();
        assert_eq!(set.add_constraint([("A", 1.0)], 10.0, None), "_const_0");
        assert_eq!(set.add_constraint([("A", 1.0)], 10.0, None), "_const_1");
        set.add_constraint([("A", 1.0)], 99.0, Some("_const_0"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("_const_0").map(|c| c.limit), Some(99.0));
        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["_const_0", "_const_1"]);
    }

    #[test]
    fn short_circuits_on_first_violation() {
        let mut set = ConstraintSet::new();
        set.add_constraint([("A", 1.0)], 5.0, Some("first"));
        set.add_constraint([("A", 1.0)], 1.0, Some("second"));
        assert_eq!(set.first_violation(&loads(&[("A", 10.0)]), false), Some("first"));
    }
}
