//! Seeded synthetic session generator.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::devices::VehicleSession;

/// Random session workload over a fixed set of stations.
///
/// Each draw samples:
/// - a dwell duration (which sets the departure)
/// - an arrival index so the session ends within the horizon
/// - a requested energy in kWh
///
/// and places the session on a random station that is free for the whole
/// dwell. Draws that find no free station are dropped, so the returned
/// workload never double-books a station.
#[derive(Debug, Clone)]
pub struct SyntheticWorkload {
    /// Number of sessions to attempt.
    pub sessions: usize,
    /// Minimum requested energy (kWh).
    pub energy_kwh_min: f64,
    /// Maximum requested energy (kWh).
    pub energy_kwh_max: f64,
    /// Minimum dwell in time indices.
    pub dwell_steps_min: usize,
    /// Maximum dwell in time indices.
    pub dwell_steps_max: usize,
    /// Vehicle-side current limit (A).
    pub max_rate: f64,
    rng: StdRng,
}

impl SyntheticWorkload {
    /// Creates a generator.
    ///
    /// # Arguments
    ///
    /// * `sessions` - Number of sessions to attempt
    /// * `energy_kwh_min` - Minimum requested energy in kWh
    /// * `energy_kwh_max` - Maximum requested energy in kWh
    /// * `dwell_steps_min` - Minimum dwell in steps (must be > 0)
    /// * `dwell_steps_max` - Maximum dwell in steps
    /// * `max_rate` - Vehicle current limit in A
    /// * `seed` - Random seed for reproducible workloads
    ///
    /// # Panics
    ///
    /// Panics if the energy or dwell ranges are invalid or `max_rate` is negative.
    pub fn new(
        sessions: usize,
        energy_kwh_min: f64,
        energy_kwh_max: f64,
        dwell_steps_min: usize,
        dwell_steps_max: usize,
        max_rate: f64,
        seed: u64,
    ) -> Self {
        assert!(energy_kwh_min >= 0.0);
        assert!(energy_kwh_max >= energy_kwh_min);
        assert!(dwell_steps_min > 0);
        assert!(dwell_steps_max >= dwell_steps_min);
        assert!(max_rate >= 0.0);
        Self {
            sessions,
            energy_kwh_min,
            energy_kwh_max,
            dwell_steps_min,
            dwell_steps_max,
            max_rate,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws a workload for `station_ids` over `horizon` time indices,
    /// sorted by arrival.
    pub fn generate(&mut self, station_ids: &[&str], horizon: usize) -> Vec<VehicleSession> {
        let mut out = Vec::new();
        if station_ids.is_empty() || horizon == 0 {
            return out;
        }
        let mut booked: Vec<Vec<(usize, usize)>> = vec![Vec::new(); station_ids.len()];

        for k in 0..self.sessions {
            let dwell_max = self.dwell_steps_max.min(horizon);
            let dwell_min = self.dwell_steps_min.min(dwell_max);
            let dwell = self.rng.random_range(dwell_min..=dwell_max);
            let arrival = self.rng.random_range(0..=horizon - dwell);
            let departure = arrival + dwell;
            let energy = self
                .rng
                .random_range(self.energy_kwh_min..=self.energy_kwh_max);

            let free: Vec<usize> = booked
                .iter()
                .enumerate()
                .filter(|(_, slots)| slots.iter().all(|&(a, d)| departure <= a || d <= arrival))
                .map(|(idx, _)| idx)
                .collect();
            if free.is_empty() {
                debug!(arrival, departure, "no free station, dropping session");
                continue;
            }
            let idx = free[self.rng.random_range(0..free.len())];
            booked[idx].push((arrival, departure));
            out.push(VehicleSession::new(
                format!("ev-{k:04}"),
                station_ids[idx],
                arrival,
                departure,
                energy,
                self.max_rate,
            ));
        }

        out.sort_by_key(VehicleSession::arrival);
        out
    }
}
