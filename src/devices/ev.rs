use serde::Serialize;

/// Minutes per hour, for converting period length into energy.
const MINUTES_PER_HOUR: f64 = 60.0;

/// One vehicle charging session.
///
/// Arrival and departure are time indices on the simulation grid. Energy is
/// in kWh, rates in amps. The assigned station is a back-reference by id; the
/// station owns the session while it is plugged in.
///
/// # Examples
///
/// ```
/// use acn_sim::devices::VehicleSession;
///
/// let mut ev = VehicleSession::new("s-1", "CA-303", 0, 12, 2.0, 32.0);
/// let rate = ev.charge(16.0, 240.0, 5.0);
/// assert_eq!(rate, 16.0);
/// assert!((ev.energy_delivered() - 0.32).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSession {
    session_id: String,
    station_id: String,
    arrival: usize,
    departure: usize,
    requested_energy: f64,
    max_rate: f64,
    energy_delivered: f64,
    current_charging_rate: f64,
}

impl VehicleSession {
    /// Creates a new session with nothing delivered yet.
    ///
    /// # Panics
    ///
    /// Panics if `departure < arrival`, or if energy or max rate is negative.
    pub fn new(
        session_id: impl Into<String>,
        station_id: impl Into<String>,
        arrival: usize,
        departure: usize,
        requested_energy: f64,
        max_rate: f64,
    ) -> Self {
        assert!(departure >= arrival, "departure must be >= arrival");
        assert!(requested_energy >= 0.0, "requested_energy must be >= 0");
        assert!(max_rate >= 0.0, "max_rate must be >= 0");
        Self {
            session_id: session_id.into(),
            station_id: station_id.into(),
            arrival,
            departure,
            requested_energy,
            max_rate,
            energy_delivered: 0.0,
            current_charging_rate: 0.0,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn arrival(&self) -> usize {
        self.arrival
    }

    pub fn departure(&self) -> usize {
        self.departure
    }

    /// Requested energy in kWh.
    pub fn requested_energy(&self) -> f64 {
        self.requested_energy
    }

    /// Maximum rate the vehicle accepts, in amps.
    pub fn max_rate(&self) -> f64 {
        self.max_rate
    }

    /// Energy delivered so far in kWh.
    pub fn energy_delivered(&self) -> f64 {
        self.energy_delivered
    }

    /// Energy still owed in kWh.
    pub fn remaining_demand(&self) -> f64 {
        (self.requested_energy - self.energy_delivered).max(0.0)
    }

    /// Rate realised during the last charge application, in amps.
    pub fn current_charging_rate(&self) -> f64 {
        self.current_charging_rate
    }

    pub fn fully_charged(&self) -> bool {
        self.energy_delivered >= self.requested_energy
    }

    /// Integrates one period of charging under `pilot` and returns the rate
    /// actually drawn.
    ///
    /// The realised rate never exceeds the pilot, the vehicle's max rate, or
    /// the rate that would exactly complete the remaining demand.
    pub fn charge(&mut self, pilot: f64, voltage: f64, period_minutes: f64) -> f64 {
        let kwh_per_amp = voltage * period_minutes / MINUTES_PER_HOUR / 1000.0;
        let remaining = self.remaining_demand();
        let finishing_rate = if kwh_per_amp > 0.0 {
            remaining / kwh_per_amp
        } else {
            f64::INFINITY
        };

        let rate = pilot.min(self.max_rate).max(0.0);
        if rate >= finishing_rate {
            self.current_charging_rate = finishing_rate;
            self.energy_delivered = self.requested_energy;
        } else {
            self.current_charging_rate = rate;
            self.energy_delivered += rate * kwh_per_amp;
        }
        self.current_charging_rate
    }

    /// Clears the instantaneous draw, e.g. when the session is unplugged.
    pub fn reset_rate(&mut self) {
        self.current_charging_rate = 0.0;
    }
}
