use crate::devices::ev::VehicleSession;
use crate::devices::rates::RateDomain;
use crate::error::{Result, SimError};

/// A charging station (EVSE) holding at most one vehicle session.
///
/// The station validates every pilot against its [`RateDomain`] before
/// applying it, whether or not a vehicle is plugged in. Mutations stay local:
/// re-checking network constraints is the caller's job.
///
/// # Examples
///
/// ```
/// use acn_sim::devices::{ChargingStation, RateDomain, VehicleSession};
///
/// let mut evse = ChargingStation::new("CA-148", RateDomain::deadband(6.0, 32.0));
/// evse.plugin(VehicleSession::new("s-1", "CA-148", 0, 10, 5.0, 32.0)).unwrap();
/// evse.set_pilot(16.0, 240.0, 5.0).unwrap();
/// assert_eq!(evse.current_pilot(), 16.0);
/// assert!(evse.set_pilot(3.0, 240.0, 5.0).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ChargingStation {
    station_id: String,
    rates: RateDomain,
    current_pilot: f64,
    ramp_limit: Option<f64>,
    occupant: Option<VehicleSession>,
}

impl ChargingStation {
    /// Creates an empty station with the given rate domain.
    pub fn new(station_id: impl Into<String>, rates: RateDomain) -> Self {
        Self {
            station_id: station_id.into(),
            rates,
            current_pilot: 0.0,
            ramp_limit: None,
            occupant: None,
        }
    }

    /// Sets the largest pilot change per period the device tolerates.
    ///
    /// Exceeding it is reported by the stepper as a warning; the station
    /// itself still applies the pilot.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is negative.
    pub fn with_ramp_limit(mut self, limit: f64) -> Self {
        assert!(limit >= 0.0, "ramp limit must be >= 0");
        self.ramp_limit = Some(limit);
        self
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn rate_domain(&self) -> &RateDomain {
        &self.rates
    }

    /// Allowed pilot magnitudes; see [`RateDomain::allowed_rates`].
    pub fn allowed_rates(&self) -> Vec<f64> {
        self.rates.allowed_rates()
    }

    /// Last accepted pilot (A).
    pub fn current_pilot(&self) -> f64 {
        self.current_pilot
    }

    pub fn ramp_limit(&self) -> Option<f64> {
        self.ramp_limit
    }

    pub fn occupant(&self) -> Option<&VehicleSession> {
        self.occupant.as_ref()
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Attaches `session` and resets the pilot to zero.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Occupied`] if a session is already attached; the
    /// existing occupant stays in place.
    pub fn plugin(&mut self, session: VehicleSession) -> Result<()> {
        if let Some(current) = &self.occupant {
            return Err(SimError::Occupied {
                station_id: self.station_id.clone(),
                occupant: current.session_id().to_string(),
            });
        }
        self.occupant = Some(session);
        self.current_pilot = 0.0;
        Ok(())
    }

    /// Detaches and returns the occupant, if any. Always zeroes the pilot.
    pub fn unplug(&mut self) -> Option<VehicleSession> {
        self.current_pilot = 0.0;
        self.occupant.take().map(|mut session| {
            session.reset_rate();
            session
        })
    }

    /// Validates and applies a pilot for one period.
    ///
    /// With an occupant, the vehicle charges under the pilot for
    /// `period_minutes` at `voltage`. Without one, the pilot is only stored.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidRate`] if `rate` is not in the allowed
    /// domain; `current_pilot` is left unchanged.
    pub fn set_pilot(&mut self, rate: f64, voltage: f64, period_minutes: f64) -> Result<()> {
        if !self.rates.contains(rate) {
            return Err(SimError::InvalidRate {
                station_id: self.station_id.clone(),
                rate,
            });
        }
        if let Some(session) = &mut self.occupant {
            session.charge(rate, voltage, period_minutes);
        }
        self.current_pilot = rate;
        Ok(())
    }

    /// Instantaneous current draw: the occupant's realised rate, or 0.
    pub fn current_draw(&self) -> f64 {
        self.occupant
            .as_ref()
            .map_or(0.0, VehicleSession::current_charging_rate)
    }
}
