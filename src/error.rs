//! Error types for the charging-network engine.

use thiserror::Error;

/// Fatal errors raised by stations, the network registry, and the stepper.
///
/// Network-feasibility violations are not errors; the stepper records them
/// as warning events.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A pilot was requested that the station cannot produce.
    #[error("invalid pilot {rate} A for station {station_id}")]
    InvalidRate { station_id: String, rate: f64 },

    /// A session was plugged into a station that already has an occupant.
    #[error("station {station_id} is already occupied by session {occupant}")]
    Occupied {
        station_id: String,
        occupant: String,
    },

    /// A station id was referenced that was never registered.
    #[error("station {0} not found")]
    UnknownStation(String),

    /// Wraps a fatal error with the time index at which it occurred.
    #[error("at time index {time_index}: {source}")]
    AtTimeIndex {
        time_index: usize,
        #[source]
        source: Box<SimError>,
    },
}

impl SimError {
    /// Attaches a time index to this error.
    pub fn at(self, time_index: usize) -> Self {
        SimError::AtTimeIndex {
            time_index,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping time-index wrappers.
    pub fn root(&self) -> &SimError {
        match self {
            SimError::AtTimeIndex { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
