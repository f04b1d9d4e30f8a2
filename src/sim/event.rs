//! Simulation event log.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
        }
    }
}

/// One recorded anomaly or notable occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimEvent {
    pub severity: Severity,
    pub time_index: usize,
    pub message: String,
    pub station_id: Option<String>,
    pub session_id: Option<String>,
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] t={}: {}", self.severity, self.time_index, self.message)
    }
}

/// Append-only log of [`SimEvent`]s. Every entry is also traced.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(
        &mut self,
        time_index: usize,
        message: impl Into<String>,
        station_id: Option<&str>,
        session_id: Option<&str>,
    ) {
        let message = message.into();
        info!(time_index, station = station_id, session = session_id, "{message}");
        self.push(Severity::Info, time_index, message, station_id, session_id);
    }

    pub fn warning(
        &mut self,
        time_index: usize,
        message: impl Into<String>,
        station_id: Option<&str>,
        session_id: Option<&str>,
    ) {
        let message = message.into();
        warn!(time_index, station = station_id, session = session_id, "{message}");
        self.push(Severity::Warning, time_index, message, station_id, session_id);
    }

    fn push(
        &mut self,
        severity: Severity,
        time_index: usize,
        message: String,
        station_id: Option<&str>,
        session_id: Option<&str>,
    ) {
        self.events.push(SimEvent {
            severity,
            time_index,
            message,
            station_id: station_id.map(str::to_string),
            session_id: session_id.map(str::to_string),
        });
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn warnings(&self) -> impl Iterator<Item = &SimEvent> {
        self.events
            .iter()
            .filter(|e| e.severity == Severity::Warning)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn into_events(self) -> Vec<SimEvent> {
        self.events
    }
}
