//! CSV export for step records and session summaries.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::report::SessionSummary;
use crate::sim::types::StepResult;

/// Leading columns of the step CSV; per-station `<id>_pilot,<id>_draw` pairs follow.
const STEP_HEADER: &str = "time_index,total_draw_a,active_sessions,feasible,violated_constraint";

/// Column header of the session CSV.
const SESSION_HEADER: &str = "session_id,station_id,arrival,departure,\
                              energy_requested_kwh,energy_delivered_kwh,fraction_delivered";

/// Exports step records to a CSV file at the given path.
///
/// Stations are taken from the first record, in registration order.
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_steps_csv(results: &[StepResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_steps_csv(results, io::BufWriter::new(file))
}

/// Writes step records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_steps_csv(results: &[StepResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let stations: Vec<&str> = results
        .first()
        .map(|r| r.pilots.keys().map(String::as_str).collect())
        .unwrap_or_default();

    let mut header: Vec<String> = STEP_HEADER.split(',').map(str::to_string).collect();
    for id in &stations {
        header.push(format!("{id}_pilot"));
        header.push(format!("{id}_draw"));
    }
    wtr.write_record(&header)?;

    for r in results {
        let mut row = vec![
            r.time_index.to_string(),
            format!("{:.4}", r.total_draw),
            r.active_sessions.to_string(),
            r.feasible.to_string(),
            r.violated_constraint.clone().unwrap_or_default(),
        ];
        for id in &stations {
            row.push(format!("{:.4}", r.pilots.get(*id).copied().unwrap_or(0.0)));
            row.push(format!("{:.4}", r.draw.get(*id).copied().unwrap_or(0.0)));
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports session summaries to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_sessions_csv(sessions: &[SessionSummary], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_sessions_csv(sessions, io::BufWriter::new(file))
}

/// Writes session summaries as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_sessions_csv(sessions: &[SessionSummary], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SESSION_HEADER.split(',').map(str::trim))?;

    for s in sessions {
        wtr.write_record(&[
            s.session_id.clone(),
            s.station_id.clone(),
            s.arrival.to_string(),
            s.departure.to_string(),
            format!("{:.4}", s.energy_requested),
            format!("{:.4}", s.energy_delivered),
            format!("{:.4}", s.fraction_delivered()),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
