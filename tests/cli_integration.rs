use std::path::PathBuf;
use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_acn-sim"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("acn-sim process should run")
}

fn stdout_of(args: &[&str]) -> String {
    let output = run_cli(args);
    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout should be valid UTF-8")
}

fn parse_metric(stdout: &str, label: &str) -> String {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing report line `{label}` in output: {stdout}"));
    line.split_once(':')
        .map(|(_, right)| right.trim().to_string())
        .unwrap_or_else(|| panic!("invalid report format for line `{line}`"))
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("acn-sim-{}-{name}", std::process::id()))
}

#[test]
fn demo_scenario_file_matches_preset() {
    let from_file = stdout_of(&["--scenario", "scenarios/demo.toml"]);
    let from_preset = stdout_of(&["--preset", "demo"]);
    assert_eq!(from_file, from_preset);

    let energy = parse_metric(&from_file, "Energy delivered:");
    assert!(energy.ends_with("(100.0%)"), "unexpected energy line: {energy}");
    let warnings: usize = parse_metric(&from_file, "Warnings:")
        .parse()
        .expect("warning count should be an integer");
    assert!(warnings > 0);
}

#[test]
fn mixed_phase_scenario_runs() {
    let stdout = stdout_of(&["--scenario", "scenarios/mixed_phases.toml"]);
    assert!(stdout.contains("--- Simulation Report (uncontrolled) ---"));
    let sessions: usize = parse_metric(&stdout, "Sessions:")
        .parse()
        .expect("session count should be an integer");
    assert!(sessions > 0);
}

#[test]
fn outputs_are_written() {
    let steps = temp_path("steps.csv");
    let sessions = temp_path("sessions.csv");
    let report = temp_path("report.json");
    stdout_of(&[
        "--preset",
        "demo",
        "--telemetry-out",
        steps.to_str().unwrap_or_default(),
        "--sessions-out",
        sessions.to_str().unwrap_or_default(),
        "--report-out",
        report.to_str().unwrap_or_default(),
    ]);

    let steps_csv = std::fs::read_to_string(&steps).expect("steps CSV should exist");
    assert!(steps_csv.starts_with("time_index,total_draw_a"));
    assert!(steps_csv.contains("EVSE-1_pilot"));

    let sessions_csv = std::fs::read_to_string(&sessions).expect("sessions CSV should exist");
    assert_eq!(sessions_csv.lines().count(), 4);

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(&report).expect("report JSON should exist"),
    )
    .expect("report should be valid JSON");
    assert_eq!(json["scheduler"], "uncontrolled");
    assert_eq!(json["sessions"].as_array().map(Vec::len), Some(3));
    assert!(json["occupancy"]["EVSE-2"].is_array());

    for path in [steps, sessions, report] {
        std::fs::remove_file(path).ok();
    }
}

#[test]
fn invalid_inputs_fail() {
    assert!(!run_cli(&["--preset", "nonexistent"]).status.success());
    assert!(!run_cli(&["--seed", "not-a-number"]).status.success());
    assert!(!run_cli(&["--bogus"]).status.success());
}
