//! acn-sim entry point: CLI wiring and config-driven engine construction.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use acn_sim::config::{Scenario, ScenarioConfig};
use acn_sim::io::export::{export_sessions_csv, export_steps_csv};
use acn_sim::sim::engine::Engine;
use acn_sim::sim::report::SimReport;
use acn_sim::sim::scheduler::{IdleScheduler, Scheduler, UncontrolledScheduler};

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    telemetry_out: Option<String>,
    sessions_out: Option<String>,
    report_out: Option<String>,
}

fn print_help() {
    eprintln!("acn-sim: discrete-time EV charging network simulator");
    eprintln!();
    eprintln!("Usage: acn-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --telemetry-out <path>   Export step results to CSV");
    eprintln!("  --sessions-out <path>    Export session summaries to CSV");
    eprintln!("  --report-out <path>      Write the full report as JSON");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the demo preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

fn next_value(args: &[String], i: &mut usize, flag: &str, what: &str) -> String {
    *i += 1;
    if *i >= args.len() {
        eprintln!("error: {flag} requires a {what} argument");
        process::exit(1);
    }
    args[*i].clone()
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        telemetry_out: None,
        sessions_out: None,
        report_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => cli.scenario_path = Some(next_value(&args, &mut i, "--scenario", "path")),
            "--preset" => cli.preset = Some(next_value(&args, &mut i, "--preset", "name")),
            "--seed" => {
                let raw = next_value(&args, &mut i, "--seed", "u64");
                if let Ok(s) = raw.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{raw}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--telemetry-out" => {
                cli.telemetry_out = Some(next_value(&args, &mut i, "--telemetry-out", "path"));
            }
            "--sessions-out" => {
                cli.sessions_out = Some(next_value(&args, &mut i, "--sessions-out", "path"));
            }
            "--report-out" => cli.report_out = Some(next_value(&args, &mut i, "--report-out", "path")),
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn run_with<S: Scheduler>(scenario: Scenario, scheduler: S) -> SimReport {
    let mut engine = Engine::new(scenario.config, scenario.network, scheduler, scenario.sessions);
    match engine.run() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn write_json(report: &SimReport, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    serde_json::to_writer_pretty(BufWriter::new(file), report).map_err(|e| e.to_string())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();

    // Load config: --scenario takes priority, then --preset, then demo default
    let mut cfg = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::demo()
    };

    if let Some(seed) = cli.seed_override {
        cfg.simulation.seed = seed;
    }

    let scenario = match cfg.build() {
        Ok(scenario) => scenario,
        Err(errors) => {
            for e in &errors {
                eprintln!("{e}");
            }
            process::exit(1);
        }
    };

    let report = if scenario.scheduler == "idle" {
        run_with(scenario, IdleScheduler)
    } else {
        run_with(scenario, UncontrolledScheduler)
    };

    for r in &report.results {
        println!("{r}");
    }
    println!("\n{report}");

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_steps_csv(&report.results, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }
    if let Some(ref path) = cli.sessions_out {
        if let Err(e) = export_sessions_csv(&report.sessions, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Sessions written to {path}");
    }
    if let Some(ref path) = cli.report_out {
        if let Err(e) = write_json(&report, Path::new(path)) {
            eprintln!("error: failed to write report: {e}");
            process::exit(1);
        }
        eprintln!("Report written to {path}");
    }
}
