//! CLI command handlers.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::process::ExitCode;

use crate::config::PlantConfig;
use crate::error::SimResult;
use crate::plant::TracingSink;
use crate::simulation::{RunReport, Simulation};

use super::output::{print_help, print_run_summary, print_verification, print_version};
use super::{Args, Command};

/// Main CLI entry point.
///
/// Dispatches to the appropriate command handler based on parsed arguments.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    match args.command {
        Command::Run {
            config_path,
            minutes,
            output,
            verbose: _,
        } => run_plant(&config_path, minutes, output.as_deref()),
        Command::Verify { config_path, runs } => verify_reproducibility(&config_path, runs),
        Command::Validate { config_path } => validate_plant(&config_path),
        Command::Reference => print_reference(),
        Command::Help => {
            print_help();
            ExitCode::SUCCESS
        }
        Command::Version => {
            print_version();
            ExitCode::SUCCESS
        }
    }
}

/// Simulate a plant from a YAML file.
///
/// An aborted run still writes the ticks it completed before exiting with
/// a failure code.
#[must_use]
pub fn run_plant(path: &Path, minutes: Option<u64>, output: Option<&Path>) -> ExitCode {
    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║           waterplant - Treatment Plant Simulation             ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    let config = match PlantConfig::load(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };
    let minutes = minutes.unwrap_or(config.run.minutes);

    println!("Running {} for {minutes} minutes\n", path.display());

    let (report, log_result) = match simulate(&config, minutes, output) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    print_run_summary(&config.simulation.name, &report);

    if let Err(e) = log_result {
        eprintln!("Error writing tick log: {e}");
        return ExitCode::from(1);
    }
    if let Some(path) = output {
        println!("Tick log written to {}", path.display());
    }

    if report.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn simulate(
    config: &PlantConfig,
    minutes: u64,
    output: Option<&Path>,
) -> SimResult<(RunReport, SimResult<()>)> {
    let mut sim = Simulation::from_config(config)?.with_event_sink(Box::new(TracingSink));
    let report = sim.run(minutes);

    let log_result = match output {
        Some(path) => write_tick_log(&sim, path),
        None => Ok(()),
    };

    Ok((report, log_result))
}

fn write_tick_log(sim: &Simulation, path: &Path) -> SimResult<()> {
    let file = File::create(path)?;
    sim.treatment()
        .results()
        .write_json_lines(BufWriter::new(file))
}

/// Validate a plant YAML file.
#[must_use]
pub fn validate_plant(path: &Path) -> ExitCode {
    println!("Validating: {}\n", path.display());

    match PlantConfig::load(path) {
        Ok(config) => {
            println!("✓ Plant configuration is valid");
            println!("  Name:           {}", config.simulation.name);
            println!("  Filter streets: {}", config.filter_streets.len());
            println!(
                "  Filters:        {}",
                config
                    .filter_streets
                    .iter()
                    .map(|s| s.filter_count)
                    .sum::<usize>()
            );
            println!("  Run length:     {} minutes", config.run.minutes);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("✗ Validation FAILED");
            println!("  {e}");
            ExitCode::from(1)
        }
    }
}

/// Run a plant `runs` times and compare result-log fingerprints.
#[must_use]
pub fn verify_reproducibility(path: &Path, runs: usize) -> ExitCode {
    let config = match PlantConfig::load(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    println!("Verifying reproducibility: {}", path.display());
    println!("Runs: {runs}\n");

    let mut fingerprints = Vec::with_capacity(runs);
    for _ in 0..runs.max(1) {
        match Simulation::from_config(&config) {
            Ok(mut sim) => fingerprints.push(sim.run(config.run.minutes).summary.fingerprint),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::from(1);
            }
        }
    }

    let identical = fingerprints.windows(2).all(|w| w[0] == w[1]);
    print_verification(&fingerprints, identical);

    if identical {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn print_reference() -> ExitCode {
    match PlantConfig::reference().to_yaml() {
        Ok(yaml) => {
            print!("{yaml}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}
