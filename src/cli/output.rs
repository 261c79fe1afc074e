//! CLI output formatting.

use crate::simulation::{RunReport, RunSummary};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Print version information.
pub fn print_version() {
    println!("waterplant {}", env!("CARGO_PKG_VERSION"));
}

/// Print help message.
pub fn print_help() {
    println!(
        r"waterplant - minute-by-minute water treatment plant simulation

USAGE:
    waterplant <COMMAND> [OPTIONS]

COMMANDS:
    run <plant.yaml>            Simulate a plant
        --minutes <N>           Override the configured run length
        -o, --output <FILE>     Write the tick log as JSON lines
        -v, --verbose           Log plant events

    verify <plant.yaml>         Check that repeated runs are identical
        --runs <N>              Number of runs (default: 3)

    validate <plant.yaml>       Validate a plant file without running it

    reference                   Print the reference plant as YAML

    help                        Show this help message
    version                     Show version information

EXAMPLES:
    waterplant reference > plant.yaml
    waterplant run plant.yaml --minutes 1440 --output ticks.jsonl
    waterplant verify plant.yaml --runs 5

Log filtering follows RUST_LOG (for example RUST_LOG=waterplant=debug).
"
    );
}

/// Render a run summary as aligned text lines.
#[must_use]
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("  Ticks:                 {}\n", summary.ticks));
    out.push_str(&format!(
        "  Reservoir level:       {:.3} .. {:.3}\n",
        summary.min_reservoir_level, summary.max_reservoir_level
    ));
    out.push_str(&format!(
        "  Peak backwash buffer:  {:.1} m³\n",
        summary.peak_backwash_buffer
    ));
    out.push_str(&format!("  Backwashes:            {}\n", summary.backwash_count));
    out.push_str(&format!("  Energy:                {:.1} kWh\n", summary.energy_kwh));
    out.push_str(&format!("  Peak power:            {:.1} kW\n", summary.peak_power));
    out.push_str(&format!(
        "  Peak 15-min power:     {:.1} kW\n",
        summary.peak_quarter_hour_power
    ));
    out.push_str(&format!("  Fingerprint:           {}\n", summary.fingerprint));
    out
}

/// Print the outcome of a run.
pub fn print_run_summary(name: &str, report: &RunReport) {
    let (status, symbol) = if report.is_ok() {
        ("COMPLETED", "✓")
    } else {
        ("ABORTED", "✗")
    };

    println!("{RULE}");
    println!("Plant: {name}");
    println!("{RULE}\n");
    print!("{}", format_summary(&report.summary));

    if let Some(ref e) = report.error {
        if e.is_invariant_violation() {
            println!("\n  Stopped on plant invariant: {e}");
        } else {
            println!("\n  Stopped: {e}");
        }
    }

    println!("\n{RULE}");
    println!("{symbol} Result: {status}");
    println!("{RULE}\n");
}

/// Print the outcome of a reproducibility check.
pub fn print_verification(fingerprints: &[String], identical: bool) {
    let (status, symbol) = if identical {
        ("PASSED", "✓")
    } else {
        ("FAILED", "✗")
    };

    println!("{RULE}");
    println!("Reproducibility Check");
    println!("{RULE}\n");
    println!("  Runs:      {}", fingerprints.len());
    println!("  Identical: {identical}");

    if let Some(reference) = fingerprints.first() {
        println!("\n  Reference Hash: {reference}");
        for (i, hash) in fingerprints.iter().enumerate().skip(1) {
            let mark = if hash == reference { "=" } else { "!" };
            println!("    Run {}: {hash} {mark}", i + 1);
        }
    }

    println!("\n{RULE}");
    println!("{symbol} Result: {status}");
    println!("{RULE}\n");
}
