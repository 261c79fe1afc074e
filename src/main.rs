//! waterplant CLI
//!
//! Command-line interface for running treatment-plant simulations.

use std::process::ExitCode;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use waterplant::cli::{run_cli, Args};

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose() { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    run_cli(args)
}
