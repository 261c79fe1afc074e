//! CLI module for waterplant.
//!
//! All CLI logic lives here so it can be tested; `main.rs` only installs the
//! log subscriber and calls [`run_cli`].

mod args;
mod commands;
mod output;

pub use args::{Args, Command};
pub use commands::{run_cli, run_plant, validate_plant, verify_reproducibility};
pub use output::{print_help, print_run_summary, print_version};
