//! CLI argument parsing.
//!
//! Hand-rolled so the parser can be driven from any iterator of strings in
//! tests.

use std::path::PathBuf;

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// The command to execute.
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Simulate a plant
    Run {
        /// Path to the plant YAML file.
        config_path: PathBuf,
        /// Override for the configured run length.
        minutes: Option<u64>,
        /// Write the tick log as JSON lines here.
        output: Option<PathBuf>,
        /// Enable verbose output.
        verbose: bool,
    },
    /// Run a plant several times and compare fingerprints
    Verify {
        /// Path to the plant YAML file.
        config_path: PathBuf,
        /// Number of runs.
        runs: usize,
    },
    /// Validate a plant YAML file without running it
    Validate {
        /// Path to the plant YAML file.
        config_path: PathBuf,
    },
    /// Print the reference plant as YAML
    Reference,
    /// Show help
    Help,
    /// Show version
    Version,
}

impl Args {
    /// Parse command-line arguments from an iterator.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::parse_from_vec(&args)
    }

    /// Parse command-line arguments from the environment.
    #[must_use]
    pub fn parse() -> Self {
        Self::parse_from(std::env::args())
    }

    /// Whether the command asked for verbose output.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        matches!(self.command, Command::Run { verbose: true, .. })
    }

    fn parse_from_vec(args: &[String]) -> Self {
        if args.len() < 2 {
            return Self {
                command: Command::Help,
            };
        }

        let command = match args[1].as_str() {
            "run" => Self::parse_run_command(args),
            "verify" => Self::parse_verify_command(args),
            "validate" => Self::parse_validate_command(args),
            "reference" => Command::Reference,
            "-h" | "--help" | "help" => Command::Help,
            "-V" | "--version" | "version" => Command::Version,
            unknown => {
                eprintln!("Unknown command: {unknown}");
                Command::Help
            }
        };

        Self { command }
    }

    fn parse_run_command(args: &[String]) -> Command {
        if args.len() < 3 {
            eprintln!("Error: 'run' command requires a plant config path");
            return Command::Help;
        }

        let mut minutes = None;
        let mut output = None;
        let mut verbose = false;

        let mut i = 3;
        while i < args.len() {
            match args[i].as_str() {
                "--minutes" => {
                    if let Some(value) = args.get(i + 1) {
                        match value.parse() {
                            Ok(n) => minutes = Some(n),
                            Err(_) => eprintln!("Ignoring invalid --minutes value: {value}"),
                        }
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                "--output" | "-o" => {
                    if let Some(value) = args.get(i + 1) {
                        output = Some(PathBuf::from(value));
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                "-v" | "--verbose" => {
                    verbose = true;
                    i += 1;
                }
                _ => i += 1,
            }
        }

        Command::Run {
            config_path: PathBuf::from(&args[2]),
            minutes,
            output,
            verbose,
        }
    }

    fn parse_verify_command(args: &[String]) -> Command {
        if args.len() < 3 {
            eprintln!("Error: 'verify' command requires a plant config path");
            return Command::Help;
        }

        let mut runs = 3;
        if args.len() > 4 && args[3] == "--runs" {
            if let Ok(n) = args[4].parse() {
                runs = n;
            }
        }

        Command::Verify {
            config_path: PathBuf::from(&args[2]),
            runs,
        }
    }

    fn parse_validate_command(args: &[String]) -> Command {
        if args.len() < 3 {
            eprintln!("Error: 'validate' command requires a plant config path");
            return Command::Help;
        }

        Command::Validate {
            config_path: PathBuf::from(&args[2]),
        }
    }
}
