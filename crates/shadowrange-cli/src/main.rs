mod error;
mod output;
mod problem_file;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use shadowrange::{Analysis, SolveService, analyze, apply_rhs_changes, estimate_interval_with_baseline};
use tracing_subscriber::EnvFilter;

use crate::error::CliError;
use crate::problem_file::{ProblemFile, SearchArgs, search_config};

/// Sizes the interactive tool was designed for
const INTERACTIVE_VARIABLES: std::ops::RangeInclusive<usize> = 2..=4;
const INTERACTIVE_CONSTRAINTS: std::ops::RangeInclusive<usize> = 1..=10;

#[derive(Parser)]
#[command(name = "shadowrange")]
#[command(about = "Solve small LPs and estimate where their shadow prices stay valid", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem and show the solution and shadow prices
    Solve {
        /// Problem file (.json or .toml)
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Estimate the RHS interval over which each shadow price stays valid
    Ranges {
        /// Problem file (.json or .toml)
        file: PathBuf,
        /// Only this constraint (1-based)
        #[arg(short, long)]
        constraint: Option<usize>,
        #[command(flatten)]
        search: SearchArgs,
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Re-solve with changed right-hand sides
    WhatIf {
        /// Problem file (.json or .toml)
        file: PathBuf,
        /// RHS change as CONSTRAINT=DELTA (1-based), repeatable
        #[arg(short, long = "delta", value_parser = parse_delta, required = true)]
        deltas: Vec<(usize, f64)>,
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Check a problem file for errors
    Check {
        /// Problem file (.json or .toml)
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli.command) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns whether the problem had an optimal solution.
fn run(command: Commands) -> Result<bool, CliError> {
    let service = SolveService::default();

    match command {
        Commands::Solve { file, format } => {
            let problem = ProblemFile::load(&file)?;
            let result = service.solve(&problem.to_spec())?;

            match format {
                Format::Json => print_json(&result)?,
                Format::Pretty => output::print_solution(&problem, &result),
            }
            Ok(result.is_optimal())
        }
        Commands::Ranges {
            file,
            constraint,
            search,
            format,
        } => {
            let problem = ProblemFile::load(&file)?;
            let spec = problem.to_spec();
            let config = search_config(&problem.search, &search);

            let analysis = match constraint {
                Some(number) => {
                    let index = constraint_index(number, spec.num_constraints())?;
                    let baseline = service.solve(&spec)?;
                    let interval = estimate_interval_with_baseline(&service, &spec, index, &config, &baseline)?;
                    Analysis {
                        baseline,
                        intervals: vec![interval],
                    }
                }
                None => analyze(&service, &spec, &config)?,
            };

            match format {
                Format::Json => print_json(&analysis)?,
                Format::Pretty => output::print_analysis(&problem, &analysis, &config),
            }
            Ok(analysis.baseline.is_optimal())
        }
        Commands::WhatIf { file, deltas, format } => {
            let problem = ProblemFile::load(&file)?;
            let spec = problem.to_spec();
            spec.validate()?;

            let mut changes = vec![0.0; spec.num_constraints()];
            for (number, delta) in deltas {
                let index = constraint_index(number, changes.len())?;
                changes[index] += delta;
            }
            let change = apply_rhs_changes(&service, &spec, &changes)?;

            match format {
                Format::Json => print_json(&change)?,
                Format::Pretty => output::print_rhs_change(&problem, &change),
            }
            Ok(change.baseline.is_optimal())
        }
        Commands::Check { file } => {
            let problem = match ProblemFile::load(&file).and_then(|p| {
                p.to_spec().validate()?;
                Ok(p)
            }) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    return Ok(false);
                }
            };

            let n = problem.objective.len();
            let m = problem.constraints.len();
            println!("✓ {} is valid", file.display());
            println!("  {} variables", n);
            println!("  {} constraints", m);
            if !INTERACTIVE_VARIABLES.contains(&n) || !INTERACTIVE_CONSTRAINTS.contains(&m) {
                println!(
                    "  note: sized beyond {}-{} variables and {}-{} constraints; interval searches may be slow",
                    INTERACTIVE_VARIABLES.start(),
                    INTERACTIVE_VARIABLES.end(),
                    INTERACTIVE_CONSTRAINTS.start(),
                    INTERACTIVE_CONSTRAINTS.end()
                );
            }
            Ok(true)
        }
    }
}

fn constraint_index(number: usize, count: usize) -> Result<usize, CliError> {
    if (1..=count).contains(&number) {
        Ok(number - 1)
    } else {
        Err(CliError::ConstraintNumber { number, count })
    }
}

fn parse_delta(s: &str) -> Result<(usize, f64), String> {
    let (number, delta) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CONSTRAINT=DELTA, got '{}'", s))?;
    let number = number
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a constraint number", number))?;
    let delta = delta
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", delta))?;
    Ok((number, delta))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value).map_err(CliError::Output)?;
    println!("{}", json);
    Ok(())
}
