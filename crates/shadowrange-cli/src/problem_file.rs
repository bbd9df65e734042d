//! On-disk problem format (JSON or TOML) and the search settings it may carry.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use shadowrange::{Direction, LpSpec, SearchConfig, Sense, StepPolicy};
use tracing::debug;

use crate::error::CliError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProblemFile {
    pub name: Option<String>,
    pub direction: Direction,
    pub objective: Vec<f64>,
    pub constraints: Vec<ConstraintEntry>,
    #[serde(default)]
    pub search: SearchSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintEntry {
    pub name: Option<String>,
    pub coefficients: Vec<f64>,
    pub sense: Sense,
    pub rhs: f64,
}

/// `[search]` table; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchSection {
    pub step_size: Option<f64>,
    pub max_steps: Option<usize>,
    pub tolerance: Option<f64>,
    pub growth: Option<f64>,
    pub time_limit_ms: Option<u64>,
}

impl ProblemFile {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let source = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        debug!(path = %path.display(), toml = is_toml, "loading problem file");
        if is_toml {
            toml::from_str(&source).map_err(|source| CliError::Toml {
                path: path.to_path_buf(),
                source,
            })
        } else {
            serde_json::from_str(&source).map_err(|source| CliError::Json {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    pub fn to_spec(&self) -> LpSpec {
        let mut spec = LpSpec::new(self.direction, self.objective.clone());
        for c in &self.constraints {
            spec.add_constraint(c.coefficients.clone(), c.sense, c.rhs);
        }
        spec
    }

    /// Display label of constraint `index`
    pub fn constraint_label(&self, index: usize) -> String {
        self.constraints
            .get(index)
            .and_then(|c| c.name.clone())
            .unwrap_or_else(|| format!("R{}", index + 1))
    }
}

/// Search flags shared by the commands that estimate intervals. They take
/// precedence over the file's `[search]` table.
#[derive(Debug, Default, clap::Args)]
pub struct SearchArgs {
    /// RHS step between re-solves
    #[arg(long)]
    pub step: Option<f64>,
    /// Maximum re-solves in each direction
    #[arg(long)]
    pub max_steps: Option<usize>,
    /// Absolute tolerance on the shadow price
    #[arg(long, conflicts_with = "strict")]
    pub tolerance: Option<f64>,
    /// Use the strict price tolerance (1e-6)
    #[arg(long)]
    pub strict: bool,
    /// Multiply the step by this factor after every accepted step
    #[arg(long)]
    pub growth: Option<f64>,
    /// Wall-clock limit per constraint, in milliseconds
    #[arg(long)]
    pub time_limit_ms: Option<u64>,
}

pub fn search_config(file: &SearchSection, args: &SearchArgs) -> SearchConfig {
    let mut config = if args.strict {
        SearchConfig::strict()
    } else {
        SearchConfig::default()
    };

    if let Some(step) = args.step.or(file.step_size) {
        config.step_size = step;
    }
    if let Some(max_steps) = args.max_steps.or(file.max_steps) {
        config.max_steps = max_steps;
    }
    if !args.strict {
        if let Some(tolerance) = args.tolerance.or(file.tolerance) {
            config.tolerance = tolerance;
        }
    }
    if let Some(factor) = args.growth.or(file.growth) {
        config.step_policy = StepPolicy::Geometric { factor };
    }
    if let Some(ms) = args.time_limit_ms.or(file.time_limit_ms) {
        config.time_limit = Some(Duration::from_millis(ms));
    }
    config
}
