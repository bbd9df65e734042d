use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Error reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid TOML in {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Constraint {number} does not exist; the problem has {count} constraints")]
    ConstraintNumber { number: usize, count: usize },
    #[error("{0}")]
    Core(#[from] shadowrange::Error),
    #[error("Error writing JSON: {0}")]
    Output(#[source] serde_json::Error),
}

impl From<shadowrange::SpecError> for CliError {
    fn from(err: shadowrange::SpecError) -> Self {
        CliError::Core(err.into())
    }
}
