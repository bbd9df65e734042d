use thiserror::Error;

/// Structural problems with an [`LpSpec`](crate::LpSpec). A call failing with
/// one of these must not be retried until the specification is fixed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecError {
    #[error("the objective has no coefficients; at least one variable is required")]
    NoVariables,
    #[error("the specification has no constraints")]
    NoConstraints,
    #[error("expected {expected} right-hand side values (one per constraint row), found {found}")]
    RhsCount { expected: usize, found: usize },
    #[error("expected {expected} constraint senses (one per constraint row), found {found}")]
    SenseCount { expected: usize, found: usize },
    #[error("constraint row {row} has {found} coefficients but the objective has {expected}")]
    RowLength { row: usize, expected: usize, found: usize },
    #[error("{what} is not a finite number")]
    NonFinite { what: String },
    #[error("constraint index {index} is out of range for {count} constraints")]
    ConstraintIndex { index: usize, count: usize },
    #[error("expected {expected} RHS changes (one per constraint), found {found}")]
    DeltaCount { expected: usize, found: usize },
}

/// Invalid search parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid LP specification: {0}")]
    Spec(#[from] SpecError),
    #[error("invalid search configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
