//! Shadow prices of small linear programs and the RHS intervals over which
//! they remain valid.
//!
//! [`SolveService`] turns an [`LpSpec`] into a model for a [`Backend`] and
//! returns a [`SolveResult`] with primal values, objective and dual prices.
//! [`estimate_interval`] perturbs one constraint's RHS and re-solves to bracket
//! the range where its dual price does not change.

pub mod analysis;
pub mod backend;
mod error;
mod result;
pub mod sensitivity;
mod service;
mod spec;
pub mod what_if;

pub use analysis::{Analysis, analyze};
pub use backend::{Backend, Solver};
pub use error::{ConfigError, Error, Result, SpecError};
pub use result::{Optimum, SolveResult, SolveStatus};
pub use sensitivity::{
    Bound, Estimate, NotEstimable, SearchConfig, SensitivityInterval, StepPolicy, Stop, estimate_interval,
    estimate_interval_with_baseline,
};
pub use service::SolveService;
pub use spec::{Direction, LpSpec, Sense};
pub use what_if::{RhsChange, apply_rhs_changes};
