use std::fmt;

use crate::backend::SolutionStatus;

/// Outcome category of one solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// The backend stopped without a definite answer
    Undetermined,
}

impl From<SolutionStatus> for SolveStatus {
    fn from(status: SolutionStatus) -> Self {
        match status {
            SolutionStatus::Optimal => SolveStatus::Optimal,
            SolutionStatus::Infeasible => SolveStatus::Infeasible,
            SolutionStatus::Unbounded => SolveStatus::Unbounded,
            SolutionStatus::IterationLimit => SolveStatus::Undetermined,
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::Undetermined => "undetermined",
        })
    }
}

/// The optimal point of a solved LP
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Optimum {
    /// Value of each variable, by variable index
    pub primal: Vec<f64>,
    pub objective: f64,
    /// Shadow price of each constraint, by constraint index. `None` when the
    /// backend did not report duals for this solve.
    pub duals: Option<Vec<f64>>,
    /// Reduced cost of each variable (zero for basic variables)
    pub reduced_costs: Vec<f64>,
    /// `rhs - row · x` for each constraint
    pub slacks: Vec<f64>,
}

/// Result of a single solve. Created fresh by every call and never mutated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveResult {
    pub status: SolveStatus,
    /// Present exactly when `status` is [`SolveStatus::Optimal`]
    pub optimum: Option<Optimum>,
}

impl SolveResult {
    pub fn without_optimum(status: SolveStatus) -> Self {
        Self { status, optimum: None }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    pub fn primal_values(&self) -> Option<&[f64]> {
        self.optimum.as_ref().map(|o| o.primal.as_slice())
    }

    pub fn objective_value(&self) -> Option<f64> {
        self.optimum.as_ref().map(|o| o.objective)
    }

    pub fn dual_prices(&self) -> Option<&[f64]> {
        self.optimum.as_ref().and_then(|o| o.duals.as_deref())
    }

    pub fn dual_price(&self, index: usize) -> Option<f64> {
        self.dual_prices().and_then(|duals| duals.get(index).copied())
    }

    /// Optimal, but without dual prices
    pub fn duals_unavailable(&self) -> bool {
        self.optimum.as_ref().is_some_and(|o| o.duals.is_none())
    }

    pub fn reduced_costs(&self) -> Option<&[f64]> {
        self.optimum.as_ref().map(|o| o.reduced_costs.as_slice())
    }

    /// Indices of the constraints whose slack is within `tolerance` of zero
    pub fn binding_constraints(&self, tolerance: f64) -> Vec<usize> {
        self.optimum
            .as_ref()
            .map(|o| {
                o.slacks
                    .iter()
                    .enumerate()
                    .filter(|(_, slack)| slack.abs() <= tolerance)
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default()
    }
}
