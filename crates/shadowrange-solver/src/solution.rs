/// The result of solving an LP problem
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal values for each variable (empty unless optimal)
    pub values: Vec<f64>,
    /// Optimal objective value
    pub objective_value: f64,
    /// Dual value per constraint: change in the optimal objective per unit
    /// increase of that constraint's RHS. `None` when not reported.
    pub duals: Option<Vec<f64>>,
    /// Reduced cost per variable (zero for basic variables)
    pub reduced_costs: Vec<f64>,
    /// Simplex pivots performed over both phases
    pub iterations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The iteration limit was reached before the solver converged
    IterationLimit,
}

impl Solution {
    fn without_point(status: SolutionStatus, objective_value: f64, iterations: usize) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value,
            duals: None,
            reduced_costs: Vec::new(),
            iterations,
        }
    }

    pub fn infeasible(iterations: usize) -> Self {
        Self::without_point(SolutionStatus::Infeasible, f64::NAN, iterations)
    }

    pub fn unbounded(iterations: usize) -> Self {
        Self::without_point(SolutionStatus::Unbounded, f64::NAN, iterations)
    }

    pub fn iteration_limit(iterations: usize) -> Self {
        Self::without_point(SolutionStatus::IterationLimit, f64::NAN, iterations)
    }
}
