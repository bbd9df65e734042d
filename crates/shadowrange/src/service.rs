use tracing::trace;
use uuid::Uuid;

use crate::backend::{Backend, ConstraintOp, LpProblem, Solution, Solver};
use crate::error::SpecError;
use crate::result::{Optimum, SolveResult, SolveStatus};
use crate::spec::{Direction, LpSpec, Sense};

/// Assembles an [`LpSpec`] into a backend model, solves it and extracts the
/// results. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct SolveService<B = Solver> {
    backend: B,
}

impl Default for SolveService<Solver> {
    fn default() -> Self {
        Self::new(Solver::default())
    }
}

impl<B: Backend> SolveService<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Solve `spec`. Infeasible, unbounded and undetermined outcomes are
    /// reported through [`SolveResult::status`]; only a malformed `spec` is an error.
    pub fn solve(&self, spec: &LpSpec) -> Result<SolveResult, SpecError> {
        spec.validate()?;

        let problem = build_model(spec, Uuid::new_v4());
        let solution = self.backend.solve(&problem);
        trace!(
            model = %problem.name,
            status = ?solution.status,
            pivots = solution.iterations,
            "lp solved"
        );

        Ok(extract_result(spec, solution))
    }
}

/// Every call gets its own model namespace, so concurrent solves never share
/// identifiers.
fn build_model(spec: &LpSpec, model_id: Uuid) -> LpProblem {
    let variables = (1..=spec.num_variables()).map(|j| format!("x{j}")).collect();
    let mut problem = LpProblem::new(format!("lp-{model_id}"), variables);
    problem.set_objective(spec.objective.clone(), spec.direction == Direction::Minimize);

    for (i, ((row, &sense), &rhs)) in spec.matrix.iter().zip(&spec.senses).zip(&spec.rhs).enumerate() {
        let op = match sense {
            Sense::Le => ConstraintOp::Le,
            Sense::Ge => ConstraintOp::Ge,
            Sense::Eq => ConstraintOp::Eq,
        };
        problem.add_constraint(format!("r{}", i + 1), row.clone(), op, rhs);
    }

    problem
}

fn extract_result(spec: &LpSpec, solution: Solution) -> SolveResult {
    let status = SolveStatus::from(solution.status);
    if status != SolveStatus::Optimal || solution.values.len() != spec.num_variables() {
        return SolveResult::without_optimum(status);
    }

    let slacks = spec
        .matrix
        .iter()
        .zip(&spec.rhs)
        .map(|(row, rhs)| rhs - row.iter().zip(&solution.values).map(|(a, x)| a * x).sum::<f64>())
        .collect();

    // A backend answering with the wrong number of duals has not answered
    let duals = solution.duals.filter(|d| d.len() == spec.num_constraints());

    SolveResult {
        status,
        optimum: Some(Optimum {
            primal: solution.values,
            objective: solution.objective_value,
            duals,
            reduced_costs: solution.reduced_costs,
            slacks,
        }),
    }
}
