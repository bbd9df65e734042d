//! The LP-solving capability the core delegates to.

use std::sync::Arc;

pub use shadowrange_solver::{ConstraintOp, LpProblem, Solution, SolutionStatus, Solver};

/// Anything that can solve an assembled [`LpProblem`].
///
/// A backend reports duals through [`Solution::duals`]; returning `None` there
/// is a valid answer and leaves the primal part of the result intact.
pub trait Backend {
    fn solve(&self, problem: &LpProblem) -> Solution;
}

impl Backend for Solver {
    fn solve(&self, problem: &LpProblem) -> Solution {
        Solver::solve(self, problem)
    }
}

impl<B: Backend + ?Sized> Backend for &B {
    fn solve(&self, problem: &LpProblem) -> Solution {
        (**self).solve(problem)
    }
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn solve(&self, problem: &LpProblem) -> Solution {
        (**self).solve(problem)
    }
}
