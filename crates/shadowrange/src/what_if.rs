//! Re-solving with a set of RHS changes applied at once.

use crate::backend::Backend;
use crate::error::Result;
use crate::result::SolveResult;
use crate::service::SolveService;
use crate::spec::LpSpec;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RhsChange {
    pub deltas: Vec<f64>,
    pub new_rhs: Vec<f64>,
    pub baseline: SolveResult,
    pub changed: SolveResult,
}

impl RhsChange {
    /// The changed problem still has an optimal solution
    pub fn is_feasible(&self) -> bool {
        self.changed.is_optimal()
    }

    /// Actual change of the optimal objective
    pub fn objective_delta(&self) -> Option<f64> {
        Some(self.changed.objective_value()? - self.baseline.objective_value()?)
    }

    /// First-order change predicted by the baseline shadow prices. Only
    /// exact while every changed RHS stays inside its validity interval.
    pub fn predicted_delta(&self) -> Option<f64> {
        let duals = self.baseline.dual_prices()?;
        Some(duals.iter().zip(&self.deltas).map(|(y, d)| y * d).sum())
    }
}

/// Solve `spec` as given and with `deltas[i]` added to the RHS of each constraint `i`.
pub fn apply_rhs_changes<B: Backend>(service: &SolveService<B>, spec: &LpSpec, deltas: &[f64]) -> Result<RhsChange> {
    let changed_spec = spec.with_rhs_deltas(deltas)?;
    let baseline = service.solve(spec)?;
    let changed = service.solve(&changed_spec)?;

    Ok(RhsChange {
        deltas: deltas.to_vec(),
        new_rhs: changed_spec.rhs,
        baseline,
        changed,
    })
}
