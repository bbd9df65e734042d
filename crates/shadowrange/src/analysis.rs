//! Baseline solve plus a validity interval for every constraint.

use rayon::prelude::*;

use crate::backend::Backend;
use crate::error::Result;
use crate::result::SolveResult;
use crate::sensitivity::{SearchConfig, SensitivityInterval, estimate_interval_with_baseline};
use crate::service::SolveService;
use crate::spec::LpSpec;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Analysis {
    pub baseline: SolveResult,
    /// One entry per constraint, in constraint order
    pub intervals: Vec<SensitivityInterval>,
}

impl Analysis {
    /// The shared baseline solve plus every interval's perturbed solves
    pub fn solves(&self) -> usize {
        1 + self.intervals.iter().map(|i| i.solves).sum::<usize>()
    }
}

/// Solve `spec` once and estimate every constraint's interval from that
/// baseline. The per-constraint searches run in parallel.
pub fn analyze<B: Backend + Sync>(service: &SolveService<B>, spec: &LpSpec, config: &SearchConfig) -> Result<Analysis> {
    config.validate()?;
    spec.validate()?;
    let baseline = service.solve(spec)?;

    let intervals = (0..spec.num_constraints())
        .into_par_iter()
        .map(|index| estimate_interval_with_baseline(service, spec, index, config, &baseline))
        .collect::<Result<Vec<_>>>()?;

    Ok(Analysis { baseline, intervals })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::backend::{LpProblem, Solution, Solver};
    use crate::result::SolveStatus;
    use crate::sensitivity::Estimate;
    use crate::spec::Sense;

    #[derive(Default)]
    struct Counting {
        solves: AtomicUsize,
    }

    impl Backend for Counting {
        fn solve(&self, problem: &LpProblem) -> Solution {
            self.solves.fetch_add(1, Ordering::SeqCst);
            Solver::new().solve(problem)
        }
    }

    #[test]
    fn test_every_constraint_gets_an_interval() {
        let spec = LpSpec::maximize(vec![3.0, 5.0])
            .with_constraint(vec![1.0, 0.0], Sense::Le, 4.0)
            .with_constraint(vec![0.0, 2.0], Sense::Le, 12.0)
            .with_constraint(vec![3.0, 2.0], Sense::Le, 18.0);
        let analysis = analyze(&SolveService::default(), &spec, &SearchConfig::default().with_step_size(0.7)).unwrap();

        assert_eq!(analysis.baseline.status, SolveStatus::Optimal);
        assert_eq!(analysis.intervals.len(), 3);
        for (i, interval) in analysis.intervals.iter().enumerate() {
            assert_eq!(interval.constraint_index, i);
            assert!(interval.is_estimable());
            let (lower, upper) = (interval.lower_bound().unwrap(), interval.upper_bound().unwrap());
            assert!(lower <= interval.rhs && interval.rhs <= upper, "{} not in [{}, {}]", interval.rhs, lower, upper);
        }
        assert!((analysis.intervals[1].base_price().unwrap() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible_problem_has_no_intervals_estimated() {
        let spec = LpSpec::minimize(vec![1.0])
            .with_constraint(vec![1.0], Sense::Ge, 5.0)
            .with_constraint(vec![1.0], Sense::Le, 1.0);
        let analysis = analyze(&SolveService::default(), &spec, &SearchConfig::default()).unwrap();

        assert_eq!(analysis.baseline.status, SolveStatus::Infeasible);
        assert!(analysis.intervals.iter().all(|i| matches!(i.estimate, Estimate::NotEstimable(_))));
        assert_eq!(analysis.solves(), 1);
        assert!(analysis.intervals.iter().all(|i| i.solves == 0));
    }

    #[test]
    fn test_baseline_is_solved_once() {
        let service = SolveService::new(Counting::default());
        let spec = LpSpec::maximize(vec![3.0, 5.0])
            .with_constraint(vec![1.0, 0.0], Sense::Le, 4.0)
            .with_constraint(vec![0.0, 2.0], Sense::Le, 12.0)
            .with_constraint(vec![3.0, 2.0], Sense::Le, 18.0);
        let config = SearchConfig::default().with_step_size(0.7);
        let analysis = analyze(&service, &spec, &config).unwrap();

        let performed = service.backend().solves.load(Ordering::SeqCst);
        assert_eq!(performed, analysis.solves());
        assert_eq!(analysis.intervals[2].solves, 9 + 9);
    }
}
