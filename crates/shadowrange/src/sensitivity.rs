//! Perturb-and-resolve estimate of the RHS interval over which a constraint's
//! shadow price stays put.
//!
//! Starting from the current RHS of one constraint, the estimator walks up and
//! then down in steps, re-solving after each step. A direction stops at the
//! first solve that is no longer optimal or whose dual price for the
//! constraint differs from the baseline by more than the tolerance; the bound
//! is the last RHS that still passed. Each direction gives up after
//! `max_steps` solves, so a call never performs more than `2 * max_steps + 1`
//! solves. A walk also ends, without solving, once the next RHS would overflow
//! to infinity. A bound records why its walk ended, so a true limit can be told
//! apart from a walk that simply ran out of budget.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::backend::Backend;
use crate::error::{ConfigError, Result};
use crate::result::{SolveResult, SolveStatus};
use crate::service::SolveService;
use crate::spec::LpSpec;

/// How the step length evolves along one walk
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StepPolicy {
    /// Every step has length `step_size`
    Fixed,
    /// The step is multiplied by `factor` after every accepted step
    Geometric { factor: f64 },
}

impl StepPolicy {
    pub const DEFAULT_GROWTH: f64 = 1.5;

    pub fn geometric() -> Self {
        StepPolicy::Geometric { factor: Self::DEFAULT_GROWTH }
    }

    fn next_step(self, step: f64) -> f64 {
        match self {
            StepPolicy::Fixed => step,
            StepPolicy::Geometric { factor } => step * factor,
        }
    }
}

/// Parameters of the interval search.
///
/// `tolerance` is an absolute bound on `|price - base_price|`. It directly sets
/// how wide the reported interval is: a looser tolerance tolerates numerical
/// noise but may step over a small price change.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub step_size: f64,
    pub max_steps: usize,
    pub tolerance: f64,
    pub step_policy: StepPolicy,
    /// Wall-clock budget for one estimate, checked between solves
    pub time_limit: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            step_size: 1.0,
            max_steps: 20,
            tolerance: 1e-4,
            step_policy: StepPolicy::Fixed,
            time_limit: None,
        }
    }
}

impl SearchConfig {
    pub const STRICT_TOLERANCE: f64 = 1e-6;

    /// Defaults with the tighter price tolerance
    pub fn strict() -> Self {
        Self {
            tolerance: Self::STRICT_TOLERANCE,
            ..Self::default()
        }
    }

    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_step_policy(mut self, step_policy: StepPolicy) -> Self {
        self.step_policy = step_policy;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "step_size",
                reason: format!("must be a positive finite number, got {}", self.step_size),
            });
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "tolerance",
                reason: format!("must be a non-negative finite number, got {}", self.tolerance),
            });
        }
        if let StepPolicy::Geometric { factor } = self.step_policy {
            if !(factor.is_finite() && factor >= 1.0) {
                return Err(ConfigError::InvalidValue {
                    field: "growth",
                    reason: format!("must be a finite factor >= 1, got {factor}"),
                });
            }
        }
        Ok(())
    }
}

/// Why a walk in one direction ended
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Stop {
    /// The next step moved the dual price beyond the tolerance
    PriceChanged { price: f64 },
    /// The next step made the problem infeasible, unbounded or undetermined
    NotOptimal { status: SolveStatus },
    /// The next step solved but the backend reported no duals
    DualsUnavailable,
    /// `max_steps` steps all kept the price
    Exhausted,
    /// The time limit ran out between solves
    TimedOut,
    /// The next RHS value would not be a finite number
    RhsOverflow,
}

/// One end of an interval
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bound {
    /// Last RHS value at which the price was confirmed
    pub value: f64,
    /// Accepted steps; zero means the first step already broke the price
    pub steps: usize,
    pub stop: Stop,
}

impl Bound {
    /// Whether the walk hit an actual change in the solution rather than a budget
    pub fn is_limit(&self) -> bool {
        matches!(
            self.stop,
            Stop::PriceChanged { .. } | Stop::NotOptimal { .. } | Stop::DualsUnavailable
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NotEstimable {
    /// The unperturbed problem is not optimal
    Baseline { status: SolveStatus },
    /// The unperturbed problem solved without duals
    DualsUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Estimate {
    NotEstimable(NotEstimable),
    Estimated { base_price: f64, lower: Bound, upper: Bound },
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensitivityInterval {
    pub constraint_index: usize,
    /// RHS of the constraint in the unperturbed problem
    pub rhs: f64,
    /// Solves performed; includes the baseline unless it was passed in
    pub solves: usize,
    pub estimate: Estimate,
}

impl SensitivityInterval {
    pub fn is_estimable(&self) -> bool {
        matches!(self.estimate, Estimate::Estimated { .. })
    }

    pub fn base_price(&self) -> Option<f64> {
        match self.estimate {
            Estimate::Estimated { base_price, .. } => Some(base_price),
            Estimate::NotEstimable(_) => None,
        }
    }

    pub fn lower(&self) -> Option<&Bound> {
        match &self.estimate {
            Estimate::Estimated { lower, .. } => Some(lower),
            Estimate::NotEstimable(_) => None,
        }
    }

    pub fn upper(&self) -> Option<&Bound> {
        match &self.estimate {
            Estimate::Estimated { upper, .. } => Some(upper),
            Estimate::NotEstimable(_) => None,
        }
    }

    pub fn lower_bound(&self) -> Option<f64> {
        self.lower().map(|b| b.value)
    }

    pub fn upper_bound(&self) -> Option<f64> {
        self.upper().map(|b| b.value)
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Lower,
    Upper,
}

impl Side {
    fn sign(self) -> f64 {
        match self {
            Side::Lower => -1.0,
            Side::Upper => 1.0,
        }
    }
}

/// Estimate the RHS interval of constraint `index` over which its dual price
/// stays within `config.tolerance` of the price at the current RHS.
///
/// A baseline that is not optimal, or has no duals, yields
/// [`Estimate::NotEstimable`]; that is a result, not an error.
pub fn estimate_interval<B: Backend>(
    service: &SolveService<B>,
    spec: &LpSpec,
    index: usize,
    config: &SearchConfig,
) -> Result<SensitivityInterval> {
    config.validate()?;
    spec.validate()?;
    spec.check_index(index)?;

    let started = Instant::now();
    let baseline = service.solve(spec)?;
    let mut interval = estimate(service, spec, index, config, &baseline, started)?;
    interval.solves += 1;
    Ok(interval)
}

/// Like [`estimate_interval`], but starts from an already computed solve of
/// `spec`, so callers that need the baseline themselves solve it only once.
/// The returned `solves` counts perturbed solves only.
pub fn estimate_interval_with_baseline<B: Backend>(
    service: &SolveService<B>,
    spec: &LpSpec,
    index: usize,
    config: &SearchConfig,
    baseline: &SolveResult,
) -> Result<SensitivityInterval> {
    config.validate()?;
    spec.validate()?;
    spec.check_index(index)?;

    estimate(service, spec, index, config, baseline, Instant::now())
}

fn estimate<B: Backend>(
    service: &SolveService<B>,
    spec: &LpSpec,
    index: usize,
    config: &SearchConfig,
    baseline: &SolveResult,
    started: Instant,
) -> Result<SensitivityInterval> {
    let rhs = spec.rhs[index];
    let base_price = match (baseline.status, baseline.dual_price(index)) {
        (SolveStatus::Optimal, Some(price)) => price,
        (SolveStatus::Optimal, None) => {
            return Ok(SensitivityInterval {
                constraint_index: index,
                rhs,
                solves: 0,
                estimate: Estimate::NotEstimable(NotEstimable::DualsUnavailable),
            });
        }
        (status, _) => {
            return Ok(SensitivityInterval {
                constraint_index: index,
                rhs,
                solves: 0,
                estimate: Estimate::NotEstimable(NotEstimable::Baseline { status }),
            });
        }
    };

    let mut search = Search {
        service,
        spec,
        index,
        config,
        base_price,
        deadline: config.time_limit.map(|limit| started + limit),
        solves: 0,
    };
    let upper = search.walk(Side::Upper)?;
    let lower = search.walk(Side::Lower)?;

    debug!(
        constraint = index,
        base_price,
        lower = lower.value,
        upper = upper.value,
        solves = search.solves,
        "estimated shadow price interval"
    );

    Ok(SensitivityInterval {
        constraint_index: index,
        rhs,
        solves: search.solves,
        estimate: Estimate::Estimated { base_price, lower, upper },
    })
}

struct Search<'a, B> {
    service: &'a SolveService<B>,
    spec: &'a LpSpec,
    index: usize,
    config: &'a SearchConfig,
    base_price: f64,
    deadline: Option<Instant>,
    solves: usize,
}

impl<B: Backend> Search<'_, B> {
    fn walk(&mut self, side: Side) -> Result<Bound> {
        let mut value = self.spec.rhs[self.index];
        let mut step = self.config.step_size;

        for steps in 0..self.config.max_steps {
            if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Ok(Bound { value, steps, stop: Stop::TimedOut });
            }

            let candidate = value + side.sign() * step;
            if !candidate.is_finite() {
                return Ok(Bound { value, steps, stop: Stop::RhsOverflow });
            }
            let result = self.service.solve(&self.spec.with_rhs(self.index, candidate)?)?;
            self.solves += 1;

            let stop = match (result.status, result.dual_price(self.index)) {
                (SolveStatus::Optimal, Some(price)) if (price - self.base_price).abs() <= self.config.tolerance => {
                    None
                }
                (SolveStatus::Optimal, Some(price)) => Some(Stop::PriceChanged { price }),
                (SolveStatus::Optimal, None) => Some(Stop::DualsUnavailable),
                (status, _) => Some(Stop::NotOptimal { status }),
            };

            debug!(
                constraint = self.index,
                side = ?side,
                rhs = candidate,
                status = %result.status,
                price = ?result.dual_price(self.index),
                "perturbed solve"
            );

            if let Some(stop) = stop {
                return Ok(Bound { value, steps, stop });
            }

            value = candidate;
            step = self.config.step_policy.next_step(step);
        }

        Ok(Bound {
            value,
            steps: self.config.max_steps,
            stop: Stop::Exhausted,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::backend::{LpProblem, Solution, Solver};
    use crate::error::{Error, SpecError};
    use crate::spec::Sense;

    fn textbook() -> LpSpec {
        // Maximize 3x1 + 5x2 with x1 <= 4, 2x2 <= 12, 3x1 + 2x2 <= 18.
        // Prices (0, 1.5, 1) hold for b1 >= 2, 6 <= b2 <= 18, 12 <= b3 <= 24.
        LpSpec::maximize(vec![3.0, 5.0])
            .with_constraint(vec![1.0, 0.0], Sense::Le, 4.0)
            .with_constraint(vec![0.0, 2.0], Sense::Le, 12.0)
            .with_constraint(vec![3.0, 2.0], Sense::Le, 18.0)
    }

    fn floor_and_cap() -> LpSpec {
        // Minimize x1 with x1 >= 1.5 and x1 <= 3.2
        LpSpec::minimize(vec![1.0])
            .with_constraint(vec![1.0], Sense::Ge, 1.5)
            .with_constraint(vec![1.0], Sense::Le, 3.2)
    }

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

    fn assert_close(actual: f64, expected: f64, what: &str) {
        assert!((actual - expected).abs() < 1e-9, "{} = {} (expected {})", what, actual, expected);
    }

    #[test]
    fn test_binding_constraint_interval() {
        let service = SolveService::default();
        let config = SearchConfig::default().with_step_size(0.7);
        let interval = estimate_interval(&service, &textbook(), 2, &config).unwrap();

        assert_close(interval.base_price().unwrap(), 1.0, "base price");

        let upper = interval.upper().unwrap();
        assert_close(upper.value, 18.0 + 8.0 * 0.7, "upper");
        assert_eq!(upper.steps, 8);
        assert!(matches!(upper.stop, Stop::PriceChanged { price } if price.abs() < 1e-9));

        let lower = interval.lower().unwrap();
        assert_close(lower.value, 18.0 - 8.0 * 0.7, "lower");
        assert_eq!(lower.steps, 8);
        assert!(lower.is_limit());
        assert_eq!(interval.solves, 1 + 9 + 9);
    }

    #[test]
    fn test_small_increase_keeps_price() {
        let service = SolveService::default();
        let base = service.solve(&textbook()).unwrap().dual_price(1).unwrap();
        let nudged = service.solve(&textbook().with_rhs(1, 12.5).unwrap()).unwrap().dual_price(1).unwrap();
        assert_close(nudged, base, "price after nudge");

        let past = service.solve(&textbook().with_rhs(1, 19.0).unwrap()).unwrap().dual_price(1).unwrap();
        assert!((past - base).abs() > 1e-4, "price past the limit {} vs {}", past, base);
    }

    #[test]
    fn test_non_binding_constraint_runs_out_of_budget_upwards() {
        let service = SolveService::default();
        let config = SearchConfig::default().with_step_size(0.75);
        let interval = estimate_interval(&service, &textbook(), 0, &config).unwrap();

        assert_close(interval.base_price().unwrap(), 0.0, "base price");

        let upper = interval.upper().unwrap();
        assert_eq!(upper.stop, Stop::Exhausted);
        assert!(!upper.is_limit());
        assert_eq!(upper.steps, 20);
        assert_close(upper.value, 4.0 + 20.0 * 0.75, "upper");

        // 3.25 and 2.5 keep x1 = 2 feasible; at 1.75 the cap starts to bind
        let lower = interval.lower().unwrap();
        assert_close(lower.value, 2.5, "lower");
        assert!(matches!(lower.stop, Stop::PriceChanged { price } if (price - 3.0).abs() < 1e-9));
    }

    #[test]
    fn test_infeasibility_ends_the_walk() {
        let service = SolveService::default();
        let interval = estimate_interval(&service, &floor_and_cap(), 0, &SearchConfig::default()).unwrap();

        assert_close(interval.base_price().unwrap(), 1.0, "base price");

        let upper = interval.upper().unwrap();
        assert_close(upper.value, 2.5, "upper");
        assert_eq!(upper.stop, Stop::NotOptimal { status: SolveStatus::Infeasible });

        let lower = interval.lower().unwrap();
        assert_close(lower.value, 0.5, "lower");
        assert!(matches!(lower.stop, Stop::PriceChanged { .. }));
    }

    #[test]
    fn test_first_step_breaking_gives_zero_width_side() {
        let spec = floor_and_cap().with_rhs(0, 3.0).unwrap();
        let interval = estimate_interval(&SolveService::default(), &spec, 0, &SearchConfig::default()).unwrap();

        let upper = interval.upper().unwrap();
        assert_eq!(upper.steps, 0);
        assert_eq!(upper.value, 3.0);
        assert!(upper.is_limit());
        assert!(interval.is_estimable());
    }

    #[test]
    fn test_infeasible_baseline_is_not_estimable() {
        let spec = LpSpec::minimize(vec![1.0])
            .with_constraint(vec![1.0], Sense::Ge, 5.0)
            .with_constraint(vec![1.0], Sense::Le, 1.0);
        let interval = estimate_interval(&SolveService::default(), &spec, 1, &SearchConfig::default()).unwrap();

        assert_eq!(
            interval.estimate,
            Estimate::NotEstimable(NotEstimable::Baseline { status: SolveStatus::Infeasible })
        );
        assert_eq!(interval.base_price(), None);
        assert_eq!(interval.lower_bound(), None);
        assert_eq!(interval.upper_bound(), None);
        assert_eq!(interval.solves, 1);
    }

    #[test]
    fn test_missing_duals_are_not_estimable() {
        let service = SolveService::new(Solver::new().without_duals());
        let interval = estimate_interval(&service, &textbook(), 2, &SearchConfig::default()).unwrap();
        assert_eq!(interval.estimate, Estimate::NotEstimable(NotEstimable::DualsUnavailable));
    }

    #[test]
    fn test_geometric_steps_grow() {
        let config = SearchConfig::default().with_step_policy(StepPolicy::geometric()).with_max_steps(3);
        let interval = estimate_interval(&SolveService::default(), &textbook(), 0, &config).unwrap();

        // Steps of 1, 1.5 and 2.25 upwards, all above x1 = 2
        let upper = interval.upper().unwrap();
        assert_eq!(upper.stop, Stop::Exhausted);
        assert_close(upper.value, 4.0 + 1.0 + 1.5 + 2.25, "upper");
    }

    #[test]
    fn test_solve_budget() {
        let service = SolveService::new(Counting::default());
        let config = SearchConfig::default().with_max_steps(5);
        let interval = estimate_interval(&service, &textbook(), 0, &config).unwrap();

        let performed = service.backend().solves.load(Ordering::SeqCst);
        assert!(performed <= 2 * 5 + 1, "{} solves", performed);
        assert_eq!(performed, interval.solves);
    }

    #[test]
    fn test_zero_time_limit_times_out_both_sides() {
        let config = SearchConfig::default().with_time_limit(Duration::ZERO);
        let interval = estimate_interval(&SolveService::default(), &textbook(), 2, &config).unwrap();

        assert_eq!(interval.upper().unwrap().stop, Stop::TimedOut);
        assert_eq!(interval.lower().unwrap().stop, Stop::TimedOut);
        assert_eq!(interval.lower_bound(), Some(18.0));
        assert_eq!(interval.solves, 1);
    }

    #[test]
    fn test_bad_index_and_config_are_errors() {
        let service = SolveService::default();
        let err = estimate_interval(&service, &textbook(), 3, &SearchConfig::default()).unwrap_err();
        assert_eq!(err, Error::Spec(SpecError::ConstraintIndex { index: 3, count: 3 }));

        let config = SearchConfig::default().with_step_size(0.0);
        let err = estimate_interval(&service, &textbook(), 0, &config).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { field: "step_size", .. })));

        let config = SearchConfig::default().with_step_policy(StepPolicy::Geometric { factor: 0.5 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overflowing_rhs_ends_the_walk() {
        // The first step lands on 1e308, the second would be infinite
        let config = SearchConfig::default().with_step_size(1e308);
        let interval = estimate_interval(&SolveService::default(), &textbook(), 0, &config).unwrap();

        let upper = interval.upper().unwrap();
        assert_eq!(upper.stop, Stop::RhsOverflow);
        assert_eq!(upper.steps, 1);
        assert!(upper.value.is_finite());
        assert!(!upper.is_limit());
    }

    #[test]
    fn test_growing_steps_stop_before_overflow() {
        let config = SearchConfig::default()
            .with_step_size(1e200)
            .with_step_policy(StepPolicy::Geometric { factor: 1e100 });
        let interval = estimate_interval(&SolveService::default(), &textbook(), 0, &config).unwrap();

        let upper = interval.upper().unwrap();
        assert_eq!(upper.stop, Stop::RhsOverflow);
        assert!(upper.value.is_finite());
        assert!(upper.steps < config.max_steps);
    }

    #[test]
    fn test_supplied_baseline_is_not_solved_again() {
        let service = SolveService::new(Counting::default());
        let spec = textbook();
        let config = SearchConfig::default().with_step_size(0.7);
        let baseline = service.solve(&spec).unwrap();
        service.backend().solves.store(0, Ordering::SeqCst);

        let interval = estimate_interval_with_baseline(&service, &spec, 2, &config, &baseline).unwrap();

        assert_eq!(interval.solves, 9 + 9);
        assert_eq!(service.backend().solves.load(Ordering::SeqCst), interval.solves);

        let solved_here = estimate_interval(&SolveService::default(), &spec, 2, &config).unwrap();
        assert_eq!(interval.estimate, solved_here.estimate);
        assert_eq!(solved_here.solves, interval.solves + 1);
    }

    #[test]
    fn test_supplied_infeasible_baseline_needs_no_solves() {
        let spec = LpSpec::minimize(vec![1.0])
            .with_constraint(vec![1.0], Sense::Ge, 5.0)
            .with_constraint(vec![1.0], Sense::Le, 1.0);
        let service = SolveService::new(Counting::default());
        let baseline = service.solve(&spec).unwrap();

        let interval = estimate_interval_with_baseline(&service, &spec, 0, &SearchConfig::default(), &baseline).unwrap();

        assert!(!interval.is_estimable());
        assert_eq!(interval.solves, 0);
        assert_eq!(service.backend().solves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_strict_tolerance() {
        assert_eq!(SearchConfig::strict().tolerance, 1e-6);
        assert_eq!(SearchConfig::default().tolerance, 1e-4);
    }
}
