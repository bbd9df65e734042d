use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{Solution, SolutionStatus};

/// Two-phase simplex solver for small, dense linear programs
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Whether dual values are reported on optimal solutions
    report_duals: bool,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            report_duals: true,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Stop reporting dual values. Primal results are unaffected.
    pub fn without_duals(mut self) -> Self {
        self.report_duals = false;
        self
    }

    /// Solve the LP problem using the two-phase simplex method
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        let mut tableau = self.build_tableau(problem);

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                SimplexResult::Optimal => {}
                SimplexResult::IterationLimit => return Solution::iteration_limit(tableau.pivots),
                SimplexResult::Unbounded | SimplexResult::Infeasible => {
                    return Solution::infeasible(tableau.pivots);
                }
            }
        }

        // Phase 2: Optimize
        match self.phase2(&mut tableau) {
            SimplexResult::Optimal => self.extract_solution(&tableau, problem),
            SimplexResult::Unbounded => Solution::unbounded(tableau.pivots),
            SimplexResult::Infeasible => Solution::infeasible(tableau.pivots),
            SimplexResult::IterationLimit => Solution::iteration_limit(tableau.pivots),
        }
    }

    fn build_tableau(&self, problem: &LpProblem) -> Tableau {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // Rows with a negative RHS are negated, which flips their operator
        let row_signs: Vec<f64> = problem
            .constraints
            .iter()
            .map(|c| if c.rhs < 0.0 { -1.0 } else { 1.0 })
            .collect();
        let ops: Vec<ConstraintOp> = problem
            .constraints
            .iter()
            .zip(&row_signs)
            .map(|(c, &sign)| if sign < 0.0 { c.op.flipped() } else { c.op })
            .collect();

        // Count slack and artificial variables needed
        let mut n_slack = 0;
        let mut n_artificial = 0;

        for op in &ops {
            match op {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            unit_cols: vec![0; n_constraints],
            row_signs,
            n_vars,
            n_slack,
            n_artificial,
            pivots: 0,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (c, op)) in problem.constraints.iter().zip(&ops).enumerate() {
            let sign = tableau.row_signs[i];
            for (j, &coef) in c.coefficients.iter().enumerate() {
                tableau.data[i][j] = sign * coef;
            }
            tableau.data[i][total_cols - 1] = sign * c.rhs;

            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    tableau.unit_cols[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    tableau.unit_cols[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    tableau.unit_cols[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Objective row (last row). Simplex maximizes, so minimization
        // negates the coefficients.
        let obj_row = n_constraints;
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            tableau.data[obj_row][j] = if problem.objective.minimize { -coef } else { coef };
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau) -> SimplexResult {
        let obj_row = tableau.obj_row();
        let n_cols = tableau.n_cols();
        let art_start = tableau.art_start();

        // Phase 1 objective: maximize -sum(artificials)
        let orig_obj = std::mem::replace(&mut tableau.data[obj_row], vec![0.0; n_cols]);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[obj_row][j] = -1.0;
        }

        // Price out the basic artificials
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, n_cols - 1) {
            SimplexResult::Optimal => {}
            // The phase 1 objective is bounded by zero
            SimplexResult::Unbounded | SimplexResult::Infeasible => return SimplexResult::Infeasible,
            SimplexResult::IterationLimit => return SimplexResult::IterationLimit,
        }

        let rhs_col = n_cols - 1;
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > self.tolerance {
                return SimplexResult::Infeasible;
            }
        }

        // Artificials left in the basis sit at zero; swap them for any
        // structural or slack column in the same row. Rows with none are redundant.
        for i in 0..obj_row {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            if let Some(col) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                self.pivot(tableau, i, col);
            }
        }

        // Restore original objective and price out the basic variables
        tableau.data[obj_row] = orig_obj;
        for i in 0..obj_row {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio != 0.0 {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        SimplexResult::Optimal
    }

    fn phase2(&self, tableau: &mut Tableau) -> SimplexResult {
        // Artificial columns never re-enter the basis
        let exclude_from = tableau.art_start();
        self.iterate(tableau, exclude_from)
    }

    fn iterate(&self, tableau: &mut Tableau, exclude_from: usize) -> SimplexResult {
        for _ in 0..self.max_iterations {
            let Some(pivot_col) = self.find_pivot_column(tableau, exclude_from) else {
                return SimplexResult::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };
            self.pivot(tableau, pivot_row, pivot_col);
        }

        if self.find_pivot_column(tableau, exclude_from).is_none() {
            SimplexResult::Optimal
        } else {
            SimplexResult::IterationLimit
        }
    }

    /// Bland's rule: the lowest-index column that can improve the objective.
    /// Together with the row rule below this cannot cycle on degenerate vertices.
    fn find_pivot_column(&self, tableau: &Tableau, exclude_from: usize) -> Option<usize> {
        let obj_row = tableau.obj_row();
        (0..exclude_from).find(|&j| tableau.data[obj_row][j] > self.tolerance)
    }

    /// Minimum ratio test; ties go to the row whose basic variable has the lowest index
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.n_cols() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..tableau.obj_row() {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = (tableau.data[i][rhs_col] / val).max(0.0);
            let better = match min_row {
                None => true,
                Some(r) if (ratio - min_ratio).abs() <= self.tolerance => {
                    tableau.basic_vars[i] < tableau.basic_vars[r]
                }
                Some(_) => ratio < min_ratio,
            };
            if better {
                min_ratio = ratio;
                min_row = Some(i);
            }
        }

        min_row
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.n_cols();

        tableau.basic_vars[row] = col;
        tableau.pivots += 1;

        // Scale pivot row
        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        // Eliminate column in other rows
        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n_cols {
                    tableau.data[i][j] -= factor * tableau.data[row][j];
                }
            }
        }
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem) -> Solution {
        let n_vars = problem.num_variables();
        let obj_row = tableau.obj_row();
        let rhs_col = tableau.n_cols() - 1;
        let minimize = problem.objective.minimize;

        let mut values = vec![0.0; n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < n_vars {
                values[basic] = tableau.data[i][rhs_col];
            }
        }

        let objective_value = problem
            .objective
            .coefficients
            .iter()
            .zip(&values)
            .map(|(c, x)| c * x)
            .sum();

        // The objective row holds c_j - y^T A_j in maximization form. A row's
        // unit column has c_j = 0, so its entry is -y_i.
        let duals = self.report_duals.then(|| {
            tableau
                .unit_cols
                .iter()
                .zip(&tableau.row_signs)
                .map(|(&col, &sign)| {
                    let y = -tableau.data[obj_row][col] * sign;
                    self.snap(if minimize { -y } else { y })
                })
                .collect()
        });

        let reduced_costs = (0..n_vars)
            .map(|j| {
                if tableau.basic_vars.contains(&j) {
                    0.0
                } else {
                    let entry = tableau.data[obj_row][j];
                    self.snap(if minimize { -entry } else { entry })
                }
            })
            .collect();

        Solution {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            duals,
            reduced_costs,
            iterations: tableau.pivots,
        }
    }

    fn snap(&self, value: f64) -> f64 {
        if value.abs() <= self.tolerance { 0.0 } else { value }
    }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    /// Column of each row's starting basic variable (slack or artificial)
    unit_cols: Vec<usize>,
    /// -1.0 for rows negated to make their RHS non-negative
    row_signs: Vec<f64>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
    pivots: usize,
}

impl Tableau {
    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn n_cols(&self) -> usize {
        self.data[0].len()
    }

    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }
}

enum SimplexResult {
    Optimal,
    Unbounded,
    Infeasible,
    IterationLimit,
}
