use shadowrange::{Analysis, Bound, Estimate, NotEstimable, RhsChange, SearchConfig, SolveResult, StepPolicy, Stop};

use crate::problem_file::ProblemFile;

const BINDING_TOLERANCE: f64 = 1e-7;

pub fn print_solution(file: &ProblemFile, result: &SolveResult) {
    if let Some(name) = &file.name {
        println!("Problem: {}", name);
    }
    println!("Status: {}", result.status.to_string().to_uppercase());

    let Some(optimum) = &result.optimum else {
        return;
    };

    println!("Objective value: {:.4}", optimum.objective);
    println!();
    println!("Variables:");
    for (j, value) in optimum.primal.iter().enumerate() {
        println!("  x{:<4} {:12.4}", j + 1, value);
    }
    println!();

    match &optimum.duals {
        Some(duals) => {
            println!("Shadow prices:");
            for (i, price) in duals.iter().enumerate() {
                println!("  {:20} {:12.4}", file.constraint_label(i), price);
            }
        }
        None => println!("Shadow prices: not reported by the solver"),
    }
    println!();

    let binding = result.binding_constraints(BINDING_TOLERANCE);
    if !binding.is_empty() {
        let labels: Vec<String> = binding.iter().map(|&i| file.constraint_label(i)).collect();
        println!("Binding constraints: {}", labels.join(", "));
    }

    let entering: Vec<(usize, f64)> = optimum
        .reduced_costs
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, rc)| rc.abs() > BINDING_TOLERANCE)
        .collect();
    if !entering.is_empty() {
        println!("Reduced costs (variables at zero):");
        for (j, rc) in entering {
            println!("  x{:<4} {:12.4}", j + 1, rc);
        }
    }
}

pub fn print_analysis(file: &ProblemFile, analysis: &Analysis, config: &SearchConfig) {
    println!("Status: {}", analysis.baseline.status.to_string().to_uppercase());
    println!("Search: {}", describe_config(config));
    println!();

    for interval in &analysis.intervals {
        let label = file.constraint_label(interval.constraint_index);
        match &interval.estimate {
            Estimate::NotEstimable(reason) => {
                let why = match reason {
                    NotEstimable::Baseline { status } => format!("the problem is {}", status),
                    NotEstimable::DualsUnavailable => "no shadow price was reported".to_string(),
                };
                println!("{}: interval could not be estimated ({})", label, why);
            }
            Estimate::Estimated { base_price, lower, upper } => {
                println!("{}: shadow price {:.4}", label, base_price);
                println!(
                    "  RHS {:.4} valid in [{:.4}, {:.4}]",
                    interval.rhs, lower.value, upper.value
                );
                println!("  lower: {}", describe_bound(lower));
                println!("  upper: {}", describe_bound(upper));
            }
        }
    }
}

pub fn print_rhs_change(file: &ProblemFile, change: &RhsChange) {
    println!("New RHS:");
    for (i, (rhs, delta)) in change.new_rhs.iter().zip(&change.deltas).enumerate() {
        println!("  {:20} {:12.4} ({:+.4})", file.constraint_label(i), rhs, delta);
    }
    println!();
    println!("Status after changes: {}", change.changed.status.to_string().to_uppercase());

    let Some(optimum) = &change.changed.optimum else {
        println!("The changed problem has no optimal solution.");
        return;
    };

    println!("New operating point:");
    for (j, value) in optimum.primal.iter().enumerate() {
        println!("  x{:<4} {:12.4}", j + 1, value);
    }
    println!("New objective value: {:.4}", optimum.objective);
    if let Some(delta) = change.objective_delta() {
        println!("Objective change: {:+.4}", delta);
    }
    if let Some(predicted) = change.predicted_delta() {
        println!("Predicted by shadow prices: {:+.4}", predicted);
    }
}

fn describe_config(config: &SearchConfig) -> String {
    let policy = match config.step_policy {
        StepPolicy::Fixed => "fixed step".to_string(),
        StepPolicy::Geometric { factor } => format!("step grows x{}", factor),
    };
    format!(
        "step {}, at most {} steps per side, tolerance {:e}, {}",
        config.step_size, config.max_steps, config.tolerance, policy
    )
}

fn describe_bound(bound: &Bound) -> String {
    match bound.stop {
        Stop::PriceChanged { price } => format!("price changes to {:.4} beyond {:.4}", price, bound.value),
        Stop::NotOptimal { status } => format!("problem becomes {} beyond {:.4}", status, bound.value),
        Stop::DualsUnavailable => format!("no shadow price reported beyond {:.4}", bound.value),
        Stop::Exhausted => format!("still unchanged after {} steps; the limit may lie further out", bound.steps),
        Stop::TimedOut => format!("time limit reached after {} steps; the limit may lie further out", bound.steps),
        Stop::RhsOverflow => format!("next step would overflow the RHS after {} steps", bound.steps),
    }
}
