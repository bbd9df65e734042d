use std::fmt;

use crate::error::SpecError;

/// Relation between a constraint row and its right-hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sense {
    #[cfg_attr(feature = "serde", serde(rename = "<=", alias = "le"))]
    Le,
    #[cfg_attr(feature = "serde", serde(rename = ">=", alias = "ge"))]
    Ge,
    #[cfg_attr(feature = "serde", serde(rename = "=", alias = "==", alias = "eq"))]
    Eq,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    #[cfg_attr(feature = "serde", serde(alias = "max"))]
    Maximize,
    #[cfg_attr(feature = "serde", serde(alias = "min"))]
    Minimize,
}

/// A linear program over variables that are all bounded below by zero.
///
/// `matrix[i]` is the coefficient row of constraint `i`, which reads
/// `matrix[i] · x  senses[i]  rhs[i]`. The number of variables is the length of
/// `objective` and the number of constraints the number of rows.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LpSpec {
    pub direction: Direction,
    pub objective: Vec<f64>,
    pub matrix: Vec<Vec<f64>>,
    pub rhs: Vec<f64>,
    pub senses: Vec<Sense>,
}

impl LpSpec {
    pub fn new(direction: Direction, objective: Vec<f64>) -> Self {
        Self {
            direction,
            objective,
            matrix: Vec::new(),
            rhs: Vec::new(),
            senses: Vec::new(),
        }
    }

    pub fn maximize(objective: Vec<f64>) -> Self {
        Self::new(Direction::Maximize, objective)
    }

    pub fn minimize(objective: Vec<f64>) -> Self {
        Self::new(Direction::Minimize, objective)
    }

    pub fn add_constraint(&mut self, coefficients: Vec<f64>, sense: Sense, rhs: f64) {
        self.matrix.push(coefficients);
        self.senses.push(sense);
        self.rhs.push(rhs);
    }

    /// Builder form of [`add_constraint`](Self::add_constraint)
    pub fn with_constraint(mut self, coefficients: Vec<f64>, sense: Sense, rhs: f64) -> Self {
        self.add_constraint(coefficients, sense, rhs);
        self
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.matrix.len()
    }

    /// Check every shape relation and that all numbers are finite.
    pub fn validate(&self) -> Result<(), SpecError> {
        let n = self.num_variables();
        let m = self.num_constraints();

        if n == 0 {
            return Err(SpecError::NoVariables);
        }
        if m == 0 {
            return Err(SpecError::NoConstraints);
        }
        if self.rhs.len() != m {
            return Err(SpecError::RhsCount { expected: m, found: self.rhs.len() });
        }
        if self.senses.len() != m {
            return Err(SpecError::SenseCount { expected: m, found: self.senses.len() });
        }
        for (row, coefficients) in self.matrix.iter().enumerate() {
            if coefficients.len() != n {
                return Err(SpecError::RowLength { row, expected: n, found: coefficients.len() });
            }
        }

        ensure_finite("objective", &self.objective)?;
        for (row, coefficients) in self.matrix.iter().enumerate() {
            ensure_finite(&format!("matrix[{row}]"), coefficients)?;
        }
        ensure_finite("rhs", &self.rhs)
    }

    pub fn check_index(&self, index: usize) -> Result<(), SpecError> {
        let count = self.num_constraints();
        if index < count {
            Ok(())
        } else {
            Err(SpecError::ConstraintIndex { index, count })
        }
    }

    /// A copy with the RHS of constraint `index` replaced by `value`.
    pub fn with_rhs(&self, index: usize, value: f64) -> Result<Self, SpecError> {
        self.check_index(index)?;
        let mut spec = self.clone();
        spec.rhs[index] = value;
        Ok(spec)
    }

    /// A copy with `deltas[i]` added to the RHS of every constraint `i`.
    pub fn with_rhs_deltas(&self, deltas: &[f64]) -> Result<Self, SpecError> {
        if deltas.len() != self.rhs.len() {
            return Err(SpecError::DeltaCount { expected: self.rhs.len(), found: deltas.len() });
        }
        let mut spec = self.clone();
        for (b, delta) in spec.rhs.iter_mut().zip(deltas) {
            *b += delta;
        }
        Ok(spec)
    }
}

fn ensure_finite(what: &str, values: &[f64]) -> Result<(), SpecError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(SpecError::NonFinite { what: format!("{what}[{i}]") }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textbook() -> LpSpec {
        LpSpec::maximize(vec![3.0, 5.0])
            .with_constraint(vec![1.0, 0.0], Sense::Le, 4.0)
            .with_constraint(vec![0.0, 2.0], Sense::Le, 12.0)
            .with_constraint(vec![3.0, 2.0], Sense::Le, 18.0)
    }

    #[test]
    fn test_valid_spec() {
        let spec = textbook();
        assert_eq!(spec.validate(), Ok(()));
        assert_eq!(spec.num_variables(), 2);
        assert_eq!(spec.num_constraints(), 3);
    }

    #[test]
    fn test_shape_errors() {
        assert_eq!(LpSpec::maximize(vec![]).validate(), Err(SpecError::NoVariables));
        assert_eq!(LpSpec::maximize(vec![1.0]).validate(), Err(SpecError::NoConstraints));

        let mut spec = textbook();
        spec.rhs.pop();
        assert_eq!(spec.validate(), Err(SpecError::RhsCount { expected: 3, found: 2 }));

        let mut spec = textbook();
        spec.senses.push(Sense::Ge);
        assert_eq!(spec.validate(), Err(SpecError::SenseCount { expected: 3, found: 4 }));

        let mut spec = textbook();
        spec.matrix[1].push(7.0);
        assert_eq!(spec.validate(), Err(SpecError::RowLength { row: 1, expected: 2, found: 3 }));
    }

    #[test]
    fn test_non_finite_is_rejected() {
        let mut spec = textbook();
        spec.matrix[2][1] = f64::NAN;
        assert_eq!(
            spec.validate(),
            Err(SpecError::NonFinite { what: "matrix[2][1]".to_string() })
        );
    }

    #[test]
    fn test_with_rhs_leaves_original_untouched() {
        let spec = textbook();
        let moved = spec.with_rhs(2, 20.0).unwrap();
        assert_eq!(moved.rhs, vec![4.0, 12.0, 20.0]);
        assert_eq!(spec.rhs, vec![4.0, 12.0, 18.0]);

        assert_eq!(spec.with_rhs(3, 1.0), Err(SpecError::ConstraintIndex { index: 3, count: 3 }));
    }

    #[test]
    fn test_with_rhs_deltas() {
        let spec = textbook();
        let moved = spec.with_rhs_deltas(&[0.0, -2.0, 1.5]).unwrap();
        assert_eq!(moved.rhs, vec![4.0, 10.0, 19.5]);
        assert_eq!(
            spec.with_rhs_deltas(&[1.0]),
            Err(SpecError::DeltaCount { expected: 3, found: 1 })
        );
    }
}
