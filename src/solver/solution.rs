//! Solver-independent solution records.

use std::collections::HashMap;

use crate::constraints::Constraint;
use crate::error::{CvxError, Result};
use crate::expr::{Array, Expr, ExprId, Value};

/// Solution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    /// Optimal solution found.
    Optimal,
    /// Solution found to reduced accuracy.
    OptimalInaccurate,
    /// Problem is infeasible.
    Infeasible,
    /// Infeasibility detected to reduced accuracy.
    InfeasibleInaccurate,
    /// Problem is unbounded.
    Unbounded,
    /// Unboundedness detected to reduced accuracy.
    UnboundedInaccurate,
    /// Iteration or time limit reached.
    MaxIterations,
    /// Numerical difficulties.
    NumericalError,
    /// Unknown status.
    Unknown,
}

impl SolveStatus {
    /// Whether primal and dual values accompany this status.
    pub fn is_solution_present(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::OptimalInaccurate)
    }
}

/// Attribute key for the solver's wall-clock time in seconds.
pub const SOLVE_TIME: &str = "solve_time";
/// Attribute key for the number of solver iterations.
pub const ITERATIONS: &str = "iterations";

/// Outcome of a solve, keyed by variable and constraint id.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status.
    pub status: SolveStatus,
    /// Optimal value (if solved).
    pub value: Option<f64>,
    /// Primal variable values.
    pub primal: HashMap<ExprId, Value>,
    /// Dual values, one array per constraint.
    pub dual: HashMap<ExprId, Array>,
    /// Solver statistics (solve time, iterations, ...).
    pub attributes: HashMap<String, f64>,
}

impl Solution {
    /// A solution with the given status and nothing else.
    pub fn with_status(status: SolveStatus) -> Self {
        Solution {
            status,
            value: None,
            primal: HashMap::new(),
            dual: HashMap::new(),
            attributes: HashMap::new(),
        }
    }

    /// Get the value of a variable by id.
    pub fn get_value(&self, var_id: ExprId) -> Option<&Value> {
        self.primal.get(&var_id)
    }

    /// Get the value of a variable expression.
    pub fn primal_value(&self, var: &Expr) -> Option<&Value> {
        var.variable_id().and_then(|id| self.get_value(id))
    }

    /// Get the dual value of a constraint.
    pub fn dual_value(&self, constraint: &Constraint) -> Option<&Array> {
        self.dual.get(&constraint.id())
    }

    /// Get the real scalar value of a variable.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The expression is not a variable
    /// - The variable is not in the solution
    /// - The variable is not a real scalar
    pub fn try_value(&self, var: &Expr) -> Result<f64> {
        let var_id = var
            .variable_id()
            .ok_or_else(|| CvxError::InvalidProblem("Expression is not a variable".into()))?;
        match self.get_value(var_id) {
            Some(Value::Real(arr)) => arr.as_scalar().ok_or_else(|| {
                CvxError::InvalidProblem("Variable is not scalar".into())
            }),
            Some(_) => Err(CvxError::InvalidProblem("Variable is not real".into())),
            None => Err(CvxError::InvalidProblem("Variable not in solution".into())),
        }
    }

    /// Solver attribute by key.
    pub fn attribute(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{constant, variable};

    #[test]
    fn test_status_presence() {
        assert!(SolveStatus::Optimal.is_solution_present());
        assert!(SolveStatus::OptimalInaccurate.is_solution_present());
        assert!(!SolveStatus::Infeasible.is_solution_present());
        assert!(!SolveStatus::Unknown.is_solution_present());
    }

    #[test]
    fn test_try_value() {
        let x = variable(());
        let y = variable(2);
        let mut sol = Solution::with_status(SolveStatus::Optimal);
        sol.primal.insert(x.variable_id().unwrap(), Value::Real(Array::Scalar(1.5)));
        sol.primal
            .insert(y.variable_id().unwrap(), Value::Real(Array::from_vec(vec![1.0, 2.0])));

        assert_eq!(sol.try_value(&x).unwrap(), 1.5);
        assert!(sol.try_value(&y).is_err());
        assert!(sol.try_value(&constant(1.0)).is_err());
        assert!(sol.try_value(&variable(())).is_err());
    }
}
