//! Constraint types for optimization problems.
//!
//! Constraints map to cone constraints in the solver:
//! - Zero: expr = 0 (zero cone / equality)
//! - NonNeg: expr >= 0 (nonnegative orthant)
//!
//! Each constraint carries its own id so that dual values can be reported
//! against it after any number of reductions.

use std::sync::Arc;

use crate::expr::{Expr, ExprId};

/// A constraint in an optimization problem.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Equality constraint: expr == 0.
    /// Maps to the zero cone.
    Zero { id: ExprId, expr: Arc<Expr> },

    /// Inequality constraint: expr >= 0.
    /// Maps to the nonnegative orthant cone.
    NonNeg { id: ExprId, expr: Arc<Expr> },
}

impl Constraint {
    /// Create `expr == 0` with a fresh id.
    pub fn zero(expr: Expr) -> Self {
        Constraint::Zero {
            id: ExprId::new(),
            expr: Arc::new(expr),
        }
    }

    /// Create `expr >= 0` with a fresh id.
    pub fn nonneg(expr: Expr) -> Self {
        Constraint::NonNeg {
            id: ExprId::new(),
            expr: Arc::new(expr),
        }
    }

    /// Create an equality constraint: lhs == rhs.
    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Constraint::zero(lhs - rhs)
    }

    /// Create an inequality constraint: lhs <= rhs.
    pub fn leq(lhs: Expr, rhs: Expr) -> Self {
        // lhs <= rhs  <=>  rhs - lhs >= 0
        Constraint::nonneg(rhs - lhs)
    }

    /// Create an inequality constraint: lhs >= rhs.
    pub fn geq(lhs: Expr, rhs: Expr) -> Self {
        Constraint::nonneg(lhs - rhs)
    }

    /// The constraint's id.
    pub fn id(&self) -> ExprId {
        match self {
            Constraint::Zero { id, .. } | Constraint::NonNeg { id, .. } => *id,
        }
    }

    /// The constrained expression.
    pub fn expr(&self) -> &Arc<Expr> {
        match self {
            Constraint::Zero { expr, .. } | Constraint::NonNeg { expr, .. } => expr,
        }
    }

    /// Same kind of constraint over a new expression, with a fresh id.
    pub fn with_expr(&self, expr: Arc<Expr>) -> Self {
        let id = ExprId::new();
        match self {
            Constraint::Zero { .. } => Constraint::Zero { id, expr },
            Constraint::NonNeg { .. } => Constraint::NonNeg { id, expr },
        }
    }

    /// Check if this constraint is DCP-compliant.
    ///
    /// DCP rules for constraints:
    /// - Zero: expression must be affine (equality of affine expressions)
    /// - NonNeg: expression must be real and concave (concave >= 0)
    pub fn is_dcp(&self) -> bool {
        match self {
            Constraint::Zero { expr, .. } => expr.is_affine(),
            Constraint::NonNeg { expr, .. } => expr.is_real() && expr.is_concave(),
        }
    }

    /// Get all variable IDs in this constraint.
    pub fn variables(&self) -> Vec<ExprId> {
        self.expr().variables()
    }
}

/// Extension trait for creating constraints from expressions.
pub trait ConstraintExt {
    /// Create equality constraint: self == rhs.
    fn equals(&self, rhs: &Expr) -> Constraint;

    /// Create inequality constraint: self <= rhs.
    fn leq(&self, rhs: &Expr) -> Constraint;

    /// Create inequality constraint: self >= rhs.
    fn geq(&self, rhs: &Expr) -> Constraint;
}

impl ConstraintExt for Expr {
    fn equals(&self, rhs: &Expr) -> Constraint {
        Constraint::eq(self.clone(), rhs.clone())
    }

    fn leq(&self, rhs: &Expr) -> Constraint {
        Constraint::leq(self.clone(), rhs.clone())
    }

    fn geq(&self, rhs: &Expr) -> Constraint {
        Constraint::geq(self.clone(), rhs.clone())
    }
}
