//! Problem definition and solving API.
//!
//! The `Problem` struct represents an optimization problem with:
//! - An objective (minimize or maximize)
//! - A set of constraints
//!
//! Use the builder pattern to construct problems:
//! ```ignore
//! let solution = Problem::minimize(objective)
//!     .subject_to([constraint1, constraint2])
//!     .solve()?;
//! ```

use std::collections::HashSet;

use tracing::debug;

use crate::canon::{canonicalize, ConeConstraint, LinExpr};
use crate::constraints::Constraint;
use crate::error::{CvxError, Result};
use crate::expr::{Expr, ExprId, Shape, VariableData};
use crate::reductions::{Complex2Real, Reduction};
use crate::solver::{solve, stuff_problem, Settings, Solution, SolveStatus};

/// Objective type for optimization problems.
#[derive(Debug, Clone)]
pub enum Objective {
    /// Minimize the expression.
    Minimize(Expr),
    /// Maximize the expression (internally converted to minimization).
    Maximize(Expr),
}

impl Objective {
    /// Get the expression being optimized.
    pub fn expr(&self) -> &Expr {
        match self {
            Objective::Minimize(e) | Objective::Maximize(e) => e,
        }
    }

    /// Check if this is a minimization.
    pub fn is_minimize(&self) -> bool {
        matches!(self, Objective::Minimize(_))
    }

    /// Same sense of objective over a new expression.
    pub fn with_expr(&self, expr: Expr) -> Objective {
        match self {
            Objective::Minimize(_) => Objective::Minimize(expr),
            Objective::Maximize(_) => Objective::Maximize(expr),
        }
    }
}

/// An optimization problem.
#[derive(Debug, Clone)]
pub struct Problem {
    /// The objective to optimize.
    pub objective: Objective,
    /// The constraints.
    pub constraints: Vec<Constraint>,
}

impl Problem {
    /// Create a minimization problem.
    pub fn minimize(expr: Expr) -> ProblemBuilder {
        ProblemBuilder {
            objective: Objective::Minimize(expr),
            constraints: Vec::new(),
        }
    }

    /// Create a maximization problem.
    pub fn maximize(expr: Expr) -> ProblemBuilder {
        ProblemBuilder {
            objective: Objective::Maximize(expr),
            constraints: Vec::new(),
        }
    }

    /// Check if the problem is DCP-compliant.
    ///
    /// The objective must be real and scalar; minimization needs it convex
    /// and maximization concave. Every constraint must be DCP.
    pub fn is_dcp(&self) -> bool {
        let obj = self.objective.expr();
        let obj_ok = obj.is_real()
            && obj.shape().is_scalar()
            && match &self.objective {
                Objective::Minimize(e) => e.is_convex(),
                Objective::Maximize(e) => e.is_concave(),
            };
        obj_ok && self.constraints.iter().all(|c| c.is_dcp())
    }

    /// The objective expression followed by every constraint expression.
    pub fn expressions(&self) -> impl Iterator<Item = &Expr> {
        std::iter::once(self.objective.expr())
            .chain(self.constraints.iter().map(|c| c.expr().as_ref()))
    }

    /// All leaves of the problem, objective first, in left-to-right order.
    pub fn leaves(&self) -> Vec<&Expr> {
        self.expressions().flat_map(|e| e.leaves()).collect()
    }

    /// Get all variable IDs in the problem.
    pub fn variables(&self) -> Vec<ExprId> {
        self.variable_data().into_iter().map(|v| v.id).collect()
    }

    /// Every distinct variable of the problem, in order of first occurrence.
    pub fn variable_data(&self) -> Vec<VariableData> {
        let mut seen = HashSet::new();
        self.leaves()
            .into_iter()
            .filter_map(|leaf| match leaf {
                Expr::Variable(v) if seen.insert(v.id) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    /// Variable shapes for stuffing.
    fn variable_shapes(&self) -> Vec<(ExprId, Shape)> {
        self.variable_data()
            .into_iter()
            .map(|v| (v.id, v.shape))
            .collect()
    }

    /// Solve the problem with default settings.
    pub fn solve(&self) -> Result<Solution> {
        self.solve_with(&Settings::default())
    }

    /// Solve the problem with custom settings.
    ///
    /// Complex problems are first split into real ones; the returned
    /// solution is always keyed by the ids of this problem's own variables
    /// and constraints. A non-optimal status is reported on the solution
    /// rather than as an error, except for numerical failures.
    pub fn solve_with(&self, settings: &Settings) -> Result<Solution> {
        if !self.is_dcp() {
            return Err(CvxError::NotDcp(self.dcp_violation_message()));
        }

        let complex2real = Complex2Real;
        let solution = if complex2real.accepts(self) {
            let (reduced, inverse) = complex2real.apply(self)?;
            let raw = reduced.solve_real(settings)?;
            complex2real.invert(&raw, &inverse)
        } else {
            self.solve_real(settings)?
        };

        match solution.status {
            SolveStatus::NumericalError => Err(CvxError::NumericalError(
                "Solver encountered numerical difficulties".into(),
            )),
            _ => Ok(solution),
        }
    }

    /// Canonicalize, stuff and solve a problem whose leaves are all real.
    fn solve_real(&self, settings: &Settings) -> Result<Solution> {
        // Convert maximize to minimize
        let negate_result = !self.objective.is_minimize();
        let obj_expr = if negate_result {
            -self.objective.expr()
        } else {
            self.objective.expr().clone()
        };
        let obj_canon = canonicalize(&obj_expr)?;

        let user_vars = self.variable_shapes();
        let mut all_vars = user_vars.clone();
        all_vars.extend(obj_canon.aux_vars);

        let mut all_cone_constraints: Vec<ConeConstraint> = obj_canon.constraints;
        for constraint in &self.constraints {
            let canon = canonicalize(constraint.expr())?;
            let cone = match constraint {
                Constraint::Zero { .. } => ConeConstraint::zero(canon.expr),
                Constraint::NonNeg { .. } => ConeConstraint::nonneg(canon.expr),
            };
            all_cone_constraints.push(cone.with_origin(constraint.id()));
            all_cone_constraints.extend(canon.constraints);
            all_vars.extend(canon.aux_vars);
        }
        all_cone_constraints.extend(sign_constraints(&self.variable_data()));

        let stuffed = stuff_problem(&obj_canon.expr, &all_cone_constraints, &all_vars)?;
        let mut solution = solve(&stuffed, settings)?;

        if negate_result {
            solution.value = solution.value.map(|v| -v);
        }
        // Auxiliary variables never leave the solver layer.
        let keep: HashSet<ExprId> = user_vars.iter().map(|(id, _)| *id).collect();
        solution.primal.retain(|id, _| keep.contains(id));

        debug!(
            status = ?solution.status,
            value = ?solution.value,
            "solved real problem"
        );
        Ok(solution)
    }

    /// Get a message describing why the problem is not DCP.
    fn dcp_violation_message(&self) -> String {
        let mut violations = Vec::new();

        let obj = self.objective.expr();
        if !obj.is_real() {
            violations.push("Objective must be real-valued".to_string());
        }
        if !obj.shape().is_scalar() {
            violations.push(format!("Objective must be scalar, got shape {}", obj.shape()));
        }
        match &self.objective {
            Objective::Minimize(e) if !e.is_convex() => {
                violations.push(format!(
                    "Objective has curvature {:?} but must be convex for minimization",
                    e.curvature()
                ));
            }
            Objective::Maximize(e) if !e.is_concave() => {
                violations.push(format!(
                    "Objective has curvature {:?} but must be concave for maximization",
                    e.curvature()
                ));
            }
            _ => {}
        }

        for (i, c) in self.constraints.iter().enumerate() {
            if !c.is_dcp() {
                violations.push(format!("Constraint {} is not DCP", i));
            }
        }

        if violations.is_empty() {
            "Unknown DCP violation".into()
        } else {
            violations.join("; ")
        }
    }
}

/// Cone constraints implied by variable sign attributes.
fn sign_constraints(vars: &[VariableData]) -> Vec<ConeConstraint> {
    let mut constraints = Vec::new();
    for v in vars {
        let lin = LinExpr::variable(v.id, v.shape.clone());
        if v.nonneg {
            constraints.push(ConeConstraint::nonneg(lin.clone()));
        }
        if v.nonpos {
            constraints.push(ConeConstraint::nonneg(lin.neg()));
        }
    }
    constraints
}

/// Builder for constructing problems.
#[derive(Debug, Clone)]
pub struct ProblemBuilder {
    objective: Objective,
    constraints: Vec<Constraint>,
}

impl ProblemBuilder {
    /// Add constraints to the problem.
    pub fn subject_to(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    /// Add a single constraint.
    pub fn constraint(mut self, c: Constraint) -> Self {
        self.constraints.push(c);
        self
    }

    /// Build the problem.
    pub fn build(self) -> Problem {
        Problem {
            objective: self.objective,
            constraints: self.constraints,
        }
    }

    /// Build and solve the problem with default settings.
    pub fn solve(self) -> Result<Solution> {
        self.build().solve()
    }

    /// Build and solve the problem with custom settings.
    pub fn solve_with(self, settings: &Settings) -> Result<Solution> {
        self.build().solve_with(settings)
    }
}
