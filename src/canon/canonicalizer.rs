//! Expression canonicalization.
//!
//! Canonicalization transforms real DCP expressions into standard form:
//! - Affine expressions become `LinExpr`
//! - Nonlinear atoms are replaced by their graph implementation, which adds
//!   auxiliary variables and cone constraints

use tracing::trace;

use super::lin_expr::LinExpr;
use crate::atoms::Atom;
use crate::error::{CvxError, Result};
use crate::expr::{fold_post_order, Expr, ExprId, Shape};

/// A cone constraint in standard form: Ax + b in K.
#[derive(Debug, Clone)]
pub enum ConeConstraint {
    /// Zero cone: Ax + b = 0 (equality).
    Zero {
        a: LinExpr,
        /// User constraint this row block came from, if any.
        origin: Option<ExprId>,
    },
    /// Nonnegative cone: Ax + b >= 0.
    NonNeg {
        a: LinExpr,
        /// User constraint this row block came from, if any.
        origin: Option<ExprId>,
    },
}

impl ConeConstraint {
    /// Equality constraint with no user-facing origin.
    pub fn zero(a: LinExpr) -> Self {
        ConeConstraint::Zero { a, origin: None }
    }

    /// Nonnegativity constraint with no user-facing origin.
    pub fn nonneg(a: LinExpr) -> Self {
        ConeConstraint::NonNeg { a, origin: None }
    }

    /// Tag the constraint with the id of the user constraint it encodes.
    pub fn with_origin(self, id: ExprId) -> Self {
        match self {
            ConeConstraint::Zero { a, .. } => ConeConstraint::Zero { a, origin: Some(id) },
            ConeConstraint::NonNeg { a, .. } => ConeConstraint::NonNeg { a, origin: Some(id) },
        }
    }

    /// The affine expression constrained to the cone.
    pub fn expr(&self) -> &LinExpr {
        match self {
            ConeConstraint::Zero { a, .. } | ConeConstraint::NonNeg { a, .. } => a,
        }
    }

    /// The originating user constraint, if any.
    pub fn origin(&self) -> Option<ExprId> {
        match self {
            ConeConstraint::Zero { origin, .. } | ConeConstraint::NonNeg { origin, .. } => *origin,
        }
    }

    /// Number of rows this constraint occupies.
    pub fn size(&self) -> usize {
        self.expr().size()
    }
}

/// Result of canonicalizing an expression.
#[derive(Debug)]
pub struct CanonResult {
    /// The affine stand-in for the expression.
    pub expr: LinExpr,
    /// Additional cone constraints introduced during canonicalization.
    pub constraints: Vec<ConeConstraint>,
    /// Auxiliary variables introduced during canonicalization.
    pub aux_vars: Vec<(ExprId, Shape)>,
}

/// Canonicalize a real expression.
///
/// Complex leaves must already have been split into real ones and every
/// parameter must be bound; either is reported as an invalid problem.
pub fn canonicalize(expr: &Expr) -> Result<CanonResult> {
    let mut ctx = CanonContext::new();
    let lin = fold_post_order(expr, |_| Ok(None), |node, args| ctx.canonicalize_node(node, args))?;
    Ok(CanonResult {
        expr: lin,
        constraints: ctx.constraints,
        aux_vars: ctx.aux_vars,
    })
}

/// Context for canonicalization, tracking auxiliary variables and constraints.
struct CanonContext {
    constraints: Vec<ConeConstraint>,
    aux_vars: Vec<(ExprId, Shape)>,
}

impl CanonContext {
    fn new() -> Self {
        CanonContext {
            constraints: Vec::new(),
            aux_vars: Vec::new(),
        }
    }

    /// Canonicalize one node given its canonicalized arguments.
    fn canonicalize_node(&mut self, expr: &Expr, mut args: Vec<LinExpr>) -> Result<LinExpr> {
        Ok(match expr {
            // Leaves
            Expr::Variable(v) => {
                if !v.domain.is_real() {
                    return Err(CvxError::InvalidProblem(format!(
                        "variable {:?} is not real; split it before canonicalization",
                        v.name.as_deref().unwrap_or("<unnamed>")
                    )));
                }
                LinExpr::variable(v.id, v.shape.clone())
            }
            Expr::Constant(c) => {
                if !c.domain().is_real() {
                    return Err(CvxError::InvalidProblem(
                        "complex constant reached canonicalization".into(),
                    ));
                }
                LinExpr::from_array(&c.value)
            }
            Expr::Parameter(p) => {
                return Err(CvxError::InvalidProblem(format!(
                    "parameter {:?} must be bound before canonicalization",
                    p.name.as_deref().unwrap_or("<unnamed>")
                )))
            }

            // Affine operations
            Expr::Add(_, _) => {
                let rhs = pop(&mut args)?;
                let lhs = pop(&mut args)?;
                check_broadcast(&lhs.shape, &rhs.shape)?;
                lhs.add(&rhs)
            }
            Expr::Neg(_) => pop(&mut args)?.neg(),
            Expr::Mul(_, _) => {
                let rhs = pop(&mut args)?;
                let lhs = pop(&mut args)?;
                check_broadcast(&lhs.shape, &rhs.shape)?;
                canonicalize_mul(lhs, rhs)?
            }
            Expr::Sum(_) => pop(&mut args)?.sum(),
            Expr::VStack(_) => {
                let shapes: Vec<Shape> = args.iter().map(|a| a.shape.clone()).collect();
                let shape = Shape::vstack(&shapes).ok_or_else(|| CvxError::ShapeMismatch {
                    expected: "blocks with equal column counts".into(),
                    got: format!("{:?}", shapes),
                })?;
                LinExpr::vstack(&args, shape)
            }

            // Leaves are real by now, so these are identity / zero.
            Expr::Real(_) | Expr::Conj(_) => pop(&mut args)?,
            Expr::Imag(_) => LinExpr::zeros(pop(&mut args)?.shape),

            // Nonlinear atoms
            Expr::SumLargest(atom) => {
                self.apply_graph_implementation(atom, &args, &atom.shape_from_args())?
            }
        })
    }

    fn apply_graph_implementation<A: Atom>(
        &mut self,
        atom: &A,
        args: &[LinExpr],
        shape: &Shape,
    ) -> Result<LinExpr> {
        let graph = atom.graph_implementation(args, shape)?;
        trace!(
            atom = atom.name(),
            constraints = graph.constraints.len(),
            aux_vars = graph.aux_vars.len(),
            "expanded graph implementation"
        );
        self.constraints.extend(graph.constraints);
        self.aux_vars.extend(graph.aux_vars);
        Ok(graph.objective)
    }
}

/// Elementwise product where one side must be constant.
fn canonicalize_mul(lhs: LinExpr, rhs: LinExpr) -> Result<LinExpr> {
    if lhs.is_constant() {
        Ok(rhs.mul_elementwise(&lhs.constant))
    } else if rhs.is_constant() {
        Ok(lhs.mul_elementwise(&rhs.constant))
    } else {
        Err(CvxError::NotDcp(
            "product of two non-constant expressions".into(),
        ))
    }
}

fn check_broadcast(sa: &Shape, sb: &Shape) -> Result<()> {
    match sa.broadcast(sb) {
        Some(_) => Ok(()),
        None => Err(CvxError::ShapeMismatch {
            expected: sa.to_string(),
            got: sb.to_string(),
        }),
    }
}

fn pop(args: &mut Vec<LinExpr>) -> Result<LinExpr> {
    args.pop()
        .ok_or_else(|| CvxError::Invariant("missing canonicalized argument".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{imag, sum, sum_largest, vstack};
    use crate::expr::{complex_variable, constant, constant_vec, parameter, variable};

    #[test]
    fn test_canonicalize_variable() {
        let x = variable(5);
        let result = canonicalize(&x).unwrap();
        assert!(result.constraints.is_empty());
        assert!(result.aux_vars.is_empty());
        assert_eq!(result.expr.variables(), vec![x.variable_id().unwrap()]);
    }

    #[test]
    fn test_canonicalize_affine() {
        let x = variable(3);
        let e = sum(&(&(2.0 * &x) + &constant_vec(vec![1.0, 2.0, 3.0])));
        let result = canonicalize(&e).unwrap();
        assert!(result.expr.shape.is_scalar());
        assert_eq!(result.expr.constant[(0, 0)], 6.0);
    }

    #[test]
    fn test_canonicalize_sum_largest() {
        let x = variable(5);
        let e = sum_largest(&x, 2.0).unwrap();
        let result = canonicalize(&e).unwrap();
        assert_eq!(result.constraints.len(), 2);
        assert_eq!(result.aux_vars.len(), 2);
        assert!(result
            .constraints
            .iter()
            .all(|c| matches!(c, ConeConstraint::NonNeg { origin: None, .. })));
    }

    #[test]
    fn test_imag_of_real_is_zero() {
        let x = variable(2);
        let e = vstack(vec![x.clone(), imag(&x)]);
        let result = canonicalize(&e).unwrap();
        assert_eq!(result.expr.size(), 4);
    }

    #[test]
    fn test_rejects_unreduced_inputs() {
        assert!(matches!(
            canonicalize(&complex_variable(2)),
            Err(CvxError::InvalidProblem(_))
        ));
        assert!(matches!(
            canonicalize(&(&variable(2) + &parameter(2))),
            Err(CvxError::InvalidProblem(_))
        ));
        let x = variable(2);
        assert!(matches!(canonicalize(&(&x * &x)), Err(CvxError::NotDcp(_))));
        assert!(matches!(
            canonicalize(&(&variable(2) + &variable(3))),
            Err(CvxError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_with_origin() {
        let id = ExprId::new();
        let c = ConeConstraint::zero(LinExpr::scalar(0.0)).with_origin(id);
        assert_eq!(c.origin(), Some(id));
        assert_eq!(c.size(), 1);
    }
}
