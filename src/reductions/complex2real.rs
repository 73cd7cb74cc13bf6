//! Lift complex-valued problems into real ones.
//!
//! Every expression is split into a real part and an imaginary part, each a
//! real expression (`None` standing for an identically zero part). Imaginary
//! and complex variables are replaced by fresh real variables, and the
//! recorded [`InverseData`] maps solver values back onto the originals.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, trace};

use super::inverse_data::{InverseData, SplitIds};
use super::Reduction;
use crate::atoms::Atom;
use crate::constraints::Constraint;
use crate::dcp::Domain;
use crate::error::{CvxError, Result};
use crate::expr::{
    constant_array, fold_post_order, zeros, Array, Expr, ExprId, Shape, Value, VariableData,
};
use crate::problem::Problem;
use crate::solver::Solution;

/// Real and imaginary parts of a split expression.
#[derive(Debug, Clone, Default)]
pub struct Parts {
    /// Real part, `None` when identically zero.
    pub re: Option<Arc<Expr>>,
    /// Imaginary part, `None` when identically zero.
    pub im: Option<Arc<Expr>>,
}

impl Parts {
    fn real(re: Arc<Expr>) -> Self {
        Parts {
            re: Some(re),
            im: None,
        }
    }

    fn real_or_zeros(self, shape: &Shape) -> Arc<Expr> {
        self.re.unwrap_or_else(|| Arc::new(zeros(shape.clone())))
    }
}

/// Outcome of splitting one node.
#[derive(Debug, Clone)]
pub enum Rewrite {
    /// Split into real parts.
    Resolved(Parts),
    /// Depends on parameters whose values are not known yet.
    Deferred(String),
    /// A splitting rule could not be applied.
    Failed(String),
}

/// Replaces complex variables, constants and expressions by real ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct Complex2Real;

impl Reduction for Complex2Real {
    type Inverse = InverseData;

    fn name(&self) -> &'static str {
        "Complex2Real"
    }

    fn accepts(&self, problem: &Problem) -> bool {
        problem.leaves().iter().any(|leaf| !leaf.is_real())
    }

    fn apply(&self, problem: &Problem) -> Result<(Problem, InverseData)> {
        let mut splitter = Splitter::default();

        let (obj_parts, obj_shape) = splitter.resolve(problem.objective.expr())?;
        if obj_parts.im.is_some() {
            return Err(invariant("objective is not real-valued".into()));
        }
        let objective = problem
            .objective
            .with_expr(Arc::unwrap_or_clone(obj_parts.real_or_zeros(&obj_shape)));

        let mut constraints = Vec::with_capacity(problem.constraints.len());
        for constraint in &problem.constraints {
            constraints.push(splitter.split_constraint(constraint)?);
        }

        debug!(
            reduction = self.name(),
            variables = splitter.inverse.id2var.len(),
            split = splitter.inverse.real2imag.len(),
            constraints = constraints.len(),
            "applied reduction"
        );
        Ok((
            Problem {
                objective,
                constraints,
            },
            splitter.inverse,
        ))
    }

    fn invert(&self, solution: &Solution, inverse: &InverseData) -> Solution {
        let mut out = Solution::with_status(solution.status);
        out.value = solution.value;
        out.attributes = solution.attributes.clone();
        if !solution.status.is_solution_present() {
            return out;
        }

        for (id, var) in &inverse.id2var {
            let split = inverse.split_of(*id);
            let part = |pick: fn(&SplitIds) -> Option<ExprId>| {
                split
                    .and_then(pick)
                    .and_then(|replacement| real_value(solution, replacement))
            };
            let value = match var.domain {
                Domain::Real => solution.primal.get(id).cloned(),
                Domain::Imaginary => part(|s| s.imag).map(Value::Imaginary),
                Domain::Complex => match (part(|s| s.real), part(|s| s.imag)) {
                    (Some(re), Some(im)) => Some(Value::Complex { re, im }),
                    _ => None,
                },
            };
            if let Some(value) = value {
                out.primal.insert(*id, value);
            }
        }

        for (original, replacement) in &inverse.cons_id_map {
            if let Some(dual) = solution.dual.get(replacement) {
                out.dual.insert(*original, dual.clone());
            }
        }
        out
    }
}

fn real_value(solution: &Solution, id: ExprId) -> Option<Array> {
    solution.primal.get(&id).and_then(|v| v.real_part()).cloned()
}

fn invariant(msg: String) -> CvxError {
    error!(reduction = "Complex2Real", "{}", msg);
    CvxError::Invariant(msg)
}

/// Per-node state of the bottom-up walk.
///
/// Variable-free subtrees are kept as references until their parent needs
/// them split, so each is evaluated once, at its topmost node.
enum Walk<'a> {
    Constant(&'a Expr),
    Parametric(&'a Expr),
    Split(Rewrite),
}

/// A walk state together with the shape of the node it stands for.
///
/// Both parts of a split expression share the shape of the original.
struct Step<'a> {
    walk: Walk<'a>,
    shape: Shape,
}

#[derive(Default)]
struct Splitter {
    inverse: InverseData,
    // Parts of every variable seen so far, shared by the whole problem.
    cache: HashMap<ExprId, Parts>,
}

impl Splitter {
    /// Split a whole tree, returning its parts and its shape.
    fn resolve(&mut self, expr: &Expr) -> Result<(Parts, Shape)> {
        let root =
            fold_post_order(expr, |_| Ok(None), |node, children| self.visit(node, children))?;
        match self.settle(root.walk, &root.shape)? {
            Rewrite::Resolved(parts) => Ok((parts, root.shape)),
            Rewrite::Deferred(msg) => {
                debug!(reduction = "Complex2Real", reason = %msg, "deferred");
                Err(CvxError::Deferred(msg))
            }
            Rewrite::Failed(msg) => Err(invariant(msg)),
        }
    }

    fn split_constraint(&mut self, constraint: &Constraint) -> Result<Constraint> {
        let (parts, shape) = self.resolve(constraint.expr())?;
        let expr = match constraint {
            Constraint::Zero { .. } => match (parts.re, parts.im) {
                (Some(re), Some(im)) => Arc::new(Expr::VStack(vec![re, im])),
                (Some(part), None) | (None, Some(part)) => part,
                (None, None) => Arc::new(zeros(shape)),
            },
            Constraint::NonNeg { .. } => {
                if parts.im.is_some() {
                    return Err(invariant("inequality over a non-real expression".into()));
                }
                parts.real_or_zeros(&shape)
            }
        };
        let rewritten = constraint.with_expr(expr);
        self.inverse.record_constraint(constraint.id(), rewritten.id());
        Ok(rewritten)
    }

    fn visit<'a>(&mut self, node: &'a Expr, children: Vec<Step<'a>>) -> Result<Step<'a>> {
        let shapes: Vec<Shape> = children.iter().map(|c| c.shape.clone()).collect();
        let shape = node.shape_over(&shapes);
        let walk = self.walk_node(node, children, &shapes, &shape)?;
        Ok(Step { walk, shape })
    }

    fn walk_node<'a>(
        &mut self,
        node: &'a Expr,
        children: Vec<Step<'a>>,
        shapes: &[Shape],
        shape: &Shape,
    ) -> Result<Walk<'a>> {
        match node {
            Expr::Variable(v) => return Ok(Walk::Split(Rewrite::Resolved(self.split_variable(v)))),
            Expr::Constant(_) => return Ok(Walk::Constant(node)),
            Expr::Parameter(_) => return Ok(Walk::Parametric(node)),
            _ => {}
        }
        if children.iter().all(|c| matches!(c.walk, Walk::Constant(_))) {
            return Ok(Walk::Constant(node));
        }
        if children
            .iter()
            .all(|c| matches!(c.walk, Walk::Constant(_) | Walk::Parametric(_)))
        {
            return Ok(Walk::Parametric(node));
        }

        let mut parts = Vec::with_capacity(children.len());
        let mut deferred = None;
        for child in children {
            match self.settle(child.walk, &child.shape)? {
                Rewrite::Resolved(p) => parts.push(p),
                Rewrite::Deferred(msg) => deferred = deferred.or(Some(msg)),
                failed @ Rewrite::Failed(_) => return Ok(Walk::Split(failed)),
            }
        }
        if let Some(msg) = deferred {
            return Ok(Walk::Split(Rewrite::Deferred(msg)));
        }
        Ok(Walk::Split(split_node(node, parts, shapes, shape)?))
    }

    /// Turn a walk state into a rewrite, evaluating constant subtrees.
    fn settle(&mut self, walk: Walk<'_>, shape: &Shape) -> Result<Rewrite> {
        Ok(match walk {
            Walk::Split(rewrite) => rewrite,
            Walk::Constant(expr) => match expr.value() {
                Ok(value) => Rewrite::Resolved(split_value(value)),
                // An atom over a non-real constant argument.
                Err(CvxError::Domain(msg)) => Rewrite::Failed(msg),
                Err(err) => return Err(err),
            },
            Walk::Parametric(expr) if expr.leaves().iter().all(|l| l.is_real()) => {
                Rewrite::Resolved(Parts::real(Arc::new(expr.clone())))
            }
            Walk::Parametric(expr) => Rewrite::Deferred(format!(
                "{:?} subtree of shape {} depends on parameters",
                expr.domain(),
                shape
            )),
        })
    }

    fn split_variable(&mut self, var: &VariableData) -> Parts {
        if let Some(parts) = self.cache.get(&var.id) {
            return parts.clone();
        }
        self.inverse.record_variable(var);

        let parts = match var.domain {
            Domain::Real => Parts::real(Arc::new(Expr::Variable(var.clone()))),
            Domain::Imaginary => {
                let im = replacement(var, "im");
                self.inverse.record_split(
                    var.id,
                    SplitIds {
                        real: None,
                        imag: Some(im.id),
                    },
                );
                Parts {
                    re: None,
                    im: Some(Arc::new(Expr::Variable(im))),
                }
            }
            Domain::Complex => {
                let (re, im) = (replacement(var, "re"), replacement(var, "im"));
                self.inverse.record_split(
                    var.id,
                    SplitIds {
                        real: Some(re.id),
                        imag: Some(im.id),
                    },
                );
                Parts {
                    re: Some(Arc::new(Expr::Variable(re))),
                    im: Some(Arc::new(Expr::Variable(im))),
                }
            }
        };
        trace!(variable = var.id.raw(), domain = ?var.domain, "split variable");
        self.cache.insert(var.id, parts.clone());
        parts
    }
}

/// Fresh real variable standing in for one part of `var`.
fn replacement(var: &VariableData, suffix: &str) -> VariableData {
    VariableData {
        id: ExprId::new(),
        shape: var.shape.clone(),
        name: var.name.as_ref().map(|n| format!("{}_{}", n, suffix)),
        nonneg: false,
        nonpos: false,
        domain: Domain::Real,
    }
}

fn split_value(value: Value) -> Parts {
    let wrap = |a: Array| Arc::new(constant_array(a));
    match value {
        Value::Real(re) => Parts::real(wrap(re)),
        Value::Imaginary(im) => Parts {
            re: None,
            im: Some(wrap(im)),
        },
        Value::Complex { re, im } => Parts {
            re: Some(wrap(re)),
            im: Some(wrap(im)),
        },
    }
}

/// Apply the splitting rule of `node` to its children's parts.
///
/// `shapes` are the shapes of the children and `shape` that of `node`.
fn split_node(
    node: &Expr,
    parts: Vec<Parts>,
    shapes: &[Shape],
    shape: &Shape,
) -> Result<Rewrite> {
    let mut it = parts.into_iter();
    let mut next = || {
        it.next()
            .ok_or_else(|| CvxError::Invariant("missing split argument".into()))
    };

    let parts = match node {
        Expr::Add(_, _) => {
            let (a, b) = (next()?, next()?);
            let [sa, sb] = shapes else {
                return Ok(Rewrite::Failed("sum without two operand shapes".into()));
            };
            Parts {
                re: add_fit((a.re, sa), (b.re, sb), shape),
                im: add_fit((a.im, sa), (b.im, sb), shape),
            }
        }
        Expr::Neg(_) => {
            let a = next()?;
            Parts {
                re: neg(a.re),
                im: neg(a.im),
            }
        }
        Expr::Mul(_, _) => {
            // (ar + i ai)(br + i bi) = (ar br - ai bi) + i (ar bi + ai br)
            let (a, b) = (next()?, next()?);
            Parts {
                re: add(mul(&a.re, &b.re), neg(mul(&a.im, &b.im))),
                im: add(mul(&a.re, &b.im), mul(&a.im, &b.re)),
            }
        }
        Expr::Sum(_) => {
            let a = next()?;
            Parts {
                re: a.re.map(|e| Arc::new(Expr::Sum(e))),
                im: a.im.map(|e| Arc::new(Expr::Sum(e))),
            }
        }
        Expr::VStack(exprs) => {
            let mut blocks = Vec::with_capacity(exprs.len());
            for _ in exprs {
                blocks.push(next()?);
            }
            stack_parts(shapes, blocks)
        }
        Expr::Real(_) => Parts {
            re: next()?.re,
            im: None,
        },
        Expr::Imag(_) => Parts {
            re: next()?.im,
            im: None,
        },
        Expr::Conj(_) => {
            let a = next()?;
            Parts {
                re: a.re,
                im: neg(a.im),
            }
        }
        Expr::SumLargest(atom) => {
            let mut real_args = Vec::new();
            for arg_shape in shapes {
                let p = next()?;
                if p.im.is_some() {
                    return Ok(Rewrite::Failed(format!(
                        "{} received a non-real argument",
                        atom.name()
                    )));
                }
                real_args.push(p.real_or_zeros(arg_shape));
            }
            Parts::real(Arc::new(node.copy_with_args(real_args)?))
        }
        Expr::Variable(_) | Expr::Constant(_) | Expr::Parameter(_) => {
            return Ok(Rewrite::Failed("leaf reached the splitting rules".into()))
        }
    };
    Ok(Rewrite::Resolved(parts))
}

/// Stack parts blockwise, filling absent parts with zeros of the block's shape.
fn stack_parts(shapes: &[Shape], blocks: Vec<Parts>) -> Parts {
    let any_re = blocks.iter().any(|b| b.re.is_some());
    let any_im = blocks.iter().any(|b| b.im.is_some());
    let mut re = Vec::with_capacity(blocks.len());
    let mut im = Vec::with_capacity(blocks.len());
    for (shape, block) in shapes.iter().zip(blocks) {
        let filled =
            |part: Option<Arc<Expr>>| part.unwrap_or_else(|| Arc::new(zeros(shape.clone())));
        re.push(filled(block.re));
        im.push(filled(block.im));
    }
    Parts {
        re: any_re.then(|| Arc::new(Expr::VStack(re))),
        im: any_im.then(|| Arc::new(Expr::VStack(im))),
    }
}

fn add(a: Option<Arc<Expr>>, b: Option<Arc<Expr>>) -> Option<Arc<Expr>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(Arc::new(Expr::Add(a, b))),
        (a, None) => a,
        (None, b) => b,
    }
}

fn neg(a: Option<Arc<Expr>>) -> Option<Arc<Expr>> {
    a.map(|e| Arc::new(Expr::Neg(e)))
}

fn mul(a: &Option<Arc<Expr>>, b: &Option<Arc<Expr>>) -> Option<Arc<Expr>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(Arc::new(Expr::Mul(a.clone(), b.clone()))),
        _ => None,
    }
}

/// Add two optional parts, broadcasting a lone operand up to the sum's shape.
fn add_fit(
    (a, a_shape): (Option<Arc<Expr>>, &Shape),
    (b, b_shape): (Option<Arc<Expr>>, &Shape),
    shape: &Shape,
) -> Option<Arc<Expr>> {
    let fit = |e: Arc<Expr>, e_shape: &Shape| {
        if e_shape == shape {
            e
        } else {
            Arc::new(Expr::Add(e, Arc::new(zeros(shape.clone()))))
        }
    };
    match (a, b) {
        (Some(a), Some(b)) => Some(Arc::new(Expr::Add(a, b))),
        (Some(a), None) => Some(fit(a, a_shape)),
        (None, Some(b)) => Some(fit(b, b_shape)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{imag, real, sum, sum_largest, vstack};
    use crate::constraints::ConstraintExt;
    use crate::expr::{
        complex_constant, complex_variable, constant, imag_variable, parameter, parameter_in,
        variable,
    };

    fn leaves_real(problem: &Problem) -> bool {
        problem.leaves().iter().all(|l| l.is_real())
    }

    #[test]
    fn test_accepts() {
        let x = variable(2);
        let real_problem = Problem::minimize(sum(&x)).build();
        assert!(!Complex2Real.accepts(&real_problem));

        let z = complex_variable(2);
        let complex_problem = Problem::minimize(sum(&x))
            .subject_to([z.equals(&x)])
            .build();
        assert!(Complex2Real.accepts(&complex_problem));

        let c = Problem::minimize(real(&(&x * &complex_constant(1.0, 1.0)))).build();
        assert!(Complex2Real.accepts(&c));
    }

    #[test]
    fn test_real_variables_keep_their_id() {
        let x = variable(2);
        let z = imag_variable(2);
        let problem = Problem::minimize(sum(&x))
            .subject_to([(&x + &z).equals(&constant(0.0))])
            .build();
        let (reduced, inverse) = Complex2Real.apply(&problem).unwrap();

        assert!(leaves_real(&reduced));
        assert!(!Complex2Real.accepts(&reduced));
        let x_id = x.variable_id().unwrap();
        assert!(reduced.variables().contains(&x_id));
        assert!(inverse.split_of(x_id).is_none());

        let split = inverse.split_of(z.variable_id().unwrap()).unwrap();
        assert_eq!(split.real, None);
        assert!(split.imag.is_some());
    }

    #[test]
    fn test_complex_equality_becomes_stacked() {
        let z = complex_variable(3);
        let problem = Problem::minimize(constant(0.0))
            .subject_to([z.equals(&complex_constant(1.0, 2.0))])
            .build();
        let (reduced, inverse) = Complex2Real.apply(&problem).unwrap();

        assert_eq!(reduced.constraints.len(), 1);
        let c = &reduced.constraints[0];
        assert!(matches!(c, Constraint::Zero { .. }));
        assert_eq!(c.expr().shape(), Shape::vector(6));
        assert_eq!(
            inverse.cons_id_map.get(&problem.constraints[0].id()),
            Some(&c.id())
        );
    }

    #[test]
    fn test_constant_subtree_is_folded() {
        let x = variable(());
        let c = &complex_constant(1.0, 2.0) * &complex_constant(3.0, -1.0);
        let problem = Problem::minimize(x.clone())
            .subject_to([Constraint::zero(&x - &real(&c))])
            .build();
        let (reduced, _) = Complex2Real.apply(&problem).unwrap();
        // (1 + 2i)(3 - i) = 5 + 5i
        let folded: Vec<f64> = reduced.constraints[0]
            .expr()
            .leaves()
            .iter()
            .filter_map(|l| l.constant_value().and_then(|a| a.as_scalar()))
            .collect();
        assert_eq!(folded, vec![-5.0]);
    }

    #[test]
    fn test_vstack_fills_missing_parts() {
        let x = variable(2);
        let z = imag_variable(3);
        let stacked = vstack(vec![x.clone(), z.clone()]);
        let problem = Problem::minimize(constant(0.0))
            .subject_to([stacked.equals(&constant(0.0))])
            .build();
        let (reduced, _) = Complex2Real.apply(&problem).unwrap();
        assert_eq!(reduced.constraints[0].expr().shape(), Shape::vector(10));
    }

    #[test]
    fn test_lone_part_broadcast_to_sum_shape() {
        // The imaginary part comes from the scalar alone and is widened to 3.
        let x = variable(3);
        let y = imag_variable(());
        let problem = Problem::minimize(constant(0.0))
            .subject_to([(&x + &y).equals(&constant(0.0))])
            .build();
        let (reduced, _) = Complex2Real.apply(&problem).unwrap();
        assert_eq!(reduced.constraints[0].expr().shape(), Shape::vector(6));
    }

    #[test]
    fn test_complex_parameter_defers() {
        let x = variable(2);
        let z = complex_variable(2);
        let p = parameter_in(2, Domain::Complex);
        let problem = Problem::minimize(sum(&x))
            .subject_to([(&z * &p).equals(&constant(0.0))])
            .build();
        assert!(matches!(
            Complex2Real.apply(&problem),
            Err(CvxError::Deferred(_))
        ));

        // Real-valued, but only because of a complex parameter underneath.
        let hidden = Problem::minimize(sum(&x))
            .subject_to([(&x + &imag(&p)).geq(&constant(0.0))])
            .build();
        assert!(matches!(
            Complex2Real.apply(&hidden),
            Err(CvxError::Deferred(_))
        ));
    }

    #[test]
    fn test_real_parameter_subtree_carried_through() {
        let z = complex_variable(2);
        let p = parameter(2);
        let problem = Problem::minimize(constant(0.0))
            .subject_to([(&z + &p).equals(&constant(0.0))])
            .build();
        let (reduced, _) = Complex2Real.apply(&problem).unwrap();
        assert_eq!(reduced.constraints[0].expr().parameters(), p.parameters());
    }

    #[test]
    fn test_complex_sum_largest_argument_is_invariant_error() {
        let z = complex_variable(3);
        let f = sum_largest(&z, 2.0).unwrap();
        let problem = Problem::minimize(f).build();
        assert!(matches!(
            Complex2Real.apply(&problem),
            Err(CvxError::Invariant(_))
        ));
    }

    #[test]
    fn test_sum_largest_of_real_part() {
        let z = complex_variable(3);
        let f = sum_largest(&real(&z), 2.0).unwrap();
        let problem = Problem::minimize(f).build();
        let (reduced, inverse) = Complex2Real.apply(&problem).unwrap();
        assert!(matches!(reduced.objective.expr(), Expr::SumLargest(_)));
        assert_eq!(inverse.real2imag.len(), 1);
    }
}
