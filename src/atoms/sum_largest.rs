//! The `sum_largest(x, k)` atom: sum of the k largest entries of x.
//!
//! Convex and nondecreasing. Its epigraph is
//!
//! ```text
//! sum_largest(x, k) = min  sum(t) + k q
//!                     s.t. x <= t + q 1,  t >= 0
//! ```
//!
//! with fresh `t` shaped like `x` and scalar `q`.

use std::sync::Arc;

use nalgebra_sparse::CscMatrix;

use super::atom::{Atom, GraphImpl};
use crate::canon::{ConeConstraint, LinExpr};
use crate::error::{CvxError, Result};
use crate::expr::{Array, Expr, ExprId, Shape};
use crate::sparse::csc_from_triplets;

/// Sum of the `k` largest entries of an expression.
#[derive(Debug, Clone)]
pub struct SumLargest {
    x: Arc<Expr>,
    k: f64,
}

impl SumLargest {
    /// Build and validate the atom.
    pub fn new(x: Arc<Expr>, k: f64) -> Result<Self> {
        let atom = SumLargest { x, k };
        atom.validate()?;
        Ok(atom)
    }

    pub(crate) fn arg_mut(&mut self) -> &mut Arc<Expr> {
        &mut self.x
    }

    /// Number of entries summed.
    pub fn k(&self) -> usize {
        // validated as a positive integer
        self.k as usize
    }

    /// Same atom over a different argument.
    pub fn with_arg(&self, x: Arc<Expr>) -> SumLargest {
        SumLargest { x, k: self.k }
    }
}

impl Atom for SumLargest {
    fn name(&self) -> &'static str {
        "sum_largest"
    }

    fn args(&self) -> Vec<&Arc<Expr>> {
        vec![&self.x]
    }

    fn validate(&self) -> Result<()> {
        if !self.k.is_finite() || self.k.fract() != 0.0 || self.k <= 0.0 {
            return Err(CvxError::Domain(format!(
                "sum_largest: k must be a positive integer, got {}",
                self.k
            )));
        }
        Ok(())
    }

    fn shape_from_args(&self) -> Shape {
        Shape::scalar()
    }

    fn sign_from_args(&self) -> (bool, bool) {
        (self.x.is_nonneg(), self.x.is_nonpos())
    }

    fn is_atom_convex(&self) -> bool {
        true
    }

    fn is_atom_concave(&self) -> bool {
        false
    }

    fn is_incr(&self, _idx: usize) -> bool {
        true
    }

    fn is_decr(&self, _idx: usize) -> bool {
        false
    }

    fn numeric(&self, values: &[Array]) -> Array {
        let flat = values.first().map(Array::to_vec).unwrap_or_default();
        Array::Scalar(sum_largest_value(&flat, self.k()))
    }

    fn grad(&self, values: &[Array]) -> Vec<Option<CscMatrix<f64>>> {
        let flat = values.first().map(Array::to_vec).unwrap_or_default();
        let n = flat.len();
        let rows = top_k_indices(&flat, self.k());
        let count = rows.len();
        let d = csc_from_triplets(n, 1, rows, vec![0; count], vec![1.0; count]);
        vec![Some(d)]
    }

    fn graph_implementation(&self, arg_objs: &[LinExpr], _shape: &Shape) -> Result<GraphImpl> {
        let [x] = arg_objs else {
            return Err(CvxError::Invariant(format!(
                "sum_largest expects 1 argument, got {}",
                arg_objs.len()
            )));
        };

        let t_id = ExprId::new();
        let q_id = ExprId::new();
        let t = LinExpr::variable(t_id, x.shape.clone());
        let q = LinExpr::variable(q_id, Shape::scalar());

        // k past the argument size sums every entry, so q weighs at most n.
        let weight = self.k().min(x.shape.size());
        let objective = t.sum().add(&q.scale(weight as f64));

        // x <= t + q, t >= 0
        let slack = t.add(&q.broadcast_to(&x.shape)).add(&x.neg());
        let constraints = vec![ConeConstraint::nonneg(slack), ConeConstraint::nonneg(t)];

        Ok(GraphImpl {
            objective,
            constraints,
            aux_vars: vec![(t_id, x.shape.clone()), (q_id, Shape::scalar())],
        })
    }
}

/// Create `sum_largest(x, k)`.
///
/// Fails with [`CvxError::Domain`] unless `k` is a positive integer.
pub fn sum_largest(x: &Expr, k: f64) -> Result<Expr> {
    Ok(Expr::SumLargest(SumLargest::new(Arc::new(x.clone()), k)?))
}

/// Flat indices of the `k` largest entries, largest first.
///
/// Equal values keep their original order, so lower indices win ties.
pub fn top_k_indices(x: &[f64], k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..x.len()).collect();
    idx.sort_by(|&a, &b| x[b].total_cmp(&x[a]));
    idx.truncate(k);
    idx
}

/// Sum of the `k` largest entries of `x`.
///
/// Returns 0 for `k == 0` and the sum of all entries for `k >= x.len()`.
pub fn sum_largest_value(x: &[f64], k: usize) -> f64 {
    top_k_indices(x, k).into_iter().map(|i| x[i]).sum()
}
