//! The contract every nonlinear atom implements.
//!
//! An atom declares its metadata (shape, sign, curvature, monotonicity) as
//! pure functions of its arguments' metadata, evaluates itself numerically,
//! exposes a subgradient, and supplies an epigraph rewrite into affine
//! expressions plus cone constraints.

use std::sync::Arc;

use nalgebra_sparse::CscMatrix;

use crate::canon::{ConeConstraint, LinExpr};
use crate::dcp::Monotonicity;
use crate::error::Result;
use crate::expr::{Array, Expr, ExprId, Shape};

/// Output of an atom's graph implementation.
///
/// Minimizing `objective` subject to `constraints` over the original and
/// auxiliary variables equals the atom's value at the optimum.
#[derive(Debug, Clone)]
pub struct GraphImpl {
    /// Affine stand-in for the atom.
    pub objective: LinExpr,
    /// Cone constraints coupling the stand-in to the arguments.
    pub constraints: Vec<ConeConstraint>,
    /// Fresh auxiliary variables introduced by the rewrite.
    pub aux_vars: Vec<(ExprId, Shape)>,
}

/// A function with declared DCP metadata and an epigraph rewrite.
pub trait Atom {
    /// Display name.
    fn name(&self) -> &'static str;

    /// Arguments, in order.
    fn args(&self) -> Vec<&Arc<Expr>>;

    /// Check the atom's static data. Fails with [`crate::CvxError::Domain`].
    fn validate(&self) -> Result<()>;

    /// Output shape.
    fn shape_from_args(&self) -> Shape;

    /// `(is_nonneg, is_nonpos)` of the output.
    fn sign_from_args(&self) -> (bool, bool);

    /// Convex as a function of its arguments.
    fn is_atom_convex(&self) -> bool;

    /// Concave as a function of its arguments.
    fn is_atom_concave(&self) -> bool;

    /// Nondecreasing in argument `idx`.
    fn is_incr(&self, idx: usize) -> bool;

    /// Nonincreasing in argument `idx`.
    fn is_decr(&self, idx: usize) -> bool;

    /// Monotonicity in argument `idx`.
    fn monotonicity(&self, idx: usize) -> Monotonicity {
        Monotonicity::from_flags(self.is_incr(idx), self.is_decr(idx))
    }

    /// Evaluate on concrete argument values.
    fn numeric(&self, values: &[Array]) -> Array;

    /// Subgradient with respect to each argument.
    ///
    /// Entry `i` is `None` when argument `i` contributes nothing, otherwise a
    /// sparse `(arg_size x output_size)` matrix.
    fn grad(&self, values: &[Array]) -> Vec<Option<CscMatrix<f64>>>;

    /// Epigraph rewrite over already-canonicalized arguments.
    fn graph_implementation(&self, arg_objs: &[LinExpr], shape: &Shape) -> Result<GraphImpl>;
}
