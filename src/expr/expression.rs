//! Core expression types for cvxreduce.
//!
//! The `Expr` enum represents all possible expressions in the DCP framework.
//! Expressions form an immutable DAG (directed acyclic graph) using `Arc` for sharing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use nalgebra::DMatrix;
use nalgebra_sparse::CscMatrix;

use super::shape::Shape;
use super::traverse::fold_up;
use crate::atoms::SumLargest;
use crate::dcp::Domain;
use crate::error::{CvxError, Result};
use crate::sparse::csc_to_dense;

/// Unique identifier for expressions and constraints.
///
/// Ids are handed out from a process-wide counter at construction time, so two
/// structurally identical leaves never share an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u64);

impl ExprId {
    /// Generate a new unique ID.
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        ExprId(NEXT_ID.fetch_add(1, Ordering::SeqCst))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ExprId {
    fn default() -> Self {
        Self::new()
    }
}

/// Real array storage (dense or sparse).
#[derive(Debug, Clone)]
pub enum Array {
    /// Dense matrix storage.
    Dense(DMatrix<f64>),
    /// Sparse CSC matrix storage.
    Sparse(CscMatrix<f64>),
    /// Scalar value.
    Scalar(f64),
}

impl Array {
    /// Get the shape of the array.
    pub fn shape(&self) -> Shape {
        match self {
            Array::Dense(m) => Shape::of_block(m.nrows(), m.ncols()),
            Array::Sparse(m) => Shape::of_block(m.nrows(), m.ncols()),
            Array::Scalar(_) => Shape::scalar(),
        }
    }

    /// Get the total number of elements.
    pub fn size(&self) -> usize {
        match self {
            Array::Dense(m) => m.nrows() * m.ncols(),
            Array::Sparse(m) => m.nrows() * m.ncols(),
            Array::Scalar(_) => 1,
        }
    }

    /// Try to get as a scalar value.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Array::Scalar(v) => Some(*v),
            Array::Dense(m) if m.nrows() == 1 && m.ncols() == 1 => Some(m[(0, 0)]),
            _ => None,
        }
    }

    /// Check if all elements are non-negative.
    pub fn is_nonneg(&self) -> bool {
        match self {
            Array::Scalar(v) => *v >= 0.0,
            Array::Dense(m) => m.iter().all(|&v| v >= 0.0),
            Array::Sparse(m) => m.values().iter().all(|&v| v >= 0.0),
        }
    }

    /// Check if all elements are non-positive.
    pub fn is_nonpos(&self) -> bool {
        match self {
            Array::Scalar(v) => *v <= 0.0,
            Array::Dense(m) => m.iter().all(|&v| v <= 0.0),
            // Implicit zeros are non-positive
            Array::Sparse(m) => m.values().iter().all(|&v| v <= 0.0),
        }
    }

    /// Check if every element is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.is_nonneg() && self.is_nonpos()
    }

    /// Convert to a dense matrix (scalars become 1x1).
    pub fn to_dense(&self) -> DMatrix<f64> {
        match self {
            Array::Dense(m) => m.clone(),
            Array::Sparse(s) => csc_to_dense(s),
            Array::Scalar(v) => DMatrix::from_element(1, 1, *v),
        }
    }

    /// Flatten to a vector in column-major order.
    pub fn to_vec(&self) -> Vec<f64> {
        self.to_dense().iter().copied().collect()
    }

    /// Create from a vector.
    pub fn from_vec(v: Vec<f64>) -> Self {
        let n = v.len();
        Array::Dense(DMatrix::from_vec(n, 1, v))
    }

    /// Create from a dense block, collapsing 1x1 blocks to scalars.
    pub fn from_dense(m: DMatrix<f64>) -> Self {
        if m.nrows() == 1 && m.ncols() == 1 {
            Array::Scalar(m[(0, 0)])
        } else {
            Array::Dense(m)
        }
    }
}

impl From<f64> for Array {
    fn from(v: f64) -> Self {
        Array::Scalar(v)
    }
}

impl From<Vec<f64>> for Array {
    fn from(v: Vec<f64>) -> Self {
        Array::from_vec(v)
    }
}

impl From<DMatrix<f64>> for Array {
    fn from(m: DMatrix<f64>) -> Self {
        Array::Dense(m)
    }
}

/// A numeric value in the user's space.
///
/// Complex numbers are kept as explicit pairs of real arrays so the numeric
/// backend never has to know about them.
#[derive(Debug, Clone)]
pub enum Value {
    /// Purely real value.
    Real(Array),
    /// Purely imaginary value; the array holds the imaginary coefficients.
    Imaginary(Array),
    /// General complex value.
    Complex { re: Array, im: Array },
}

impl Value {
    /// Build a value from a real part and an optional imaginary part.
    pub fn from_parts(re: Array, im: Option<Array>) -> Self {
        match im {
            None => Value::Real(re),
            Some(im) if im.is_zero() => Value::Real(re),
            Some(im) if re.is_zero() => Value::Imaginary(im),
            Some(im) => Value::Complex { re, im },
        }
    }

    /// Real part, or `None` for a purely imaginary value.
    pub fn real_part(&self) -> Option<&Array> {
        match self {
            Value::Real(re) | Value::Complex { re, .. } => Some(re),
            Value::Imaginary(_) => None,
        }
    }

    /// Imaginary part, or `None` for a purely real value.
    pub fn imag_part(&self) -> Option<&Array> {
        match self {
            Value::Imaginary(im) | Value::Complex { im, .. } => Some(im),
            Value::Real(_) => None,
        }
    }

    /// Domain of this value.
    pub fn domain(&self) -> Domain {
        match self {
            Value::Real(_) => Domain::Real,
            Value::Imaginary(_) => Domain::Imaginary,
            Value::Complex { .. } => Domain::Complex,
        }
    }

    /// Shape of this value.
    pub fn shape(&self) -> Shape {
        match self {
            Value::Real(a) | Value::Imaginary(a) | Value::Complex { re: a, .. } => a.shape(),
        }
    }
}

/// Data for a variable expression.
#[derive(Debug, Clone)]
pub struct VariableData {
    /// Unique identifier.
    pub id: ExprId,
    /// Shape of the variable.
    pub shape: Shape,
    /// Optional name for display.
    pub name: Option<String>,
    /// Variable is constrained to be non-negative.
    pub nonneg: bool,
    /// Variable is constrained to be non-positive.
    pub nonpos: bool,
    /// Whether the variable is real, imaginary or complex.
    pub domain: Domain,
}

/// Data for a constant expression.
#[derive(Debug, Clone)]
pub struct ConstantData {
    /// Unique identifier.
    pub id: ExprId,
    /// Real part of the constant.
    pub value: Array,
    /// Imaginary part, absent for real constants.
    pub imag: Option<Array>,
}

impl ConstantData {
    /// Get the shape of the constant.
    pub fn shape(&self) -> Shape {
        self.value.shape()
    }

    /// Domain of the constant, judged from its stored parts.
    pub fn domain(&self) -> Domain {
        match &self.imag {
            None => Domain::Real,
            Some(im) if im.is_zero() => Domain::Real,
            Some(_) if self.value.is_zero() => Domain::Imaginary,
            Some(_) => Domain::Complex,
        }
    }
}

/// Data for a parameter expression.
///
/// Parameters have a fixed shape and domain; their value is bound by a
/// later compilation stage.
#[derive(Debug, Clone)]
pub struct ParameterData {
    /// Unique identifier.
    pub id: ExprId,
    /// Shape of the parameter.
    pub shape: Shape,
    /// Optional name for display.
    pub name: Option<String>,
    /// Whether the parameter is real, imaginary or complex.
    pub domain: Domain,
}

/// The core expression type - an algebraic data type.
///
/// All expressions are immutable and use `Arc` for efficient sharing.
/// This allows building expression DAGs without copying.
#[derive(Debug, Clone)]
pub enum Expr {
    // ========== Leaf nodes ==========
    /// A decision variable.
    Variable(VariableData),
    /// A constant value.
    Constant(ConstantData),
    /// A parameter whose value is bound later.
    Parameter(ParameterData),

    // ========== Affine atoms ==========
    /// Addition: a + b
    Add(Arc<Expr>, Arc<Expr>),
    /// Negation: -a
    Neg(Arc<Expr>),
    /// Elementwise (or scalar) multiplication: a * b
    Mul(Arc<Expr>, Arc<Expr>),
    /// Sum of all entries.
    Sum(Arc<Expr>),
    /// Vertical stack: [a; b; ...]
    VStack(Vec<Arc<Expr>>),
    /// Real part of a (possibly complex) expression.
    Real(Arc<Expr>),
    /// Imaginary part of a (possibly complex) expression, as a real expression.
    Imag(Arc<Expr>),
    /// Complex conjugate.
    Conj(Arc<Expr>),

    // ========== Nonlinear atoms ==========
    /// Sum of the k largest entries.
    SumLargest(SumLargest),
}

impl Expr {
    /// Get the shape of the expression.
    pub fn shape(&self) -> Shape {
        fold_up(self, |node, args: Vec<Shape>| node.shape_over(&args))
    }

    /// Shape of this node given the shapes of its arguments.
    pub(crate) fn shape_over(&self, args: &[Shape]) -> Shape {
        match (self, args) {
            (Expr::Variable(v), _) => v.shape.clone(),
            (Expr::Constant(c), _) => c.shape(),
            (Expr::Parameter(p), _) => p.shape.clone(),

            (Expr::Add(_, _) | Expr::Mul(_, _), [a, b]) => {
                a.broadcast(b).unwrap_or_else(Shape::scalar)
            }
            (Expr::Neg(_) | Expr::Real(_) | Expr::Imag(_) | Expr::Conj(_), [a]) => a.clone(),
            (Expr::VStack(_), shapes) => Shape::vstack(shapes).unwrap_or_else(Shape::scalar),
            (Expr::SumLargest(atom), _) => crate::atoms::Atom::shape_from_args(atom),
            _ => Shape::scalar(),
        }
    }

    /// Direct sub-expressions, in argument order.
    pub fn args(&self) -> Vec<&Arc<Expr>> {
        match self {
            Expr::Variable(_) | Expr::Constant(_) | Expr::Parameter(_) => Vec::new(),
            Expr::Add(a, b) | Expr::Mul(a, b) => vec![a, b],
            Expr::Neg(a) | Expr::Sum(a) | Expr::Real(a) | Expr::Imag(a) | Expr::Conj(a) => {
                vec![a]
            }
            Expr::VStack(exprs) => exprs.iter().collect(),
            Expr::SumLargest(atom) => crate::atoms::Atom::args(atom),
        }
    }

    /// Rebuild this node over new arguments, keeping its static data.
    ///
    /// Leaves are returned unchanged and must be given no arguments.
    pub fn copy_with_args(&self, args: Vec<Arc<Expr>>) -> Result<Expr> {
        let expected = self.args().len();
        if args.len() != expected {
            return Err(CvxError::Invariant(format!(
                "node expects {} arguments, got {}",
                expected,
                args.len()
            )));
        }
        let mut it = args.into_iter();
        let mut next = || it.next().ok_or_else(|| CvxError::Invariant("missing argument".into()));
        Ok(match self {
            Expr::Variable(_) | Expr::Constant(_) | Expr::Parameter(_) => self.clone(),
            Expr::Add(_, _) => Expr::Add(next()?, next()?),
            Expr::Mul(_, _) => Expr::Mul(next()?, next()?),
            Expr::Neg(_) => Expr::Neg(next()?),
            Expr::Sum(_) => Expr::Sum(next()?),
            Expr::Real(_) => Expr::Real(next()?),
            Expr::Imag(_) => Expr::Imag(next()?),
            Expr::Conj(_) => Expr::Conj(next()?),
            Expr::VStack(_) => {
                let mut exprs = Vec::with_capacity(expected);
                for _ in 0..expected {
                    exprs.push(next()?);
                }
                Expr::VStack(exprs)
            }
            Expr::SumLargest(atom) => Expr::SumLargest(atom.with_arg(next()?)),
        })
    }

    /// Get the unique ID if this is a variable.
    pub fn variable_id(&self) -> Option<ExprId> {
        match self {
            Expr::Variable(v) => Some(v.id),
            _ => None,
        }
    }

    /// Check if this expression is a constant.
    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Constant(_))
    }

    /// Check if this expression is a variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, Expr::Variable(_))
    }

    /// Get the real part of the constant value if this is a constant expression.
    pub fn constant_value(&self) -> Option<&Array> {
        match self {
            Expr::Constant(c) => Some(&c.value),
            _ => None,
        }
    }

    /// Collect all variable ids in this expression.
    pub fn variables(&self) -> Vec<ExprId> {
        let mut vars: Vec<ExprId> = self
            .leaves()
            .into_iter()
            .filter_map(|e| e.variable_id())
            .collect();
        vars.sort();
        vars.dedup();
        vars
    }

    /// Collect all parameter ids in this expression.
    pub fn parameters(&self) -> Vec<ExprId> {
        let mut params: Vec<ExprId> = self
            .leaves()
            .into_iter()
            .filter_map(|e| match e {
                Expr::Parameter(p) => Some(p.id),
                _ => None,
            })
            .collect();
        params.sort();
        params.dedup();
        params
    }

}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        crate::expr::constant(value)
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}
