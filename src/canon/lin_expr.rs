//! Linear expression representation for canonicalization.
//!
//! After canonicalization, expressions are represented in standard form
//! `sum_i(A_i * x_i) + b`, with every operand flattened in column-major order.

use std::collections::HashMap;

use nalgebra::DMatrix;
use nalgebra_sparse::CscMatrix;

use crate::expr::{Array, ExprId, Shape};
use crate::sparse::{
    csc_add, csc_from_triplets, csc_repeat_rows, csc_scale, csc_scale_rows, csc_sum_rows,
};

/// A linear expression in standard form: sum_i(A_i * x_i) + b
///
/// Each term is a sparse coefficient matrix multiplied by a variable.
/// The constant term `b` is a dense matrix of the expression's shape.
#[derive(Debug, Clone)]
pub struct LinExpr {
    /// Coefficient matrices for each variable: var_id -> coefficient matrix.
    /// The coefficient matrix A_i has shape (output_size, var_size).
    pub coeffs: HashMap<ExprId, CscMatrix<f64>>,
    /// Constant term (offset).
    pub constant: DMatrix<f64>,
    /// Output shape of this expression.
    pub shape: Shape,
}

impl LinExpr {
    /// Create a zero linear expression with the given shape.
    pub fn zeros(shape: Shape) -> Self {
        LinExpr {
            coeffs: HashMap::new(),
            constant: DMatrix::zeros(shape.rows(), shape.cols()),
            shape,
        }
    }

    /// Create a linear expression for a single variable (identity coefficient).
    pub fn variable(var_id: ExprId, shape: Shape) -> Self {
        let mut coeffs = HashMap::new();
        coeffs.insert(var_id, CscMatrix::identity(shape.size()));
        LinExpr {
            coeffs,
            constant: DMatrix::zeros(shape.rows(), shape.cols()),
            shape,
        }
    }

    /// Create a constant linear expression.
    pub fn constant(value: DMatrix<f64>) -> Self {
        let shape = Shape::of_block(value.nrows(), value.ncols());
        LinExpr {
            coeffs: HashMap::new(),
            constant: value,
            shape,
        }
    }

    /// Create a constant linear expression from an array.
    pub fn from_array(value: &Array) -> Self {
        LinExpr::constant(value.to_dense())
    }

    /// Create a scalar constant.
    pub fn scalar(value: f64) -> Self {
        LinExpr::constant(DMatrix::from_element(1, 1, value))
    }

    /// Check if this is a constant (no variables).
    pub fn is_constant(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Get the output size (flattened).
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    /// The constant term flattened in column-major order.
    pub fn flat_constant(&self) -> &[f64] {
        self.constant.as_slice()
    }

    /// Get all variable IDs in this expression, sorted.
    pub fn variables(&self) -> Vec<ExprId> {
        let mut vars: Vec<_> = self.coeffs.keys().copied().collect();
        vars.sort();
        vars
    }

    /// Promote a scalar expression to `shape` by repetition.
    ///
    /// Expressions that already have `shape`'s size are only reshaped.
    pub fn broadcast_to(&self, shape: &Shape) -> LinExpr {
        let n = shape.size();
        if self.size() == n {
            return self.reshaped(shape.clone());
        }
        let coeffs = self
            .coeffs
            .iter()
            .map(|(id, c)| (*id, csc_repeat_rows(c, n)))
            .collect();
        let value = self.flat_constant().first().copied().unwrap_or(0.0);
        LinExpr {
            coeffs,
            constant: DMatrix::from_element(shape.rows(), shape.cols(), value),
            shape: shape.clone(),
        }
    }

    /// Same entries under a new shape of equal size.
    fn reshaped(&self, shape: Shape) -> LinExpr {
        LinExpr {
            coeffs: self.coeffs.clone(),
            constant: DMatrix::from_column_slice(shape.rows(), shape.cols(), self.flat_constant()),
            shape,
        }
    }

    /// Add two linear expressions, promoting a scalar side.
    pub fn add(&self, other: &LinExpr) -> LinExpr {
        if self.size() == 1 && other.size() > 1 {
            return self.broadcast_to(&other.shape).add(other);
        }
        if other.size() == 1 && self.size() > 1 {
            return self.add(&other.broadcast_to(&self.shape));
        }

        let mut coeffs = self.coeffs.clone();
        for (var_id, coeff) in &other.coeffs {
            coeffs
                .entry(*var_id)
                .and_modify(|c| *c = csc_add(c, coeff))
                .or_insert_with(|| coeff.clone());
        }
        let rhs = other.reshaped(self.shape.clone());

        LinExpr {
            coeffs,
            constant: &self.constant + &rhs.constant,
            shape: self.shape.clone(),
        }
    }

    /// Negate a linear expression.
    pub fn neg(&self) -> LinExpr {
        self.scale(-1.0)
    }

    /// Scale by a scalar.
    pub fn scale(&self, scalar: f64) -> LinExpr {
        let coeffs = self
            .coeffs
            .iter()
            .map(|(k, v)| (*k, csc_scale(v, scalar)))
            .collect();
        LinExpr {
            coeffs,
            constant: &self.constant * scalar,
            shape: self.shape.clone(),
        }
    }

    /// Multiply elementwise by constant weights, promoting a scalar side.
    pub fn mul_elementwise(&self, weights: &DMatrix<f64>) -> LinExpr {
        let w_shape = Shape::of_block(weights.nrows(), weights.ncols());
        if w_shape.is_scalar() {
            return self.scale(weights[(0, 0)]);
        }
        if self.size() == 1 {
            return self.broadcast_to(&w_shape).mul_elementwise(weights);
        }

        let w = weights.as_slice();
        let coeffs = self
            .coeffs
            .iter()
            .map(|(k, v)| (*k, csc_scale_rows(v, w)))
            .collect();
        let values: Vec<f64> = self
            .flat_constant()
            .iter()
            .zip(w)
            .map(|(c, w)| c * w)
            .collect();
        LinExpr {
            coeffs,
            constant: DMatrix::from_vec(self.shape.rows(), self.shape.cols(), values),
            shape: self.shape.clone(),
        }
    }

    /// Sum all entries into a scalar.
    pub fn sum(&self) -> LinExpr {
        let coeffs = self
            .coeffs
            .iter()
            .map(|(k, v)| (*k, csc_sum_rows(v)))
            .collect();
        LinExpr {
            coeffs,
            constant: DMatrix::from_element(1, 1, self.constant.sum()),
            shape: Shape::scalar(),
        }
    }

    /// Stack expressions vertically.
    ///
    /// Every block must have the same number of columns. Entries are
    /// interleaved so the result is again column-major.
    pub fn vstack(blocks: &[LinExpr], shape: Shape) -> LinExpr {
        let total_rows = shape.rows();
        let total = shape.size();

        let mut constant = DMatrix::zeros(shape.rows(), shape.cols());
        let mut parts: HashMap<ExprId, Vec<(usize, usize, f64)>> = HashMap::new();
        let mut var_sizes: HashMap<ExprId, usize> = HashMap::new();

        let mut offset = 0;
        for block in blocks {
            let rows = block.shape.rows();
            let dest = |flat: usize| (flat / rows) * total_rows + offset + flat % rows;

            for (flat, v) in block.flat_constant().iter().enumerate() {
                let to = dest(flat);
                constant[(to % total_rows, to / total_rows)] = *v;
            }
            for (id, coeff) in &block.coeffs {
                var_sizes.insert(*id, coeff.ncols());
                parts
                    .entry(*id)
                    .or_default()
                    .extend(coeff.triplet_iter().map(|(r, c, v)| (dest(r), c, *v)));
            }
            offset += rows;
        }

        let coeffs = parts
            .into_iter()
            .map(|(id, triplets)| {
                let mut rows = Vec::with_capacity(triplets.len());
                let mut cols = Vec::with_capacity(triplets.len());
                let mut vals = Vec::with_capacity(triplets.len());
                for (r, c, v) in triplets {
                    rows.push(r);
                    cols.push(c);
                    vals.push(v);
                }
                let ncols = var_sizes.get(&id).copied().unwrap_or(0);
                (id, csc_from_triplets(total, ncols, rows, cols, vals))
            })
            .collect();

        LinExpr {
            coeffs,
            constant,
            shape,
        }
    }
}
