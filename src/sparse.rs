//! Sparse matrix utilities.
//!
//! Helper functions for working with nalgebra-sparse matrices.

use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Create a CSC matrix from triplets (row, col, value).
///
/// Duplicates are summed together; out-of-range entries are dropped.
pub fn csc_from_triplets(
    nrows: usize,
    ncols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    vals: Vec<f64>,
) -> CscMatrix<f64> {
    if rows.is_empty() {
        return CscMatrix::zeros(nrows, ncols);
    }

    let mut coo = CooMatrix::new(nrows, ncols);
    for ((row, col), val) in rows.into_iter().zip(cols).zip(vals) {
        if row < nrows && col < ncols {
            coo.push(row, col, val);
        }
    }
    CscMatrix::from(&coo)
}

/// Rebuild a CSC matrix from a list of triplets.
fn from_triplet_list(
    nrows: usize,
    ncols: usize,
    triplets: impl IntoIterator<Item = (usize, usize, f64)>,
) -> CscMatrix<f64> {
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut vals = Vec::new();
    for (r, c, v) in triplets {
        rows.push(r);
        cols.push(c);
        vals.push(v);
    }
    csc_from_triplets(nrows, ncols, rows, cols, vals)
}

/// Convert CSC to dense matrix.
pub fn csc_to_dense(sparse: &CscMatrix<f64>) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(sparse.nrows(), sparse.ncols());
    for (row, col, val) in sparse.triplet_iter() {
        dense[(row, col)] += *val;
    }
    dense
}

/// Add two CSC matrices of the same shape.
pub fn csc_add(a: &CscMatrix<f64>, b: &CscMatrix<f64>) -> CscMatrix<f64> {
    let triplets = a
        .triplet_iter()
        .chain(b.triplet_iter())
        .map(|(r, c, v)| (r, c, *v));
    from_triplet_list(a.nrows().max(b.nrows()), a.ncols().max(b.ncols()), triplets)
}

/// Scale a CSC matrix.
pub fn csc_scale(a: &CscMatrix<f64>, scalar: f64) -> CscMatrix<f64> {
    let mut out = a.clone();
    out.values_mut().iter_mut().for_each(|v| *v *= scalar);
    out
}

/// Scale row `i` of a CSC matrix by `weights[i]`.
pub fn csc_scale_rows(a: &CscMatrix<f64>, weights: &[f64]) -> CscMatrix<f64> {
    let triplets = a
        .triplet_iter()
        .map(|(r, c, v)| (r, c, v * weights.get(r).copied().unwrap_or(0.0)));
    from_triplet_list(a.nrows(), a.ncols(), triplets)
}

/// Sum the rows of a CSC matrix into a single `1 x ncols` row.
pub fn csc_sum_rows(a: &CscMatrix<f64>) -> CscMatrix<f64> {
    let triplets = a.triplet_iter().map(|(_, c, v)| (0, c, *v));
    from_triplet_list(1, a.ncols(), triplets)
}

/// Repeat rows of a CSC matrix.
pub fn csc_repeat_rows(m: &CscMatrix<f64>, times: usize) -> CscMatrix<f64> {
    let triplets = m.triplet_iter().flat_map(|(r, c, v)| {
        (0..times).map(move |t| (t * m.nrows() + r, c, *v))
    });
    from_triplet_list(m.nrows() * times, m.ncols(), triplets)
}
