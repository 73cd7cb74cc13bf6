//! Matrix stuffing: converts canonicalized expressions to solver format.
//!
//! This module builds the matrices (q, A, b) and cone specifications
//! required by Clarabel from the canonicalized problem. Only linear
//! objectives over the zero and nonnegative cones are produced.

use std::collections::HashMap;

use nalgebra_sparse::CscMatrix;
use tracing::debug;

use crate::canon::{ConeConstraint, LinExpr};
use crate::error::{CvxError, Result};
use crate::expr::{ExprId, Shape};
use crate::sparse::csc_from_triplets;

/// Cone dimensions for Clarabel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConeDims {
    /// Number of zero cone (equality) rows.
    pub zero: usize,
    /// Number of nonnegative cone rows.
    pub nonneg: usize,
}

impl ConeDims {
    /// Total number of constraint rows.
    pub fn total(&self) -> usize {
        self.zero + self.nonneg
    }
}

/// Mapping from variable IDs to column ranges in the optimization variable.
#[derive(Debug, Clone)]
pub struct VariableMap {
    /// Map from variable ID to (start_col, shape).
    pub id_to_col: HashMap<ExprId, (usize, Shape)>,
    /// Total number of optimization variables.
    pub total_vars: usize,
}

impl VariableMap {
    /// Create from a list of (variable_id, shape) pairs.
    ///
    /// Repeated ids keep their first position.
    pub fn from_vars(vars: &[(ExprId, Shape)]) -> Self {
        let mut id_to_col = HashMap::new();
        let mut offset = 0;

        for (var_id, shape) in vars {
            if id_to_col.contains_key(var_id) {
                continue;
            }
            id_to_col.insert(*var_id, (offset, shape.clone()));
            offset += shape.size();
        }

        VariableMap {
            id_to_col,
            total_vars: offset,
        }
    }

    /// Get the (start column, size) range for a variable.
    pub fn get(&self, var_id: ExprId) -> Option<(usize, usize)> {
        self.id_to_col
            .get(&var_id)
            .map(|(start, shape)| (*start, shape.size()))
    }
}

/// Stuffed problem ready for Clarabel.
#[derive(Debug)]
pub struct StuffedProblem {
    /// Linear cost vector q (n).
    pub q: Vec<f64>,
    /// Constraint matrix A (m x n).
    pub a: CscMatrix<f64>,
    /// Constraint vector b (m).
    pub b: Vec<f64>,
    /// Cone dimensions.
    pub cone_dims: ConeDims,
    /// Variable mapping for solution recovery.
    pub var_map: VariableMap,
    /// Row range (start, size) of each user constraint, for dual recovery.
    pub cons_rows: HashMap<ExprId, (usize, usize)>,
    /// Constant offset in objective.
    pub objective_offset: f64,
}

/// Build the stuffed problem from canonicalized components.
///
/// Every constraint `expr in K` becomes `s = b - A x = expr`, `s in K`, so
/// the solver's dual for those rows is the multiplier of `expr`.
pub fn stuff_problem(
    objective: &LinExpr,
    constraints: &[ConeConstraint],
    variables: &[(ExprId, Shape)],
) -> Result<StuffedProblem> {
    if !objective.shape.is_scalar() {
        return Err(CvxError::ShapeMismatch {
            expected: Shape::scalar().to_string(),
            got: objective.shape.to_string(),
        });
    }
    let var_map = VariableMap::from_vars(variables);
    let q = stuff_objective(objective, &var_map)?;

    // Zero rows first, then nonnegative rows.
    let (zeros, nonnegs): (Vec<&ConeConstraint>, Vec<&ConeConstraint>) = constraints
        .iter()
        .partition(|c| matches!(c, ConeConstraint::Zero { .. }));
    let cone_dims = ConeDims {
        zero: zeros.iter().map(|c| c.size()).sum(),
        nonneg: nonnegs.iter().map(|c| c.size()).sum(),
    };

    let n = var_map.total_vars;
    let m = cone_dims.total();
    let mut rows = RowBuilder {
        a_rows: Vec::new(),
        a_cols: Vec::new(),
        a_vals: Vec::new(),
        b: vec![0.0; m],
    };
    let mut cons_rows = HashMap::new();

    let mut row_offset = 0;
    for c in zeros.into_iter().chain(nonnegs) {
        rows.push(c.expr(), &var_map, row_offset)?;
        if let Some(origin) = c.origin() {
            cons_rows.insert(origin, (row_offset, c.size()));
        }
        row_offset += c.size();
    }

    debug!(
        vars = n,
        zero_rows = cone_dims.zero,
        nonneg_rows = cone_dims.nonneg,
        "stuffed problem"
    );

    Ok(StuffedProblem {
        q,
        a: csc_from_triplets(m, n, rows.a_rows, rows.a_cols, rows.a_vals),
        b: rows.b,
        cone_dims,
        var_map,
        cons_rows,
        objective_offset: objective.flat_constant().first().copied().unwrap_or(0.0),
    })
}

/// Stuff the scalar objective into q.
fn stuff_objective(objective: &LinExpr, var_map: &VariableMap) -> Result<Vec<f64>> {
    let mut q = vec![0.0; var_map.total_vars];
    for (var_id, coeff) in &objective.coeffs {
        let (start, _) = lookup(var_map, *var_id)?;
        for (_row, col, val) in coeff.triplet_iter() {
            q[start + col] += *val;
        }
    }
    Ok(q)
}

/// Accumulates triplets of A and entries of b.
struct RowBuilder {
    a_rows: Vec<usize>,
    a_cols: Vec<usize>,
    a_vals: Vec<f64>,
    b: Vec<f64>,
}

impl RowBuilder {
    /// Stuff one affine expression `coeffs x + constant` as `A = -coeffs`, `b = constant`.
    fn push(&mut self, expr: &LinExpr, var_map: &VariableMap, row_offset: usize) -> Result<()> {
        for (var_id, coeff) in &expr.coeffs {
            let (col_start, _) = lookup(var_map, *var_id)?;
            for (row, col, val) in coeff.triplet_iter() {
                self.a_rows.push(row_offset + row);
                self.a_cols.push(col_start + col);
                self.a_vals.push(-*val);
            }
        }
        for (i, v) in expr.flat_constant().iter().enumerate() {
            self.b[row_offset + i] = *v;
        }
        Ok(())
    }
}

fn lookup(var_map: &VariableMap, var_id: ExprId) -> Result<(usize, usize)> {
    var_map.get(var_id).ok_or_else(|| {
        CvxError::InvalidProblem(format!("variable {:?} missing from stuffing map", var_id))
    })
}
