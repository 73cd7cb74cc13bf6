//! Clarabel solver integration.
//!
//! This module provides the interface to the Clarabel conic solver.

use std::collections::HashMap;

use clarabel::algebra::CscMatrix as ClarabelCsc;
use clarabel::solver::implementations::default::DefaultSettingsBuilder;
use clarabel::solver::{DefaultSolver, IPSolver, SolverStatus, SupportedConeT};
use nalgebra::DMatrix;
use tracing::debug;

use super::solution::{Solution, SolveStatus, ITERATIONS, SOLVE_TIME};
use super::stuffing::{ConeDims, StuffedProblem, VariableMap};
use crate::error::{CvxError, Result};
use crate::expr::{Array, ExprId, Value};

impl From<SolverStatus> for SolveStatus {
    fn from(status: SolverStatus) -> Self {
        match status {
            SolverStatus::Solved => SolveStatus::Optimal,
            SolverStatus::AlmostSolved => SolveStatus::OptimalInaccurate,
            SolverStatus::PrimalInfeasible => SolveStatus::Infeasible,
            SolverStatus::AlmostPrimalInfeasible => SolveStatus::InfeasibleInaccurate,
            SolverStatus::DualInfeasible => SolveStatus::Unbounded,
            SolverStatus::AlmostDualInfeasible => SolveStatus::UnboundedInaccurate,
            SolverStatus::MaxIterations | SolverStatus::MaxTime => SolveStatus::MaxIterations,
            SolverStatus::NumericalError | SolverStatus::InsufficientProgress => {
                SolveStatus::NumericalError
            }
            SolverStatus::Unsolved | SolverStatus::CallbackTerminated => SolveStatus::Unknown,
        }
    }
}

/// Solver settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Print solver output.
    pub verbose: bool,
    /// Maximum iterations.
    pub max_iter: u32,
    /// Time limit in seconds.
    pub time_limit: f64,
    /// Absolute tolerance.
    pub tol_gap_abs: f64,
    /// Relative tolerance.
    pub tol_gap_rel: f64,
    /// Feasibility tolerance.
    pub tol_feas: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            verbose: false,
            max_iter: 100,
            time_limit: f64::INFINITY,
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
            tol_feas: 1e-8,
        }
    }
}

/// Solve the stuffed problem using Clarabel.
///
/// Primal values are keyed by variable id and dual values by the id of the
/// constraint each row block came from.
pub fn solve(problem: &StuffedProblem, settings: &Settings) -> Result<Solution> {
    let n = problem.var_map.total_vars;
    let p = ClarabelCsc::zeros((n, n));
    let a = to_clarabel_csc(&problem.a);
    let cones = to_clarabel_cones(&problem.cone_dims);

    let clarabel_settings = DefaultSettingsBuilder::default()
        .verbose(settings.verbose)
        .max_iter(settings.max_iter)
        .time_limit(settings.time_limit)
        .tol_gap_abs(settings.tol_gap_abs)
        .tol_gap_rel(settings.tol_gap_rel)
        .tol_feas(settings.tol_feas)
        .build()
        .map_err(|e| CvxError::SolverError(format!("invalid settings: {:?}", e)))?;

    let mut solver = DefaultSolver::new(&p, &problem.q, &a, &problem.b, &cones, clarabel_settings)
        .map_err(|e| CvxError::SolverError(format!("{:?}", e)))?;
    solver.solve();

    let status: SolveStatus = solver.solution.status.into();
    debug!(
        ?status,
        iterations = solver.solution.iterations,
        solve_time = solver.solution.solve_time,
        "clarabel finished"
    );

    let mut solution = Solution::with_status(status);
    solution
        .attributes
        .insert(SOLVE_TIME.to_string(), solver.solution.solve_time);
    solution
        .attributes
        .insert(ITERATIONS.to_string(), solver.solution.iterations as f64);

    if status.is_solution_present() {
        let x = &solver.solution.x;
        solution.value = Some(linear_objective(x, &problem.q) + problem.objective_offset);
        solution.primal = unpack_primal(x, &problem.var_map);
        solution.dual = unpack_dual(&solver.solution.z, &problem.cons_rows);
    }
    Ok(solution)
}

/// Convert nalgebra CSC to Clarabel CSC.
fn to_clarabel_csc(m: &nalgebra_sparse::CscMatrix<f64>) -> ClarabelCsc<f64> {
    ClarabelCsc::new(
        m.nrows(),
        m.ncols(),
        m.col_offsets().to_vec(),
        m.row_indices().to_vec(),
        m.values().to_vec(),
    )
}

/// Convert cone dimensions to Clarabel cones.
fn to_clarabel_cones(dims: &ConeDims) -> Vec<SupportedConeT<f64>> {
    let mut cones = Vec::new();
    if dims.zero > 0 {
        cones.push(SupportedConeT::ZeroConeT(dims.zero));
    }
    if dims.nonneg > 0 {
        cones.push(SupportedConeT::NonnegativeConeT(dims.nonneg));
    }
    cones
}

/// Unpack primal solution into variable values.
fn unpack_primal(x: &[f64], var_map: &VariableMap) -> HashMap<ExprId, Value> {
    var_map
        .id_to_col
        .iter()
        .map(|(&var_id, (start, shape))| {
            let block = &x[*start..*start + shape.size()];
            let m = DMatrix::from_column_slice(shape.rows(), shape.cols(), block);
            (var_id, Value::Real(Array::from_dense(m)))
        })
        .collect()
}

/// Slice the dual vector into per-constraint arrays.
fn unpack_dual(z: &[f64], cons_rows: &HashMap<ExprId, (usize, usize)>) -> HashMap<ExprId, Array> {
    cons_rows
        .iter()
        .map(|(&id, &(start, size))| {
            let block = z[start..start + size].to_vec();
            let arr = if size == 1 {
                Array::Scalar(block[0])
            } else {
                Array::from_vec(block)
            };
            (id, arr)
        })
        .collect()
}

/// Compute objective value q' x.
fn linear_objective(x: &[f64], q: &[f64]) -> f64 {
    q.iter().zip(x).map(|(qi, xi)| qi * xi).sum()
}
