//! Solver interface for cvxreduce.
//!
//! This module provides:
//! - Solution records keyed by variable and constraint id
//! - Matrix stuffing to convert canonicalized problems to solver format
//! - Clarabel solver integration

pub mod clarabel;
pub mod solution;
pub mod stuffing;

pub use self::clarabel::{solve, Settings};
pub use solution::{Solution, SolveStatus, ITERATIONS, SOLVE_TIME};
pub use stuffing::{stuff_problem, ConeDims, StuffedProblem, VariableMap};
