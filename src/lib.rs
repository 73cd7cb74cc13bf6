//! # cvxreduce
//!
//! Canonicalization and problem reductions for Disciplined Convex
//! Programming (DCP).
//!
//! cvxreduce turns a problem built from composable atoms into an equivalent
//! one made only of affine expressions and cone memberships, and maps the
//! numeric answer of a conic solver back onto the user's own variables and
//! constraints, complex-valued ones included.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cvxreduce::prelude::*;
//!
//! // A complex variable and the sum of the two largest entries of its real part
//! let z = complex_variable(4);
//! let target = complex_constant_vec(vec![1.0, 4.0, 2.0, 3.0], vec![0.0, 1.0, 0.0, -1.0]);
//!
//! let solution = Problem::minimize(sum_largest(&real(&z), 2.0)?)
//!     .subject_to([z.equals(&target)])
//!     .solve()?;
//!
//! println!("Optimal value: {:?}", solution.value);
//! println!("z = {:?}", solution.primal_value(&z));
//! ```
//!
//! ## DCP Rules
//!
//! - **Minimization** requires a real, **convex** objective
//! - **Maximization** requires a real, **concave** objective
//! - **Equality constraints** require **affine** expressions (complex allowed)
//! - **Inequality constraints** (>=) require a real, **concave** left-hand side
//!
//! ## Supported Atoms
//!
//! ### Affine
//! - Arithmetic: `+`, `-`, `*` (elementwise or by scalar)
//! - Aggregation: `sum`
//! - Structural: `vstack`
//! - Complex: `real`, `imag`, `conj`
//!
//! ### Convex
//! - `sum_largest(x, k)`: sum of the `k` largest entries
//!
//! ## Architecture
//!
//! - **Expression trees** built using the `Expr` enum with `Arc` sharing,
//!   traversed with explicit stacks
//! - **DCP verification** via curvature, sign and domain tracking
//! - **Reductions** (`Complex2Real`) rewrite problems and invert solutions
//! - **Canonicalization** expands atoms into affine + cone constraints
//! - **Clarabel solver** for the resulting LP

pub mod atoms;
pub mod canon;
pub mod constraints;
pub mod dcp;
pub mod error;
pub mod expr;
pub mod problem;
pub mod reductions;
pub mod solver;
pub mod sparse;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use cvxreduce::prelude::*;
/// ```
pub mod prelude {
    // Expression types
    pub use crate::expr::{
        complex_constant, complex_constant_vec, complex_variable, constant, constant_dmatrix,
        constant_vec, imag_variable, named_variable, nonneg_variable, parameter, parameter_in,
        variable, zeros, Array, Expr, ExprId, Shape, Value, VariableBuilder, VariableExt,
    };

    // Atoms
    pub use crate::atoms::{conj, imag, real, sum, sum_largest, vstack, Atom};

    // Constraints
    pub use crate::constraints::{Constraint, ConstraintExt};

    // DCP
    pub use crate::dcp::{Curvature, Domain, Sign};

    // Problem
    pub use crate::problem::{Objective, Problem, ProblemBuilder};

    // Reductions
    pub use crate::reductions::{Complex2Real, InverseData, Reduction, SplitIds};

    // Solver
    pub use crate::solver::{Settings, Solution, SolveStatus};

    // Errors
    pub use crate::error::{CvxError, Result};
}

// Re-export main types at crate root
pub use error::{CvxError, Result};
pub use problem::Problem;
pub use reductions::{Complex2Real, Reduction};
pub use solver::{Solution, SolveStatus};
