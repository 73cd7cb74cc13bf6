//! Problem-to-problem rewrites with solution inversion.
//!
//! A reduction turns a problem into an equivalent one that a later stage
//! can handle, and records enough to translate a solution of the rewritten
//! problem back into the ids of the original.

pub mod complex2real;
pub mod inverse_data;

pub use complex2real::{Complex2Real, Parts, Rewrite};
pub use inverse_data::{InverseData, SplitIds};

use crate::error::Result;
use crate::problem::Problem;
use crate::solver::Solution;

/// A reversible rewrite of a problem.
pub trait Reduction {
    /// Data recorded by `apply` and consumed by `invert`.
    type Inverse;

    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Whether this reduction has anything to do on `problem`.
    fn accepts(&self, problem: &Problem) -> bool;

    /// Rewrite `problem`, returning the new problem and its inverse data.
    fn apply(&self, problem: &Problem) -> Result<(Problem, Self::Inverse)>;

    /// Map a solution of the rewritten problem back to the original one.
    fn invert(&self, solution: &Solution, inverse: &Self::Inverse) -> Solution;
}
