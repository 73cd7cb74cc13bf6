//! Atom functions for building expressions.
//!
//! Atoms are the building blocks of optimization problems. They include:
//!
//! - **Affine atoms**: Operations that preserve linearity (add, mul, sum, vstack, real/imag/conj)
//! - **Nonlinear atoms**: Types implementing [`Atom`], with declared curvature
//!   and an epigraph rewrite (`sum_largest`)

pub mod affine;
pub mod atom;
pub mod sum_largest;

pub use affine::{conj, imag, real, sum, vstack};
pub use atom::{Atom, GraphImpl};
pub use sum_largest::{sum_largest, sum_largest_value, top_k_indices, SumLargest};
