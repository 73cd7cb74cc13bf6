//! DCP (Disciplined Convex Programming) analysis.
//!
//! This module provides the core DCP analysis functionality:
//! - Curvature tracking (convex, concave, affine, constant)
//! - Sign tracking (non-negative, non-positive, unknown)
//! - Domain tracking (real, imaginary, complex)
//! - DCP composition rules

pub mod curvature;
pub mod domain;
pub mod sign;

pub use curvature::{
    add_curvature, atom_curvature, scalar_mul_curvature, Curvature, Monotonicity,
};
pub use domain::{add_domain, mul_domain, Domain};
pub use sign::{add_sign, mul_sign, Sign};
