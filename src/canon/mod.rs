//! Canonicalization transforms expressions into standard form.
//!
//! This module converts real DCP expressions into:
//! - Linear expressions (LinExpr) for affine parts
//! - Cone constraints (ConeConstraint) for nonlinear atoms

pub mod canonicalizer;
pub mod lin_expr;

pub use canonicalizer::{canonicalize, CanonResult, ConeConstraint};
pub use lin_expr::LinExpr;
