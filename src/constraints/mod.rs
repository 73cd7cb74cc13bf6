//! Constraints and the builder trait for creating them from expressions.

pub mod constraint;

pub use constraint::{Constraint, ConstraintExt};
