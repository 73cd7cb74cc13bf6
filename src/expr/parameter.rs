//! Parameter creation.
//!
//! Parameters stand for values bound after the problem is built. Reductions
//! treat any subtree that depends on one as not yet reducible.

use super::expression::{Expr, ExprId, ParameterData};
use super::shape::Shape;
use crate::dcp::Domain;

/// Create a real parameter with the given shape.
pub fn parameter(shape: impl Into<Shape>) -> Expr {
    parameter_in(shape, Domain::Real)
}

/// Create a parameter with the given shape and domain.
pub fn parameter_in(shape: impl Into<Shape>, domain: Domain) -> Expr {
    Expr::Parameter(ParameterData {
        id: ExprId::new(),
        shape: shape.into(),
        name: None,
        domain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter() {
        let p = parameter(3);
        assert_eq!(p.shape(), Shape::vector(3));
        assert_eq!(p.parameters().len(), 1);
        assert!(p.variables().is_empty());
    }

    #[test]
    fn test_complex_parameter() {
        let p = parameter_in((), Domain::Complex);
        assert_eq!(p.domain(), Domain::Complex);
    }
}
