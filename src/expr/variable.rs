//! Variable creation with builder pattern.

use super::expression::{Expr, ExprId, VariableData};
use super::shape::Shape;
use crate::dcp::Domain;

/// Builder for creating variables with various attributes.
#[derive(Default)]
pub struct VariableBuilder {
    shape: Shape,
    name: Option<String>,
    nonneg: bool,
    nonpos: bool,
    domain: Domain,
}

impl VariableBuilder {
    /// Create a new variable builder with the given shape.
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
            ..Default::default()
        }
    }

    /// Set the name of the variable.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Constrain the variable to be non-negative (x >= 0).
    ///
    /// Sign attributes only apply to real variables.
    pub fn nonneg(mut self) -> Self {
        self.nonneg = true;
        self.nonpos = false;
        self.domain = Domain::Real;
        self
    }

    /// Constrain the variable to be non-positive (x <= 0).
    pub fn nonpos(mut self) -> Self {
        self.nonpos = true;
        self.nonneg = false;
        self.domain = Domain::Real;
        self
    }

    /// Make the variable purely imaginary.
    pub fn imaginary(mut self) -> Self {
        self.domain = Domain::Imaginary;
        self.nonneg = false;
        self.nonpos = false;
        self
    }

    /// Make the variable complex.
    pub fn complex(mut self) -> Self {
        self.domain = Domain::Complex;
        self.nonneg = false;
        self.nonpos = false;
        self
    }

    /// Build the variable expression.
    pub fn build(self) -> Expr {
        Expr::Variable(VariableData {
            id: ExprId::new(),
            shape: self.shape,
            name: self.name,
            nonneg: self.nonneg,
            nonpos: self.nonpos,
            domain: self.domain,
        })
    }
}

/// Create a real variable with the given shape.
///
/// # Examples
///
/// ```
/// use cvxreduce::expr::variable;
///
/// let x = variable(());     // scalar
/// let y = variable(5);      // vector
/// let z = variable((3, 4)); // matrix
/// ```
pub fn variable(shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).build()
}

/// Create a named real variable with the given shape.
pub fn named_variable(name: impl Into<String>, shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).name(name).build()
}

/// Create a non-negative variable with the given shape.
pub fn nonneg_variable(shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).nonneg().build()
}

/// Create a purely imaginary variable with the given shape.
pub fn imag_variable(shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).imaginary().build()
}

/// Create a complex variable with the given shape.
pub fn complex_variable(shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).complex().build()
}

/// Extension trait for variable-like operations on Expr.
pub trait VariableExt {
    /// Give a name to this expression (if it's a variable).
    fn named(self, name: impl Into<String>) -> Expr;
}

impl VariableExt for Expr {
    fn named(mut self, name: impl Into<String>) -> Expr {
        if let Expr::Variable(ref mut v) = self {
            v.name = Some(name.into());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_builder() {
        let x = VariableBuilder::new(5).name("x").nonneg().build();

        if let Expr::Variable(v) = &x {
            assert_eq!(v.shape, Shape::vector(5));
            assert_eq!(v.name, Some("x".to_string()));
            assert!(v.nonneg);
            assert!(!v.nonpos);
            assert_eq!(v.domain, Domain::Real);
        } else {
            panic!("Expected Variable");
        }
    }

    #[test]
    fn test_domains() {
        assert_eq!(variable(2).domain(), Domain::Real);
        assert_eq!(imag_variable(2).domain(), Domain::Imaginary);
        assert_eq!(complex_variable(2).domain(), Domain::Complex);
    }

    #[test]
    fn test_complex_clears_sign() {
        let z = VariableBuilder::new(()).nonneg().complex().build();
        if let Expr::Variable(v) = &z {
            assert!(!v.nonneg);
            assert_eq!(v.domain, Domain::Complex);
        } else {
            panic!("Expected Variable");
        }
    }

    #[test]
    fn test_named() {
        let x = variable((3, 4)).named("x");
        assert_eq!(x.shape(), Shape::matrix(3, 4));
        if let Expr::Variable(v) = &x {
            assert_eq!(v.name.as_deref(), Some("x"));
        } else {
            panic!("Expected Variable");
        }
    }
}
