//! Affine atoms and operator overloading.
//!
//! Affine atoms are both convex and concave. They include:
//! - Addition, subtraction, negation
//! - Elementwise and scalar multiplication
//! - Sum and vertical stacking
//! - Real part, imaginary part and complex conjugate

use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

use crate::expr::{constant, Expr};

// ============================================================================
// Operator overloading for Expr
// ============================================================================

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Arc::new(self))
    }
}

impl Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Arc::new(self.clone()))
    }
}

/// Implement a binary operator for every owned/borrowed pairing of `Expr`.
macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, |$a:ident, $b:ident| $body:expr) => {
        impl $trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                let ($a, $b) = (Arc::new(self), Arc::new(rhs));
                $body
            }
        }

        impl $trait for &Expr {
            type Output = Expr;

            fn $method(self, rhs: &Expr) -> Expr {
                let ($a, $b) = (Arc::new(self.clone()), Arc::new(rhs.clone()));
                $body
            }
        }

        impl $trait<&Expr> for Expr {
            type Output = Expr;

            fn $method(self, rhs: &Expr) -> Expr {
                let ($a, $b) = (Arc::new(self), Arc::new(rhs.clone()));
                $body
            }
        }

        impl $trait<Expr> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                let ($a, $b) = (Arc::new(self.clone()), Arc::new(rhs));
                $body
            }
        }
    };
}

impl_binary_op!(Add, add, |a, b| Expr::Add(a, b));
impl_binary_op!(Sub, sub, |a, b| Expr::Add(a, Arc::new(Expr::Neg(b))));
impl_binary_op!(Mul, mul, |a, b| Expr::Mul(a, b));

// Scalar multiplication
impl Mul<f64> for Expr {
    type Output = Expr;

    fn mul(self, rhs: f64) -> Expr {
        Expr::Mul(Arc::new(constant(rhs)), Arc::new(self))
    }
}

impl Mul<f64> for &Expr {
    type Output = Expr;

    fn mul(self, rhs: f64) -> Expr {
        Expr::Mul(Arc::new(constant(rhs)), Arc::new(self.clone()))
    }
}

impl Mul<Expr> for f64 {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(Arc::new(constant(self)), Arc::new(rhs))
    }
}

impl Mul<&Expr> for f64 {
    type Output = Expr;

    fn mul(self, rhs: &Expr) -> Expr {
        Expr::Mul(Arc::new(constant(self)), Arc::new(rhs.clone()))
    }
}

// ============================================================================
// Affine atom functions
// ============================================================================

/// Sum of all elements.
pub fn sum(expr: &Expr) -> Expr {
    Expr::Sum(Arc::new(expr.clone()))
}

/// Vertical stack (row-wise concatenation).
pub fn vstack(exprs: Vec<Expr>) -> Expr {
    Expr::VStack(exprs.into_iter().map(Arc::new).collect())
}

/// Real part, as a real expression.
pub fn real(expr: &Expr) -> Expr {
    Expr::Real(Arc::new(expr.clone()))
}

/// Imaginary part, as a real expression.
pub fn imag(expr: &Expr) -> Expr {
    Expr::Imag(Arc::new(expr.clone()))
}

/// Complex conjugate.
pub fn conj(expr: &Expr) -> Expr {
    Expr::Conj(Arc::new(expr.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcp::Domain;
    use crate::expr::{complex_variable, variable, Shape};

    #[test]
    fn test_add_sub_neg() {
        let x = variable(5);
        let y = variable(5);
        assert_eq!((&x + &y).shape(), Shape::vector(5));
        assert_eq!((&x - &y).shape(), Shape::vector(5));
        assert_eq!((-&x).shape(), Shape::vector(5));
        assert!(matches!(&x - &y, Expr::Add(_, ref b) if matches!(**b, Expr::Neg(_))));
    }

    #[test]
    fn test_scalar_mul() {
        let x = variable(5);
        assert_eq!((2.0 * &x).shape(), Shape::vector(5));
        assert_eq!((&x * 2.0).shape(), Shape::vector(5));
        assert!((2.0 * &x).is_affine());
    }

    #[test]
    fn test_sum() {
        let x = variable((3, 4));
        let s = sum(&x);
        assert_eq!(s.shape(), Shape::scalar());
        assert!(s.is_affine());
    }

    #[test]
    fn test_vstack() {
        let x = variable((2, 3));
        let y = variable((3, 3));
        let z = vstack(vec![x, y]);
        assert_eq!(z.shape(), Shape::matrix(5, 3));

        let z = vstack(vec![variable(2), variable(())]);
        assert_eq!(z.shape(), Shape::vector(3));
    }

    #[test]
    fn test_complex_parts() {
        let z = complex_variable(3);
        assert_eq!(real(&z).shape(), Shape::vector(3));
        assert_eq!(imag(&z).domain(), Domain::Real);
        assert_eq!(conj(&z).domain(), Domain::Complex);
    }
}
