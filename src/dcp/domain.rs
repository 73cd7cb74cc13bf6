//! Numeric domain tracking (real, imaginary, complex).
//!
//! Like sign and curvature, the domain of an expression is derived purely
//! from the domains of its leaves, never from numeric content.

use crate::expr::{fold_up, Expr};

/// Numeric domain of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Domain {
    /// Real-valued.
    #[default]
    Real,
    /// Purely imaginary (real part identically zero).
    Imaginary,
    /// General complex.
    Complex,
}

impl Domain {
    /// Check if the domain is real.
    pub fn is_real(self) -> bool {
        self == Domain::Real
    }
}

/// Combine domains for addition: a + b.
pub fn add_domain(a: Domain, b: Domain) -> Domain {
    use Domain::*;
    match (a, b) {
        (Real, Real) => Real,
        (Imaginary, Imaginary) => Imaginary,
        _ => Complex,
    }
}

/// Combine domains for multiplication: a * b.
pub fn mul_domain(a: Domain, b: Domain) -> Domain {
    use Domain::*;
    match (a, b) {
        (Real, x) | (x, Real) => x,
        // i * i = -1
        (Imaginary, Imaginary) => Real,
        _ => Complex,
    }
}

impl Expr {
    /// Get the numeric domain of this expression.
    pub fn domain(&self) -> Domain {
        fold_up(self, |node, args: Vec<Domain>| node.domain_over(&args))
    }

    /// Domain of this node given the domains of its arguments.
    pub(crate) fn domain_over(&self, args: &[Domain]) -> Domain {
        match (self, args) {
            (Expr::Variable(v), _) => v.domain,
            (Expr::Constant(c), _) => c.domain(),
            (Expr::Parameter(p), _) => p.domain,

            (Expr::Add(_, _), [a, b]) => add_domain(*a, *b),
            (Expr::Mul(_, _), [a, b]) => mul_domain(*a, *b),
            (Expr::Neg(_) | Expr::Sum(_) | Expr::Conj(_), [a]) => *a,
            (Expr::VStack(_), domains) => match domains.split_first() {
                None => Domain::Real,
                Some((first, rest)) => {
                    if rest.iter().all(|d| d == first) {
                        *first
                    } else {
                        Domain::Complex
                    }
                }
            },
            // Nonlinear atoms are real-valued.
            (Expr::Real(_) | Expr::Imag(_) | Expr::SumLargest(_), _) => Domain::Real,
            _ => Domain::Complex,
        }
    }

    /// Check if this expression is real-valued.
    pub fn is_real(&self) -> bool {
        self.domain().is_real()
    }
}
