//! Sign tracking for DCP (Disciplined Convex Programming).
//!
//! This module tracks whether expressions are non-negative, non-positive,
//! or have unknown sign. Sign information is used in DCP composition rules.
//! Non-real expressions have no order, so their sign is always unknown.

use crate::atoms::Atom;
use crate::dcp::Domain;
use crate::expr::{fold_up, Expr};

/// Sign of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    /// Expression is always >= 0.
    Nonnegative,
    /// Expression is always <= 0.
    Nonpositive,
    /// Expression is always == 0.
    Zero,
    /// Sign is unknown.
    Unknown,
}

impl Sign {
    /// Build a sign from `(is_nonneg, is_nonpos)` flags.
    pub fn from_flags(nonneg: bool, nonpos: bool) -> Self {
        match (nonneg, nonpos) {
            (true, true) => Sign::Zero,
            (true, false) => Sign::Nonnegative,
            (false, true) => Sign::Nonpositive,
            (false, false) => Sign::Unknown,
        }
    }

    /// Check if the sign is non-negative (>= 0).
    pub fn is_nonneg(self) -> bool {
        matches!(self, Sign::Nonnegative | Sign::Zero)
    }

    /// Check if the sign is non-positive (<= 0).
    pub fn is_nonpos(self) -> bool {
        matches!(self, Sign::Nonpositive | Sign::Zero)
    }

    /// Check if the sign is zero.
    pub fn is_zero(self) -> bool {
        matches!(self, Sign::Zero)
    }

    /// Negate the sign.
    pub fn negate(self) -> Self {
        match self {
            Sign::Nonnegative => Sign::Nonpositive,
            Sign::Nonpositive => Sign::Nonnegative,
            Sign::Zero => Sign::Zero,
            Sign::Unknown => Sign::Unknown,
        }
    }
}

/// Combine signs for addition: a + b.
pub fn add_sign(a: Sign, b: Sign) -> Sign {
    use Sign::*;
    match (a, b) {
        (Zero, x) | (x, Zero) => x,
        (Nonnegative, Nonnegative) => Nonnegative,
        (Nonpositive, Nonpositive) => Nonpositive,
        (Nonnegative, Nonpositive) | (Nonpositive, Nonnegative) => Unknown,
        (Unknown, _) | (_, Unknown) => Unknown,
    }
}

/// Combine signs for multiplication: a * b.
pub fn mul_sign(a: Sign, b: Sign) -> Sign {
    use Sign::*;
    match (a, b) {
        (Zero, _) | (_, Zero) => Zero,
        (Nonnegative, Nonnegative) | (Nonpositive, Nonpositive) => Nonnegative,
        (Nonnegative, Nonpositive) | (Nonpositive, Nonnegative) => Nonpositive,
        (Unknown, _) | (_, Unknown) => Unknown,
    }
}

impl Expr {
    /// Get the sign of this expression.
    pub fn sign(&self) -> Sign {
        let (_, sign) = fold_up(self, |node, args: Vec<(Domain, Sign)>| {
            let domains: Vec<Domain> = args.iter().map(|(d, _)| *d).collect();
            let domain = node.domain_over(&domains);
            (domain, node.sign_over(domain, &args))
        });
        sign
    }

    /// Sign of this node given its own domain and the domain and sign of
    /// each argument.
    fn sign_over(&self, domain: Domain, args: &[(Domain, Sign)]) -> Sign {
        if !domain.is_real() {
            return Sign::Unknown;
        }
        match (self, args) {
            (Expr::Variable(v), _) => Sign::from_flags(v.nonneg, v.nonpos),
            (Expr::Constant(c), _) => Sign::from_flags(c.value.is_nonneg(), c.value.is_nonpos()),
            (Expr::Parameter(_), _) => Sign::Unknown,

            (Expr::Add(_, _), [(_, a), (_, b)]) => add_sign(*a, *b),
            (Expr::Neg(_), [(_, a)]) => a.negate(),
            (Expr::Mul(_, _), [(_, a), (_, b)]) => mul_sign(*a, *b),
            (Expr::Sum(_), [(_, a)]) => *a,
            (Expr::VStack(_), blocks) => Sign::from_flags(
                blocks.iter().all(|(_, s)| s.is_nonneg()),
                blocks.iter().all(|(_, s)| s.is_nonpos()),
            ),

            // Over a real argument these are the identity / zero.
            (Expr::Real(_) | Expr::Conj(_), [(Domain::Real, a)]) => *a,
            (Expr::Imag(_), [(Domain::Real, _)]) => Sign::Zero,

            (Expr::SumLargest(atom), _) => {
                let (nonneg, nonpos) = atom.sign_from_args();
                Sign::from_flags(nonneg, nonpos)
            }
            _ => Sign::Unknown,
        }
    }

    /// Check if this expression is non-negative.
    pub fn is_nonneg(&self) -> bool {
        self.sign().is_nonneg()
    }

    /// Check if this expression is non-positive.
    pub fn is_nonpos(&self) -> bool {
        self.sign().is_nonpos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{imag, sum_largest};
    use crate::expr::{complex_variable, constant, nonneg_variable, variable};

    #[test]
    fn test_sign_basics() {
        assert!(Sign::Nonnegative.is_nonneg());
        assert!(!Sign::Nonnegative.is_nonpos());
        assert!(Sign::Zero.is_nonneg());
        assert!(Sign::Zero.is_nonpos());
        assert_eq!(Sign::from_flags(false, true), Sign::Nonpositive);
    }

    #[test]
    fn test_add_and_mul_sign() {
        use Sign::*;
        assert_eq!(add_sign(Nonnegative, Nonnegative), Nonnegative);
        assert_eq!(add_sign(Nonnegative, Nonpositive), Unknown);
        assert_eq!(add_sign(Zero, Nonpositive), Nonpositive);
        assert_eq!(mul_sign(Nonpositive, Nonpositive), Nonnegative);
        assert_eq!(mul_sign(Zero, Unknown), Zero);
    }

    #[test]
    fn test_leaf_signs() {
        assert_eq!(variable(5).sign(), Sign::Unknown);
        assert_eq!(nonneg_variable(5).sign(), Sign::Nonnegative);
        assert_eq!(constant(-5.0).sign(), Sign::Nonpositive);
        assert_eq!(constant(0.0).sign(), Sign::Zero);
    }

    #[test]
    fn test_complex_sign_unknown() {
        let z = complex_variable(2);
        assert_eq!(z.sign(), Sign::Unknown);
        assert_eq!(imag(&variable(2)).sign(), Sign::Zero);
    }

    #[test]
    fn test_sum_largest_sign_follows_argument() {
        let x = nonneg_variable(4);
        assert_eq!(sum_largest(&x, 2.0).unwrap().sign(), Sign::Nonnegative);
        let y = variable(4);
        assert_eq!(sum_largest(&y, 2.0).unwrap().sign(), Sign::Unknown);
    }
}
