//! Curvature tracking for DCP (Disciplined Convex Programming).
//!
//! This module implements the curvature rules that determine whether an
//! expression is convex, concave, affine, or unknown. Nonlinear atoms go
//! through the general composition rule in [`atom_curvature`].

use crate::atoms::Atom;
use crate::dcp::Domain;
use crate::expr::{fold_up, Expr};

/// Curvature of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curvature {
    /// Constant value (most restrictive).
    Constant,
    /// Affine function (both convex and concave).
    Affine,
    /// Convex function.
    Convex,
    /// Concave function.
    Concave,
    /// Unknown curvature (not DCP-compliant).
    Unknown,
}

impl Curvature {
    /// Check if the curvature is convex (constant, affine, or convex).
    pub fn is_convex(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine | Curvature::Convex)
    }

    /// Check if the curvature is concave (constant, affine, or concave).
    pub fn is_concave(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine | Curvature::Concave)
    }

    /// Check if the curvature is affine (constant or affine).
    pub fn is_affine(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine)
    }

    /// Check if this is a constant.
    pub fn is_constant(self) -> bool {
        matches!(self, Curvature::Constant)
    }

    /// Negate the curvature (convex <-> concave).
    pub fn negate(self) -> Self {
        match self {
            Curvature::Convex => Curvature::Concave,
            Curvature::Concave => Curvature::Convex,
            other => other,
        }
    }
}

/// Monotonicity of an atom in one of its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Monotonicity {
    /// Nondecreasing in the argument.
    Increasing,
    /// Nonincreasing in the argument.
    Decreasing,
    /// Neither (or unknown).
    None,
}

impl Monotonicity {
    /// Build from `(is_incr, is_decr)` flags. Constant-in-argument counts as increasing.
    pub fn from_flags(incr: bool, decr: bool) -> Self {
        match (incr, decr) {
            (true, _) => Monotonicity::Increasing,
            (false, true) => Monotonicity::Decreasing,
            (false, false) => Monotonicity::None,
        }
    }
}

/// Combine curvatures for addition: a + b.
pub fn add_curvature(a: Curvature, b: Curvature) -> Curvature {
    use Curvature::*;
    match (a, b) {
        (Constant, x) | (x, Constant) => x,
        (Affine, x) | (x, Affine) => x,
        (Convex, Convex) => Convex,
        (Concave, Concave) => Concave,
        (Convex, Concave) | (Concave, Convex) => Unknown,
        (Unknown, _) | (_, Unknown) => Unknown,
    }
}

/// Combine curvatures for scalar multiplication: scalar * expr.
///
/// If scalar > 0: preserves curvature
/// If scalar < 0: negates curvature
/// If scalar == 0: constant
pub fn scalar_mul_curvature(scalar: f64, expr_curv: Curvature) -> Curvature {
    if scalar == 0.0 {
        Curvature::Constant
    } else if scalar > 0.0 {
        expr_curv
    } else {
        expr_curv.negate()
    }
}

/// Curvature of a nonlinear atom under the DCP composition rule.
///
/// `f(g_1, ..., g_n)` is convex when `f` is convex and every `g_i` is affine,
/// or convex with `f` nondecreasing in `i`, or concave with `f` nonincreasing
/// in `i`. The concave case is symmetric. `args` holds the curvature of each
/// `g_i`.
pub fn atom_curvature<A: Atom + ?Sized>(atom: &A, args: &[Curvature]) -> Curvature {
    if args.iter().all(|c| c.is_constant()) {
        return Curvature::Constant;
    }

    let convex = atom.is_atom_convex()
        && args.iter().enumerate().all(|(i, c)| {
            c.is_affine()
                || (c.is_convex() && atom.is_incr(i))
                || (c.is_concave() && atom.is_decr(i))
        });
    let concave = atom.is_atom_concave()
        && args.iter().enumerate().all(|(i, c)| {
            c.is_affine()
                || (c.is_concave() && atom.is_incr(i))
                || (c.is_convex() && atom.is_decr(i))
        });

    match (convex, concave) {
        (true, true) => Curvature::Affine,
        (true, false) => Curvature::Convex,
        (false, true) => Curvature::Concave,
        (false, false) => Curvature::Unknown,
    }
}

impl Expr {
    /// Get the curvature of this expression.
    pub fn curvature(&self) -> Curvature {
        let (_, curvature) = fold_up(self, |node, args: Vec<(Domain, Curvature)>| {
            let domains: Vec<Domain> = args.iter().map(|(d, _)| *d).collect();
            (node.domain_over(&domains), node.curvature_over(&args))
        });
        curvature
    }

    /// Curvature of this node given the domain and curvature of each argument.
    fn curvature_over(&self, args: &[(Domain, Curvature)]) -> Curvature {
        match (self, args) {
            (Expr::Variable(_), _) => Curvature::Affine,
            // Parameters are fixed at solve time.
            (Expr::Constant(_) | Expr::Parameter(_), _) => Curvature::Constant,

            (Expr::Add(_, _), [(_, a), (_, b)]) => add_curvature(*a, *b),
            (Expr::Neg(_), [(_, a)]) => a.negate(),
            (Expr::Mul(a, b), [lhs, rhs]) => {
                mul_curvature((a.as_ref(), *lhs), (b.as_ref(), *rhs))
            }
            (Expr::Sum(_), [(_, a)]) => *a,
            (Expr::VStack(_), blocks) => blocks
                .iter()
                .fold(Curvature::Constant, |acc, (_, c)| add_curvature(acc, *c)),

            (Expr::Real(_) | Expr::Conj(_), [(d, c)]) => {
                if d.is_real() || c.is_affine() {
                    *c
                } else {
                    Curvature::Unknown
                }
            }
            (Expr::Imag(_), [(d, c)]) => {
                if d.is_real() {
                    Curvature::Constant
                } else if c.is_affine() {
                    *c
                } else {
                    Curvature::Unknown
                }
            }

            (Expr::SumLargest(atom), _) => {
                let curvatures: Vec<Curvature> = args.iter().map(|(_, c)| *c).collect();
                atom_curvature(atom, &curvatures)
            }
            _ => Curvature::Unknown,
        }
    }

    /// Check if this expression is convex.
    pub fn is_convex(&self) -> bool {
        self.curvature().is_convex()
    }

    /// Check if this expression is concave.
    pub fn is_concave(&self) -> bool {
        self.curvature().is_concave()
    }

    /// Check if this expression is affine.
    pub fn is_affine(&self) -> bool {
        self.curvature().is_affine()
    }
}

/// Handle multiplication curvature.
fn mul_curvature(
    (a, (ad, ac)): (&Expr, (Domain, Curvature)),
    (b, (bd, bc)): (&Expr, (Domain, Curvature)),
) -> Curvature {
    if ac.is_constant() && bc.is_constant() {
        return Curvature::Constant;
    }

    let (coeff, coeff_domain, other) = if ac.is_constant() {
        (a, ad, bc)
    } else if bc.is_constant() {
        (b, bd, ac)
    } else {
        // affine * affine is quadratic
        return Curvature::Unknown;
    };

    if coeff_domain.is_real() {
        if let Some(scalar) = coeff.constant_value().and_then(|arr| arr.as_scalar()) {
            return scalar_mul_curvature(scalar, other);
        }
    }
    // Unknown-sign coefficient: only affine survives.
    if other.is_affine() {
        Curvature::Affine
    } else {
        Curvature::Unknown
    }
}
