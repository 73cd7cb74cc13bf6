//! Shape representation for expressions.
//!
//! - `()` is a scalar
//! - `(n,)` is a vector of length n
//! - `(m, n)` is an m x n matrix
//!
//! Values are flattened in column-major order everywhere in the crate.

use std::fmt;

/// Shape of an expression.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a scalar shape.
    pub fn scalar() -> Self {
        Shape(vec![])
    }

    /// Create a vector shape.
    pub fn vector(n: usize) -> Self {
        Shape(vec![n])
    }

    /// Create a matrix shape.
    pub fn matrix(m: usize, n: usize) -> Self {
        Shape(vec![m, n])
    }

    /// Shape of an `nrows x ncols` dense block: column blocks collapse to vectors.
    pub fn of_block(nrows: usize, ncols: usize) -> Self {
        match (nrows, ncols) {
            (1, 1) => Shape::scalar(),
            (n, 1) => Shape::vector(n),
            (m, n) => Shape::matrix(m, n),
        }
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.0.iter().product::<usize>().max(1)
    }

    /// Check if this is a scalar.
    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of rows (1 for scalar, n for vector, m for matrix).
    pub fn rows(&self) -> usize {
        match self.0.len() {
            0 => 1,
            _ => self.0[0],
        }
    }

    /// Number of columns (1 for scalar and vector, n for matrix).
    pub fn cols(&self) -> usize {
        match self.0.len() {
            0 | 1 => 1,
            _ => self.0[1],
        }
    }

    /// Result shape of an elementwise operation, if the shapes are compatible.
    ///
    /// Only scalar promotion is supported: either side may be a scalar,
    /// otherwise the shapes must agree.
    pub fn broadcast(&self, other: &Shape) -> Option<Shape> {
        if self == other || other.is_scalar() {
            Some(self.clone())
        } else if self.is_scalar() {
            Some(other.clone())
        } else if self.rows() == other.rows() && self.cols() == other.cols() {
            // (n,) and (n, 1) describe the same column
            Some(self.clone())
        } else {
            None
        }
    }

    /// Result shape of stacking the given shapes vertically.
    pub fn vstack(shapes: &[Shape]) -> Option<Shape> {
        let first = shapes.first()?;
        let cols = first.cols();
        if shapes.iter().any(|s| s.cols() != cols) {
            return None;
        }
        let rows = shapes.iter().map(|s| s.rows()).sum();
        Some(if cols == 1 {
            Shape::vector(rows)
        } else {
            Shape::matrix(rows, cols)
        })
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({:?})", self.0)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "()"),
            [n] => write!(f, "({},)", n),
            dims => {
                let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

impl From<()> for Shape {
    fn from(_: ()) -> Self {
        Shape::scalar()
    }
}

impl From<usize> for Shape {
    fn from(n: usize) -> Self {
        Shape::vector(n)
    }
}

impl From<(usize, usize)> for Shape {
    fn from((m, n): (usize, usize)) -> Self {
        Shape::matrix(m, n)
    }
}
