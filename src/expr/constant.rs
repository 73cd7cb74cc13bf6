//! Constant expression creation.

use nalgebra::DMatrix;

use super::expression::{Array, ConstantData, Expr, ExprId};
use super::shape::Shape;

/// Create a constant expression from a scalar.
pub fn constant(value: f64) -> Expr {
    constant_array(Array::Scalar(value))
}

/// Create a constant expression from a vector.
pub fn constant_vec(values: Vec<f64>) -> Expr {
    constant_array(Array::from_vec(values))
}

/// Create a constant expression from a nalgebra DMatrix.
pub fn constant_dmatrix(matrix: DMatrix<f64>) -> Expr {
    constant_array(Array::Dense(matrix))
}

/// Create a real constant from an array.
pub fn constant_array(value: Array) -> Expr {
    Expr::Constant(ConstantData {
        id: ExprId::new(),
        value,
        imag: None,
    })
}

/// Create a complex scalar constant `re + i im`.
pub fn complex_constant(re: f64, im: f64) -> Expr {
    complex_array(Array::Scalar(re), Array::Scalar(im))
}

/// Create a complex vector constant from its real and imaginary parts.
///
/// Both parts must have the same length.
pub fn complex_constant_vec(re: Vec<f64>, im: Vec<f64>) -> Expr {
    complex_array(Array::from_vec(re), Array::from_vec(im))
}

/// Create a complex constant from its real and imaginary parts.
pub fn complex_array(re: Array, im: Array) -> Expr {
    Expr::Constant(ConstantData {
        id: ExprId::new(),
        value: re,
        imag: Some(im),
    })
}

/// Create a zero constant with the given shape.
pub fn zeros(shape: impl Into<Shape>) -> Expr {
    let shape = shape.into();
    let value = if shape.is_scalar() {
        Array::Scalar(0.0)
    } else {
        Array::Dense(DMatrix::zeros(shape.rows(), shape.cols()))
    };
    constant_array(value)
}
