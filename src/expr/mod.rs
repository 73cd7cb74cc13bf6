//! Expression types and creation utilities.
//!
//! This module provides the core expression types for building optimization problems:
//! - `Expr` - The main expression enum representing all expressions
//! - `Shape` - Shape information for expressions
//! - Variable creation via `variable()` and `VariableBuilder`
//! - Constant and parameter creation
//! - Stack-based traversal and numeric evaluation

pub mod constant;
pub mod eval;
pub mod expression;
pub mod parameter;
pub mod shape;
pub mod traverse;
pub mod variable;

pub use constant::{
    complex_array, complex_constant, complex_constant_vec, constant, constant_array,
    constant_dmatrix, constant_vec, zeros,
};
pub use expression::{
    Array, ConstantData, Expr, ExprId, ParameterData, Value, VariableData,
};
pub use parameter::{parameter, parameter_in};
pub use shape::Shape;
pub use traverse::{fold_post_order, fold_up};
pub use variable::{
    complex_variable, imag_variable, named_variable, nonneg_variable, variable, VariableBuilder,
    VariableExt,
};
