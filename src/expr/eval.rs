//! Numeric evaluation of variable-free expressions.

use nalgebra::DMatrix;

use super::expression::{Array, Expr, Value};
use super::traverse::fold_post_order;
use crate::atoms::Atom;
use crate::error::{CvxError, Result};

/// Dense real and optional imaginary parts of an intermediate value.
type Parts = (DMatrix<f64>, Option<DMatrix<f64>>);

impl Expr {
    /// Evaluate this expression numerically.
    ///
    /// Fails when the expression contains variables or parameters.
    pub fn value(&self) -> Result<Value> {
        let (re, im) = fold_post_order(self, |_| Ok(None), eval_node)?;
        Ok(Value::from_parts(Array::from_dense(re), im.map(Array::from_dense)))
    }
}

fn eval_node(expr: &Expr, mut args: Vec<Parts>) -> Result<Parts> {
    Ok(match expr {
        Expr::Constant(c) => (c.value.to_dense(), c.imag.as_ref().map(|a| a.to_dense())),
        Expr::Variable(v) => {
            return Err(CvxError::InvalidProblem(format!(
                "cannot evaluate variable {:?} without a value",
                v.name.as_deref().unwrap_or("<unnamed>")
            )))
        }
        Expr::Parameter(p) => {
            return Err(CvxError::InvalidProblem(format!(
                "cannot evaluate parameter {:?} before it is bound",
                p.name.as_deref().unwrap_or("<unnamed>")
            )))
        }
        Expr::Add(_, _) => {
            let (br, bi) = pop(&mut args)?;
            let (ar, ai) = pop(&mut args)?;
            let re = zip_broadcast(&ar, &br, |x, y| x + y)?;
            let im = match (ai, bi) {
                (None, None) => None,
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (Some(a), Some(b)) => Some(zip_broadcast(&a, &b, |x, y| x + y)?),
            };
            let im = im.map(|m| fit(m, &re));
            (re, im)
        }
        Expr::Neg(_) => {
            let (re, im) = pop(&mut args)?;
            (-re, im.map(|m| -m))
        }
        Expr::Mul(_, _) => {
            let (br, bi) = pop(&mut args)?;
            let (ar, ai) = pop(&mut args)?;
            // (ar + i ai)(br + i bi) = (ar br - ai bi) + i (ar bi + ai br)
            let mut re = zip_broadcast(&ar, &br, |x, y| x * y)?;
            if let (Some(ai), Some(bi)) = (&ai, &bi) {
                re -= zip_broadcast(ai, bi, |x, y| x * y)?;
            }
            let im = match (&ai, &bi) {
                (None, None) => None,
                (Some(ai), None) => Some(zip_broadcast(ai, &br, |x, y| x * y)?),
                (None, Some(bi)) => Some(zip_broadcast(&ar, bi, |x, y| x * y)?),
                (Some(ai), Some(bi)) => Some(
                    zip_broadcast(&ar, bi, |x, y| x * y)? + zip_broadcast(ai, &br, |x, y| x * y)?,
                ),
            };
            (re, im)
        }
        Expr::Sum(_) => {
            let (re, im) = pop(&mut args)?;
            (
                DMatrix::from_element(1, 1, re.sum()),
                im.map(|m| DMatrix::from_element(1, 1, m.sum())),
            )
        }
        Expr::VStack(_) => {
            let any_imag = args.iter().any(|(_, im)| im.is_some());
            let re_blocks: Vec<&DMatrix<f64>> = args.iter().map(|(re, _)| re).collect();
            let re = stack_rows(&re_blocks)?;
            let im = if any_imag {
                let zero_blocks: Vec<DMatrix<f64>> = args
                    .iter()
                    .map(|(re, im)| {
                        im.clone()
                            .unwrap_or_else(|| DMatrix::zeros(re.nrows(), re.ncols()))
                    })
                    .collect();
                Some(stack_rows(&zero_blocks.iter().collect::<Vec<_>>())?)
            } else {
                None
            };
            (re, im)
        }
        Expr::Real(_) => {
            let (re, _) = pop(&mut args)?;
            (re, None)
        }
        Expr::Imag(_) => {
            let (re, im) = pop(&mut args)?;
            (im.unwrap_or_else(|| DMatrix::zeros(re.nrows(), re.ncols())), None)
        }
        Expr::Conj(_) => {
            let (re, im) = pop(&mut args)?;
            (re, im.map(|m| -m))
        }
        Expr::SumLargest(atom) => {
            let (re, im) = pop(&mut args)?;
            if im.as_ref().is_some_and(|m| m.iter().any(|&v| v != 0.0)) {
                return Err(CvxError::Domain(format!(
                    "{} received a non-real argument",
                    atom.name()
                )));
            }
            (atom.numeric(&[Array::Dense(re)]).to_dense(), None)
        }
    })
}

fn pop(args: &mut Vec<Parts>) -> Result<Parts> {
    args.pop()
        .ok_or_else(|| CvxError::Invariant("evaluation ran out of arguments".into()))
}

/// Elementwise combination with scalar promotion on either side.
fn zip_broadcast(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    f: impl Fn(f64, f64) -> f64,
) -> Result<DMatrix<f64>> {
    if a.shape() == b.shape() {
        Ok(a.zip_map(b, f))
    } else if b.len() == 1 {
        let s = b[(0, 0)];
        Ok(a.map(|v| f(v, s)))
    } else if a.len() == 1 {
        let s = a[(0, 0)];
        Ok(b.map(|v| f(s, v)))
    } else {
        Err(CvxError::ShapeMismatch {
            expected: format!("{:?}", a.shape()),
            got: format!("{:?}", b.shape()),
        })
    }
}

/// Promote a 1x1 imaginary block to the shape of the real block.
fn fit(m: DMatrix<f64>, like: &DMatrix<f64>) -> DMatrix<f64> {
    if m.shape() == like.shape() || m.len() != 1 {
        m
    } else {
        DMatrix::from_element(like.nrows(), like.ncols(), m[(0, 0)])
    }
}

fn stack_rows(blocks: &[&DMatrix<f64>]) -> Result<DMatrix<f64>> {
    let cols = blocks.first().map(|b| b.ncols()).unwrap_or(1);
    if blocks.iter().any(|b| b.ncols() != cols) {
        return Err(CvxError::ShapeMismatch {
            expected: format!("{} columns", cols),
            got: "blocks with differing column counts".into(),
        });
    }
    let rows: usize = blocks.iter().map(|b| b.nrows()).sum();
    let mut out = DMatrix::zeros(rows, cols);
    let mut offset = 0;
    for block in blocks {
        out.view_mut((offset, 0), (block.nrows(), cols)).copy_from(*block);
        offset += block.nrows();
    }
    Ok(out)
}
