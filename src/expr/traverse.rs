//! Stack-based traversals over expression trees.
//!
//! Trees can be arbitrarily deep, so nothing here recurses on the call stack.

use std::convert::Infallible;
use std::sync::{Arc, OnceLock};

use super::expression::Expr;

enum Frame<'a> {
    Enter(&'a Expr),
    Exit(&'a Expr, usize),
}

/// Fold an expression bottom-up.
///
/// `pre` is offered every node before its children are visited; returning
/// `Some` short-circuits the subtree with that result. Otherwise `post`
/// receives the node together with the results for its arguments, in
/// argument order.
pub fn fold_post_order<'a, T, E>(
    root: &'a Expr,
    mut pre: impl FnMut(&'a Expr) -> Result<Option<T>, E>,
    mut post: impl FnMut(&'a Expr, Vec<T>) -> Result<T, E>,
) -> Result<T, E> {
    let mut stack = vec![Frame::Enter(root)];
    let mut results: Vec<T> = Vec::new();

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter(expr) => {
                if let Some(done) = pre(expr)? {
                    results.push(done);
                    continue;
                }
                let args = expr.args();
                stack.push(Frame::Exit(expr, args.len()));
                for arg in args.into_iter().rev() {
                    stack.push(Frame::Enter(arg.as_ref()));
                }
            }
            Frame::Exit(expr, arity) => {
                let children = results.split_off(results.len() - arity);
                results.push(post(expr, children)?);
            }
        }
    }

    // Every Enter pushes exactly one result once its Exit has run.
    match results.pop() {
        Some(result) if results.is_empty() => Ok(result),
        _ => unreachable!("post-order fold must leave exactly one result"),
    }
}

/// Fold an expression bottom-up with a combinator that cannot fail.
pub fn fold_up<'a, T>(root: &'a Expr, mut post: impl FnMut(&'a Expr, Vec<T>) -> T) -> T {
    let folded: Result<T, Infallible> =
        fold_post_order(root, |_| Ok(None), |node, args| Ok(post(node, args)));
    match folded {
        Ok(result) => result,
        Err(never) => match never {},
    }
}

impl Drop for Expr {
    fn drop(&mut self) {
        // Unlink uniquely owned descendants one level at a time; shared
        // subtrees stay alive through their other owners.
        let mut pending = self.detach_args();
        while let Some(child) = pending.pop() {
            if let Some(mut inner) = Arc::into_inner(child) {
                pending.append(&mut inner.detach_args());
            }
        }
    }
}

impl Expr {
    /// Move the arguments out of this node, leaving an empty stand-in.
    fn detach_args(&mut self) -> Vec<Arc<Expr>> {
        match self {
            Expr::Variable(_) | Expr::Constant(_) | Expr::Parameter(_) => Vec::new(),
            Expr::Add(a, b) | Expr::Mul(a, b) => vec![detach(a), detach(b)],
            Expr::Neg(a) | Expr::Sum(a) | Expr::Real(a) | Expr::Imag(a) | Expr::Conj(a) => {
                vec![detach(a)]
            }
            Expr::VStack(exprs) => std::mem::take(exprs),
            Expr::SumLargest(atom) => vec![detach(atom.arg_mut())],
        }
    }

    /// All leaf nodes (variables, constants, parameters), in left-to-right order.
    ///
    /// Shared leaves are reported once per occurrence.
    pub fn leaves(&self) -> Vec<&Expr> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            let args = expr.args();
            if args.is_empty() {
                leaves.push(expr);
            } else {
                stack.extend(args.into_iter().rev().map(|a| a.as_ref()));
            }
        }
        leaves
    }
}

fn detach(slot: &mut Arc<Expr>) -> Arc<Expr> {
    static EMPTY: OnceLock<Arc<Expr>> = OnceLock::new();
    let empty = EMPTY.get_or_init(|| Arc::new(Expr::VStack(Vec::new())));
    std::mem::replace(slot, Arc::clone(empty))
}
