//! Property tests for the sum_largest atom.
//!
//! Numeric values are checked against a brute-force subset search on
//! seeded random inputs, with and without ties.

use cvxreduce::atoms::{sum_largest_value, top_k_indices, SumLargest};
use cvxreduce::prelude::*;
use float_eq::assert_float_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const TOL: f64 = 1e-9;

/// Largest sum over all subsets of exactly `min(k, n)` entries.
fn brute_force(x: &[f64], k: usize) -> f64 {
    let n = x.len();
    let k = k.min(n);
    let mut best = f64::NEG_INFINITY;
    for mask in 0u32..(1 << n) {
        if mask.count_ones() as usize != k {
            continue;
        }
        let s: f64 = (0..n).filter(|i| mask & (1 << i) != 0).map(|i| x[i]).sum();
        best = best.max(s);
    }
    best
}

fn random_vector(rng: &mut StdRng, n: usize, with_ties: bool) -> Vec<f64> {
    (0..n)
        .map(|_| {
            if with_ties {
                rng.gen_range(-3i32..=3) as f64
            } else {
                rng.gen_range(-10.0..10.0)
            }
        })
        .collect()
}

fn atom_of(e: &Expr) -> &SumLargest {
    match e {
        Expr::SumLargest(atom) => atom,
        other => panic!("expected sum_largest, got {:?}", other),
    }
}

#[test]
fn test_value_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(7);
    for trial in 0..60 {
        let n = rng.gen_range(1..=8);
        let x = random_vector(&mut rng, n, trial % 2 == 0);
        for k in 0..=n {
            assert_float_eq!(sum_largest_value(&x, k), brute_force(&x, k), abs <= TOL);
        }
    }
}

#[test]
fn test_value_edge_cases() {
    let x = [2.0, 2.0, 2.0];
    assert_eq!(sum_largest_value(&x, 0), 0.0);
    assert_eq!(sum_largest_value(&x, 2), 4.0);
    assert_eq!(sum_largest_value(&x, 3), 6.0);
    assert_eq!(sum_largest_value(&x, 5), 6.0);
    assert_eq!(sum_largest_value(&[-1.0, -4.0], 1), -1.0);
}

#[test]
fn test_numeric_through_atom() {
    let data = vec![1.0, 7.0, -3.0, 4.0, 4.0];
    let x = constant_vec(data.clone());
    let e = sum_largest(&x, 3.0).unwrap();
    let value = atom_of(&e).numeric(&[Array::from_vec(data)]);
    assert_eq!(value.as_scalar(), Some(15.0));

    // Evaluation of the expression tree agrees with the atom.
    match e.value().unwrap() {
        Value::Real(a) => assert_eq!(a.as_scalar(), Some(15.0)),
        other => panic!("expected a real value, got {:?}", other),
    }
}

#[test]
fn test_matrix_argument_flattens_column_major() {
    // [[1, 5], [9, 2]] flattened column-major is [1, 9, 5, 2].
    let m = nalgebra::DMatrix::from_row_slice(2, 2, &[1.0, 5.0, 9.0, 2.0]);
    let e = sum_largest(&constant_dmatrix(m.clone()), 1.0).unwrap();
    let grads = atom_of(&e).grad(&[Array::Dense(m)]);
    let d = grads[0].as_ref().unwrap();
    let rows: Vec<usize> = d.triplet_iter().map(|(r, _, _)| r).collect();
    assert_eq!(rows, vec![1]);
}

#[test]
fn test_validate_rejects_bad_k() {
    let x = variable(4);
    for k in [0.0, -1.0, 1.5, f64::INFINITY] {
        match sum_largest(&x, k) {
            Err(CvxError::Domain(msg)) => assert!(msg.contains("sum_largest")),
            other => panic!("k = {} should be rejected, got {:?}", k, other.map(|_| ())),
        }
    }
    for k in 1..=4 {
        let atom = SumLargest::new(Arc::new(x.clone()), k as f64).unwrap();
        assert!(atom.validate().is_ok());
        assert_eq!(atom.k(), k);
    }
}

#[test]
fn test_subgradient_is_top_k_indicator() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..40 {
        let n = rng.gen_range(1..=10);
        let k = rng.gen_range(1..=n);
        let data = random_vector(&mut rng, n, false);
        let x = variable(n);
        let e = sum_largest(&x, k as f64).unwrap();
        let grads = atom_of(&e).grad(&[Array::from_vec(data.clone())]);
        let d = grads[0].as_ref().unwrap();
        assert_eq!((d.nrows(), d.ncols()), (n, 1));

        let mut weights = vec![0.0; n];
        for (r, _, v) in d.triplet_iter() {
            weights[r] += *v;
        }
        assert_float_eq!(weights.iter().sum::<f64>(), k as f64, abs <= TOL);

        // Every selected entry is at least as large as every unselected one.
        let min_selected = (0..n)
            .filter(|&i| weights[i] == 1.0)
            .map(|i| data[i])
            .fold(f64::INFINITY, f64::min);
        let max_rest = (0..n)
            .filter(|&i| weights[i] == 0.0)
            .map(|i| data[i])
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(min_selected >= max_rest);

        // The subgradient's inner product with x is the value.
        let dot: f64 = weights.iter().zip(&data).map(|(w, v)| w * v).sum();
        assert_float_eq!(dot, sum_largest_value(&data, k), abs <= TOL);
    }
}

#[test]
fn test_ties_select_lowest_indices() {
    let x = [5.0, 1.0, 5.0, 5.0, 0.0];
    assert_eq!(top_k_indices(&x, 2), vec![0, 2]);
    assert_eq!(top_k_indices(&x, 4), vec![0, 2, 3, 1]);
}

#[test]
fn test_dcp_composition() {
    let x = variable(4);
    let f = sum_largest(&x, 2.0).unwrap();
    assert!(f.is_convex());
    assert!(!f.is_concave());

    // Nondecreasing: convex of convex stays convex, convex of concave does not.
    let convex_arg = vstack(vec![f.clone(), constant(1.0)]);
    assert!(sum_largest(&convex_arg, 1.0).unwrap().is_convex());
    let concave_arg = vstack(vec![-f, constant(1.0)]);
    assert!(!sum_largest(&concave_arg, 1.0).unwrap().is_convex());
}

#[test]
fn test_sign_follows_argument() {
    let x = nonneg_variable(3);
    assert!(sum_largest(&x, 2.0).unwrap().is_nonneg());
    let y = variable(3);
    let f = sum_largest(&y, 2.0).unwrap();
    assert!(!f.is_nonneg());
    assert!(!f.is_nonpos());
}
