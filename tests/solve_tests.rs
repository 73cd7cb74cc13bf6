//! End-to-end solve tests.
//!
//! Problems are built with the public API, reduced, canonicalized and solved
//! with Clarabel; results are compared against values known in closed form.

use cvxreduce::atoms::sum_largest_value;
use cvxreduce::prelude::*;
use float_eq::assert_float_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Tolerance for comparing floating point results
const TOL: f64 = 1e-5;

fn optimal(solution: &Solution) -> f64 {
    assert!(
        solution.status.is_solution_present(),
        "unexpected status {:?}",
        solution.status
    );
    solution.value.expect("optimal solution carries a value")
}

fn real_vec(solution: &Solution, var: &Expr) -> Vec<f64> {
    match solution.primal_value(var) {
        Some(Value::Real(a)) => a.to_vec(),
        other => panic!("expected a real value, got {:?}", other),
    }
}

// ============================================================================
// Real problems
// ============================================================================

#[test]
fn test_epigraph_lp_matches_numeric() {
    // min sum(t) + k q  s.t.  t >= 0,  x <= t + q  equals sum_largest(x, k).
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..8 {
        let n = rng.gen_range(1..=6);
        let k = rng.gen_range(1..=n);
        let data: Vec<f64> = (0..n).map(|_| rng.gen_range(-5.0..5.0)).collect();

        let t = variable(n);
        let q = variable(());
        let x = constant_vec(data.clone());
        let solution = Problem::minimize(&sum(&t) + &(k as f64 * &q))
            .subject_to([t.geq(&constant(0.0)), (&t + &q).geq(&x)])
            .solve()
            .expect("solve failed");

        assert_float_eq!(optimal(&solution), sum_largest_value(&data, k), abs <= TOL);
    }
}

#[test]
fn test_sum_largest_objective_matches_numeric() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..8 {
        let n = rng.gen_range(2..=6);
        let k = rng.gen_range(1..=n);
        let data: Vec<f64> = (0..n).map(|_| rng.gen_range(-3i32..=3) as f64).collect();

        let x = variable(n);
        let solution = Problem::minimize(sum_largest(&x, k as f64).unwrap())
            .subject_to([x.equals(&constant_vec(data.clone()))])
            .solve()
            .expect("solve failed");

        assert_float_eq!(optimal(&solution), sum_largest_value(&data, k), abs <= TOL);
        // Auxiliary epigraph variables are not reported.
        assert_eq!(solution.primal.len(), 1);
    }
}

#[test]
fn test_sum_largest_with_budget() {
    // min sum_largest(x, 2) s.t. sum(x) == 6, x in R^3: spread evenly, value 4.
    let x = variable(3);
    let solution = Problem::minimize(sum_largest(&x, 2.0).unwrap())
        .subject_to([sum(&x).equals(&constant(6.0))])
        .solve()
        .expect("solve failed");

    assert_float_eq!(optimal(&solution), 4.0, abs <= TOL);
    for v in real_vec(&solution, &x) {
        assert_float_eq!(v, 2.0, abs <= 1e-4);
    }
}

#[test]
fn test_k_beyond_size_sums_everything() {
    // k = 3, 5 and 9 over three entries all equal 1 + 2 + 3.
    let data = vec![1.0, 2.0, 3.0];
    for k in [3.0, 5.0, 9.0] {
        let x = variable(3);
        let solution = Problem::minimize(sum_largest(&x, k).unwrap())
            .subject_to([x.equals(&constant_vec(data.clone()))])
            .solve()
            .expect("solve failed");

        assert_float_eq!(optimal(&solution), 6.0, abs <= TOL);
        assert_float_eq!(optimal(&solution), sum_largest_value(&data, k as usize), abs <= TOL);
    }
}

#[test]
fn test_maximize_negated_sum_largest() {
    // max -sum_largest(x, 2) s.t. x >= [1, 2, 3]: x = [1, 2, 3], value -5.
    let x = variable(3);
    let solution = Problem::maximize(-sum_largest(&x, 2.0).unwrap())
        .subject_to([x.geq(&constant_vec(vec![1.0, 2.0, 3.0]))])
        .solve()
        .expect("solve failed");

    assert_float_eq!(optimal(&solution), -5.0, abs <= TOL);
}

#[test]
fn test_inequality_dual() {
    // min x s.t. x >= 2: the multiplier of x - 2 >= 0 is 1.
    let x = variable(());
    let c = x.geq(&constant(2.0));
    let solution = Problem::minimize(x.clone())
        .subject_to([c.clone()])
        .solve()
        .expect("solve failed");

    assert_float_eq!(optimal(&solution), 2.0, abs <= TOL);
    assert_float_eq!(solution.try_value(&x).unwrap(), 2.0, abs <= TOL);
    let dual = solution.dual_value(&c).expect("dual present");
    assert_float_eq!(dual.as_scalar().unwrap(), 1.0, abs <= TOL);
}

#[test]
fn test_infeasible_status() {
    let x = variable(2);
    let solution = Problem::minimize(sum(&x))
        .subject_to([x.geq(&constant(1.0)), x.leq(&constant(0.0))])
        .solve()
        .expect("solve failed");

    assert!(matches!(
        solution.status,
        SolveStatus::Infeasible | SolveStatus::InfeasibleInaccurate
    ));
    assert!(solution.value.is_none());
    assert!(solution.primal.is_empty());
}

#[test]
fn test_solver_attributes_recorded() {
    let x = variable(2);
    let solution = Problem::minimize(sum(&x))
        .subject_to([x.geq(&constant(0.0))])
        .solve()
        .expect("solve failed");
    assert!(solution.attribute(cvxreduce::solver::ITERATIONS).is_some());
    assert!(solution.attribute(cvxreduce::solver::SOLVE_TIME).is_some());
}

#[test]
fn test_custom_settings() {
    let settings = Settings {
        max_iter: 200,
        tol_gap_abs: 1e-9,
        ..Settings::default()
    };
    let x = variable(3);
    let solution = Problem::minimize(sum_largest(&x, 1.0).unwrap())
        .subject_to([sum(&x).equals(&constant(3.0))])
        .solve_with(&settings)
        .expect("solve failed");
    assert_float_eq!(optimal(&solution), 1.0, abs <= TOL);
}

#[test]
fn test_unbound_parameter_rejected() {
    let x = variable(2);
    let p = parameter(2);
    let result = Problem::minimize(sum(&x))
        .subject_to([x.geq(&p)])
        .solve();
    assert!(matches!(result, Err(CvxError::InvalidProblem(_))));
}

// ============================================================================
// Complex problems
// ============================================================================

#[test]
fn test_complex_linear_equation() {
    // z (1 + 2i) == 3 + 4i  =>  z = (3 + 4i) / (1 + 2i) = 2.2 - 0.4i
    let z = complex_variable(());
    let c = (&z * &complex_constant(1.0, 2.0)).equals(&complex_constant(3.0, 4.0));
    let solution = Problem::minimize(constant(0.0))
        .subject_to([c.clone()])
        .solve()
        .expect("solve failed");

    assert_float_eq!(optimal(&solution), 0.0, abs <= TOL);
    match solution.primal_value(&z) {
        Some(Value::Complex { re, im }) => {
            assert_float_eq!(re.as_scalar().unwrap(), 2.2, abs <= TOL);
            assert_float_eq!(im.as_scalar().unwrap(), -0.4, abs <= TOL);
        }
        other => panic!("expected a complex value, got {:?}", other),
    }
    // The stacked equality reports a dual for both parts.
    assert_eq!(solution.dual_value(&c).expect("dual present").size(), 2);
}

#[test]
fn test_imaginary_variable() {
    // y == i [1, 3]: imag(y) = [1, 3], sum_largest of it is 3.
    let y = imag_variable(2);
    let target = complex_constant_vec(vec![0.0, 0.0], vec![1.0, 3.0]);
    let solution = Problem::minimize(sum_largest(&imag(&y), 1.0).unwrap())
        .subject_to([y.equals(&target)])
        .solve()
        .expect("solve failed");

    assert_float_eq!(optimal(&solution), 3.0, abs <= TOL);
    match solution.primal_value(&y) {
        Some(Value::Imaginary(im)) => {
            let im = im.to_vec();
            assert_float_eq!(im[0], 1.0, abs <= TOL);
            assert_float_eq!(im[1], 3.0, abs <= TOL);
        }
        other => panic!("expected an imaginary value, got {:?}", other),
    }
}

#[test]
fn test_conjugate_and_real_part() {
    // conj(z) == [1, 4 - i, 2, 3 + i]  =>  z = [1, 4 + i, 2, 3 - i]
    let z = complex_variable(4);
    let target = complex_constant_vec(vec![1.0, 4.0, 2.0, 3.0], vec![0.0, -1.0, 0.0, 1.0]);
    let solution = Problem::minimize(sum_largest(&real(&z), 2.0).unwrap())
        .subject_to([conj(&z).equals(&target)])
        .solve()
        .expect("solve failed");

    assert_float_eq!(optimal(&solution), 7.0, abs <= TOL);
    match solution.primal_value(&z) {
        Some(Value::Complex { re, im }) => {
            let expected_re = [1.0, 4.0, 2.0, 3.0];
            let expected_im = [0.0, 1.0, 0.0, -1.0];
            for (got, want) in re.to_vec().iter().zip(expected_re) {
                assert_float_eq!(*got, want, abs <= TOL);
            }
            for (got, want) in im.to_vec().iter().zip(expected_im) {
                assert_float_eq!(*got, want, abs <= TOL);
            }
        }
        other => panic!("expected a complex value, got {:?}", other),
    }
}

#[test]
fn test_mixed_real_and_complex() {
    // A real variable bounded by the real part of a complex one.
    let x = variable(3);
    let z = complex_variable(3);
    let target = complex_constant_vec(vec![1.0, 5.0, 2.0], vec![2.0, 0.0, 1.0]);
    let solution = Problem::minimize(sum(&x))
        .subject_to([z.equals(&target), x.geq(&real(&z)), x.geq(&imag(&z))])
        .solve()
        .expect("solve failed");

    // x = max(re, im) = [2, 5, 2]
    assert_float_eq!(optimal(&solution), 9.0, abs <= TOL);
    for (got, want) in real_vec(&solution, &x).iter().zip([2.0, 5.0, 2.0]) {
        assert_float_eq!(*got, want, abs <= 1e-4);
    }
    // Only the user's two variables come back.
    assert_eq!(solution.primal.len(), 2);
}

#[test]
fn test_complex_equality_dual() {
    // min re(z) + im(z) s.t. z == 1 + 2i: multipliers are [1, 1].
    let z = complex_variable(());
    let c = z.equals(&complex_constant(1.0, 2.0));
    let solution = Problem::minimize(&real(&z) + &imag(&z))
        .subject_to([c.clone()])
        .solve()
        .expect("solve failed");

    assert_float_eq!(optimal(&solution), 3.0, abs <= TOL);
    let dual = solution.dual_value(&c).expect("dual present").to_vec();
    assert_eq!(dual.len(), 2);
    assert_float_eq!(dual[0], 1.0, abs <= TOL);
    assert_float_eq!(dual[1], 1.0, abs <= TOL);
}

#[test]
fn test_deep_expression_solves() {
    // An odd number of negations: -z == 1 + 2i, so z = -1 - 2i.
    let z = complex_variable(());
    let mut e = z.clone();
    for _ in 0..10_001 {
        e = -e;
    }
    let solution = Problem::minimize(constant(0.0))
        .subject_to([e.equals(&complex_constant(1.0, 2.0))])
        .solve()
        .expect("solve failed");

    assert_float_eq!(optimal(&solution), 0.0, abs <= TOL);
    match solution.primal_value(&z) {
        Some(Value::Complex { re, im }) => {
            assert_float_eq!(re.as_scalar().unwrap(), -1.0, abs <= TOL);
            assert_float_eq!(im.as_scalar().unwrap(), -2.0, abs <= TOL);
        }
        other => panic!("expected a complex value, got {:?}", other),
    }
}

#[test]
fn test_complex_inequality_not_dcp() {
    let z = complex_variable(2);
    let result = Problem::minimize(constant(0.0))
        .subject_to([z.geq(&constant(0.0))])
        .solve();
    assert!(matches!(result, Err(CvxError::NotDcp(_))));
}

#[test]
fn test_complex_parameter_deferred() {
    let z = complex_variable(2);
    let p = parameter_in(2, Domain::Complex);
    let result = Problem::minimize(constant(0.0))
        .subject_to([(&z * &p).equals(&constant(1.0))])
        .solve();
    assert!(matches!(result, Err(CvxError::Deferred(_))));
}
