//! Finite difference Jacobian computation.

use nalgebra::{DMatrix, DVector};

/// Compute Jacobian using forward finite differences.
///
/// For each column j, perturbs x[j] by `epsilon * max(|x[j]|, 1)` and
/// computes (f(x+e) - f(x))/e.
pub fn finite_difference_jacobian<F, E>(x: &DVector<f64>, mut f: F, epsilon: f64) -> Result<DMatrix<f64>, E>
where
    F: FnMut(&DVector<f64>) -> Result<DVector<f64>, E>,
{
    let n = x.len();
    let f_x = f(x)?;
    let m = f_x.len();

    let mut jac = DMatrix::zeros(m, n);
    let mut x_perturbed = x.clone();

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);
        x_perturbed[j] = x[j] + dx;
        let f_perturbed = f(&x_perturbed)?;
        x_perturbed[j] = x[j];

        jac.set_column(j, &((f_perturbed - &f_x) / dx));
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_of_linear_map() {
        // f(x) = [2 x0 + x1, -3 x1]
        let f = |x: &DVector<f64>| -> Result<DVector<f64>, ()> {
            Ok(DVector::from_vec(vec![2.0 * x[0] + x[1], -3.0 * x[1]]))
        };
        let x = DVector::from_vec(vec![1.0, 5.0]);
        let jac = finite_difference_jacobian(&x, f, 1e-7).unwrap();
        assert!((jac[(0, 0)] - 2.0).abs() < 1e-6);
        assert!((jac[(0, 1)] - 1.0).abs() < 1e-6);
        assert!(jac[(1, 0)].abs() < 1e-6);
        assert!((jac[(1, 1)] + 3.0).abs() < 1e-6);
    }

    #[test]
    fn jacobian_of_exponential() {
        let f = |x: &DVector<f64>| -> Result<DVector<f64>, ()> { Ok(x.map(f64::exp)) };
        let x = DVector::from_vec(vec![0.0, 1.0]);
        let jac = finite_difference_jacobian(&x, f, 1e-7).unwrap();
        assert!((jac[(0, 0)] - 1.0).abs() < 1e-5);
        assert!((jac[(1, 1)] - 1f64.exp()).abs() < 1e-5);
    }

    #[test]
    fn errors_propagate() {
        let f = |_: &DVector<f64>| -> Result<DVector<f64>, &'static str> { Err("boom") };
        assert_eq!(
            finite_difference_jacobian(&DVector::zeros(2), f, 1e-7).unwrap_err(),
            "boom"
        );
    }
}
