//! Utility functions for single-qubit operators.
//!
//! This module contains helper functions for:
//! - Matrix operations (trace, outer product, adjoint).
//! - Completeness checks for measurements and channels.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Numerical tolerance used by every completeness and unitarity check.
pub const TOLERANCE: f64 = 1e-9;

/// Computes the trace of a matrix (sum of diagonal elements).
pub fn trace(matrix: &Array2<Complex64>) -> Complex64 {
    matrix.diag().sum()
}

/// Conjugate transpose.
pub fn adjoint(matrix: &Array2<Complex64>) -> Array2<Complex64> {
    matrix.t().mapv(|c| c.conj())
}

/// Computes the outer product $|u\rangle\langle v|$.
pub fn outer_product(u: &Array1<Complex64>, v: &Array1<Complex64>) -> Array2<Complex64> {
    let n = u.len();
    let m = v.len();
    Array2::from_shape_fn((n, m), |(i, j)| u[i] * v[j].conj())
}

/// Element-wise comparison within `TOLERANCE`.
pub fn approx_eq(a: &Array2<Complex64>, b: &Array2<Complex64>) -> bool {
    a.dim() == b.dim()
        && a
            .iter()
            .zip(b.iter())
            .all(|(x, y)| (*x - *y).norm() < TOLERANCE)
}

/// Checks $\sum_k K_k^\dagger K_k = I$ for a set of operators of size `dim`.
///
/// Shared by measurements (projectors) and channels (Kraus operators).
pub fn check_completeness(operators: &[Array2<Complex64>], dim: usize) -> bool {
    let mut sum = Array2::<Complex64>::zeros((dim, dim));
    for op in operators {
        if op.dim() != (dim, dim) {
            return false;
        }
        sum = sum + adjoint(op).dot(op);
    }
    approx_eq(&sum, &Array2::<Complex64>::eye(dim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_outer_product_projector() {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        let v = array![one, zero];
        let p = outer_product(&v, &v);
        assert_eq!(trace(&p), one);
        let complement = Array2::<Complex64>::eye(2) - &p;
        assert!(check_completeness(&[p, complement], 2));
    }

    #[test]
    fn test_incomplete_set_rejected() {
        let half = Complex64::new(0.5, 0.0);
        let op = Array2::from_elem((2, 2), half);
        assert!(!check_completeness(&[op], 2));
    }
}
