use crate::core::errors::GateError;
use crate::core::utils;
use ndarray::{Array2, arr2};
use num_complex::Complex64;

/// A single-qubit unitary.
///
/// State preparation only ever needs the Pauli-X and Hadamard gates, but any
/// 2x2 unitary is accepted.
#[derive(Clone, Debug)]
pub struct Gate {
    /// The unitary matrix of the gate.
    pub matrix: Array2<Complex64>,
}

impl Gate {
    /// Creates a new `Gate` from a unitary matrix.
    ///
    /// # Errors
    ///
    /// Returns a `GateError` if the matrix is not 2x2 or is not unitary.
    pub fn new(matrix: Array2<Complex64>) -> Result<Self, GateError> {
        let (rows, cols) = matrix.dim();

        if (rows, cols) != (2, 2) {
            return Err(GateError::InvalidDimensions { rows, cols });
        }

        let product = matrix.dot(&utils::adjoint(&matrix));
        if !utils::approx_eq(&product, &Array2::<Complex64>::eye(2)) {
            return Err(GateError::NonUnitary);
        }

        Ok(Self { matrix })
    }

    /// Pauli-X (bit flip).
    pub fn x() -> Self {
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        Self {
            matrix: arr2(&[[zero, one], [one, zero]]),
        }
    }

    /// Hadamard, maps the Z basis onto the X basis.
    pub fn h() -> Self {
        let s = Complex64::new(1.0 / 2.0_f64.sqrt(), 0.0);
        Self {
            matrix: arr2(&[[s, s], [s, -s]]),
        }
    }
}
