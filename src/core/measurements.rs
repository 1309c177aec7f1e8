use crate::core::errors::MeasurementError;
use crate::core::utils;
use ndarray::{Array1, Array2, array};
use num_complex::Complex64;

/// Projective two-outcome measurement on one qubit.
#[derive(Clone, Debug)]
pub struct Measurement {
    /// Projector for outcome 0 and outcome 1, in that order.
    pub operators: [Array2<Complex64>; 2],
}

impl Measurement {
    pub fn new(operators: [Array2<Complex64>; 2]) -> Result<Self, MeasurementError> {
        if operators.iter().any(|op| op.dim() != (2, 2)) {
            return Err(MeasurementError::InvalidDimensions);
        }

        if !utils::check_completeness(&operators, 2) {
            return Err(MeasurementError::NotComplete);
        }

        Ok(Self { operators })
    }

    fn from_eigenvectors(v0: Array1<Complex64>, v1: Array1<Complex64>) -> Measurement {
        Measurement {
            operators: [utils::outer_product(&v0, &v0), utils::outer_product(&v1, &v1)],
        }
    }

    /// Z basis (Computational) -> {|0>, |1>}.
    pub fn z_basis() -> Measurement {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        Self::from_eigenvectors(array![one, zero], array![zero, one])
    }

    /// X basis (Hadamard) -> {|+>, |->}.
    pub fn x_basis() -> Measurement {
        let s = Complex64::new(1.0 / 2.0_f64.sqrt(), 0.0);
        Self::from_eigenvectors(array![s, s], array![s, -s])
    }
}

/// Outcome of a single measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementResult {
    /// Index of the projector the state collapsed onto.
    pub index: usize,
}

impl MeasurementResult {
    pub fn bit(&self) -> bool {
        self.index == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_bases_are_complete() {
        assert!(Measurement::new(Measurement::z_basis().operators).is_ok());
        assert!(Measurement::new(Measurement::x_basis().operators).is_ok());
    }

    #[test]
    fn test_incomplete_measurement_rejected() {
        let z = Measurement::z_basis();
        let ops = [z.operators[0].clone(), z.operators[0].clone()];
        assert!(matches!(
            Measurement::new(ops),
            Err(MeasurementError::NotComplete)
        ));
    }
}
