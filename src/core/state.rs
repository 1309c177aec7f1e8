use crate::core::channels::QuantumChannel;
use crate::core::errors::StateError;
use crate::core::gates::Gate;
use crate::core::measurements::{Measurement, MeasurementResult};
use crate::core::utils::{adjoint, trace};
use ndarray::Array2;
use num_complex::Complex64;
use rand::Rng;

/// A single qubit held as a 2x2 density matrix.
///
/// Every photon polarisation prepared by the sender lives in one of these
/// until it is measured.
#[derive(Clone, Debug)]
pub struct QuantumState {
    pub density_matrix: Array2<Complex64>,
}

impl Default for QuantumState {
    fn default() -> Self {
        Self::new()
    }
}

impl QuantumState {
    /// Creates a new quantum state initialized to |0>.
    pub fn new() -> Self {
        let mut density_matrix = Array2::<Complex64>::zeros((2, 2));
        density_matrix[[0, 0]] = Complex64::new(1.0, 0.0);

        Self { density_matrix }
    }

    /// Checks that the density matrix still has unit trace.
    pub fn is_valid(&self) -> Result<(), StateError> {
        let tr = trace(&self.density_matrix);
        if (tr - Complex64::new(1.0, 0.0)).norm() > 1e-9 {
            return Err(StateError::InvalidTrace(tr));
        }
        Ok(())
    }

    /// rho -> U rho U†
    pub fn apply(&mut self, gate: &Gate) {
        let u = &gate.matrix;
        self.density_matrix = u.dot(&self.density_matrix).dot(&adjoint(u));
    }

    /// rho -> sum_k K rho K†
    pub fn apply_channel(&mut self, channel: &QuantumChannel) {
        let mut new_rho = Array2::<Complex64>::zeros((2, 2));

        for k in &channel.kraus_ops {
            new_rho = new_rho + k.dot(&self.density_matrix).dot(&adjoint(k));
        }

        self.density_matrix = new_rho;
    }

    /// Born-rule probability of each outcome of `measurement`.
    pub fn probabilities(&self, measurement: &Measurement) -> [f64; 2] {
        let mut probs = [0.0; 2];
        for (p, op) in probs.iter_mut().zip(measurement.operators.iter()) {
            *p = trace(&op.dot(&self.density_matrix).dot(&adjoint(op))).re.max(0.0);
        }

        // Renormalize against floating point drift
        let sum: f64 = probs.iter().sum();
        if sum > 0.0 {
            for p in &mut probs {
                *p /= sum;
            }
        }
        probs
    }

    /// Physical measurement which collapses the state irretrievably.
    pub fn measure<R: Rng + ?Sized>(
        &mut self,
        measurement: &Measurement,
        rng: &mut R,
    ) -> Result<MeasurementResult, StateError> {
        let probs = self.probabilities(measurement);

        let roll: f64 = rng.random();
        let outcome = if roll < probs[0] { 0 } else { 1 };
        let p_selected = probs[outcome];

        if p_selected <= 1e-12 {
            return Err(StateError::ImpossibleOutcome { outcome });
        }

        // rho' = (M_k * rho * M_k†) / p_k
        let m_k = &measurement.operators[outcome];
        let numerator = m_k.dot(&self.density_matrix).dot(&adjoint(m_k));
        self.density_matrix = numerator.mapv(|val| val / Complex64::new(p_selected, 0.0));

        Ok(MeasurementResult { index: outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_plus_state_is_unbiased_in_z() {
        let mut state = QuantumState::new();
        state.apply(&Gate::h());
        let probs = state.probabilities(&Measurement::z_basis());
        assert_relative_eq!(probs[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(probs[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_minus_state_is_eigenstate_of_x() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut state = QuantumState::new();
            state.apply(&Gate::x());
            state.apply(&Gate::h());
            let res = state.measure(&Measurement::x_basis(), &mut rng).unwrap();
            assert_eq!(res.index, 1);
        }
    }

    #[test]
    fn test_measurement_collapses_state() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut state = QuantumState::new();
        state.apply(&Gate::h());
        let first = state.measure(&Measurement::z_basis(), &mut rng).unwrap();
        for _ in 0..10 {
            let again = state.measure(&Measurement::z_basis(), &mut rng).unwrap();
            assert_eq!(first, again);
        }
        assert!(state.is_valid().is_ok());
    }

    #[test]
    fn test_full_depolarization_gives_mixed_state() {
        let mut state = QuantumState::new();
        state.apply_channel(&QuantumChannel::depolarizing(1.0).unwrap());
        let probs = state.probabilities(&Measurement::z_basis());
        assert_relative_eq!(probs[0], 0.5, epsilon = 1e-12);
        assert!(state.is_valid().is_ok());
    }
}
