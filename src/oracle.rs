//! Measurement of prepared qubits.
//!
//! The protocol engine never looks inside a qubit; it hands an
//! [`EncodedMessage`] and a basis string to a [`MeasurementOracle`] and gets
//! classical bits back.

use crate::core::QuantumChannel;
use crate::core::errors::SimulationError;
use crate::encoding::{Basis, EncodedMessage, PolarizationState};
use rand::Rng;

/// Born-rule measurement of single qubits.
///
/// Contract: a state measured in its own basis yields its eigenvalue with
/// certainty; a state measured in the conjugate basis yields 0 or 1 with
/// probability 1/2, independently per call.
pub trait MeasurementOracle {
    fn measure<R: Rng + ?Sized>(
        &self,
        state: PolarizationState,
        basis: Basis,
        rng: &mut R,
    ) -> Result<bool, SimulationError>;

    /// Measures every qubit of `message` in the matching entry of `bases`.
    /// The message is consumed.
    fn measure_message<R: Rng + ?Sized>(
        &self,
        message: EncodedMessage,
        bases: &[Basis],
        rng: &mut R,
    ) -> Result<Vec<bool>, SimulationError> {
        if message.len() != bases.len() {
            return Err(SimulationError::LengthMismatch {
                what: "measurement bases",
                expected: message.len(),
                got: bases.len(),
            });
        }

        message
            .into_states()
            .into_iter()
            .zip(bases)
            .map(|(state, &basis)| self.measure(state, basis, rng))
            .collect()
    }
}

/// Oracle backed by the density-matrix qubit simulator, with optional
/// in-transit noise.
#[derive(Debug, Clone)]
pub struct DensityMatrixOracle {
    channel: Option<QuantumChannel>,
}

impl Default for DensityMatrixOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl DensityMatrixOracle {
    /// Noise-free oracle.
    pub fn new() -> Self {
        Self { channel: None }
    }

    /// Sets the channel every qubit passes through before measurement.
    pub fn with_channel(mut self, channel: QuantumChannel) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn channel(&self) -> Option<&QuantumChannel> {
        self.channel.as_ref()
    }
}

impl MeasurementOracle for DensityMatrixOracle {
    fn measure<R: Rng + ?Sized>(
        &self,
        state: PolarizationState,
        basis: Basis,
        rng: &mut R,
    ) -> Result<bool, SimulationError> {
        let mut qubit = state.prepare();

        if let Some(chan) = &self.channel {
            qubit.apply_channel(chan);
        }

        let result = qubit.measure(&basis.measurement(), rng)?;
        Ok(result.bit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_message;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const ALL_STATES: [PolarizationState; 4] = [
        PolarizationState::Zero,
        PolarizationState::One,
        PolarizationState::Plus,
        PolarizationState::Minus,
    ];

    #[test]
    fn test_eigenstates_are_deterministic() {
        let oracle = DensityMatrixOracle::new();
        let mut rng = StdRng::seed_from_u64(1);
        for state in ALL_STATES {
            for _ in 0..20 {
                let bit = oracle.measure(state, state.basis(), &mut rng).unwrap();
                assert_eq!(bit, state.eigenvalue());
            }
        }
    }

    #[test]
    fn test_conjugate_basis_is_fair_coin() {
        let oracle = DensityMatrixOracle::new();
        let mut rng = StdRng::seed_from_u64(2);
        let shots = 4000;
        for state in ALL_STATES {
            let conjugate = match state.basis() {
                Basis::Rectilinear => Basis::Diagonal,
                Basis::Diagonal => Basis::Rectilinear,
            };
            let ones = (0..shots)
                .filter(|_| oracle.measure(state, conjugate, &mut rng).unwrap())
                .count();
            let ratio = ones as f64 / shots as f64;
            assert!((ratio - 0.5).abs() < 0.05, "{state}: ratio {ratio}");
        }
    }

    #[test]
    fn test_full_bit_flip_channel_inverts_z_outcomes() {
        let oracle = DensityMatrixOracle::new().with_channel(QuantumChannel::bit_flip(1.0).unwrap());
        let mut rng = StdRng::seed_from_u64(3);
        assert!(oracle.measure(PolarizationState::Zero, Basis::Rectilinear, &mut rng).unwrap());
        assert!(!oracle.measure(PolarizationState::One, Basis::Rectilinear, &mut rng).unwrap());
    }

    #[test]
    fn test_measure_message_checks_lengths() {
        let oracle = DensityMatrixOracle::new();
        let mut rng = StdRng::seed_from_u64(4);
        let message = encode_message(&[true, false], &[Basis::Rectilinear, Basis::Diagonal]).unwrap();
        let err = oracle
            .measure_message(message, &[Basis::Rectilinear], &mut rng)
            .unwrap_err();
        assert!(matches!(err, SimulationError::LengthMismatch { .. }));
    }
}
