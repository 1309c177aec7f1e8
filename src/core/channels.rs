use crate::core::errors::ChannelError;
use crate::core::utils;
use ndarray::{Array2, array};
use num_complex::Complex64;

/// A single-qubit CPTP map given by its Kraus operators.
#[derive(Clone, Debug)]
pub struct QuantumChannel {
    pub kraus_ops: Vec<Array2<Complex64>>,
}

impl QuantumChannel {
    pub fn new(kraus_ops: Vec<Array2<Complex64>>) -> Result<Self, ChannelError> {
        if kraus_ops.is_empty() {
            return Err(ChannelError::Empty);
        }

        if kraus_ops.iter().any(|op| op.dim() != (2, 2)) {
            return Err(ChannelError::InvalidDimensions);
        }

        if !utils::check_completeness(&kraus_ops, 2) {
            return Err(ChannelError::NotComplete);
        }

        Ok(Self { kraus_ops })
    }

    /// Bit flip: X with probability `p`.
    pub fn bit_flip(p: f64) -> Result<QuantumChannel, ChannelError> {
        validate_prob(p)?;
        QuantumChannel::pauli_mixture(&[(1.0 - p, Pauli::I), (p, Pauli::X)])
    }

    /// Phase flip: Z with probability `p`.
    pub fn phase_flip(p: f64) -> Result<QuantumChannel, ChannelError> {
        validate_prob(p)?;
        QuantumChannel::pauli_mixture(&[(1.0 - p, Pauli::I), (p, Pauli::Z)])
    }

    /// Depolarizing Channel: the qubit is replaced by the maximally mixed
    /// state with probability p.
    pub fn depolarizing(p: f64) -> Result<QuantumChannel, ChannelError> {
        validate_prob(p)?;
        QuantumChannel::pauli_mixture(&[
            (1.0 - 0.75 * p, Pauli::I),
            (p / 4.0, Pauli::X),
            (p / 4.0, Pauli::Y),
            (p / 4.0, Pauli::Z),
        ])
    }

    /// Applies each Pauli with the paired probability; Kraus ops are
    /// `sqrt(w) * P`.
    fn pauli_mixture(terms: &[(f64, Pauli)]) -> Result<QuantumChannel, ChannelError> {
        let kraus_ops = terms
            .iter()
            .map(|&(w, pauli)| pauli.matrix().mapv(|c| c * w.sqrt()))
            .collect();
        QuantumChannel::new(kraus_ops)
    }
}

#[derive(Clone, Copy)]
enum Pauli {
    I,
    X,
    Y,
    Z,
}

impl Pauli {
    fn matrix(self) -> Array2<Complex64> {
        let o = Complex64::new(0.0, 0.0);
        let l = Complex64::new(1.0, 0.0);
        let i = Complex64::new(0.0, 1.0);
        match self {
            Pauli::I => array![[l, o], [o, l]],
            Pauli::X => array![[o, l], [l, o]],
            Pauli::Y => array![[o, -i], [i, o]],
            Pauli::Z => array![[l, o], [o, -l]],
        }
    }
}

/// Validate probability parameter
fn validate_prob(p: f64) -> Result<(), ChannelError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(ChannelError::InvalidProbability(p));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_channels_trace_preserving() {
        for p in [0.0, 0.1, 0.5, 1.0] {
            assert!(QuantumChannel::bit_flip(p).is_ok());
            assert!(QuantumChannel::phase_flip(p).is_ok());
            assert!(QuantumChannel::depolarizing(p).is_ok());
        }
    }

    #[test]
    fn test_invalid_probability() {
        assert!(matches!(
            QuantumChannel::bit_flip(1.5),
            Err(ChannelError::InvalidProbability(_))
        ));
        assert!(matches!(
            QuantumChannel::depolarizing(-0.1),
            Err(ChannelError::InvalidProbability(_))
        ));
    }

    #[test]
    fn test_depolarizing_weights() {
        let chan = QuantumChannel::depolarizing(0.4).unwrap();
        assert_eq!(chan.kraus_ops.len(), 4);
        assert!((chan.kraus_ops[1][[0, 1]].re - 0.1f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_channel_rejected() {
        assert!(matches!(QuantumChannel::new(vec![]), Err(ChannelError::Empty)));
    }
}
