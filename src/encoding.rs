//! Preparation of BB84 / SARG04 polarisation states.

use crate::core::errors::SimulationError;
use crate::core::{Gate, Measurement, QuantumState};
use rand::Rng;
use std::fmt;

/// Measurement / preparation basis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Basis {
    /// Z, {|0>, |1>}
    Rectilinear,
    /// X, {|+>, |->}
    Diagonal,
}

impl Basis {
    /// Uniformly random basis.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Basis::Diagonal
        } else {
            Basis::Rectilinear
        }
    }

    /// `n` uniformly random bases.
    pub fn random_string<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<Basis> {
        (0..n).map(|_| Basis::random(rng)).collect()
    }

    pub fn measurement(&self) -> Measurement {
        match self {
            Basis::Rectilinear => Measurement::z_basis(),
            Basis::Diagonal => Measurement::x_basis(),
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::Rectilinear => write!(f, "Z"),
            Basis::Diagonal => write!(f, "X"),
        }
    }
}

/// `n` uniformly random bits.
pub fn random_bits<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<bool> {
    (0..n).map(|_| rng.random_bool(0.5)).collect()
}

/// One of the four BB84 states. Its `Display` form ("0", "1", "+", "-") is
/// the symbol used in SARG04 set announcements.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PolarizationState {
    Zero,
    One,
    Plus,
    Minus,
}

impl PolarizationState {
    pub fn basis(&self) -> Basis {
        match self {
            PolarizationState::Zero | PolarizationState::One => Basis::Rectilinear,
            PolarizationState::Plus | PolarizationState::Minus => Basis::Diagonal,
        }
    }

    /// The eigenvalue this state yields when measured in its own basis.
    pub fn eigenvalue(&self) -> bool {
        matches!(self, PolarizationState::One | PolarizationState::Minus)
    }

    /// Inverse of the eigenvalue map: the state a receiver infers from a
    /// basis and a measured bit.
    pub fn from_outcome(basis: Basis, bit: bool) -> Self {
        match (basis, bit) {
            (Basis::Rectilinear, false) => PolarizationState::Zero,
            (Basis::Rectilinear, true) => PolarizationState::One,
            (Basis::Diagonal, false) => PolarizationState::Plus,
            (Basis::Diagonal, true) => PolarizationState::Minus,
        }
    }

    /// Builds the physical qubit from |0>.
    pub fn prepare(&self) -> QuantumState {
        let mut state = QuantumState::new();
        if self.eigenvalue() {
            state.apply(&Gate::x());
        }
        if self.basis() == Basis::Diagonal {
            state.apply(&Gate::h());
        }
        state
    }
}

impl fmt::Display for PolarizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            PolarizationState::Zero => "0",
            PolarizationState::One => "1",
            PolarizationState::Plus => "+",
            PolarizationState::Minus => "-",
        };
        f.write_str(symbol)
    }
}

/// A train of prepared qubits in flight.
///
/// Not `Clone`: measuring consumes it. A second, independent measurement
/// needs a fresh encoding of the classical bits.
#[derive(Debug)]
pub struct EncodedMessage {
    states: Vec<PolarizationState>,
}

impl EncodedMessage {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub(crate) fn into_states(self) -> Vec<PolarizationState> {
        self.states
    }
}

/// BB84 encoding table.
///
/// | basis | bit | state |
/// |-------|-----|-------|
/// | Z     | 0   | \|0>  |
/// | Z     | 1   | \|1>  |
/// | X     | 0   | \|+>  |
/// | X     | 1   | \|->  |
pub fn encode_bb84(bit: bool, basis: Basis) -> PolarizationState {
    PolarizationState::from_outcome(basis, bit)
}

/// Encodes a whole BB84 bit string.
pub fn encode_message(bits: &[bool], bases: &[Basis]) -> Result<EncodedMessage, SimulationError> {
    if bits.len() != bases.len() {
        return Err(SimulationError::LengthMismatch {
            what: "sender bases",
            expected: bits.len(),
            got: bases.len(),
        });
    }

    let states = bits
        .iter()
        .zip(bases)
        .map(|(&bit, &basis)| encode_bb84(bit, basis))
        .collect();

    Ok(EncodedMessage { states })
}

/// SARG04 encoding: the bit selects the basis (0 -> Z, 1 -> X) and the state
/// within that basis is drawn uniformly.
pub fn encode_sarg04<R: Rng + ?Sized>(bit: bool, rng: &mut R) -> PolarizationState {
    let basis = if bit { Basis::Diagonal } else { Basis::Rectilinear };
    PolarizationState::from_outcome(basis, rng.random_bool(0.5))
}

/// Encodes a SARG04 bit string, returning the qubits and the prepared
/// symbols the sender keeps for the set announcement.
pub fn encode_sarg04_message<R: Rng + ?Sized>(
    bits: &[bool],
    rng: &mut R,
) -> (EncodedMessage, Vec<PolarizationState>) {
    let symbols: Vec<PolarizationState> = bits.iter().map(|&b| encode_sarg04(b, rng)).collect();
    let message = EncodedMessage {
        states: symbols.clone(),
    };
    (message, symbols)
}

/// Publicly announced pair of non-orthogonal states, one from each basis,
/// one of which is the state actually sent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StateSet {
    pub rectilinear: PolarizationState,
    pub diagonal: PolarizationState,
}

impl StateSet {
    /// Pairs the sent state with a uniformly random state of the other basis.
    pub fn announce<R: Rng + ?Sized>(sent: PolarizationState, rng: &mut R) -> Self {
        let partner = rng.random_bool(0.5);
        match sent.basis() {
            Basis::Rectilinear => StateSet {
                rectilinear: sent,
                diagonal: PolarizationState::from_outcome(Basis::Diagonal, partner),
            },
            Basis::Diagonal => StateSet {
                rectilinear: PolarizationState::from_outcome(Basis::Rectilinear, partner),
                diagonal: sent,
            },
        }
    }

    pub fn contains(&self, state: PolarizationState) -> bool {
        self.rectilinear == state || self.diagonal == state
    }

    /// The set member lying in `basis`.
    pub fn member_in(&self, basis: Basis) -> PolarizationState {
        match basis {
            Basis::Rectilinear => self.rectilinear,
            Basis::Diagonal => self.diagonal,
        }
    }
}

impl fmt::Display for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.rectilinear, self.diagonal)
    }
}

/// Set announcement for every prepared symbol.
pub fn sets_sifting<R: Rng + ?Sized>(symbols: &[PolarizationState], rng: &mut R) -> Vec<StateSet> {
    symbols.iter().map(|&s| StateSet::announce(s, rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_bb84_table() {
        assert_eq!(encode_bb84(false, Basis::Rectilinear), PolarizationState::Zero);
        assert_eq!(encode_bb84(true, Basis::Rectilinear), PolarizationState::One);
        assert_eq!(encode_bb84(false, Basis::Diagonal), PolarizationState::Plus);
        assert_eq!(encode_bb84(true, Basis::Diagonal), PolarizationState::Minus);
    }

    #[test]
    fn test_encode_message_length_mismatch() {
        let err = encode_message(&[true, false], &[Basis::Diagonal]).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::LengthMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_sarg04_bit_selects_basis() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let s0 = encode_sarg04(false, &mut rng);
            let s1 = encode_sarg04(true, &mut rng);
            assert_eq!(s0.basis(), Basis::Rectilinear);
            assert_eq!(s1.basis(), Basis::Diagonal);
            seen.insert(s0);
            seen.insert(s1);
        }
        assert_eq!(seen.len(), 4, "all four states should be drawn");
    }

    #[test]
    fn test_announced_set_contains_sent_state_and_spans_both_bases() {
        let mut rng = StdRng::seed_from_u64(5);
        let symbols = [
            PolarizationState::Zero,
            PolarizationState::One,
            PolarizationState::Plus,
            PolarizationState::Minus,
        ];
        for _ in 0..50 {
            for (set, sent) in sets_sifting(&symbols, &mut rng).iter().zip(symbols) {
                assert!(set.contains(sent));
                assert_eq!(set.rectilinear.basis(), Basis::Rectilinear);
                assert_eq!(set.diagonal.basis(), Basis::Diagonal);
            }
        }
    }

    #[test]
    fn test_symbols() {
        let rendered: Vec<String> = [
            PolarizationState::Zero,
            PolarizationState::One,
            PolarizationState::Plus,
            PolarizationState::Minus,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(rendered, ["0", "1", "+", "-"]);
        assert_eq!(Basis::Rectilinear.to_string(), "Z");
    }
}
