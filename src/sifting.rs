//! Basis / set reconciliation between the legitimate parties.

use crate::core::errors::SimulationError;
use crate::encoding::{Basis, PolarizationState, StateSet};
use std::fmt;

/// One bit of a decoy-state sifted key, tagged by the pulse type it came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KeyEntry {
    Signal(bool),
    Decoy(bool),
}

impl KeyEntry {
    pub fn bit(&self) -> bool {
        match *self {
            KeyEntry::Signal(b) | KeyEntry::Decoy(b) => b,
        }
    }

    pub fn is_decoy(&self) -> bool {
        matches!(self, KeyEntry::Decoy(_))
    }

    pub fn tag(bit: bool, decoy: bool) -> Self {
        if decoy {
            KeyEntry::Decoy(bit)
        } else {
            KeyEntry::Signal(bit)
        }
    }
}

impl fmt::Display for KeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyEntry::Signal(b) => write!(f, "{}", u8::from(*b)),
            KeyEntry::Decoy(b) => write!(f, "d{}", u8::from(*b)),
        }
    }
}

fn check_len(what: &'static str, expected: usize, got: usize) -> Result<(), SimulationError> {
    if expected != got {
        return Err(SimulationError::LengthMismatch {
            what,
            expected,
            got,
        });
    }
    Ok(())
}

/// Indices where both parties used the same basis.
pub fn matching_positions(
    sender_bases: &[Basis],
    receiver_bases: &[Basis],
) -> Result<Vec<usize>, SimulationError> {
    check_len("receiver bases", sender_bases.len(), receiver_bases.len())?;
    Ok(sender_bases
        .iter()
        .zip(receiver_bases)
        .enumerate()
        .filter_map(|(i, (a, b))| (a == b).then_some(i))
        .collect())
}

/// BB84 sifting: keeps `bits[i]` wherever the bases agree.
pub fn sift_bb84(
    sender_bases: &[Basis],
    receiver_bases: &[Basis],
    bits: &[bool],
) -> Result<Vec<bool>, SimulationError> {
    check_len("bits", sender_bases.len(), bits.len())?;
    let kept = matching_positions(sender_bases, receiver_bases)?;
    Ok(kept.into_iter().map(|i| bits[i]).collect())
}

/// BB84 sifting for the decoy-state variant: as [`sift_bb84`], but bits at
/// positions flagged in `decoy_mask` are tagged as [`KeyEntry::Decoy`].
pub fn sift_decoy(
    sender_bases: &[Basis],
    receiver_bases: &[Basis],
    bits: &[bool],
    decoy_mask: &[bool],
) -> Result<Vec<KeyEntry>, SimulationError> {
    check_len("bits", sender_bases.len(), bits.len())?;
    check_len("decoy mask", sender_bases.len(), decoy_mask.len())?;
    let kept = matching_positions(sender_bases, receiver_bases)?;
    Ok(kept
        .into_iter()
        .map(|i| KeyEntry::tag(bits[i], decoy_mask[i]))
        .collect())
}

/// Drops decoy entries, leaving the candidate secret key.
pub fn key_signal_states(key: &[KeyEntry]) -> Vec<bool> {
    key.iter()
        .filter_map(|e| match e {
            KeyEntry::Signal(b) => Some(*b),
            KeyEntry::Decoy(_) => None,
        })
        .collect()
}

/// SARG04: the state the receiver would have seen had it guessed the
/// basis right.
///
/// | basis | bit | guess |
/// |-------|-----|-------|
/// | Z     | 0   | 0     |
/// | Z     | 1   | 1     |
/// | X     | 0   | +     |
/// | X     | 1   | -     |
pub fn states_guess(
    bases: &[Basis],
    results: &[bool],
) -> Result<Vec<PolarizationState>, SimulationError> {
    check_len("measurement results", bases.len(), results.len())?;
    Ok(bases
        .iter()
        .zip(results)
        .map(|(&basis, &bit)| PolarizationState::from_outcome(basis, bit))
        .collect())
}

/// Bit the receiver can infer from a guess that is *not* in the announced
/// set. `None` when the guess is in the set and the outcome is ambiguous.
pub fn disambiguate(guess: PolarizationState, set: &StateSet) -> Option<bool> {
    if set.contains(guess) {
        return None;
    }

    // The set member sharing the guess's basis is orthogonal to it, so the
    // sender must have sent the other member.
    match (guess, set.member_in(guess.basis())) {
        (PolarizationState::Zero, PolarizationState::One) => Some(true),
        (PolarizationState::One, PolarizationState::Zero) => Some(true),
        (PolarizationState::Plus, PolarizationState::Minus) => Some(false),
        (PolarizationState::Minus, PolarizationState::Plus) => Some(false),
        _ => None,
    }
}

/// Result of SARG04 set reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SargSifted {
    /// Bits inferred by the receiver.
    pub receiver_key: Vec<bool>,
    /// Sender's original bits at the same positions.
    pub sender_key: Vec<bool>,
    /// Positions kept, publicly confirmed by the receiver.
    pub positions: Vec<usize>,
}

/// SARG04 reconciliation of the receiver's guesses against the announced sets.
pub fn sifted_key(
    sets: &[StateSet],
    guesses: &[PolarizationState],
    sender_bits: &[bool],
) -> Result<SargSifted, SimulationError> {
    check_len("receiver guesses", sets.len(), guesses.len())?;
    check_len("sender bits", sets.len(), sender_bits.len())?;

    let mut sifted = SargSifted {
        receiver_key: Vec::new(),
        sender_key: Vec::new(),
        positions: Vec::new(),
    };

    for (i, (set, &guess)) in sets.iter().zip(guesses).enumerate() {
        if let Some(bit) = disambiguate(guess, set) {
            sifted.receiver_key.push(bit);
            sifted.sender_key.push(sender_bits[i]);
            sifted.positions.push(i);
        }
    }

    Ok(sifted)
}
