//! What an attacker learns.
//!
//! Two strategies are modelled:
//!
//! - **Photon-number splitting** (BB84): the attacker keeps one photon of
//!   every multi-photon pulse in a quantum memory and measures it after the
//!   receiver's bases are made public.
//! - **Trojan horse** (SARG04): the attacker reads the receiver's basis
//!   choices by probing its apparatus and never touches the quantum channel.

use crate::core::errors::SimulationError;
use crate::encoding::{Basis, encode_message};
use crate::oracle::MeasurementOracle;
use crate::sampler::YieldFractions;
use rand::Rng;
use tracing::{debug, warn};

/// Measurement outcomes of a PNS attacker.
///
/// The stored photons are rebuilt from the sender's bits and bases (a
/// measured message cannot be read twice) and measured in the bases the
/// receiver later discloses.
pub fn pns_measurements<O, R>(
    oracle: &O,
    sender_bits: &[bool],
    sender_bases: &[Basis],
    disclosed_bases: &[Basis],
    rng: &mut R,
) -> Result<Vec<bool>, SimulationError>
where
    O: MeasurementOracle,
    R: Rng + ?Sized,
{
    let stored = encode_message(sender_bits, sender_bases)?;
    let results = oracle.measure_message(stored, disclosed_bases, rng)?;
    debug!(photons = results.len(), "PNS attacker measured stored photons");
    Ok(results)
}

/// Key obtained by a Trojan-horse attack on a SARG04 receiver.
///
/// SARG04 keeps exactly the positions where the receiver's guess was wrong,
/// so the sender's basis is the one the receiver did *not* use: a Z
/// measurement means the bit was 1, an X measurement means 0.
pub fn trojan_horse_key(
    receiver_bases: &[Basis],
    sifted_positions: &[usize],
) -> Result<Vec<bool>, SimulationError> {
    sifted_positions
        .iter()
        .map(|&i| {
            receiver_bases
                .get(i)
                .map(|basis| *basis == Basis::Rectilinear)
                .ok_or_else(|| SimulationError::PositionOutOfRange {
                    position: i,
                    len: receiver_bases.len(),
                })
        })
        .collect()
}

/// Outcome of comparing observed decoy yields against an honest-channel
/// baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoyVerdict {
    /// Observed decoy yield minus baseline decoy yield, signed.
    pub deviation: f64,
    /// Whether `deviation` exceeded the tolerance.
    pub attack_detected: bool,
}

/// Flags a PNS attack when the observed decoy yield departs from the honest
/// baseline by more than `tolerance`, in either direction.
///
/// A PNS attacker forwards only multi-photon pulses, so whichever intensity
/// is brighter becomes over-represented among detections. Decoys brighter
/// than the signal push the decoy yield up; dimmer decoys push it down.
pub fn assess_decoy_yields(
    observed: YieldFractions,
    baseline: YieldFractions,
    tolerance: f64,
) -> DecoyVerdict {
    let deviation = observed.decoy - baseline.decoy;
    let attack_detected = deviation.abs() > tolerance;
    if attack_detected {
        warn!(
            observed = observed.decoy,
            expected = baseline.decoy,
            "decoy yield anomaly: photon-number splitting suspected"
        );
    }
    DecoyVerdict {
        deviation,
        attack_detected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::DensityMatrixOracle;
    use crate::sifting::sift_bb84;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const Z: Basis = Basis::Rectilinear;
    const X: Basis = Basis::Diagonal;

    #[test]
    fn test_trojan_horse_rule() {
        let key = trojan_horse_key(&[Z, X, Z], &[0, 2]).unwrap();
        assert_eq!(key, vec![true, true]);
        let key = trojan_horse_key(&[Z, X, Z], &[1]).unwrap();
        assert_eq!(key, vec![false]);
    }

    #[test]
    fn test_trojan_horse_rejects_unknown_position() {
        assert!(matches!(
            trojan_horse_key(&[Z], &[3]),
            Err(SimulationError::PositionOutOfRange { position: 3, len: 1 })
        ));
    }

    #[test]
    fn test_pns_attacker_matches_sender_on_sifted_positions() {
        let mut rng = StdRng::seed_from_u64(21);
        let oracle = DensityMatrixOracle::new();
        let bits = crate::encoding::random_bits(200, &mut rng);
        let sender_bases = Basis::random_string(200, &mut rng);
        let receiver_bases = Basis::random_string(200, &mut rng);
        let eve = pns_measurements(&oracle, &bits, &sender_bases, &receiver_bases, &mut rng).unwrap();
        let eve_key = sift_bb84(&sender_bases, &receiver_bases, &eve).unwrap();
        let sender_key = sift_bb84(&sender_bases, &receiver_bases, &bits).unwrap();
        assert_eq!(eve_key, sender_key);
    }

    #[test]
    fn test_decoy_verdict() {
        let baseline = YieldFractions {
            decoy: 0.55,
            signal: 0.45,
        };
        let attacked = YieldFractions {
            decoy: 0.95,
            signal: 0.05,
        };
        let verdict = assess_decoy_yields(attacked, baseline, 0.1);
        assert!(verdict.attack_detected);
        assert!(verdict.deviation > 0.39);
        assert!(!assess_decoy_yields(baseline, baseline, 0.1).attack_detected);
    }

    #[test]
    fn test_decoy_verdict_dim_decoys() {
        let baseline = YieldFractions {
            decoy: 0.25,
            signal: 0.75,
        };
        let attacked = YieldFractions {
            decoy: 0.04,
            signal: 0.96,
        };
        let verdict = assess_decoy_yields(attacked, baseline, 0.1);
        assert!(verdict.attack_detected);
        assert!(verdict.deviation < -0.2);

        let close = YieldFractions {
            decoy: 0.2,
            signal: 0.8,
        };
        assert!(!assess_decoy_yields(close, baseline, 0.1).attack_detected);
    }
}
