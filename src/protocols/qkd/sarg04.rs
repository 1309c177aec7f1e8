//! SARG04 over a lossy fibre with a Trojan-horse attack on the receiver.
//!
//! Instead of its basis the sender announces a pair of non-orthogonal
//! states, one of which it sent. The receiver keeps only the positions
//! where its own guess is *not* in the pair. The attacker probes the
//! receiver's apparatus to learn each measurement basis and needs nothing
//! else to reconstruct the key.

use crate::config::SimulationConfig;
use crate::core::errors::SimulationError;
use crate::eavesdropper::trojan_horse_key;
use crate::encoding::{Basis, StateSet, encode_sarg04_message, random_bits, sets_sifting};
use crate::fiber::{FiberLink, surviving_count};
use crate::oracle::MeasurementOracle;
use crate::protocols::qkd::bb84::ensure_survivors;
use crate::sampler::{Sampler, draw_sample, qber};
use crate::sifting::{sifted_key, states_guess};
use rand::Rng;
use tracing::{debug, info};

/// SARG04 + Trojan horse results
#[derive(Debug, Clone)]
pub struct TrojanHorseResult {
    pub link: FiberLink,
    pub raw_rate: f64,
    /// Pulses detected by the receiver.
    pub surviving: usize,
    /// Sets announced by the sender, one per detected pulse.
    pub sets: Vec<StateSet>,
    /// Measurement bases the attacker read off the receiver.
    pub receiver_bases: Vec<Basis>,
    /// Positions kept by set reconciliation.
    pub sifted_positions: Vec<usize>,
    pub sifted_length: usize,
    pub sender_key: Vec<bool>,
    pub receiver_key: Vec<bool>,
    pub eve_key: Vec<bool>,
    pub sender_sample: Vec<bool>,
    pub receiver_sample: Vec<bool>,
    pub eve_sample: Vec<bool>,
    pub qber: f64,
}

/// Runs SARG04 under a Trojan-horse attack. Needs `config.fiber_length_km`.
pub fn run<O, R>(
    config: &SimulationConfig,
    oracle: &O,
    sampler: &Sampler,
    rng: &mut R,
) -> Result<TrojanHorseResult, SimulationError>
where
    O: MeasurementOracle,
    R: Rng + ?Sized,
{
    let link = FiberLink::new(
        config.attenuation_db_per_km,
        config.required_fiber_length()?,
        config.detector_efficiency,
    );
    let raw_rate = link.raw_rate(config.mean_photon_number);
    let surviving = surviving_count(raw_rate, config.bits_sent);

    info!(
        length_km = link.length_km,
        loss_db = link.loss_db(),
        surviving,
        "starting SARG04 under Trojan-horse attack"
    );
    ensure_survivors("lossy fibre", surviving)?;

    let sender_bits = random_bits(surviving, rng);
    let (message, symbols) = encode_sarg04_message(&sender_bits, rng);
    let sets = sets_sifting(&symbols, rng);

    let receiver_bases = Basis::random_string(surviving, rng);
    let results = oracle.measure_message(message, &receiver_bases, rng)?;
    let guesses = states_guess(&receiver_bases, &results)?;

    let sifted = sifted_key(&sets, &guesses, &sender_bits)?;
    let eve_key = trojan_horse_key(&receiver_bases, &sifted.positions)?;
    let sifted_length = sifted.sender_key.len();
    debug!(sifted_length, "set reconciliation complete");

    let positions = sampler.positions(sifted_length, surviving, rng);
    let (sender_key, sender_sample) = draw_sample(sifted.sender_key, &positions);
    let (receiver_key, receiver_sample) = draw_sample(sifted.receiver_key, &positions);
    let (eve_key, eve_sample) = draw_sample(eve_key, &positions);

    let qber = qber(&sender_sample, &receiver_sample)?;
    info!(
        sifted_length,
        final_length = sender_key.len(),
        qber,
        "SARG04 run finished"
    );

    Ok(TrojanHorseResult {
        link,
        raw_rate,
        surviving,
        sets,
        receiver_bases,
        sifted_positions: sifted.positions,
        sifted_length,
        sender_key,
        receiver_key,
        eve_key,
        sender_sample,
        receiver_sample,
        eve_sample,
        qber,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::DensityMatrixOracle;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config_80km() -> SimulationConfig {
        SimulationConfig {
            fiber_length_km: Some(80.0),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_reference_count() {
        // eta * 10^(-2) * mu * n = 0.1 * 0.01 * 0.1 * 1e6
        let mut rng = StdRng::seed_from_u64(11);
        let r = run(&config_80km(), &DensityMatrixOracle::new(), &Sampler::new(), &mut rng).unwrap();
        assert_eq!(r.surviving, 100);
        assert_eq!(r.sets.len(), 100);
        assert_eq!(r.receiver_bases.len(), 100);
    }

    #[test]
    fn test_trojan_horse_recovers_whole_key() {
        let mut rng = StdRng::seed_from_u64(12);
        let r = run(&config_80km(), &DensityMatrixOracle::new(), &Sampler::new(), &mut rng).unwrap();
        assert_eq!(r.qber, 0.0);
        assert_eq!(r.receiver_key, r.sender_key);
        assert_eq!(r.eve_key, r.sender_key);
        assert_eq!(r.eve_sample, r.sender_sample);
        assert_eq!(r.sifted_positions.len(), r.sifted_length);
        assert_eq!(r.sender_key.len() + r.sender_sample.len(), r.sifted_length);
    }

    #[test]
    fn test_missing_length_is_rejected() {
        let mut rng = StdRng::seed_from_u64(13);
        let result = run(
            &SimulationConfig::default(),
            &DensityMatrixOracle::new(),
            &Sampler::new(),
            &mut rng,
        );
        assert!(matches!(
            result,
            Err(SimulationError::ParameterDomain {
                parameter: "fiber_length_km",
                ..
            })
        ));
    }

    #[test]
    fn test_long_fibre_is_degenerate() {
        let mut rng = StdRng::seed_from_u64(14);
        let config = SimulationConfig {
            fiber_length_km: Some(400.0),
            ..SimulationConfig::default()
        };
        assert!(matches!(
            run(&config, &DensityMatrixOracle::new(), &Sampler::new(), &mut rng),
            Err(SimulationError::DegenerateRun { .. })
        ));
    }
}
