//! BB84 over a lossy fibre under a photon-number-splitting attack.
//!
//! The attacker blocks every single-photon pulse, splits one photon off
//! each multi-photon pulse into a quantum memory and forwards the rest over
//! a lossless line. Once the receiver announces its bases the attacker
//! measures its stored photons in the same bases, ending up with the
//! sender's sifted key without disturbing a single qubit.

use crate::config::SimulationConfig;
use crate::core::errors::SimulationError;
use crate::eavesdropper::pns_measurements;
use crate::encoding::{Basis, encode_message, random_bits};
use crate::fiber::{critical_length_km, expected_count, pns_raw_rate, surviving_count};
use crate::oracle::MeasurementOracle;
use crate::photon::{PhotonStatistics, Pulse};
use crate::sampler::{Sampler, draw_sample, qber};
use crate::sifting::sift_bb84;
use rand::Rng;
use tracing::{debug, info};

/// Fewest pulses that must reach the receiver for a run to be meaningful.
pub const MIN_SURVIVING_BITS: usize = 10;

/// Raw material of one BB84 exchange, before sifting.
#[derive(Debug, Clone)]
pub struct Bb84Transcript {
    pub sender_bits: Vec<bool>,
    pub sender_bases: Vec<Basis>,
    pub receiver_bases: Vec<Basis>,
    pub receiver_results: Vec<bool>,
}

/// Sender encodes `sender_bits` in random bases, receiver measures each
/// qubit in a random basis of its own.
pub fn exchange<O, R>(
    sender_bits: Vec<bool>,
    oracle: &O,
    rng: &mut R,
) -> Result<Bb84Transcript, SimulationError>
where
    O: MeasurementOracle,
    R: Rng + ?Sized,
{
    let n = sender_bits.len();
    let sender_bases = Basis::random_string(n, rng);
    let message = encode_message(&sender_bits, &sender_bases)?;

    let receiver_bases = Basis::random_string(n, rng);
    let receiver_results = oracle.measure_message(message, &receiver_bases, rng)?;

    Ok(Bb84Transcript {
        sender_bits,
        sender_bases,
        receiver_bases,
        receiver_results,
    })
}

/// Checks that enough pulses survived the channel.
pub(crate) fn ensure_survivors(stage: &'static str, count: usize) -> Result<(), SimulationError> {
    if count < MIN_SURVIVING_BITS {
        return Err(SimulationError::DegenerateRun { stage, count });
    }
    Ok(())
}

/// BB84 + PNS results
#[derive(Debug, Clone)]
pub struct PnsResult {
    /// Photon statistics of the signal pulses.
    pub statistics: PhotonStatistics,
    /// Fibre length beyond which the attack is invisible in the detection rate.
    pub critical_length_km: Option<f64>,
    /// Sent pulses that carried two or more photons.
    pub multi_photon_pulses: usize,
    /// Detection rate after the attack.
    pub raw_rate: f64,
    /// Pulses detected by the receiver.
    pub surviving: usize,
    /// Length of the sifted key before the error-estimation sample.
    pub sifted_length: usize,
    pub sender_key: Vec<bool>,
    pub receiver_key: Vec<bool>,
    pub eve_key: Vec<bool>,
    pub sender_sample: Vec<bool>,
    pub receiver_sample: Vec<bool>,
    pub eve_sample: Vec<bool>,
    /// Sender vs receiver error rate on the disclosed sample, in [0, 1].
    pub qber: f64,
}

/// Runs BB84 under a PNS attack.
///
/// `oracle` measures for the receiver; `attacker` measures the photons the
/// attacker held in memory, which never cross the fibre.
pub fn run<O, A, R>(
    config: &SimulationConfig,
    oracle: &O,
    attacker: &A,
    sampler: &Sampler,
    rng: &mut R,
) -> Result<PnsResult, SimulationError>
where
    O: MeasurementOracle,
    A: MeasurementOracle,
    R: Rng + ?Sized,
{
    let statistics = Pulse::new(config.mean_photon_number).statistics();
    let multi_photon_pulses = expected_count(statistics.multi_given_nonempty(), config.bits_sent);
    let raw_rate = pns_raw_rate(config.detector_efficiency, &statistics);
    let surviving = surviving_count(raw_rate, multi_photon_pulses);
    let critical_length_km = critical_length_km(config.attenuation_db_per_km, &statistics);

    info!(
        mu = statistics.mu,
        multi_photon_pulses,
        surviving,
        critical_length_km,
        "starting BB84 under PNS attack"
    );
    ensure_survivors("PNS-filtered channel", surviving)?;

    let transcript = exchange(random_bits(surviving, rng), oracle, rng)?;

    let eve_results = pns_measurements(
        attacker,
        &transcript.sender_bits,
        &transcript.sender_bases,
        &transcript.receiver_bases,
        rng,
    )?;

    let t = &transcript;
    let sender_key = sift_bb84(&t.sender_bases, &t.receiver_bases, &t.sender_bits)?;
    let receiver_key = sift_bb84(&t.sender_bases, &t.receiver_bases, &t.receiver_results)?;
    let eve_key = sift_bb84(&t.sender_bases, &t.receiver_bases, &eve_results)?;
    let sifted_length = sender_key.len();
    debug!(sifted_length, "sifting complete");

    let positions = sampler.positions(sifted_length, surviving, rng);
    let (sender_key, sender_sample) = draw_sample(sender_key, &positions);
    let (receiver_key, receiver_sample) = draw_sample(receiver_key, &positions);
    let (eve_key, eve_sample) = draw_sample(eve_key, &positions);

    let qber = qber(&sender_sample, &receiver_sample)?;
    info!(
        sifted_length,
        final_length = sender_key.len(),
        qber,
        "BB84 PNS run finished"
    );

    Ok(PnsResult {
        statistics,
        critical_length_km,
        multi_photon_pulses,
        raw_rate,
        surviving,
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

    #[test]
    fn test_exchange_shapes() {
        let mut rng = StdRng::seed_from_u64(1);
        let oracle = DensityMatrixOracle::new();
        let t = exchange(random_bits(40, &mut rng), &oracle, &mut rng).unwrap();
        assert_eq!(t.sender_bases.len(), 40);
        assert_eq!(t.receiver_bases.len(), 40);
        assert_eq!(t.receiver_results.len(), 40);
        for i in 0..40 {
            if t.sender_bases[i] == t.receiver_bases[i] {
                assert_eq!(t.sender_bits[i], t.receiver_results[i]);
            }
        }
    }

    #[test]
    fn test_reference_counts() {
        // mu = 0.1, eta = 0.1, n = 1e6
        let mut rng = StdRng::seed_from_u64(2);
        let oracle = DensityMatrixOracle::new();
        let config = SimulationConfig::default();
        let r = run(&config, &oracle, &oracle, &Sampler::new(), &mut rng).unwrap();
        assert_eq!(r.multi_photon_pulses, 49_167);
        assert_eq!(r.surviving, 23);
        assert_eq!(r.qber, 0.0);
        assert_eq!(r.eve_key, r.sender_key);
        assert_eq!(r.receiver_key, r.sender_key);
        assert_eq!(r.sender_key.len() + r.sender_sample.len(), r.sifted_length);
    }

    #[test]
    fn test_too_few_survivors_is_degenerate() {
        let mut rng = StdRng::seed_from_u64(3);
        let oracle = DensityMatrixOracle::new();
        let config = SimulationConfig {
            bits_sent: 1_000,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            run(&config, &oracle, &oracle, &Sampler::new(), &mut rng),
            Err(SimulationError::DegenerateRun { count: 0, .. })
        ));
    }
}
