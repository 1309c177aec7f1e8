//! Decoy-state BB84: detecting a PNS attack from detection yields.
//!
//! The sender randomly interleaves signal pulses (intensity μ) with decoy
//! pulses of a different intensity (μ_decoy) and reveals which positions were
//! decoys only after sifting. An honest fibre attenuates both kinds alike,
//! while a PNS attacker only forwards multi-photon pulses, so the brighter
//! kind takes a disproportionate share of the detections. The decoy yield
//! rises when decoys are brighter than the signal and falls when they are
//! dimmer.
//!
//! Two branches are simulated with the same parameters: one where the
//! attacker is present, one over the honest fibre. Their decoy yields are
//! then compared.

use crate::config::SimulationConfig;
use crate::core::errors::SimulationError;
use crate::eavesdropper::{DecoyVerdict, assess_decoy_yields, pns_measurements};
use crate::fiber::{critical_attenuation_db, expected_count, honest_raw_rate, pns_raw_rate, surviving_count};
use crate::oracle::MeasurementOracle;
use crate::photon::{PhotonStatistics, Pulse};
use crate::protocols::qkd::bb84::{Bb84Transcript, ensure_survivors, exchange};
use crate::sampler::{Sampler, YieldFractions, draw_sample, qber, yield_decoy};
use crate::sifting::{KeyEntry, key_signal_states, sift_decoy};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

/// Sender's pulse train: `surviving_signal` signal entries and
/// `surviving_decoy` decoy entries with random bits, shuffled together.
pub fn tagged_pulse_train<R: Rng + ?Sized>(
    surviving_signal: usize,
    surviving_decoy: usize,
    rng: &mut R,
) -> Vec<KeyEntry> {
    let mut train = Vec::with_capacity(surviving_signal + surviving_decoy);
    train.extend((0..surviving_signal).map(|_| KeyEntry::Signal(rng.random_bool(0.5))));
    train.extend((0..surviving_decoy).map(|_| KeyEntry::Decoy(rng.random_bool(0.5))));
    train.shuffle(rng);
    train
}

/// Sifted, tagged keys of one branch.
struct TaggedExchange {
    transcript: Bb84Transcript,
    decoy_mask: Vec<bool>,
    sender_key: Vec<KeyEntry>,
    receiver_key: Vec<KeyEntry>,
}

fn tagged_exchange<O, R>(
    train: Vec<KeyEntry>,
    oracle: &O,
    rng: &mut R,
) -> Result<TaggedExchange, SimulationError>
where
    O: MeasurementOracle,
    R: Rng + ?Sized,
{
    let decoy_mask: Vec<bool> = train.iter().map(KeyEntry::is_decoy).collect();
    let bits: Vec<bool> = train.iter().map(KeyEntry::bit).collect();

    let transcript = exchange(bits, oracle, rng)?;
    let t = &transcript;
    let sender_key = sift_decoy(&t.sender_bases, &t.receiver_bases, &t.sender_bits, &decoy_mask)?;
    let receiver_key = sift_decoy(&t.sender_bases, &t.receiver_bases, &t.receiver_results, &decoy_mask)?;

    Ok(TaggedExchange {
        transcript,
        decoy_mask,
        sender_key,
        receiver_key,
    })
}

/// Pulses of each kind that reach the receiver in one branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchCounts {
    pub decoy: usize,
    pub signal: usize,
}

impl BranchCounts {
    pub fn total(&self) -> usize {
        self.decoy + self.signal
    }
}

/// Branch in which the PNS attacker is on the line.
#[derive(Debug, Clone)]
pub struct AttackBranch {
    pub surviving: BranchCounts,
    /// Length of the tagged sifted key before sampling.
    pub sifted_length: usize,
    /// Receiver's decoy/signal yield.
    pub yields: YieldFractions,
    /// Signal-only keys left after sampling.
    pub sender_key: Vec<bool>,
    pub receiver_key: Vec<bool>,
    pub eve_key: Vec<bool>,
    /// Tagged keys after sampling, decoys included.
    pub sender_tagged_key: Vec<KeyEntry>,
    pub sender_sample: Vec<KeyEntry>,
    pub receiver_sample: Vec<KeyEntry>,
    pub qber: f64,
}

/// Branch over the honest fibre.
#[derive(Debug, Clone)]
pub struct BaselineBranch {
    pub surviving: BranchCounts,
    /// Loss of the honest fibre in dB.
    pub loss_db: f64,
    pub sifted_length: usize,
    pub yields: YieldFractions,
}

/// Decoy-state results
#[derive(Debug, Clone)]
pub struct DecoyResult {
    pub signal_statistics: PhotonStatistics,
    pub decoy_statistics: PhotonStatistics,
    /// Pulses of each kind emitted by the sender.
    pub emitted: BranchCounts,
    pub attack: AttackBranch,
    pub baseline: BaselineBranch,
    pub verdict: DecoyVerdict,
}

/// Runs both decoy-state branches and compares their yields.
///
/// The honest fibre is `config.fiber_length_km` long when set; otherwise its
/// loss is the critical PNS attenuation of the signal pulses, the point
/// where the attack is invisible to a plain detection-rate check.
pub fn run<O, A, R>(
    config: &SimulationConfig,
    oracle: &O,
    attacker: &A,
    sampler: &Sampler,
    rng: &mut R,
) -> Result<DecoyResult, SimulationError>
where
    O: MeasurementOracle,
    A: MeasurementOracle,
    R: Rng + ?Sized,
{
    let eta = config.detector_efficiency;
    let signal_statistics = Pulse::new(config.mean_photon_number).statistics();
    let decoy_statistics = Pulse::new(config.decoy.mean_photon_number).statistics();

    let emitted = BranchCounts {
        decoy: expected_count(config.decoy.decoy_fraction(), config.bits_sent),
        signal: expected_count(config.decoy.signal_fraction(), config.bits_sent),
    };

    let multi = BranchCounts {
        decoy: expected_count(decoy_statistics.multi_given_nonempty(), emitted.decoy),
        signal: expected_count(signal_statistics.multi_given_nonempty(), emitted.signal),
    };

    // Attack branch
    let attacked = BranchCounts {
        decoy: surviving_count(pns_raw_rate(eta, &decoy_statistics), multi.decoy),
        signal: surviving_count(pns_raw_rate(eta, &signal_statistics), multi.signal),
    };
    info!(
        decoy = attacked.decoy,
        signal = attacked.signal,
        "starting decoy-state BB84 under PNS attack"
    );
    ensure_survivors("PNS-filtered channel", attacked.total())?;

    let train = tagged_pulse_train(attacked.signal, attacked.decoy, rng);
    let tagged = tagged_exchange(train, oracle, rng)?;
    let t = &tagged.transcript;
    let eve_results = pns_measurements(attacker, &t.sender_bits, &t.sender_bases, &t.receiver_bases, rng)?;
    let eve_key = sift_decoy(&t.sender_bases, &t.receiver_bases, &eve_results, &tagged.decoy_mask)?;

    let yields = yield_decoy(&tagged.receiver_key)?;
    let sifted_length = tagged.sender_key.len();
    debug!(sifted_length, decoy_yield = yields.decoy, "attack branch sifted");

    let positions = sampler.positions(sifted_length, attacked.total(), rng);
    let (sender_tagged_key, sender_sample) = draw_sample(tagged.sender_key, &positions);
    let (receiver_tagged_key, receiver_sample) = draw_sample(tagged.receiver_key, &positions);
    let (eve_tagged_key, _) = draw_sample(eve_key, &positions);
    let qber = qber(&sender_sample, &receiver_sample)?;

    let attack = AttackBranch {
        surviving: attacked,
        sifted_length,
        yields,
        sender_key: key_signal_states(&sender_tagged_key),
        receiver_key: key_signal_states(&receiver_tagged_key),
        eve_key: key_signal_states(&eve_tagged_key),
        sender_tagged_key,
        sender_sample,
        receiver_sample,
        qber,
    };

    // Honest baseline
    let single = BranchCounts {
        decoy: expected_count(decoy_statistics.single_given_nonempty(), emitted.decoy),
        signal: expected_count(signal_statistics.single_given_nonempty(), emitted.signal),
    };
    let loss_db = match config.fiber_length_km {
        Some(l) => config.attenuation_db_per_km * l,
        None => critical_attenuation_db(&signal_statistics),
    };
    let honest = BranchCounts {
        decoy: surviving_count(
            honest_raw_rate(eta, loss_db, decoy_statistics.mu),
            multi.decoy + single.decoy,
        ),
        signal: surviving_count(
            honest_raw_rate(eta, loss_db, signal_statistics.mu),
            multi.signal + single.signal,
        ),
    };
    ensure_survivors("honest channel", honest.total())?;

    let train = tagged_pulse_train(honest.signal, honest.decoy, rng);
    let baseline_exchange = tagged_exchange(train, oracle, rng)?;
    let baseline = BaselineBranch {
        surviving: honest,
        loss_db,
        sifted_length: baseline_exchange.receiver_key.len(),
        yields: yield_decoy(&baseline_exchange.receiver_key)?,
    };

    let verdict = assess_decoy_yields(attack.yields, baseline.yields, config.decoy.yield_tolerance);
    info!(
        observed = attack.yields.decoy,
        expected = baseline.yields.decoy,
        detected = verdict.attack_detected,
        "decoy-state run finished"
    );

    Ok(DecoyResult {
        signal_statistics,
        decoy_statistics,
        emitted,
        attack,
        baseline,
        verdict,
    })
}
