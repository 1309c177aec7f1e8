use crate::core::errors::SimulationError;
use crate::fiber::expected_count;
use crate::sifting::KeyEntry;
use rand::Rng;

/// Fraction of the sifted key disclosed for error estimation by default.
pub const DEFAULT_SAMPLE_FRACTION: f64 = 1.0 / 3.0;

/// Public-disclosure step of QKD post-processing.
///
/// The `Sampler` decides how many sifted bits are sacrificed, picks the
/// positions, and pulls them out of each party's key.
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    /// Share of the sifted key that is disclosed.
    pub fraction: f64,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler {
    /// Creates a `Sampler` disclosing one third of the key.
    pub fn new() -> Self {
        Self {
            fraction: DEFAULT_SAMPLE_FRACTION,
        }
    }

    /// Sets the disclosed share of the key, which must lie in (0, 1].
    pub fn with_fraction(mut self, fraction: f64) -> Result<Self, SimulationError> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(SimulationError::ParameterDomain {
                parameter: "sample_fraction",
                value: fraction,
                constraint: "0 < fraction <= 1",
            });
        }
        self.fraction = fraction;
        Ok(self)
    }

    /// Number of bits to disclose from a key of `key_len` bits.
    pub fn sample_size(&self, key_len: usize) -> usize {
        expected_count(self.fraction, key_len)
    }

    /// Draws `sample_size(key_len)` positions uniformly from `0..upper`.
    ///
    /// Positions may exceed the key length or repeat; [`draw_sample`] wraps
    /// each one modulo the key's current length.
    pub fn positions<R: Rng + ?Sized>(&self, key_len: usize, upper: usize, rng: &mut R) -> Vec<usize> {
        if upper == 0 {
            return Vec::new();
        }
        (0..self.sample_size(key_len))
            .map(|_| rng.random_range(0..upper))
            .collect()
    }
}

/// Pulls the entries at `positions` out of `key`.
///
/// Each position is wrapped modulo the key's length *at the time it is
/// drawn*, then removed. Returns `(remaining, sample)`; together they hold
/// exactly the entries of the original key.
pub fn draw_sample<T>(mut key: Vec<T>, positions: &[usize]) -> (Vec<T>, Vec<T>) {
    let mut sample = Vec::with_capacity(positions.len());
    for &pos in positions {
        if key.is_empty() {
            break;
        }
        let idx = pos % key.len();
        sample.push(key.remove(idx));
    }
    (key, sample)
}

/// Quantum bit error rate: the share of positions where two samples differ.
pub fn qber<T: PartialEq>(sample_a: &[T], sample_b: &[T]) -> Result<f64, SimulationError> {
    if sample_a.len() != sample_b.len() {
        return Err(SimulationError::SampleLengthMismatch {
            left: sample_a.len(),
            right: sample_b.len(),
        });
    }

    if sample_a.is_empty() {
        return Err(SimulationError::DegenerateSample);
    }

    let errors = sample_a
        .iter()
        .zip(sample_b)
        .filter(|(a, b)| a != b)
        .count();

    Ok(errors as f64 / sample_a.len() as f64)
}

/// Share of a decoy-tagged key that came from decoy and from signal pulses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldFractions {
    pub decoy: f64,
    pub signal: f64,
}

/// Decoy and signal yield of the receiver's sifted key.
pub fn yield_decoy(key: &[KeyEntry]) -> Result<YieldFractions, SimulationError> {
    if key.is_empty() {
        return Err(SimulationError::DegenerateRun {
            stage: "yield estimation",
            count: 0,
        });
    }

    let decoys = key.iter().filter(|e| e.is_decoy()).count();
    let n = key.len() as f64;

    Ok(YieldFractions {
        decoy: decoys as f64 / n,
        signal: (key.len() - decoys) as f64 / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_sample_size_is_a_third() {
        let s = Sampler::new();
        assert_eq!(s.sample_size(0), 0);
        assert_eq!(s.sample_size(1), 0);
        assert_eq!(s.sample_size(2), 1);
        assert_eq!(s.sample_size(9), 3);
        assert_eq!(s.sample_size(11), 4);
        assert_eq!(Sampler::new().with_fraction(0.5).unwrap().sample_size(10), 5);
    }

    #[test]
    fn test_fraction_outside_unit_interval_rejected() {
        for bad in [0.0, -0.2, 1.5, f64::NAN] {
            assert!(matches!(
                Sampler::new().with_fraction(bad),
                Err(SimulationError::ParameterDomain {
                    parameter: "sample_fraction",
                    ..
                })
            ));
        }
        assert_eq!(Sampler::new().with_fraction(1.0).unwrap().sample_size(7), 7);
    }

    #[test]
    fn test_draw_sample_wraps_and_removes() {
        let key = vec![10, 11, 12, 13, 14];
        let (rest, sample) = draw_sample(key, &[7, 0, 0]);
        // 7 % 5 = 2 -> 12; then 0 -> 10; then 0 -> 11
        assert_eq!(sample, vec![12, 10, 11]);
        assert_eq!(rest, vec![13, 14]);
    }

    #[test]
    fn test_draw_sample_is_disjoint_and_conserves_length() {
        let mut rng = StdRng::seed_from_u64(9);
        let key: Vec<usize> = (0..60).collect();
        let sampler = Sampler::new();
        let positions = sampler.positions(key.len(), 200, &mut rng);
        let (rest, sample) = draw_sample(key.clone(), &positions);
        assert_eq!(sample.len(), 20);
        assert_eq!(rest.len() + sample.len(), key.len());
        assert!(sample.iter().all(|v| !rest.contains(v)));
    }

    #[test]
    fn test_qber_bounds() {
        let a = [true, false, true, true];
        let b = [true, true, false, true];
        assert_relative_eq!(qber(&a, &b).unwrap(), 0.5);
        assert_relative_eq!(qber(&a, &a).unwrap(), 0.0);
        let flipped: Vec<bool> = a.iter().map(|b| !b).collect();
        assert_relative_eq!(qber(&a, &flipped).unwrap(), 1.0);
    }

    #[test]
    fn test_qber_degenerate_inputs() {
        let empty: [bool; 0] = [];
        assert!(matches!(
            qber(&empty, &empty),
            Err(SimulationError::DegenerateSample)
        ));
        assert!(matches!(
            qber(&[true], &[true, false]),
            Err(SimulationError::SampleLengthMismatch { left: 1, right: 2 })
        ));
    }

    #[test]
    fn test_yield_fractions() {
        let key = [
            KeyEntry::Signal(true),
            KeyEntry::Decoy(false),
            KeyEntry::Signal(false),
            KeyEntry::Decoy(true),
        ];
        let y = yield_decoy(&key).unwrap();
        assert_relative_eq!(y.decoy, 0.5);
        assert_relative_eq!(y.signal, 0.5);
        assert!(yield_decoy(&[]).is_err());
    }
}
