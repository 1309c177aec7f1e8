//! Optical fibre loss and detection-rate model.

use crate::photon::PhotonStatistics;

/// Turns an expected count into an integer count.
///
/// Ties round to even, so `0.5 -> 0`, `1.5 -> 2`, `2.5 -> 2`.
pub fn expected_count(rate: f64, n: usize) -> usize {
    (rate * n as f64).round_ties_even() as usize
}

/// Number of pulses out of `n_input` that reach the receiver's detector.
pub fn surviving_count(raw_rate: f64, n_input: usize) -> usize {
    expected_count(raw_rate, n_input)
}

/// A fibre segment terminated by a single-photon detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiberLink {
    pub attenuation_db_per_km: f64,
    pub length_km: f64,
    pub detector_efficiency: f64,
}

impl FiberLink {
    pub fn new(attenuation_db_per_km: f64, length_km: f64, detector_efficiency: f64) -> Self {
        Self {
            attenuation_db_per_km,
            length_km,
            detector_efficiency,
        }
    }

    /// Total loss in dB.
    pub fn loss_db(&self) -> f64 {
        self.attenuation_db_per_km * self.length_km
    }

    /// Fraction of light that makes it through the fibre.
    pub fn transmittance(&self) -> f64 {
        10f64.powf(-self.loss_db() / 10.0)
    }

    /// Raw detection rate for an honest channel: `eta * 10^(-alpha*l/10) * mu`.
    pub fn raw_rate(&self, mu: f64) -> f64 {
        honest_raw_rate(self.detector_efficiency, self.loss_db(), mu)
    }
}

/// Raw detection rate of an honest line with a total loss of `loss_db`.
pub fn honest_raw_rate(detector_efficiency: f64, loss_db: f64, mu: f64) -> f64 {
    detector_efficiency * 10f64.powf(-loss_db / 10.0) * mu
}

/// Raw detection rate when a PNS attacker forwards only multi-photon pulses
/// over a lossless line: `eta * P(>=2)`.
pub fn pns_raw_rate(detector_efficiency: f64, stats: &PhotonStatistics) -> f64 {
    detector_efficiency * stats.p_multi
}

/// Loss (dB) at which the honest detection rate `mu * T` drops to the
/// multi-photon probability, letting a PNS attacker hide behind the loss.
pub fn critical_attenuation_db(stats: &PhotonStatistics) -> f64 {
    10.0 * (stats.mu / stats.p_multi).log10()
}

/// Fibre length at which a PNS attack becomes rate-invisible.
///
/// `None` for a lossless fibre, where no such length exists.
pub fn critical_length_km(attenuation_db_per_km: f64, stats: &PhotonStatistics) -> Option<f64> {
    if attenuation_db_per_km > 0.0 {
        Some(critical_attenuation_db(stats) / attenuation_db_per_km)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rounding_ties_to_even() {
        assert_eq!(expected_count(0.5, 1), 0);
        assert_eq!(expected_count(1.5, 1), 2);
        assert_eq!(expected_count(2.5, 1), 2);
        assert_eq!(expected_count(0.25, 10), 2);
    }

    #[test]
    fn test_honest_rate() {
        let link = FiberLink::new(0.25, 80.0, 0.1);
        assert_relative_eq!(link.loss_db(), 20.0);
        assert_relative_eq!(link.transmittance(), 0.01, epsilon = 1e-15);
        assert_relative_eq!(link.raw_rate(0.1), 1e-4, epsilon = 1e-15);
        assert_eq!(surviving_count(link.raw_rate(0.1), 1_000_000), 100);
    }

    #[test]
    fn test_critical_length_matches_pns_rate() {
        let stats = PhotonStatistics::new(0.1);
        let l = critical_length_km(0.25, &stats).unwrap();
        let link = FiberLink::new(0.25, l, 0.1);
        // At the critical length the honest rate equals the PNS rate
        assert_relative_eq!(link.raw_rate(0.1), pns_raw_rate(0.1, &stats), epsilon = 1e-12);
        assert!(critical_length_km(0.0, &stats).is_none());
        let delta = critical_attenuation_db(&stats);
        assert_relative_eq!(honest_raw_rate(0.1, delta, 0.1), 0.1 * stats.p_multi, epsilon = 1e-12);
    }
}
