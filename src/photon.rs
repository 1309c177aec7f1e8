//! Photon-number statistics of weak coherent pulses.
//!
//! An attenuated laser pulse with mean photon number $\mu$ carries $n$
//! photons with Poisson probability $\mu^n e^{-\mu} / n!$. Empty pulses never
//! click a detector, so most quantities of interest are conditioned on the
//! pulse being non-empty.

/// Poisson probability of finding exactly `n` photons in a pulse of mean `mu`.
pub fn photon_probability(n: u32, mu: f64) -> f64 {
    let factorial: f64 = (1..=n).map(f64::from).product();
    mu.powi(n as i32) * (-mu).exp() / factorial
}

/// A weak coherent pulse, characterised only by its mean photon number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    pub mean_photon_number: f64,
}

impl Pulse {
    pub fn new(mean_photon_number: f64) -> Self {
        Self { mean_photon_number }
    }

    pub fn statistics(&self) -> PhotonStatistics {
        PhotonStatistics::new(self.mean_photon_number)
    }
}

/// Derived photon-number probabilities for one pulse intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotonStatistics {
    /// Mean photon number the probabilities were derived from.
    pub mu: f64,
    /// P(0 photons)
    pub p_vacuum: f64,
    /// P(1 photon)
    pub p_single: f64,
    /// P(2 or more photons)
    pub p_multi: f64,
}

impl PhotonStatistics {
    pub fn new(mu: f64) -> Self {
        let p_vacuum = photon_probability(0, mu);
        let p_single = photon_probability(1, mu);
        Self {
            mu,
            p_vacuum,
            p_single,
            p_multi: 1.0 - p_vacuum - p_single,
        }
    }

    /// P(1 photon | pulse non-empty)
    pub fn single_given_nonempty(&self) -> f64 {
        self.p_single / (self.p_single + self.p_multi)
    }

    /// P(>=2 photons | pulse non-empty)
    pub fn multi_given_nonempty(&self) -> f64 {
        self.p_multi / (self.p_single + self.p_multi)
    }
}
