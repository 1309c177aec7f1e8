//! Run parameters and their physical domains.
//!
//! A [`SimulationConfig`] can be built in code, or loaded from TOML:
//!
//! ```toml
//! seed = 42
//! mean_photon_number = 0.1
//! detector_efficiency = 0.1
//! attenuation_db_per_km = 0.25
//! fiber_length_km = 80.0
//! bits_sent = 1000000
//!
//! [channel_noise]
//! kind = "depolarizing"
//! probability = 0.02
//!
//! [decoy]
//! mean_photon_number = 0.5
//! decoy_percent = 20
//! signal_percent = 80
//! ```

use crate::core::QuantumChannel;
use crate::core::errors::{ChannelError, SimulationError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fewest pulses the sender may emit.
pub const MIN_BITS_SENT: usize = 10;

/// Parameters of a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the run's random source; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Signal pulse intensity μ
    pub mean_photon_number: f64,
    /// Detector quantum efficiency η
    pub detector_efficiency: f64,
    /// Fibre attenuation α in dB/km
    pub attenuation_db_per_km: f64,
    /// Fibre length. BB84 runs default to the critical PNS length.
    pub fiber_length_km: Option<f64>,
    /// Pulses emitted by the sender before loss
    pub bits_sent: usize,
    /// Noise applied to every qubit in transit
    pub channel_noise: Option<NoiseConfig>,
    pub decoy: DecoyConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            mean_photon_number: 0.1,
            detector_efficiency: 0.1,
            attenuation_db_per_km: 0.25,
            fiber_length_km: None,
            bits_sent: 1_000_000,
            channel_noise: None,
            decoy: DecoyConfig::default(),
        }
    }
}

/// Decoy-state countermeasure parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoyConfig {
    /// Decoy pulse intensity
    pub mean_photon_number: f64,
    pub decoy_percent: u32,
    pub signal_percent: u32,
    /// Largest excess of the decoy yield over the honest baseline that is
    /// not reported as an attack.
    pub yield_tolerance: f64,
}

impl Default for DecoyConfig {
    fn default() -> Self {
        Self {
            mean_photon_number: 0.5,
            decoy_percent: 20,
            signal_percent: 80,
            yield_tolerance: 0.1,
        }
    }
}

impl DecoyConfig {
    pub fn decoy_fraction(&self) -> f64 {
        f64::from(self.decoy_percent) / 100.0
    }

    pub fn signal_fraction(&self) -> f64 {
        f64::from(self.signal_percent) / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    BitFlip,
    PhaseFlip,
    Depolarizing,
}

/// Transcription noise on the quantum channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    pub kind: NoiseKind,
    pub probability: f64,
}

impl NoiseConfig {
    pub fn channel(&self) -> Result<QuantumChannel, ChannelError> {
        match self.kind {
            NoiseKind::BitFlip => QuantumChannel::bit_flip(self.probability),
            NoiseKind::PhaseFlip => QuantumChannel::phase_flip(self.probability),
            NoiseKind::Depolarizing => QuantumChannel::depolarizing(self.probability),
        }
    }
}

fn violation(parameter: &'static str, value: f64, constraint: &'static str) -> SimulationError {
    SimulationError::ParameterDomain {
        parameter,
        value,
        constraint,
    }
}

impl SimulationConfig {
    /// Parses a TOML document. Missing keys take their default values.
    pub fn from_toml_str(text: &str) -> Result<Self, SimulationError> {
        toml::from_str(text).map_err(|e| SimulationError::Config(e.to_string()))
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SimulationError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Checks the parameters shared by every scenario.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let mu = self.mean_photon_number;
        if !(mu > 0.01 && mu <= 0.5) {
            return Err(violation("mean_photon_number", mu, "0.01 < mu <= 0.5"));
        }

        let eta = self.detector_efficiency;
        if !(eta > 0.05 && eta <= 1.0) {
            return Err(violation("detector_efficiency", eta, "0.05 < eta <= 1"));
        }

        let alpha = self.attenuation_db_per_km;
        if !(0.0..=0.5).contains(&alpha) {
            return Err(violation("attenuation_db_per_km", alpha, "0 <= alpha <= 0.5"));
        }

        if let Some(l) = self.fiber_length_km {
            if !(l > 1.0 && l <= 500.0) {
                return Err(violation("fiber_length_km", l, "1 < l <= 500"));
            }
        }

        if self.bits_sent < MIN_BITS_SENT {
            return Err(violation("bits_sent", self.bits_sent as f64, "n >= 10"));
        }

        if let Some(noise) = &self.channel_noise {
            if !(0.0..=1.0).contains(&noise.probability) {
                return Err(violation(
                    "channel_noise.probability",
                    noise.probability,
                    "0 <= p <= 1",
                ));
            }
        }

        Ok(())
    }

    /// Checks the decoy-state parameters against the signal intensity.
    pub fn validate_decoy(&self) -> Result<(), SimulationError> {
        let d = &self.decoy;
        let mu_d = d.mean_photon_number;

        if !(0.1..=1.0).contains(&mu_d) {
            return Err(violation("decoy.mean_photon_number", mu_d, "0.1 <= mu_decoy <= 1"));
        }

        // Small epsilon so 0.1 apart in decimal is accepted despite binary rounding
        if (mu_d - self.mean_photon_number).abs() < 0.1 - 1e-12 {
            return Err(violation(
                "decoy.mean_photon_number",
                mu_d,
                "|mu_decoy - mu_signal| >= 0.1",
            ));
        }

        if d.decoy_percent > 50 {
            return Err(violation("decoy.decoy_percent", f64::from(d.decoy_percent), "decoy % <= 50"));
        }

        if d.signal_percent > 95 {
            return Err(violation("decoy.signal_percent", f64::from(d.signal_percent), "signal % <= 95"));
        }

        if d.decoy_percent + d.signal_percent != 100 {
            return Err(violation(
                "decoy.signal_percent",
                f64::from(d.signal_percent),
                "decoy % + signal % = 100",
            ));
        }

        if !(d.yield_tolerance.is_finite() && d.yield_tolerance >= 0.0) {
            return Err(violation("decoy.yield_tolerance", d.yield_tolerance, "tolerance >= 0"));
        }

        Ok(())
    }

    /// Fibre length, which SARG04 runs cannot derive.
    pub fn required_fiber_length(&self) -> Result<f64, SimulationError> {
        self.fiber_length_km
            .ok_or_else(|| violation("fiber_length_km", f64::NAN, "must be set for SARG04"))
    }

    pub fn channel(&self) -> Result<Option<QuantumChannel>, SimulationError> {
        self.channel_noise
            .as_ref()
            .map(|n| n.channel().map_err(|e| SimulationError::State(e.into())))
            .transpose()
    }
}
