mod core;
pub mod config;
pub mod eavesdropper;
pub mod encoding;
pub mod fiber;
pub mod oracle;
pub mod photon;
pub mod protocols;
pub mod sampler;
pub mod sifting;
mod simulator;

pub use crate::config::{DecoyConfig, NoiseConfig, NoiseKind, SimulationConfig};
pub use crate::core::{
    Gate, Measurement, MeasurementResult, QuantumChannel, QuantumState, errors, utils,
};
pub use crate::core::errors::SimulationError;
pub use crate::encoding::{Basis, EncodedMessage, PolarizationState, StateSet};
pub use crate::oracle::{DensityMatrixOracle, MeasurementOracle};
pub use crate::sampler::Sampler;
pub use crate::sifting::KeyEntry;
pub use crate::simulator::Simulation;
