use crate::config::SimulationConfig;
use crate::core::errors::SimulationError;
use crate::oracle::DensityMatrixOracle;
use crate::protocols::qkd::{bb84, decoy, sarg04};
use crate::sampler::Sampler;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

/// A validated configuration together with the random source every draw of
/// a run comes from.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    rng: StdRng,
    oracle: DensityMatrixOracle,
    attacker: DensityMatrixOracle,
    sampler: Sampler,
}

impl Simulation {
    /// Validates `config` and seeds the run.
    ///
    /// Without `config.seed` the generator is seeded from OS entropy.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let oracle = match config.channel()? {
            Some(channel) => DensityMatrixOracle::new().with_channel(channel),
            None => DensityMatrixOracle::new(),
        };
        debug!(seed = ?config.seed, noisy = oracle.channel().is_some(), "simulation ready");

        Ok(Self {
            config,
            rng,
            oracle,
            // Stored photons never cross the fibre
            attacker: DensityMatrixOracle::new(),
            sampler: Sampler::new(),
        })
    }

    /// Replaces the default one-third disclosure sampler.
    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// BB84 under a photon-number-splitting attack.
    pub fn run_bb84_pns(&mut self) -> Result<bb84::PnsResult, SimulationError> {
        bb84::run(
            &self.config,
            &self.oracle,
            &self.attacker,
            &self.sampler,
            &mut self.rng,
        )
    }

    /// Decoy-state BB84, attacked and honest.
    pub fn run_decoy(&mut self) -> Result<decoy::DecoyResult, SimulationError> {
        self.config.validate_decoy()?;
        decoy::run(
            &self.config,
            &self.oracle,
            &self.attacker,
            &self.sampler,
            &mut self.rng,
        )
    }

    /// SARG04 under a Trojan-horse attack.
    pub fn run_sarg04_trojan(&mut self) -> Result<sarg04::TrojanHorseResult, SimulationError> {
        sarg04::run(&self.config, &self.oracle, &self.sampler, &mut self.rng)
    }
}
