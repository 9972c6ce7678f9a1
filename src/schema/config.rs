//! Configuration types for the evolutionary search.

use serde::{Deserialize, Serialize};

use super::GenomeBounds;

/// Top-level configuration for a controller search run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Genetic operator settings.
    #[serde(default)]
    pub ga: GaConfig,
    /// Per-candidate evaluation settings.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Genome parameter bounds.
    #[serde(default)]
    pub bounds: GenomeBounds,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

/// Population sizing and run length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of genomes per generation.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Number of generations to evaluate.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: default_max_generations(),
        }
    }
}

fn default_population_size() -> usize {
    100
}
fn default_max_generations() -> usize {
    5
}

/// Genetic operator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaConfig {
    /// Per-gene mutation probability.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Tournament size for parent selection.
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    /// Fraction of the population carried over unchanged each generation.
    #[serde(default = "default_elite_fraction")]
    pub elite_fraction: f64,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            mutation_rate: default_mutation_rate(),
            tournament_size: default_tournament_size(),
            elite_fraction: default_elite_fraction(),
        }
    }
}

fn default_mutation_rate() -> f64 {
    0.1
}
fn default_tournament_size() -> usize {
    5
}
fn default_elite_fraction() -> f64 {
    0.1
}

/// Per-candidate evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Gravity samples averaged per genome.
    #[serde(default = "default_gravity_samples")]
    pub gravity_samples: usize,
    /// Half-open gravity sampling range `[min, max)`.
    #[serde(default = "default_gravity_range")]
    pub gravity_range: (f64, f64),
    /// Step cap per simulation run; exhaustion is scored as a timeout.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Vehicle spawn position.
    #[serde(default = "default_spawn")]
    pub spawn: (f64, f64),
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            gravity_samples: default_gravity_samples(),
            gravity_range: default_gravity_range(),
            max_steps: default_max_steps(),
            spawn: default_spawn(),
        }
    }
}

fn default_gravity_samples() -> usize {
    10
}
fn default_gravity_range() -> (f64, f64) {
    (1.2, 10.0)
}
fn default_max_steps() -> u32 {
    1000
}
fn default_spawn() -> (f64, f64) {
    (400.0, 200.0)
}

impl EvolutionConfig {
    /// Validate search parameters.
    ///
    /// Terrain has its own validation at construction; together these catch
    /// every configuration error before the first evaluation starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population.size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.population.max_generations == 0 {
            return Err(ConfigError::NoGenerations);
        }
        if self.ga.tournament_size == 0 {
            return Err(ConfigError::EmptyTournament);
        }
        if !(0.0..=1.0).contains(&self.ga.mutation_rate) {
            return Err(ConfigError::InvalidMutationRate(self.ga.mutation_rate));
        }
        if !(0.0..=1.0).contains(&self.ga.elite_fraction) {
            return Err(ConfigError::InvalidEliteFraction(self.ga.elite_fraction));
        }
        if self.evaluation.gravity_samples == 0 {
            return Err(ConfigError::NoGravitySamples);
        }
        let (min, max) = self.evaluation.gravity_range;
        if !(min > 0.0 && max > min) {
            return Err(ConfigError::InvalidGravityRange { min, max });
        }
        if self.evaluation.max_steps == 0 {
            return Err(ConfigError::NoSteps);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be non-zero")]
    EmptyPopulation,
    #[error("Generation count must be non-zero")]
    NoGenerations,
    #[error("Tournament size must be non-zero")]
    EmptyTournament,
    #[error("Mutation rate {0} must be within [0, 1]")]
    InvalidMutationRate(f64),
    #[error("Elite fraction {0} must be within [0, 1]")]
    InvalidEliteFraction(f64),
    #[error("Gravity sample count must be non-zero")]
    NoGravitySamples,
    #[error("Gravity range [{min}, {max}) must be positive and non-empty")]
    InvalidGravityRange { min: f64, max: f64 },
    #[error("Step cap must be non-zero")]
    NoSteps,
    #[error("Terrain needs at least 2 points, found {0}")]
    TerrainTooShort(usize),
    #[error("Terrain x values must be strictly ascending (violated at x = {x})")]
    TerrainNotAscending { x: f64 },
    #[error("Terrain has no pair of consecutive flagged points to mark the landing zone")]
    MissingLandingZone,
}
