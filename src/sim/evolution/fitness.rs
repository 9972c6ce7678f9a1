//! Fitness evaluation: multi-gravity simulation runs reduced to a scalar.

use rand::prelude::*;

use crate::schema::{ConfigError, EvaluationConfig, Genome, Terrain};
use crate::sim::physics::{LANDER_HALF_HEIGHT, LanderState, Outcome, Simulation};

/// Starting score before outcome and shaping terms.
const BASE_FITNESS: f64 = 10000.0;

/// Evaluates genomes by simulating them under sampled gravities.
///
/// A genome is scored under several independently sampled gravity values
/// and receives the arithmetic mean: it has to generalize across the range
/// rather than overfit a single gravity.
pub struct FitnessEvaluator {
    terrain: Terrain,
    config: EvaluationConfig,
    target_y: f64,
}

impl FitnessEvaluator {
    /// Create an evaluator.
    ///
    /// Rejects unusable evaluation settings here, before any search
    /// starts; terrain is already validated at its own construction.
    pub fn new(terrain: Terrain, config: EvaluationConfig) -> Result<Self, ConfigError> {
        if config.gravity_samples == 0 {
            return Err(ConfigError::NoGravitySamples);
        }
        let (min, max) = config.gravity_range;
        if !(min > 0.0 && max > min) {
            return Err(ConfigError::InvalidGravityRange { min, max });
        }
        if config.max_steps == 0 {
            return Err(ConfigError::NoSteps);
        }
        let target_y = terrain.landing_zone().y + LANDER_HALF_HEIGHT;
        Ok(Self {
            terrain,
            config,
            target_y,
        })
    }

    /// Altitude the controller descends toward.
    pub fn target_y(&self) -> f64 {
        self.target_y
    }

    /// Mean fitness across freshly sampled gravities.
    pub fn evaluate(&self, genome: &Genome, rng: &mut StdRng) -> f64 {
        let (min, max) = self.config.gravity_range;
        let mut total = 0.0;
        for _ in 0..self.config.gravity_samples {
            let gravity = rng.gen_range(min..max);
            total += self.evaluate_at(genome, gravity);
        }
        total / self.config.gravity_samples as f64
    }

    /// Score one deterministic run under a fixed gravity.
    pub fn evaluate_at(&self, genome: &Genome, gravity: f64) -> f64 {
        let mut sim = Simulation::new(
            genome,
            &self.terrain,
            gravity,
            self.config.spawn,
            self.config.max_steps,
        );
        let outcome = sim.run();
        let fitness = score(outcome, &sim.lander, sim.thruster_steps(), self.target_y);
        log::trace!(
            "gravity {gravity:.2}: {outcome:?} after {} steps, fitness {fitness:.1}",
            sim.steps()
        );
        fitness
    }
}

/// Score a finished run.
///
/// The four outcome buckets are mutually exclusive; the distance and
/// fuel-economy shaping terms always apply on top.
fn score(outcome: Outcome, lander: &LanderState, thruster_steps: u32, target_y: f64) -> f64 {
    let mut fitness = BASE_FITNESS;

    match outcome {
        Outcome::Escaped => fitness -= 9500.0,
        Outcome::Crashed => fitness -= 1000.0 + 500.0 * lander.touchdown_speed,
        Outcome::TimedOut => fitness -= 7000.0,
        Outcome::Landed => fitness += 5000.0,
    }

    fitness -= (lander.pos.y - target_y).abs().min(5000.0);
    fitness -= (2.0 * f64::from(thruster_steps)).min(1000.0);

    fitness
}
