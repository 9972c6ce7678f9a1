//! Genome manipulation utilities for the evolutionary search.
//!
//! Provides random generation, crossover, and mutation operations.

use rand::prelude::*;

use crate::schema::{Action, ActionKind, Genome, GenomeBounds};

/// Random number generator wrapper for genome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Generate a random genome within bounds.
    pub fn random_genome(&mut self, bounds: &GenomeBounds) -> Genome {
        let count = self
            .rng
            .gen_range(bounds.action_count.0..=bounds.action_count.1);
        let actions = (0..count).map(|_| self.random_action(bounds)).collect();

        Genome {
            kp: self.uniform(bounds.kp),
            ki: self.uniform(bounds.ki),
            kd: self.uniform(bounds.kd),
            actions,
        }
    }

    fn random_action(&mut self, bounds: &GenomeBounds) -> Action {
        let kind = if self.rng.gen_bool(0.5) {
            ActionKind::Thrust
        } else {
            ActionKind::Drift
        };
        Action {
            kind,
            duration: self.uniform(bounds.duration),
        }
    }

    /// Uniform random in bounds.
    fn uniform(&mut self, bounds: (f64, f64)) -> f64 {
        self.rng.gen_range(bounds.0..=bounds.1)
    }

    /// Perform crossover between two genomes.
    ///
    /// Gains are averaged and independently jittered; the action sequence
    /// is rebuilt at a freshly sampled length, each slot copying a random
    /// action from a coin-flipped parent. A parent with no actions skips
    /// its slots, so children can come out shorter than the sampled length.
    pub fn crossover(&mut self, parent1: &Genome, parent2: &Genome, bounds: &GenomeBounds) -> Genome {
        let kp = self.blend_gain(parent1.kp, parent2.kp, bounds.kp);
        let ki = self.blend_gain(parent1.ki, parent2.ki, bounds.ki);
        let kd = self.blend_gain(parent1.kd, parent2.kd, bounds.kd);

        let target_len = self
            .rng
            .gen_range(bounds.action_count.0..=bounds.action_count.1);
        let mut actions = Vec::with_capacity(target_len);
        for _ in 0..target_len {
            let donor = if self.rng.gen_bool(0.5) {
                parent1
            } else {
                parent2
            };
            if donor.actions.is_empty() {
                continue;
            }
            let idx = self.rng.gen_range(0..donor.actions.len());
            actions.push(donor.actions[idx]);
        }

        Genome { kp, ki, kd, actions }
    }

    fn blend_gain(&mut self, a: f64, b: f64, bounds: (f64, f64)) -> f64 {
        let jitter = self.rng.gen_range(0.9..=1.1);
        ((a + b) / 2.0 * jitter).clamp(bounds.0, bounds.1)
    }

    /// Mutate a genome in place with per-gene Bernoulli trials.
    ///
    /// Never changes the sequence length.
    pub fn mutate(&mut self, genome: &mut Genome, rate: f64, bounds: &GenomeBounds) {
        if self.rng.gen_bool(rate) {
            genome.kp = self.scale_gain(genome.kp, bounds.kp);
        }
        if self.rng.gen_bool(rate) {
            genome.ki = self.scale_gain(genome.ki, bounds.ki);
        }
        if self.rng.gen_bool(rate) {
            genome.kd = self.scale_gain(genome.kd, bounds.kd);
        }

        for action in &mut genome.actions {
            if self.rng.gen_bool(rate) {
                action.kind = match action.kind {
                    ActionKind::Thrust => ActionKind::Drift,
                    ActionKind::Drift => ActionKind::Thrust,
                };
            }
            if self.rng.gen_bool(rate) {
                let factor = self.rng.gen_range(0.8..=1.2);
                action.duration =
                    (action.duration * factor).clamp(bounds.duration.0, bounds.duration.1);
            }
        }
    }

    fn scale_gain(&mut self, value: f64, bounds: (f64, f64)) -> f64 {
        let factor = self.rng.gen_range(0.8..=1.2);
        (value * factor).clamp(bounds.0, bounds.1)
    }

    /// Generate next u64 for seeding child RNGs.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }

    /// Uniform index into a non-empty collection.
    pub fn pick_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Genetic distance between two genomes.
///
/// A coarse proxy weighing gain dissimilarity against sequence-length
/// dissimilarity; it ignores action content, which is fine for trend
/// monitoring but not for precise comparison.
pub fn genome_distance(a: &Genome, b: &Genome) -> f64 {
    let gain_distance = (relative_difference(a.kp, b.kp)
        + relative_difference(a.ki, b.ki)
        + relative_difference(a.kd, b.kd))
        / 3.0;

    let (len_a, len_b) = (a.actions.len(), b.actions.len());
    let length_distance = if len_a.max(len_b) == 0 {
        0.0
    } else {
        (len_a.abs_diff(len_b)) as f64 / len_a.max(len_b) as f64
    };

    0.6 * gain_distance + 0.4 * length_distance
}

fn relative_difference(a: f64, b: f64) -> f64 {
    let max = a.max(b);
    if max <= 0.0 {
        return 0.0;
    }
    (a - b).abs() / max
}
