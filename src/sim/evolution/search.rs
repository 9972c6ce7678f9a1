//! Genetic-algorithm search for landing controllers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rand::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{ConfigError, EvolutionConfig, Genome, Terrain};

use super::fitness::FitnessEvaluator;
use super::genome::{GenomeRng, genome_distance};

/// A candidate individual in the population.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Unique identifier.
    pub id: u64,
    /// The genome.
    pub genome: Genome,
    /// Fitness score.
    pub fitness: f64,
    /// Generation created.
    pub generation: usize,
}

/// Aggregate statistics for one closed generation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GenerationStats {
    pub generation: usize,
    pub best_fitness: f64,
    pub avg_fitness: f64,
    pub diversity: f64,
    /// Fraction of the population scoring above zero.
    pub success_rate: f64,
}

/// Retained per-generation history; never mutated after a generation
/// closes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchHistory {
    pub best_fitness: Vec<f64>,
    pub avg_fitness: Vec<f64>,
    pub diversity: Vec<f64>,
    pub success_rate: Vec<f64>,
}

/// Snapshot handed to the progress callback after each generation.
#[derive(Debug, Clone)]
pub struct EvolutionProgress {
    pub generation: usize,
    pub total_generations: usize,
    pub stats: GenerationStats,
    /// All-time best fitness so far.
    pub best_fitness: f64,
    /// Text encoding of the all-time best genome.
    pub best_genome: String,
}

/// Best-genome record emitted once per generation and once at the end.
/// Persistence is the consumer's business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub generation: usize,
    /// Timestamp label, e.g. `gen-3@1754505600`.
    pub label: String,
    /// Text encoding of the best genome so far.
    pub genome: String,
    pub fitness: f64,
}

/// Checkpoint consumer callback type.
pub type CheckpointSink = Box<dyn FnMut(Checkpoint) + Send>;

/// Final result of a search run.
#[derive(Debug, Clone)]
pub struct EvolutionResult {
    pub best_genome: Genome,
    pub best_fitness: f64,
    pub history: SearchHistory,
    pub generations: usize,
    pub total_evaluations: u64,
    pub elapsed_seconds: f64,
}

/// Evolution engine that owns the population and runs the search.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    rng: GenomeRng,
    evaluator: FitnessEvaluator,
    population: Vec<Candidate>,
    history: SearchHistory,
    generation: usize,
    best: Option<(f64, Genome)>,
    next_id: AtomicU64,
    checkpoint_sink: Option<CheckpointSink>,
}

impl EvolutionEngine {
    /// Create a new engine. Every configuration error surfaces here,
    /// before any evaluation starts.
    pub fn new(config: EvolutionConfig, terrain: Terrain) -> Result<Self, ConfigError> {
        config.validate()?;
        let evaluator = FitnessEvaluator::new(terrain, config.evaluation.clone())?;
        let seed = config.random_seed.unwrap_or_else(rand::random);
        Ok(Self {
            config,
            rng: GenomeRng::new(seed),
            evaluator,
            population: Vec::new(),
            history: SearchHistory::default(),
            generation: 0,
            best: None,
            next_id: AtomicU64::new(0),
            checkpoint_sink: None,
        })
    }

    /// Attach a checkpoint consumer.
    pub fn with_checkpoint_sink(mut self, sink: CheckpointSink) -> Self {
        self.checkpoint_sink = Some(sink);
        self
    }

    /// Accumulated per-generation statistics.
    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    /// All-time best fitness and genome, if any generation has closed.
    pub fn best(&self) -> Option<(f64, &Genome)> {
        self.best.as_ref().map(|(f, g)| (*f, g))
    }

    /// Read-only view of the current population.
    pub fn population(&self) -> &[Candidate] {
        &self.population
    }

    /// Seed a fresh random population.
    pub fn initialize(&mut self) {
        self.population.clear();
        self.history = SearchHistory::default();
        self.generation = 0;
        self.best = None;

        for _ in 0..self.config.population.size {
            let genome = self.rng.random_genome(&self.config.bounds);
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            self.population.push(Candidate {
                id,
                genome,
                fitness: 0.0,
                generation: 0,
            });
        }
    }

    /// Evaluate every candidate in parallel.
    ///
    /// RNG streams are split off the master up front so results do not
    /// depend on worker scheduling.
    fn evaluate_population(&mut self) {
        let seeds: Vec<u64> = (0..self.population.len())
            .map(|_| self.rng.next_seed())
            .collect();
        let evaluator = &self.evaluator;

        self.population
            .par_iter_mut()
            .zip(seeds.into_par_iter())
            .for_each(|(candidate, seed)| {
                let mut rng = StdRng::seed_from_u64(seed);
                candidate.fitness = evaluator.evaluate(&candidate.genome, &mut rng);
            });
    }

    /// Record statistics for the just-evaluated generation and update the
    /// all-time best (strictly greater replaces).
    fn record_generation(&mut self) -> GenerationStats {
        let gen_best = self
            .population
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
            .expect("population is non-empty");

        match &self.best {
            Some((best, _)) if *best >= gen_best.fitness => {}
            _ => self.best = Some((gen_best.fitness, gen_best.genome.clone())),
        }

        let len = self.population.len() as f64;
        let avg_fitness = self.population.iter().map(|c| c.fitness).sum::<f64>() / len;
        let success_rate =
            self.population.iter().filter(|c| c.fitness > 0.0).count() as f64 / len;
        let diversity = self.compute_diversity();

        let stats = GenerationStats {
            generation: self.generation,
            best_fitness: gen_best.fitness,
            avg_fitness,
            diversity,
            success_rate,
        };

        self.history.best_fitness.push(stats.best_fitness);
        self.history.avg_fitness.push(stats.avg_fitness);
        self.history.diversity.push(stats.diversity);
        self.history.success_rate.push(stats.success_rate);

        log::info!(
            "generation {}: best {:.1}, avg {:.1}, diversity {:.3}, success {:.0}%",
            stats.generation,
            stats.best_fitness,
            stats.avg_fitness,
            stats.diversity,
            stats.success_rate * 100.0
        );

        stats
    }

    /// Mean pairwise genome distance over the population.
    fn compute_diversity(&self) -> f64 {
        if self.population.len() < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        let mut count = 0u64;
        for i in 0..self.population.len() {
            for j in (i + 1)..self.population.len() {
                total += genome_distance(&self.population[i].genome, &self.population[j].genome);
                count += 1;
            }
        }
        total / count as f64
    }

    /// Build the next generation: elites unchanged, the rest bred.
    fn next_generation(&mut self) {
        let size = self.config.population.size;
        let elite_count =
            ((size as f64 * self.config.ga.elite_fraction).floor() as usize).min(size);

        // Fitness descending; stable sort keeps original index order on
        // ties.
        let mut order: Vec<usize> = (0..self.population.len()).collect();
        order.sort_by(|&a, &b| {
            self.population[b]
                .fitness
                .total_cmp(&self.population[a].fitness)
        });

        let mut next = Vec::with_capacity(size);
        for &idx in order.iter().take(elite_count) {
            let mut elite = self.population[idx].clone();
            elite.generation = self.generation + 1;
            next.push(elite);
        }

        while next.len() < size {
            let p1 = self.select_index();
            let p2 = self.select_index();
            let mut genome = self.rng.crossover(
                &self.population[p1].genome,
                &self.population[p2].genome,
                &self.config.bounds,
            );
            self.rng
                .mutate(&mut genome, self.config.ga.mutation_rate, &self.config.bounds);
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            next.push(Candidate {
                id,
                genome,
                fitness: 0.0,
                generation: self.generation + 1,
            });
        }

        // Wholesale replacement; the closed generation is dropped intact.
        self.population = next;
    }

    /// Tournament selection: sample indices with replacement, keep the
    /// fittest.
    fn select_index(&mut self) -> usize {
        let mut best = self.rng.pick_index(self.population.len());
        for _ in 1..self.config.ga.tournament_size {
            let idx = self.rng.pick_index(self.population.len());
            if self.population[idx].fitness > self.population[best].fitness {
                best = idx;
            }
        }
        best
    }

    fn emit_checkpoint(&mut self, prefix: &str) {
        let Some((fitness, genome)) = &self.best else {
            return;
        };
        let Some(sink) = &mut self.checkpoint_sink else {
            return;
        };
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        sink(Checkpoint {
            generation: self.generation,
            label: format!("{prefix}@{secs}"),
            genome: genome.to_string(),
            fitness: *fitness,
        });
    }

    fn progress(&self, stats: GenerationStats) -> EvolutionProgress {
        let (best_fitness, best_genome) = self
            .best
            .as_ref()
            .map(|(f, g)| (*f, g.to_string()))
            .unwrap_or((f64::NEG_INFINITY, String::new()));
        EvolutionProgress {
            generation: self.generation,
            total_generations: self.config.population.max_generations,
            stats,
            best_fitness,
            best_genome,
        }
    }

    /// Run the search with a per-generation progress callback.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> EvolutionResult
    where
        F: FnMut(&EvolutionProgress),
    {
        let start = Instant::now();
        self.initialize();

        loop {
            self.evaluate_population();
            let stats = self.record_generation();
            self.emit_checkpoint(&format!("gen-{}", self.generation));
            callback(&self.progress(stats));

            if self.generation + 1 >= self.config.population.max_generations {
                break;
            }
            self.next_generation();
            self.generation += 1;
        }

        self.emit_checkpoint("final");

        let (best_fitness, best_genome) = self
            .best
            .as_ref()
            .map(|(f, g)| (*f, g.clone()))
            .expect("at least one generation was evaluated");

        let generations = self.generation + 1;
        EvolutionResult {
            best_genome,
            best_fitness,
            history: self.history.clone(),
            generations,
            total_evaluations: generations as u64 * self.config.population.size as u64,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        }
    }

    /// Run the search (blocking).
    pub fn run(&mut self) -> EvolutionResult {
        self.run_with_callback(|_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EvaluationConfig, GaConfig, PopulationConfig};
    use crate::sim::physics::SCREEN_WIDTH;

    fn small_config() -> EvolutionConfig {
        EvolutionConfig {
            population: PopulationConfig {
                size: 12,
                max_generations: 3,
            },
            ga: GaConfig::default(),
            evaluation: EvaluationConfig {
                gravity_samples: 2,
                max_steps: 200,
                ..Default::default()
            },
            bounds: Default::default(),
            random_seed: Some(42),
        }
    }

    fn flat_terrain() -> Terrain {
        Terrain::flat(SCREEN_WIDTH, 100.0, 350.0, 450.0)
    }

    #[test]
    fn test_initialize_fills_population() {
        let mut engine = EvolutionEngine::new(small_config(), flat_terrain()).unwrap();
        engine.initialize();
        assert_eq!(engine.population.len(), 12);
        assert!(engine.population.iter().all(|c| c.generation == 0));
    }

    #[test]
    fn test_run_records_history_per_generation() {
        let mut engine = EvolutionEngine::new(small_config(), flat_terrain()).unwrap();
        let result = engine.run();
        assert_eq!(result.generations, 3);
        assert_eq!(result.history.best_fitness.len(), 3);
        assert_eq!(result.history.avg_fitness.len(), 3);
        assert_eq!(result.history.diversity.len(), 3);
        assert_eq!(result.history.success_rate.len(), 3);
        assert!(result.history.success_rate.iter().all(|r| (0.0..=1.0).contains(r)));
        assert!(result.best_fitness.is_finite());
        // The reported best round-trips through the text encoding.
        let decoded: Genome = result.best_genome.to_string().parse().unwrap();
        assert!(decoded.actions.len() <= 9);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let a = EvolutionEngine::new(small_config(), flat_terrain())
            .unwrap()
            .run();
        let b = EvolutionEngine::new(small_config(), flat_terrain())
            .unwrap()
            .run();
        assert_eq!(a.best_genome.to_string(), b.best_genome.to_string());
        assert_eq!(a.history.best_fitness, b.history.best_fitness);
    }

    #[test]
    fn test_elitism_carries_top_ten_unchanged() {
        let mut config = small_config();
        config.population.size = 100;
        let mut engine = EvolutionEngine::new(config, flat_terrain()).unwrap();
        engine.initialize();
        for (i, candidate) in engine.population.iter_mut().enumerate() {
            candidate.fitness = i as f64;
        }
        let expected: Vec<String> = (90..100)
            .rev()
            .map(|i| engine.population[i].genome.to_string())
            .collect();

        engine.next_generation();

        assert_eq!(engine.population.len(), 100);
        let carried: Vec<String> = engine.population[..10]
            .iter()
            .map(|c| c.genome.to_string())
            .collect();
        assert_eq!(carried, expected);
    }

    #[test]
    fn test_elitism_breaks_ties_by_original_index() {
        let mut config = small_config();
        config.population.size = 100;
        let mut engine = EvolutionEngine::new(config, flat_terrain()).unwrap();
        engine.initialize();
        for candidate in engine.population.iter_mut() {
            candidate.fitness = 1.0;
        }
        let expected: Vec<u64> = engine.population[..10].iter().map(|c| c.id).collect();

        engine.next_generation();

        let carried: Vec<u64> = engine.population[..10].iter().map(|c| c.id).collect();
        assert_eq!(carried, expected);
    }

    #[test]
    fn test_tournament_finds_the_best() {
        let mut engine = EvolutionEngine::new(small_config(), flat_terrain()).unwrap();
        engine.initialize();
        for (i, candidate) in engine.population.iter_mut().enumerate() {
            candidate.fitness = i as f64;
        }
        let best_index = engine.population.len() - 1;
        let hits = (0..1000)
            .filter(|_| engine.select_index() == best_index)
            .count();
        // With tournament size 5 over 12 candidates the global best wins a
        // large share of draws; never selecting it is astronomically
        // unlikely.
        assert!(hits > 0);
    }

    #[test]
    fn test_diversity_of_identical_population_is_zero() {
        let mut engine = EvolutionEngine::new(small_config(), flat_terrain()).unwrap();
        engine.initialize();
        let template = engine.population[0].genome.clone();
        for candidate in engine.population.iter_mut() {
            candidate.genome = template.clone();
        }
        assert_eq!(engine.compute_diversity(), 0.0);
    }

    #[test]
    fn test_checkpoints_once_per_generation_plus_final() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut engine = EvolutionEngine::new(small_config(), flat_terrain())
            .unwrap()
            .with_checkpoint_sink(Box::new(move |cp| {
                let _ = tx.send(cp);
            }));
        engine.run();
        let checkpoints: Vec<Checkpoint> = rx.try_iter().collect();
        assert_eq!(checkpoints.len(), 4);
        assert!(checkpoints[0].label.starts_with("gen-0@"));
        assert!(checkpoints[3].label.starts_with("final@"));
        // Every emitted genome is decodable.
        for cp in &checkpoints {
            assert!(cp.genome.parse::<Genome>().is_ok());
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = small_config();
        config.population.size = 0;
        assert!(matches!(
            EvolutionEngine::new(config, flat_terrain()),
            Err(ConfigError::EmptyPopulation)
        ));
    }
}
