//! Evolutionary search for landing controllers.
//!
//! # Overview
//!
//! The search consists of:
//!
//! - **Genome Operations** (`genome`): random generation, crossover, and
//!   mutation within configured bounds
//! - **Fitness Evaluation** (`fitness`): simulation runs under sampled
//!   gravities reduced to a scalar score
//! - **Search Loop** (`search`): generational genetic algorithm with
//!   tournament selection and elitism
//! - **Checkpoints** (`checkpoint`): deferred persistence of the best
//!   genome per generation
//!
//! # Example
//!
//! ```rust,no_run
//! use lander_evolve::schema::{EvolutionConfig, Terrain};
//! use lander_evolve::sim::evolution::EvolutionEngine;
//!
//! let config = EvolutionConfig::default();
//! let terrain = Terrain::flat(800.0, 100.0, 350.0, 450.0);
//!
//! let mut engine = EvolutionEngine::new(config, terrain).unwrap();
//! let result = engine.run_with_callback(|progress| {
//!     println!(
//!         "generation {}: best fitness = {:.1}",
//!         progress.generation, progress.best_fitness
//!     );
//! });
//!
//! println!("best genome: {}", result.best_genome);
//! ```

mod checkpoint;
mod fitness;
mod genome;
mod search;

pub use checkpoint::CheckpointWriter;
pub use fitness::FitnessEvaluator;
pub use genome::{GenomeRng, genome_distance};
pub use search::{
    Candidate, Checkpoint, CheckpointSink, EvolutionEngine, EvolutionProgress, EvolutionResult,
    GenerationStats, SearchHistory,
};
