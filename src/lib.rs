//! Lander Evolve - Genetic search for PID landing controllers.
//!
//! This crate searches, with a generational genetic algorithm, for a
//! controller configuration — three PID gains plus a timed sequence of
//! thrust/drift actions — that lands a simulated 2D vehicle softly under
//! gravity values it has never seen.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: configuration, genome, and terrain types (all serde-enabled)
//! - `sim`: the PID controller, the deterministic physics simulation, and
//!   the evolutionary search built on top of them
//!
//! # Example
//!
//! ```rust,no_run
//! use lander_evolve::{
//!     schema::{EvolutionConfig, Terrain},
//!     sim::evolution::EvolutionEngine,
//! };
//!
//! // Flat ground at height 100 with a landing zone between the flags.
//! let terrain = Terrain::flat(800.0, 100.0, 350.0, 450.0);
//!
//! let mut engine = EvolutionEngine::new(EvolutionConfig::default(), terrain)
//!     .expect("default configuration is valid");
//! let result = engine.run();
//!
//! println!("best fitness: {:.1}", result.best_fitness);
//! println!("best genome:  {}", result.best_genome);
//! ```

pub mod schema;
pub mod sim;

// Re-export commonly used types
pub use schema::{Action, ActionKind, EvolutionConfig, Genome, Terrain, TerrainPoint};
pub use sim::evolution::{EvolutionEngine, EvolutionResult, FitnessEvaluator};
pub use sim::{LanderState, Outcome, PidController, Simulation};
