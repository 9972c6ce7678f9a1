//! Lander Evolve CLI - Run controller searches from JSON configuration.

use std::fs;
use std::path::PathBuf;

use lander_evolve::{
    schema::{EvolutionConfig, Terrain},
    sim::SCREEN_WIDTH,
    sim::evolution::{CheckpointWriter, EvolutionEngine},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [checkpoints.jsonl]", args[0]);
        eprintln!();
        eprintln!("Search for a PID landing controller from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json        Path to search configuration file");
        eprintln!("  checkpoints.jsonl  Checkpoint output path (default: checkpoints.jsonl)");
        eprintln!();
        eprintln!("Terrain is read from <config>.terrain.json when present;");
        eprintln!("otherwise a flat floor with a centered landing zone is used.");
        eprintln!();
        eprintln!("Example configuration is printed with the --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let checkpoint_path = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "checkpoints.jsonl".to_string());

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: EvolutionConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    // Load or create terrain
    let terrain_path = config_path.with_extension("terrain.json");
    let terrain: Terrain = if terrain_path.exists() {
        let terrain_str = fs::read_to_string(&terrain_path).unwrap_or_else(|e| {
            eprintln!("Error reading terrain file: {}", e);
            std::process::exit(1);
        });
        serde_json::from_str(&terrain_str).unwrap_or_else(|e| {
            eprintln!("Error parsing terrain: {}", e);
            std::process::exit(1);
        })
    } else {
        Terrain::flat(SCREEN_WIDTH, 100.0, 350.0, 450.0)
    };

    println!("Lander Evolve");
    println!("=============");
    println!(
        "Population: {} x {} generations",
        config.population.size, config.population.max_generations
    );
    println!(
        "Gravity: {} samples from [{}, {})",
        config.evaluation.gravity_samples,
        config.evaluation.gravity_range.0,
        config.evaluation.gravity_range.1
    );
    let zone = terrain.landing_zone();
    println!(
        "Landing zone: x in [{}, {}] at height {}",
        zone.x_min, zone.x_max, zone.y
    );
    println!();

    let writer = CheckpointWriter::create(&checkpoint_path).unwrap_or_else(|e| {
        eprintln!("Error creating checkpoint file: {}", e);
        std::process::exit(1);
    });

    let mut engine = EvolutionEngine::new(config, terrain)
        .unwrap_or_else(|e| {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        })
        .with_checkpoint_sink(writer.sink());

    println!("Running search...");
    let result = engine.run_with_callback(|progress| {
        println!(
            "  Generation {}/{}: best={:.1}, avg={:.1}, diversity={:.3}, success={:.0}%",
            progress.generation + 1,
            progress.total_generations,
            progress.stats.best_fitness,
            progress.stats.avg_fitness,
            progress.stats.diversity,
            progress.stats.success_rate * 100.0
        );
    });

    if let Err(e) = writer.finish() {
        eprintln!("Error writing checkpoints: {}", e);
        std::process::exit(1);
    }

    println!();
    println!("Best fitness: {:.1}", result.best_fitness);
    println!("Best genome:  {}", result.best_genome);
    println!(
        "Evaluations: {} in {:.2}s ({:.1}/s)",
        result.total_evaluations,
        result.elapsed_seconds,
        result.total_evaluations as f64 / result.elapsed_seconds
    );
    println!("Checkpoints: {}", checkpoint_path);
}

fn print_example_config() {
    let config = EvolutionConfig::default();
    let terrain = Terrain::flat(SCREEN_WIDTH, 100.0, 350.0, 450.0);

    println!("Example configuration (config.json):");
    println!("{}", serde_json::to_string_pretty(&config).unwrap());
    println!();
    println!("Example terrain (config.terrain.json):");
    println!("{}", serde_json::to_string_pretty(&terrain).unwrap());
}
