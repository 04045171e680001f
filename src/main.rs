//! CGP Evolve CLI - Run an evolution from a JSON configuration.

use std::path::PathBuf;
use std::time::Instant;

use cgp_evolve::{
    compute::evolution::{CurveFitTrainer, TrainingEnvironment},
    schema::{CgpConfig, Genome},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [elite.json]", args[0]);
        eprintln!();
        eprintln!("Evolve a program fitting sin(pi * x) on [-1, 1].");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to evolution configuration file");
        eprintln!("  elite.json   Optional checkpoint to resume from");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let config = CgpConfig::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    println!("CGP Evolution");
    println!("=============");
    println!(
        "Genome: {} inputs, {} nodes, {} outputs",
        config.inputs, config.function_genes, config.outputs
    );
    println!(
        "Generations: {} x {} children",
        config.generations(),
        config.children_per_generation
    );
    println!("Evaluation: {:?}", config.evaluation);
    println!("Checkpoint: {}", config.model_file.display());
    println!();

    let mut env = TrainingEnvironment::new(config).unwrap_or_else(|e| {
        eprintln!("Error creating training environment: {}", e);
        std::process::exit(1);
    });

    if let Some(elite_path) = args.get(2) {
        let elite = Genome::load_from_file(elite_path).unwrap_or_else(|e| {
            eprintln!("Error loading elite: {}", e);
            std::process::exit(1);
        });
        env = env.with_elite(elite).unwrap_or_else(|e| {
            eprintln!("Error resuming from elite: {}", e);
            std::process::exit(1);
        });
    }

    let mut trainer =
        CurveFitTrainer::from_fn(|x| (std::f64::consts::PI * x).sin(), (-1.0, 1.0), 41);

    let start = Instant::now();
    let result = env
        .run_with_callback(&mut trainer, |report| {
            let every = (report.total_generations / 10).max(1);
            if (report.generation + 1) % every == 0 {
                println!(
                    "  Generation {}/{}: best={:.6}, est. {:.1} min remaining",
                    report.generation + 1,
                    report.total_generations,
                    report.best_score,
                    report.eta.as_secs_f64() / 60.0
                );
            }
        })
        .unwrap_or_else(|e| {
            eprintln!("Run failed: {}", e);
            std::process::exit(1);
        });

    let active = result.elite.active_nodes().count();
    println!();
    println!("Final elite:");
    println!("  Best score: {:.6}", result.best_score);
    println!(
        "  Active nodes: {} of {}",
        active,
        result.elite.nodes().len()
    );
    if result.checkpoint_failures > 0 {
        println!(
            "  WARNING: {} checkpoint(s) failed to persist",
            result.checkpoint_failures
        );
    }
    println!("Time: {:.2}s", start.elapsed().as_secs_f32());
}

fn print_example_config() {
    let config = CgpConfig {
        outputs: 1,
        model_file: PathBuf::from("sine.out"),
        ..Default::default()
    };

    match serde_json::to_string_pretty(&config) {
        Ok(json) => {
            println!("Example configuration (config.json):");
            println!("{}", json);
        }
        Err(e) => eprintln!("Error serializing example config: {}", e),
    }
}
