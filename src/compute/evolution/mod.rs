//! Evolutionary search module: (1+lambda) Cartesian Genetic Programming.
//!
//! # Overview
//!
//! - **Genome Operations** (`genome`): random generation, point mutation and
//!   child regeneration
//! - **Population** (`population`): fixed child slots reused every generation
//! - **Fitness** (`fitness`): the [`Trainer`] contract and a reference task
//! - **Scheduling** (`scheduler`): sequential or worker-pool evaluation
//! - **Checkpoints** (`checkpoint`): elite persistence and the progress log
//! - **Search** (`search`): the generation loop and elite selection
//!
//! # Example
//!
//! ```rust,no_run
//! use cgp_evolve::compute::evolution::{CurveFitTrainer, TrainingEnvironment};
//! use cgp_evolve::schema::CgpConfig;
//!
//! let config = CgpConfig {
//!     outputs: 1,
//!     individuals: 400,
//!     ..Default::default()
//! };
//! let mut trainer = CurveFitTrainer::from_fn(|x| x * x, (-1.0, 1.0), 21);
//!
//! let mut env = TrainingEnvironment::new(config).unwrap();
//! let result = env
//!     .run_with_callback(&mut trainer, |report| {
//!         println!("Generation {}: best = {:.4}", report.generation, report.best_score);
//!     })
//!     .unwrap();
//! println!("Final score: {}", result.best_score);
//! ```

mod checkpoint;
mod fitness;
mod genome;
mod population;
mod scheduler;
mod search;

pub use checkpoint::{CheckpointError, Checkpointer};
pub use fitness::{CurveFitEnv, CurveFitError, CurveFitTrainer, Trainer};
pub use genome::GenomeRng;
pub use population::Population;
pub use scheduler::{
    EvaluationError, EvaluationScheduler, ParallelScheduler, Scored, evaluate_sequential,
};
pub use search::{TrainingEnvironment, TrainingError, estimate_remaining, select_elite};
