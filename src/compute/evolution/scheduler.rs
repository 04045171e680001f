//! Child evaluation schedulers.
//!
//! Both strategies return one [`Scored`] per child, in slot order, whatever
//! order the episodes actually finish in.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use log::debug;
use rayon::prelude::*;

use crate::schema::{EvaluationStrategy, Genome};

use super::Trainer;

/// A child paired with its episode score.
#[derive(Debug, Clone, Copy)]
pub struct Scored<'a> {
    /// Slot the child occupies in the population.
    pub slot: usize,
    /// The evaluated genome.
    pub genome: &'a Genome,
    /// Episode score.
    pub score: f64,
}

/// Evaluates every child of a generation.
pub enum EvaluationScheduler {
    /// Episodes run one after another on the calling thread.
    Sequential,
    /// Episodes run on a bounded worker pool.
    Parallel(ParallelScheduler),
}

impl EvaluationScheduler {
    /// Build the scheduler for a configured strategy.
    pub fn from_strategy(strategy: EvaluationStrategy) -> Result<Self, EvaluationError> {
        match strategy {
            EvaluationStrategy::Sequential => Ok(EvaluationScheduler::Sequential),
            EvaluationStrategy::Parallel { workers } => {
                ParallelScheduler::new(workers).map(EvaluationScheduler::Parallel)
            }
        }
    }

    /// Evaluate all children and pair each score with its child.
    ///
    /// Blocks until every episode has finished. Any failed episode fails the
    /// whole call; no score is invented for it.
    pub fn evaluate<'a, T: Trainer>(
        &self,
        trainer: &mut T,
        env: &T::Env,
        children: &'a [Genome],
    ) -> Result<Vec<Scored<'a>>, EvaluationError> {
        match self {
            EvaluationScheduler::Sequential => evaluate_sequential(trainer, env, children),
            EvaluationScheduler::Parallel(pool) => pool.evaluate(trainer, env, children),
        }
    }
}

/// Run each child in turn, resetting the shared trainer before every episode.
pub fn evaluate_sequential<'a, T: Trainer>(
    trainer: &mut T,
    env: &T::Env,
    children: &'a [Genome],
) -> Result<Vec<Scored<'a>>, EvaluationError> {
    children
        .iter()
        .enumerate()
        .map(|(slot, genome)| {
            trainer.reset();
            let score = run_unit(trainer, env, slot, genome)?;
            Ok(Scored { slot, genome, score })
        })
        .collect()
}

/// Worker pool evaluating children concurrently.
///
/// Every unit of work owns a freshly cloned and reset trainer, so no episode
/// state is shared between concurrent units or leaks from one unit into the
/// next on the same worker.
pub struct ParallelScheduler {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl ParallelScheduler {
    /// Create a pool of `workers` threads.
    pub fn new(workers: usize) -> Result<Self, EvaluationError> {
        if workers == 0 {
            return Err(EvaluationError::NoWorkers);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("cgp-worker-{}", i))
            .build()?;
        Ok(Self { pool, workers })
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Evaluate all children on the pool.
    pub fn evaluate<'a, T: Trainer>(
        &self,
        trainer: &T,
        env: &T::Env,
        children: &'a [Genome],
    ) -> Result<Vec<Scored<'a>>, EvaluationError> {
        let units: Vec<(usize, &'a Genome, T)> = children
            .iter()
            .enumerate()
            .map(|(slot, genome)| {
                let mut unit_trainer = trainer.clone();
                unit_trainer.reset();
                (slot, genome, unit_trainer)
            })
            .collect();

        // Collect every outcome before inspecting any, so all units finish.
        let outcomes: Vec<Result<Scored<'a>, EvaluationError>> = self.pool.install(|| {
            units
                .into_par_iter()
                .map(|(slot, genome, mut unit_trainer)| {
                    debug!("slot {} dispatched", slot);
                    let score = run_unit(&mut unit_trainer, env, slot, genome)?;
                    Ok(Scored { slot, genome, score })
                })
                .collect()
        });

        outcomes.into_iter().collect()
    }
}

/// Run one episode, turning errors, panics and NaN scores into failures.
fn run_unit<T: Trainer>(
    trainer: &mut T,
    env: &T::Env,
    slot: usize,
    genome: &Genome,
) -> Result<f64, EvaluationError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| trainer.run_episode(env, genome)));
    match outcome {
        Ok(Ok(score)) if score.is_nan() => Err(EvaluationError::InvalidScore { slot }),
        Ok(Ok(score)) => Ok(score),
        Ok(Err(source)) => Err(EvaluationError::Episode {
            slot,
            source: Box::new(source),
        }),
        Err(payload) => Err(EvaluationError::WorkerPanicked {
            slot,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Child evaluation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Episode for child {slot} failed: {source}")]
    Episode {
        slot: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Worker evaluating child {slot} panicked: {message}")]
    WorkerPanicked { slot: usize, message: String },
    #[error("Child {slot} produced a NaN score")]
    InvalidScore { slot: usize },
    #[error("Worker pool needs at least one worker")]
    NoWorkers,
    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
