//! Fitness evaluation: the trainer contract and a reference task.

use crate::compute::Operand;
use crate::schema::Genome;

/// Runs one episode of a task driven by a genome's decision function.
///
/// Trainers are cloned per unit of work when children are evaluated in
/// parallel, so a clone must not share mutable episode state with its
/// original.
pub trait Trainer: Clone + Send {
    /// Task environment, built once per run and shared read-only.
    type Env: Sync;
    /// Episode failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Produce the task environment.
    fn get_env(&self) -> Self::Env;

    /// Clear per-episode state. Called before every episode.
    fn reset(&mut self);

    /// Run a full episode and return its score; higher is better.
    fn run_episode(&mut self, env: &Self::Env, genome: &Genome) -> Result<f64, Self::Error>;
}

/// Sample points of a curve-fitting task.
#[derive(Debug, Clone)]
pub struct CurveFitEnv {
    pub points: Vec<(f64, f64)>,
}

/// Reference task: fit the genome's first output to a target curve.
///
/// Every primary input receives the sample's `x`; the score is the negative
/// mean squared error over all samples.
#[derive(Debug, Clone)]
pub struct CurveFitTrainer {
    points: Vec<(f64, f64)>,
    squared_error: f64,
    samples_seen: usize,
}

impl CurveFitTrainer {
    /// Create from explicit `(x, y)` samples.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self {
            points,
            squared_error: 0.0,
            samples_seen: 0,
        }
    }

    /// Sample `target` at `samples` evenly spaced points in `range`.
    pub fn from_fn(target: impl Fn(f64) -> f64, range: (f64, f64), samples: usize) -> Self {
        let step = if samples > 1 {
            (range.1 - range.0) / (samples - 1) as f64
        } else {
            0.0
        };
        let points = (0..samples)
            .map(|i| {
                let x = range.0 + step * i as f64;
                (x, target(x))
            })
            .collect();
        Self::new(points)
    }

    /// Samples scored so far in the current episode.
    pub fn samples_seen(&self) -> usize {
        self.samples_seen
    }
}

impl Trainer for CurveFitTrainer {
    type Env = CurveFitEnv;
    type Error = CurveFitError;

    fn get_env(&self) -> CurveFitEnv {
        CurveFitEnv {
            points: self.points.clone(),
        }
    }

    fn reset(&mut self) {
        self.squared_error = 0.0;
        self.samples_seen = 0;
    }

    fn run_episode(&mut self, env: &CurveFitEnv, genome: &Genome) -> Result<f64, CurveFitError> {
        if env.points.is_empty() {
            return Err(CurveFitError::NoSamples);
        }

        for &(x, y) in &env.points {
            let inputs = vec![Operand::Scalar(x); genome.inputs()];
            let prediction = genome
                .evaluate(&inputs)
                .first()
                .map_or(0.0, Operand::scalar_value);
            self.squared_error += (prediction - y).powi(2);
            self.samples_seen += 1;
        }

        Ok(-self.squared_error / self.samples_seen as f64)
    }
}

/// Curve-fitting episode errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CurveFitError {
    #[error("Curve-fitting environment has no samples")]
    NoSamples,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Function;
    use crate::schema::NodeGene;

    fn identity_genome() -> Genome {
        Genome::from_parts(1, vec![], vec![0]).unwrap()
    }

    #[test]
    fn test_perfect_fit_scores_zero() {
        let mut trainer = CurveFitTrainer::from_fn(|x| x, (-1.0, 1.0), 11);
        let env = trainer.get_env();
        trainer.reset();
        let score = trainer.run_episode(&env, &identity_genome()).unwrap();
        assert_eq!(score, 0.0);
        assert_eq!(trainer.samples_seen(), 11);
    }

    #[test]
    fn test_better_fit_scores_higher() {
        let mut trainer = CurveFitTrainer::from_fn(|x| x * x, (-1.0, 1.0), 21);
        let env = trainer.get_env();

        let square = Genome::from_parts(
            1,
            vec![NodeGene {
                function: Function::Mult.slot(),
                inputs: [0, 0],
                parameter: 0.0,
            }],
            vec![1],
        )
        .unwrap();

        trainer.reset();
        let exact = trainer.run_episode(&env, &square).unwrap();
        trainer.reset();
        let linear = trainer.run_episode(&env, &identity_genome()).unwrap();

        assert!(exact.abs() < 1e-12);
        assert!(linear < exact);
    }

    #[test]
    fn test_reset_clears_episode_state() {
        let mut trainer = CurveFitTrainer::from_fn(|x| x + 1.0, (0.0, 1.0), 5);
        let env = trainer.get_env();
        let genome = identity_genome();

        trainer.reset();
        let first = trainer.run_episode(&env, &genome).unwrap();
        trainer.reset();
        let second = trainer.run_episode(&env, &genome).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(first, -1.0);
    }

    #[test]
    fn test_empty_environment_errors() {
        let mut trainer = CurveFitTrainer::new(vec![]);
        let env = trainer.get_env();
        assert_eq!(
            trainer.run_episode(&env, &identity_genome()),
            Err(CurveFitError::NoSamples)
        );
    }
}
