//! The (1+lambda) evolution loop.

use std::time::{Duration, Instant};

use log::{error, info};

use crate::schema::{
    CgpConfig, ConfigError, GenerationReport, Genome, GenomeError, SelectionPolicy, TrainingResult,
};

use super::checkpoint::Checkpointer;
use super::genome::GenomeRng;
use super::population::Population;
use super::scheduler::{EvaluationError, EvaluationScheduler, Scored};
use super::Trainer;

/// Scan results in order and return the index of the last accepted child.
///
/// `best` is updated to every accepted score. Under neutral drift an equal
/// score is accepted, so the last of several tying children wins.
pub fn select_elite(
    policy: SelectionPolicy,
    results: &[Scored<'_>],
    best: &mut f64,
) -> Option<usize> {
    let mut selected = None;
    for (index, result) in results.iter().enumerate() {
        if policy.accepts(result.score, *best) {
            *best = result.score;
            selected = Some(index);
        }
    }
    selected
}

/// Drives an elitist (1+lambda) run: regenerate children from the elite,
/// evaluate them, select, checkpoint, report.
pub struct TrainingEnvironment {
    config: CgpConfig,
    rng: GenomeRng,
    scheduler: EvaluationScheduler,
    checkpointer: Checkpointer,
    elite: Genome,
    best_score: f64,
    population: Population,
}

impl TrainingEnvironment {
    /// Create a run with a random elite.
    pub fn new(config: CgpConfig) -> Result<Self, TrainingError> {
        config.validate()?;
        let mut rng = GenomeRng::from_config(&config);
        let scheduler = EvaluationScheduler::from_strategy(config.evaluation)?;
        let checkpointer = Checkpointer::new(&config.model_file);
        let elite = rng.random_genome(&config);
        let population = Population::new(&config, &mut rng);

        Ok(Self {
            config,
            rng,
            scheduler,
            checkpointer,
            elite,
            best_score: f64::NEG_INFINITY,
            population,
        })
    }

    /// Start from an existing elite, e.g. one loaded from a checkpoint.
    ///
    /// The best score is reset, so the first generation always adopts a child
    /// under neutral drift.
    pub fn with_elite(mut self, elite: Genome) -> Result<Self, TrainingError> {
        if !elite.same_shape(&self.elite) {
            return Err(TrainingError::Genome(GenomeError::ShapeMismatch));
        }
        self.elite = elite;
        Ok(self)
    }

    pub fn config(&self) -> &CgpConfig {
        &self.config
    }

    pub fn elite(&self) -> &Genome {
        &self.elite
    }

    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Run every generation, reporting after each one.
    pub fn run_with_callback<T, F>(
        &mut self,
        trainer: &mut T,
        mut callback: F,
    ) -> Result<TrainingResult, TrainingError>
    where
        T: Trainer,
        F: FnMut(&GenerationReport),
    {
        let generations = self.config.generations();
        let env = trainer.get_env();
        let mut history = Vec::with_capacity(generations);
        let mut checkpoint_failures = 0;

        info!(
            "Starting run: {} generations of {} children",
            generations,
            self.population.len()
        );

        for generation in 0..generations {
            let start = Instant::now();

            self.rng
                .update_children(&self.elite, &mut self.population, &self.config);

            let results = self
                .scheduler
                .evaluate(trainer, &env, self.population.children())?;

            let generation_best = results
                .iter()
                .map(|r| r.score)
                .fold(f64::NEG_INFINITY, f64::max);

            let selected = select_elite(self.config.selection, &results, &mut self.best_score);
            if let Some(index) = selected {
                results[index].genome.copy_into(&mut self.elite);
            }
            history.push(self.best_score);

            let checkpointed = self.checkpoint(generation);
            if !checkpointed {
                checkpoint_failures += 1;
            }

            let elapsed = start.elapsed();
            let eta = estimate_remaining(elapsed, generations - generation - 1);
            info!(
                "Generation {} of {} complete, best score = {}, est. minutes remaining: {:.2}",
                generation + 1,
                generations,
                self.best_score,
                eta.as_secs_f64() / 60.0
            );

            callback(&GenerationReport {
                generation,
                total_generations: generations,
                best_score: self.best_score,
                generation_best,
                elapsed,
                eta,
                checkpointed,
            });
        }

        Ok(TrainingResult {
            elite: self.elite.clone(),
            best_score: self.best_score,
            history,
            checkpoint_failures,
        })
    }

    /// Run every generation (blocking).
    pub fn run<T: Trainer>(&mut self, trainer: &mut T) -> Result<TrainingResult, TrainingError> {
        self.run_with_callback(trainer, |_| {})
    }

    /// Save the elite and append the progress record. Each write is
    /// attempted even if the other fails; returns whether both succeeded.
    fn checkpoint(&self, generation: usize) -> bool {
        let saved = self.checkpointer.save_elite(&self.elite);
        if let Err(e) = &saved {
            error!("Saving elite for generation {} failed: {}", generation, e);
        }
        let logged = self
            .checkpointer
            .append_progress(generation, self.best_score);
        if let Err(e) = &logged {
            error!("Progress record for generation {} failed: {}", generation, e);
        }
        saved.is_ok() && logged.is_ok()
    }
}

/// Estimated time for `remaining` generations at `per_generation` each.
pub fn estimate_remaining(per_generation: Duration, remaining: usize) -> Duration {
    per_generation.mul_f64(remaining as f64)
}

/// Training run errors.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid genome: {0}")]
    Genome(#[from] GenomeError),
    #[error("Generation failed: {0}")]
    Evaluation(#[from] EvaluationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::evolution::CurveFitTrainer;
    use crate::schema::EvaluationStrategy;
    use std::convert::Infallible;
    use tempfile::tempdir;

    /// Deterministic score computed from the genotype.
    fn genotype_score(genome: &Genome) -> f64 {
        let nodes: f64 = genome
            .nodes()
            .iter()
            .filter(|n| n.function % 3 == 0)
            .map(|n| n.parameter.abs())
            .sum();
        let outputs: f64 = genome.outputs().iter().map(|&o| (o % 5) as f64).sum();
        nodes + outputs
    }

    #[derive(Clone)]
    struct GenotypeTrainer;

    impl Trainer for GenotypeTrainer {
        type Env = ();
        type Error = Infallible;

        fn get_env(&self) {}

        fn reset(&mut self) {}

        fn run_episode(&mut self, _env: &(), genome: &Genome) -> Result<f64, Infallible> {
            Ok(genotype_score(genome))
        }
    }

    fn small_config(model_file: std::path::PathBuf) -> CgpConfig {
        CgpConfig {
            inputs: 2,
            outputs: 3,
            function_genes: 10,
            individuals: 20,
            children_per_generation: 4,
            model_file,
            random_seed: Some(1234),
            ..Default::default()
        }
    }

    fn wired(output: usize) -> Genome {
        Genome::from_parts(4, vec![], vec![output]).unwrap()
    }

    #[test]
    fn test_tie_favors_last_equal_child() {
        let children: Vec<Genome> = (0..4).map(wired).collect();
        let scores = [1.0, 0.5, 1.0, 0.2];
        let results: Vec<Scored> = children
            .iter()
            .zip(scores)
            .enumerate()
            .map(|(slot, (genome, score))| Scored { slot, genome, score })
            .collect();

        let mut best = 1.0;
        let selected = select_elite(SelectionPolicy::NeutralDrift, &results, &mut best);
        assert_eq!(selected, Some(2));
        assert_eq!(results[2].genome, &children[2]);
        assert_eq!(best, 1.0);

        let mut best = 1.0;
        assert_eq!(select_elite(SelectionPolicy::Strict, &results, &mut best), None);
    }

    #[test]
    fn test_selection_tracks_running_best() {
        let children: Vec<Genome> = (0..4).map(wired).collect();
        let scores = [3.0, 5.0, 4.0, 5.0];
        let results: Vec<Scored> = children
            .iter()
            .zip(scores)
            .enumerate()
            .map(|(slot, (genome, score))| Scored { slot, genome, score })
            .collect();

        let mut best = f64::NEG_INFINITY;
        assert_eq!(
            select_elite(SelectionPolicy::NeutralDrift, &results, &mut best),
            Some(3)
        );
        assert_eq!(best, 5.0);

        let mut best = f64::NEG_INFINITY;
        assert_eq!(select_elite(SelectionPolicy::Strict, &results, &mut best), Some(1));
    }

    #[test]
    fn test_end_to_end_run() {
        let dir = tempdir().unwrap();
        let config = small_config(dir.path().join("elite.out"));
        let mut env = TrainingEnvironment::new(config).unwrap();

        let mut reports = Vec::new();
        let result = env
            .run_with_callback(&mut GenotypeTrainer, |report| reports.push(report.clone()))
            .unwrap();

        assert_eq!(reports.len(), 5);
        assert_eq!(result.history.len(), 5);
        assert!(result.history.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(result.checkpoint_failures, 0);

        let max_logged = result.history.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(result.best_score, max_logged);
        assert_eq!(genotype_score(&result.elite), max_logged);

        let checkpointed = Genome::load_from_file(dir.path().join("elite.out")).unwrap();
        assert_eq!(checkpointed, result.elite);
        assert_eq!(genotype_score(&checkpointed), max_logged);

        let records = Checkpointer::new(dir.path().join("elite.out"))
            .read_progress()
            .unwrap();
        let logged: Vec<f64> = records.iter().map(|&(_, s)| s).collect();
        assert_eq!(records.iter().map(|&(g, _)| g).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(logged, result.history);

        for (generation, report) in reports.iter().enumerate() {
            assert_eq!(report.generation, generation);
            assert_eq!(report.total_generations, 5);
            assert!(report.checkpointed);
            assert!(report.generation_best <= report.best_score);
        }
        assert_eq!(reports[4].eta, Duration::ZERO);
    }

    #[test]
    fn test_parallel_run_matches_sequential() {
        let dir = tempdir().unwrap();
        let sequential = small_config(dir.path().join("seq.out"));
        let parallel = CgpConfig {
            evaluation: EvaluationStrategy::Parallel { workers: 3 },
            ..small_config(dir.path().join("par.out"))
        };

        let a = TrainingEnvironment::new(sequential)
            .unwrap()
            .run(&mut GenotypeTrainer)
            .unwrap();
        let b = TrainingEnvironment::new(parallel)
            .unwrap()
            .run(&mut GenotypeTrainer)
            .unwrap();

        assert_eq!(a.history, b.history);
        assert_eq!(a.elite, b.elite);
    }

    #[test]
    fn test_checkpoint_failure_does_not_abort() {
        let dir = tempdir().unwrap();
        let config = small_config(dir.path().join("no-such-dir").join("elite.out"));
        let mut env = TrainingEnvironment::new(config).unwrap();

        let mut reports = Vec::new();
        let result = env
            .run_with_callback(&mut GenotypeTrainer, |r| reports.push(r.checkpointed))
            .unwrap();

        assert_eq!(result.history.len(), 5);
        assert_eq!(result.checkpoint_failures, 5);
        assert!(reports.iter().all(|&ok| !ok));
    }

    #[test]
    fn test_progress_log_survives_elite_failure() {
        let dir = tempdir().unwrap();
        // A directory at the model path makes every elite rename fail while
        // `<model_file>.csv` stays writable.
        let model_file = dir.path().join("elite.out");
        std::fs::create_dir(&model_file).unwrap();
        let mut env = TrainingEnvironment::new(small_config(model_file.clone())).unwrap();

        let result = env.run(&mut GenotypeTrainer).unwrap();
        assert_eq!(result.checkpoint_failures, 5);

        let records = Checkpointer::new(&model_file).read_progress().unwrap();
        assert_eq!(records.len(), 5);
        let logged: Vec<f64> = records.iter().map(|&(_, s)| s).collect();
        assert_eq!(logged, result.history);
        assert!(!dir.path().join("elite.out.tmp").exists());
    }

    #[test]
    fn test_curve_fit_improves() {
        let dir = tempdir().unwrap();
        let config = CgpConfig {
            inputs: 1,
            outputs: 1,
            function_genes: 20,
            individuals: 400,
            children_per_generation: 4,
            genes_mutated: 0.2,
            outputs_mutated: 0.3,
            model_file: dir.path().join("fit.out"),
            random_seed: Some(7),
            ..Default::default()
        };
        let mut trainer = CurveFitTrainer::from_fn(|x| x * x, (-1.0, 1.0), 21);
        let result = TrainingEnvironment::new(config)
            .unwrap()
            .run(&mut trainer)
            .unwrap();

        assert_eq!(result.history.len(), 100);
        assert!(result.history[99] >= result.history[0]);
        assert!(result.best_score <= 0.0);
    }

    #[test]
    fn test_with_elite_checks_shape() {
        let dir = tempdir().unwrap();
        let env = TrainingEnvironment::new(small_config(dir.path().join("e.out"))).unwrap();
        assert!(matches!(
            env.with_elite(wired(0)),
            Err(TrainingError::Genome(GenomeError::ShapeMismatch))
        ));

        let env = TrainingEnvironment::new(small_config(dir.path().join("e.out"))).unwrap();
        let elite = GenomeRng::new(3).random_genome(env.config());
        let env = env.with_elite(elite.clone()).unwrap();
        assert_eq!(env.elite(), &elite);
        assert_eq!(env.best_score(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CgpConfig {
            outputs: 0,
            ..Default::default()
        };
        assert!(matches!(
            TrainingEnvironment::new(config),
            Err(TrainingError::Config(ConfigError::NoOutputs))
        ));
    }

    #[test]
    fn test_estimate_remaining() {
        assert_eq!(
            estimate_remaining(Duration::from_millis(1500), 4),
            Duration::from_secs(6)
        );
        assert_eq!(estimate_remaining(Duration::from_secs(3), 0), Duration::ZERO);
    }
}
