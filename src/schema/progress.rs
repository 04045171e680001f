//! Progress and result types reported by a training run.

use std::time::Duration;

use serde::Serialize;

use super::Genome;

/// Snapshot emitted after each generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Zero-based generation index.
    pub generation: usize,
    /// Total generations in the run.
    pub total_generations: usize,
    /// Best score seen so far.
    pub best_score: f64,
    /// Best child score in this generation.
    pub generation_best: f64,
    /// Wall time spent on this generation.
    pub elapsed: Duration,
    /// Estimated time for the remaining generations.
    pub eta: Duration,
    /// Whether both the elite checkpoint and the progress record were written.
    pub checkpointed: bool,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingResult {
    /// Final elite genome.
    pub elite: Genome,
    /// Score of the final elite.
    pub best_score: f64,
    /// Best score after each generation.
    pub history: Vec<f64>,
    /// Generations whose checkpoint or progress record failed to persist.
    pub checkpoint_failures: usize,
}
