//! Configuration types for CGP evolution runs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

fn default_parameter_bounds() -> (f64, f64) {
    (-1.0, 1.0)
}

/// Top-level evolution configuration.
///
/// Keys are camelCase on disk (`functionGenes`, `childrenPerGeneration`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CgpConfig {
    /// Number of primary inputs.
    pub inputs: usize,
    /// Number of program outputs.
    pub outputs: usize,
    /// Number of function nodes in every genome.
    pub function_genes: usize,
    /// Per-node probability of resampling the scalar parameter.
    pub input_scalar_r: f64,
    /// Per-field probability of mutating a node's function or connections.
    pub genes_mutated: f64,
    /// Per-output probability of rewiring an output gene.
    pub outputs_mutated: f64,
    /// Total genome evaluations across the run.
    pub individuals: usize,
    /// Children produced per generation (lambda).
    pub children_per_generation: usize,
    /// Elite checkpoint path. The progress log is written next to it.
    pub model_file: PathBuf,
    /// Range node parameters are sampled from.
    #[serde(default = "default_parameter_bounds")]
    pub parameter_bounds: (f64, f64),
    /// Elite replacement policy.
    #[serde(default)]
    pub selection: SelectionPolicy,
    /// How children are evaluated.
    #[serde(default)]
    pub evaluation: EvaluationStrategy,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for CgpConfig {
    fn default() -> Self {
        Self {
            inputs: 1,
            outputs: 6,
            function_genes: 40,
            input_scalar_r: 0.1,
            genes_mutated: 0.1,
            outputs_mutated: 0.6,
            individuals: 10_000,
            children_per_generation: 4,
            model_file: PathBuf::from("tetris.out"),
            parameter_bounds: default_parameter_bounds(),
            selection: SelectionPolicy::default(),
            evaluation: EvaluationStrategy::default(),
            random_seed: None,
        }
    }
}

/// How a child's score is compared against the running best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionPolicy {
    /// Replace the elite on `score >= best`; the latest equal child wins.
    #[default]
    NeutralDrift,
    /// Replace the elite only on `score > best`.
    Strict,
}

impl SelectionPolicy {
    /// Whether `score` displaces the current `best`.
    #[inline]
    pub fn accepts(self, score: f64, best: f64) -> bool {
        match self {
            SelectionPolicy::NeutralDrift => score >= best,
            SelectionPolicy::Strict => score > best,
        }
    }
}

/// Child evaluation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum EvaluationStrategy {
    /// One child after another on the calling thread.
    #[default]
    Sequential,
    /// A bounded worker pool, one isolated trainer per child.
    Parallel { workers: usize },
}

impl CgpConfig {
    /// Number of generations: `individuals / childrenPerGeneration`.
    #[inline]
    pub fn generations(&self) -> usize {
        if self.children_per_generation == 0 {
            0
        } else {
            self.individuals / self.children_per_generation
        }
    }

    /// Size of the address space nodes and outputs can reference.
    #[inline]
    pub fn genome_size(&self) -> usize {
        self.inputs + self.function_genes
    }

    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CgpConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inputs == 0 {
            return Err(ConfigError::NoInputs);
        }
        if self.outputs == 0 {
            return Err(ConfigError::NoOutputs);
        }
        if self.children_per_generation == 0 {
            return Err(ConfigError::NoChildren);
        }
        if self.individuals < self.children_per_generation {
            return Err(ConfigError::NoGenerations {
                individuals: self.individuals,
                children: self.children_per_generation,
            });
        }

        let check_probability = |value: f64, name: &'static str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::InvalidProbability { name, value })
            }
        };
        check_probability(self.input_scalar_r, "inputScalarR")?;
        check_probability(self.genes_mutated, "genesMutated")?;
        check_probability(self.outputs_mutated, "outputsMutated")?;

        let (low, high) = self.parameter_bounds;
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(ConfigError::InvalidBounds { low, high });
        }

        if let EvaluationStrategy::Parallel { workers: 0 } = self.evaluation {
            return Err(ConfigError::NoWorkers);
        }

        if self.model_file.as_os_str().is_empty() {
            return Err(ConfigError::NoModelFile);
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Input count must be non-zero")]
    NoInputs,
    #[error("Output count must be non-zero")]
    NoOutputs,
    #[error("childrenPerGeneration must be non-zero")]
    NoChildren,
    #[error("{individuals} individuals cannot fill one generation of {children} children")]
    NoGenerations { individuals: usize, children: usize },
    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("Invalid parameter bounds [{low}, {high}]")]
    InvalidBounds { low: f64, high: f64 },
    #[error("Parallel evaluation needs at least one worker")]
    NoWorkers,
    #[error("modelFile must not be empty")]
    NoModelFile,
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
