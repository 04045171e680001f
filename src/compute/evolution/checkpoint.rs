//! Elite checkpoints and the per-generation progress log.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::schema::Genome;

/// `path` with `suffix` appended to its file name.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

impl Genome {
    /// Write the genome as JSON, replacing any previous file.
    ///
    /// The file is written beside the target and renamed over it, so a
    /// reader never sees a half-written checkpoint.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        let staging = with_suffix(path, ".tmp");
        fs::write(&staging, json).map_err(|source| CheckpointError::Io {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, path).map_err(|source| {
            let _ = fs::remove_file(&staging);
            CheckpointError::Io {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Read and validate a genome checkpoint.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Genome, CheckpointError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Persists the elite and appends progress records.
#[derive(Debug, Clone)]
pub struct Checkpointer {
    model_file: PathBuf,
    log_file: PathBuf,
}

impl Checkpointer {
    /// Checkpoint to `model_file`; progress goes to `<model_file>.csv`.
    pub fn new<P: AsRef<Path>>(model_file: P) -> Self {
        let model_file = model_file.as_ref().to_path_buf();
        let log_file = with_suffix(&model_file, ".csv");
        Self {
            model_file,
            log_file,
        }
    }

    pub fn model_file(&self) -> &Path {
        &self.model_file
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Overwrite the elite checkpoint.
    pub fn save_elite(&self, elite: &Genome) -> Result<(), CheckpointError> {
        elite.save_to_file(&self.model_file)
    }

    /// Append one `generation,bestScore` record.
    pub fn append_progress(
        &self,
        generation: usize,
        best_score: f64,
    ) -> Result<(), CheckpointError> {
        let io_error = |source: io::Error| CheckpointError::Io {
            path: self.log_file.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .map_err(io_error)?;
        writeln!(file, "{},{}", generation, best_score).map_err(io_error)
    }

    /// Read back every progress record.
    pub fn read_progress(&self) -> Result<Vec<(usize, f64)>, CheckpointError> {
        let content = fs::read_to_string(&self.log_file).map_err(|source| CheckpointError::Io {
            path: self.log_file.clone(),
            source,
        })?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                parse_record(line).ok_or_else(|| CheckpointError::BadRecord(line.to_string()))
            })
            .collect()
    }
}

fn parse_record(line: &str) -> Option<(usize, f64)> {
    let (generation, score) = line.split_once(',')?;
    Some((generation.trim().parse().ok()?, score.trim().parse().ok()?))
}

/// Checkpoint persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Genome serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Malformed progress record: {0:?}")]
    BadRecord(String),
}
