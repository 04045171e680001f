//! Schema module - Configuration, genome and progress types for CGP runs.

mod config;
mod genome;
mod progress;

pub use config::*;
pub use genome::*;
pub use progress::*;
