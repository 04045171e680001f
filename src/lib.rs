//! CGP Evolve - Cartesian Genetic Programming with a (1+lambda) strategy.
//!
//! This crate evolves small numeric programs, acyclic graphs of primitive
//! operators, that act as decision functions for an agent.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, genome and progress types
//! - `compute`: Operands, the function catalog, graph evaluation and the
//!   evolutionary search (`compute::evolution`)
//!
//! # Example
//!
//! ```rust,no_run
//! use cgp_evolve::{
//!     compute::{Operand, evolution::GenomeRng},
//!     schema::CgpConfig,
//! };
//!
//! let config = CgpConfig::default();
//! let genome = GenomeRng::new(42).random_genome(&config);
//!
//! // One primary input, six outputs.
//! let outputs = genome.evaluate(&[Operand::Scalar(0.5)]);
//! assert_eq!(outputs.len(), 6);
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{Trainer, TrainingEnvironment};
pub use compute::{Function, Operand};
pub use schema::{CgpConfig, Genome, NodeGene};
