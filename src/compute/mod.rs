//! Compute module - Operands, the function catalog and graph evaluation.

mod function;
mod graph;
mod operand;

pub mod evolution;

pub use function::*;
pub use operand::*;

pub(crate) use graph::mark_active;
