//! Genome data types: a fixed-size CGP chromosome.
//!
//! Addresses `0..inputs` name primary inputs; address `inputs + i` names the
//! output of node `i`. A node may only reference addresses below its own, so
//! every genome is acyclic and evaluable in index order.

use serde::{Deserialize, Serialize};

use crate::compute::{Function, mark_active};

/// One evolvable graph node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeGene {
    /// Slot in the function catalog.
    pub function: usize,
    /// Addresses of the `x` and `y` operands.
    pub inputs: [usize; 2],
    /// Scalar parameter passed to the function.
    pub parameter: f64,
}

/// Plain serialized form of a genome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenomeData {
    pub inputs: usize,
    pub nodes: Vec<NodeGene>,
    pub outputs: Vec<usize>,
}

/// A CGP genome: node genes, output genes and the cached active-node mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GenomeData", into = "GenomeData")]
pub struct Genome {
    inputs: usize,
    nodes: Vec<NodeGene>,
    outputs: Vec<usize>,
    active: Vec<bool>,
}

impl Genome {
    /// Build a genome from raw genes, checking every invariant.
    pub fn from_parts(
        inputs: usize,
        nodes: Vec<NodeGene>,
        outputs: Vec<usize>,
    ) -> Result<Self, GenomeError> {
        let mut genome = Self {
            inputs,
            active: vec![false; nodes.len()],
            nodes,
            outputs,
        };
        genome.validate()?;
        genome.refresh_active();
        Ok(genome)
    }

    /// Build a genome from genes produced by the mutation operator.
    pub(crate) fn from_parts_unchecked(
        inputs: usize,
        nodes: Vec<NodeGene>,
        outputs: Vec<usize>,
    ) -> Self {
        let mut genome = Self {
            inputs,
            active: vec![false; nodes.len()],
            nodes,
            outputs,
        };
        genome.refresh_active();
        debug_assert!(genome.validate().is_ok(), "{:?}", genome.validate());
        genome
    }

    /// Number of primary inputs.
    #[inline]
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    /// Node genes in evaluation order.
    #[inline]
    pub fn nodes(&self) -> &[NodeGene] {
        &self.nodes
    }

    /// Output genes: one address per program output.
    #[inline]
    pub fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    /// Total number of addressable values (inputs plus nodes).
    #[inline]
    pub fn address_count(&self) -> usize {
        self.inputs + self.nodes.len()
    }

    /// Whether node `index` is reachable from an output.
    #[inline]
    pub fn is_active(&self, index: usize) -> bool {
        self.active.get(index).copied().unwrap_or(false)
    }

    /// Indices of nodes reachable from an output, ascending.
    pub fn active_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.active
            .iter()
            .enumerate()
            .filter_map(|(i, &active)| active.then_some(i))
    }

    /// Whether both genomes have the same dimensions.
    pub fn same_shape(&self, other: &Genome) -> bool {
        self.inputs == other.inputs
            && self.nodes.len() == other.nodes.len()
            && self.outputs.len() == other.outputs.len()
    }

    /// Overwrite `target` with this genotype, reusing its storage.
    pub fn copy_into(&self, target: &mut Genome) {
        target.inputs = self.inputs;
        target.nodes.clone_from(&self.nodes);
        target.outputs.clone_from(&self.outputs);
        target.active.clone_from(&self.active);
    }

    /// Edit genes in place, then recompute the active set.
    pub(crate) fn edit<F>(&mut self, f: F)
    where
        F: FnOnce(usize, &mut [NodeGene], &mut [usize]),
    {
        f(
            self.inputs,
            self.nodes.as_mut_slice(),
            self.outputs.as_mut_slice(),
        );
        self.refresh_active();
        debug_assert!(self.validate().is_ok(), "{:?}", self.validate());
    }

    fn refresh_active(&mut self) {
        mark_active(self.inputs, &self.nodes, &self.outputs, &mut self.active);
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), GenomeError> {
        if self.inputs == 0 {
            return Err(GenomeError::NoInputs);
        }
        if self.outputs.is_empty() {
            return Err(GenomeError::NoOutputs);
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if Function::from_slot(node.function).is_none() {
                return Err(GenomeError::UnknownFunction {
                    node: index,
                    function: node.function,
                });
            }
            let limit = self.inputs + index;
            if let Some(&address) = node.inputs.iter().find(|&&a| a >= limit) {
                return Err(GenomeError::ForwardReference {
                    node: index,
                    address,
                });
            }
            if !node.parameter.is_finite() {
                return Err(GenomeError::NonFiniteParameter { node: index });
            }
        }
        let limit = self.address_count();
        for (output, &address) in self.outputs.iter().enumerate() {
            if address >= limit {
                return Err(GenomeError::OutputOutOfRange { output, address });
            }
        }
        Ok(())
    }
}

impl TryFrom<GenomeData> for Genome {
    type Error = GenomeError;

    fn try_from(data: GenomeData) -> Result<Self, Self::Error> {
        Genome::from_parts(data.inputs, data.nodes, data.outputs)
    }
}

impl From<Genome> for GenomeData {
    fn from(genome: Genome) -> Self {
        GenomeData {
            inputs: genome.inputs,
            nodes: genome.nodes,
            outputs: genome.outputs,
        }
    }
}

/// A genome violating the CGP invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenomeError {
    #[error("Genome must have at least one input")]
    NoInputs,
    #[error("Genome must have at least one output")]
    NoOutputs,
    #[error("Node {node} uses function slot {function} outside the catalog")]
    UnknownFunction { node: usize, function: usize },
    #[error("Node {node} references address {address}, which is not earlier")]
    ForwardReference { node: usize, address: usize },
    #[error("Output {output} references address {address}, which does not exist")]
    OutputOutOfRange { output: usize, address: usize },
    #[error("Node {node} has a non-finite parameter")]
    NonFiniteParameter { node: usize },
    #[error("Genome dimensions do not match the configuration")]
    ShapeMismatch,
}
