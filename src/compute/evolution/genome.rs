//! Genome manipulation utilities for evolutionary search.
//!
//! Provides random generation, point mutation and child regeneration.

use rand::prelude::*;

use crate::compute::Function;
use crate::schema::{CgpConfig, Genome, NodeGene};

use super::Population;

/// Random number generator wrapper for genome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create from the configured seed, or from entropy.
    pub fn from_config(config: &CgpConfig) -> Self {
        match config.random_seed {
            Some(seed) => Self::new(seed),
            None => Self::random(),
        }
    }

    /// Generate a random genome with the configured dimensions.
    ///
    /// # Panics
    ///
    /// Panics if `config` has no inputs while nodes or outputs are
    /// requested, or if `parameterBounds` is inverted. Check the
    /// configuration with [`CgpConfig::validate`] first.
    pub fn random_genome(&mut self, config: &CgpConfig) -> Genome {
        let nodes: Vec<NodeGene> = (0..config.function_genes)
            .map(|index| self.random_node(config.inputs + index, config.parameter_bounds))
            .collect();

        let outputs: Vec<usize> = (0..config.outputs)
            .map(|_| self.rng.gen_range(0..config.genome_size()))
            .collect();

        Genome::from_parts_unchecked(config.inputs, nodes, outputs)
    }

    /// Generate a node that may reference any address below `limit`.
    fn random_node(&mut self, limit: usize, bounds: (f64, f64)) -> NodeGene {
        NodeGene {
            function: self.rng.gen_range(0..Function::COUNT),
            inputs: [self.rng.gen_range(0..limit), self.rng.gen_range(0..limit)],
            parameter: self.uniform(bounds),
        }
    }

    /// Uniform random in bounds.
    fn uniform(&mut self, bounds: (f64, f64)) -> f64 {
        self.rng.gen_range(bounds.0..=bounds.1)
    }

    /// Point-mutate a genome in place.
    ///
    /// Each node's function and each of its connections mutate independently
    /// with probability `genesMutated`; its parameter is resampled with
    /// probability `inputScalarR`; each output is rewired with probability
    /// `outputsMutated`. New connections only ever point at earlier nodes or
    /// primary inputs.
    ///
    /// # Panics
    ///
    /// Panics if a mutation probability in `config` lies outside `[0, 1]`,
    /// or if `parameterBounds` is inverted. Check the configuration with
    /// [`CgpConfig::validate`] first.
    pub fn mutate(&mut self, genome: &mut Genome, config: &CgpConfig) {
        let rng = &mut self.rng;
        genome.edit(|inputs, nodes, outputs| {
            for (index, node) in nodes.iter_mut().enumerate() {
                let limit = inputs + index;
                if rng.gen_bool(config.genes_mutated) {
                    node.function = rng.gen_range(0..Function::COUNT);
                }
                for connection in node.inputs.iter_mut() {
                    if rng.gen_bool(config.genes_mutated) {
                        *connection = rng.gen_range(0..limit);
                    }
                }
                if rng.gen_bool(config.input_scalar_r) {
                    let (low, high) = config.parameter_bounds;
                    node.parameter = rng.gen_range(low..=high);
                }
            }

            let limit = inputs + nodes.len();
            for output in outputs.iter_mut() {
                if rng.gen_bool(config.outputs_mutated) {
                    *output = rng.gen_range(0..limit);
                }
            }
        });
    }

    /// Regenerate every child slot from the elite.
    ///
    /// Each slot is overwritten with a copy of the elite and then mutated; the
    /// slots' storage is reused, never reallocated.
    pub fn update_children(
        &mut self,
        elite: &Genome,
        population: &mut Population,
        config: &CgpConfig,
    ) {
        for child in population.slots_mut() {
            elite.copy_into(child);
            self.mutate(child, config);
        }
    }
}
