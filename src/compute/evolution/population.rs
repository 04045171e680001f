//! Fixed-capacity arena of child genomes.

use crate::schema::{CgpConfig, Genome};

use super::GenomeRng;

/// The lambda child slots of a (1+lambda) run.
///
/// Slots are allocated once and regenerated in place every generation, so a
/// slot's storage outlives any single child it holds.
#[derive(Debug, Clone)]
pub struct Population {
    children: Vec<Genome>,
}

impl Population {
    /// Allocate `childrenPerGeneration` slots filled with random genomes.
    pub fn new(config: &CgpConfig, rng: &mut GenomeRng) -> Self {
        let children = (0..config.children_per_generation)
            .map(|_| rng.random_genome(config))
            .collect();
        Self { children }
    }

    /// Current children, indexed by slot.
    #[inline]
    pub fn children(&self) -> &[Genome] {
        &self.children
    }

    /// Child in `slot`, if it exists.
    pub fn child(&self, slot: usize) -> Option<&Genome> {
        self.children.get(slot)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Slots for in-place regeneration. The slot count cannot change.
    pub(crate) fn slots_mut(&mut self) -> &mut [Genome] {
        &mut self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_identity_stable_across_generations() {
        let config = CgpConfig {
            inputs: 2,
            outputs: 3,
            function_genes: 20,
            children_per_generation: 4,
            genes_mutated: 0.5,
            ..Default::default()
        };
        let mut rng = GenomeRng::new(11);
        let mut elite = rng.random_genome(&config);
        let mut population = Population::new(&config, &mut rng);

        let slot_addresses: Vec<*const Genome> =
            population.children().iter().map(|c| c as *const Genome).collect();
        let node_buffers: Vec<*const _> = population
            .children()
            .iter()
            .map(|c| c.nodes().as_ptr())
            .collect();

        for generation in 0..10 {
            let before: Vec<Genome> = population.children().to_vec();
            rng.update_children(&elite, &mut population, &config);

            let after_slots: Vec<*const Genome> =
                population.children().iter().map(|c| c as *const Genome).collect();
            let after_buffers: Vec<*const _> = population
                .children()
                .iter()
                .map(|c| c.nodes().as_ptr())
                .collect();
            assert_eq!(after_slots, slot_addresses);
            assert_eq!(after_buffers, node_buffers);
            assert_ne!(population.children(), before.as_slice(), "generation {generation}");

            population.children()[generation % 4].copy_into(&mut elite);
        }
    }

    #[test]
    fn test_population_size() {
        let config = CgpConfig {
            children_per_generation: 7,
            ..Default::default()
        };
        let population = Population::new(&config, &mut GenomeRng::new(0));
        assert_eq!(population.len(), 7);
        assert!(population.child(6).is_some());
        assert!(population.child(7).is_none());
    }
}
