//! Graph evaluation for CGP genomes.
//!
//! Nodes are evaluated in index order. Only nodes reachable from an output
//! are computed; the reachable set is cached on the genome and refreshed
//! whenever its genes change.

use crate::schema::{Genome, NodeGene};

use super::{Function, Operand};

/// Mark the nodes transitively referenced by `outputs`.
///
/// `active` must have one entry per node; it is overwritten in place. The
/// `y` input of a unary function does not keep its source alive.
pub(crate) fn mark_active(
    inputs: usize,
    nodes: &[NodeGene],
    outputs: &[usize],
    active: &mut Vec<bool>,
) {
    active.clear();
    active.resize(nodes.len(), false);

    for &address in outputs {
        if let Some(flag) = address.checked_sub(inputs).and_then(|i| active.get_mut(i)) {
            *flag = true;
        }
    }

    for index in (0..nodes.len()).rev() {
        if !active[index] {
            continue;
        }
        let node = &nodes[index];
        let arity = Function::from_slot(node.function).map_or(2, Function::arity);
        for &address in &node.inputs[..arity] {
            if let Some(i) = address.checked_sub(inputs)
                && i < index
            {
                active[i] = true;
            }
        }
    }
}

/// Resolve an address against primary inputs and computed node values.
fn resolve<'a>(
    inputs: &'a [Operand],
    values: &'a [Option<Operand>],
    address: usize,
) -> &'a Operand {
    match address.checked_sub(inputs.len()) {
        None => &inputs[address],
        Some(index) => match values.get(index) {
            Some(Some(value)) => value,
            _ => panic!("address {address} read before it was computed"),
        },
    }
}

impl Genome {
    /// Evaluate the program on one vector of primary inputs.
    ///
    /// Returns one operand per output gene. Evaluation is deterministic: the
    /// same genome and inputs always produce bit-identical outputs.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` has the wrong length, or if the genome breaks a
    /// structural invariant (a mutation-operator bug, never a runtime
    /// condition).
    pub fn evaluate(&self, inputs: &[Operand]) -> Vec<Operand> {
        assert_eq!(
            inputs.len(),
            self.inputs(),
            "genome expects {} inputs",
            self.inputs()
        );

        let mut values: Vec<Option<Operand>> = vec![None; self.nodes().len()];

        for index in self.active_nodes() {
            let node = &self.nodes()[index];
            let Some(function) = Function::from_slot(node.function) else {
                panic!(
                    "node {index} uses function slot {} outside the {}-entry catalog",
                    node.function,
                    Function::COUNT
                );
            };
            let limit = self.inputs() + index;
            assert!(
                node.inputs.iter().all(|&a| a < limit),
                "node {index} references a later address: {:?}",
                node.inputs
            );

            let output = {
                let x = resolve(inputs, &values, node.inputs[0]);
                let y = if function.arity() == 2 {
                    resolve(inputs, &values, node.inputs[1])
                } else {
                    x
                };
                function.apply(x, y, node.parameter)
            };
            values[index] = Some(output);
        }

        self.outputs()
            .iter()
            .map(|&address| resolve(inputs, &values, address).clone())
            .collect()
    }

    /// Evaluate and reduce every output to a single number.
    pub fn evaluate_scalars(&self, inputs: &[Operand]) -> Vec<f64> {
        self.evaluate(inputs)
            .iter()
            .map(Operand::scalar_value)
            .collect()
    }
}
