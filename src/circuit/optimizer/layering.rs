//! Depth scheduling.
//!
//! Gates are partitioned into layers such that no two gates in a layer
//! share a resource. Resources are qubits plus classical bits (shifted past
//! the qubit range), so measurements and classically-conditioned gates
//! keep their happens-before order with the bits they touch.

use crate::circuit::{Gate, QuantumCircuit};

/// Resource footprint of a gate: its qubits, then `num_qubits + c` for
/// every classical bit it reads or writes. An empty barrier fences the
/// whole quantum register.
fn resources(gate: &Gate, num_qubits: usize) -> Vec<usize> {
    let mut rs = match gate {
        Gate::Barrier(qs) if qs.is_empty() => (0..num_qubits).collect(),
        _ => gate.qubits(),
    };
    match gate {
        Gate::Measure { cbit, .. } => rs.push(num_qubits + cbit),
        Gate::Conditioned { mask, .. } => {
            for c in 0..64 {
                if mask >> c & 1 == 1 {
                    rs.push(num_qubits + c);
                }
            }
        }
        _ => {}
    }
    rs
}

/// Assigns each gate the earliest layer later than every prior gate that
/// shares a resource with it. Layers are 1-based; an empty circuit has
/// depth 0.
pub(crate) fn assign_layers(circuit: &QuantumCircuit) -> Vec<usize> {
    let mut last_layer: Vec<usize> = vec![0; circuit.num_qubits + circuit.num_cbits.max(64)];
    let mut layers = Vec::with_capacity(circuit.gates.len());
    for gate in &circuit.gates {
        let rs = resources(gate, circuit.num_qubits);
        let layer = rs.iter().map(|&r| last_layer[r]).max().unwrap_or(0) + 1;
        for &r in &rs {
            last_layer[r] = layer;
        }
        layers.push(layer);
    }
    layers
}

/// The number of parallel layers in the scheduled circuit.
pub fn circuit_depth(circuit: &QuantumCircuit) -> usize {
    assign_layers(circuit).into_iter().max().unwrap_or(0)
}

/// Reorders the gate sequence layer-major. Gates in the same layer keep
/// their original relative order, so the sort is stable and the pass is
/// idempotent.
pub fn layer_pass(circuit: &QuantumCircuit) -> Vec<Gate> {
    let layers = assign_layers(circuit);
    let mut indexed: Vec<(usize, usize)> = layers.iter().copied().zip(0..).collect();
    indexed.sort_by_key(|&(layer, idx)| (layer, idx));
    indexed
        .into_iter()
        .map(|(_, idx)| circuit.gates[idx].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circuit_with(gates: Vec<Gate>, qubits: usize, cbits: usize) -> QuantumCircuit {
        let mut c = QuantumCircuit::new(qubits, cbits).unwrap();
        c.apply_gates(&gates).unwrap();
        c
    }

    #[test]
    fn disjoint_gates_share_a_layer() {
        let c = circuit_with(vec![Gate::H(0), Gate::H(1), Gate::Cx(0, 1)], 2, 0);
        assert_eq!(c.depth(), 2);
    }

    #[test]
    fn serial_chain_has_full_depth() {
        let c = circuit_with(vec![Gate::H(0), Gate::T(0), Gate::H(0)], 1, 0);
        assert_eq!(c.depth(), 3);
    }

    #[test]
    fn layer_major_order_pulls_parallel_gates_together() {
        let c = circuit_with(
            vec![Gate::H(0), Gate::Cx(0, 1), Gate::H(2)],
            3,
            0,
        );
        let out = layer_pass(&c);
        // H(2) belongs to the first layer alongside H(0).
        assert_eq!(out, vec![Gate::H(0), Gate::H(2), Gate::Cx(0, 1)]);
    }

    #[test]
    fn conditioned_gate_stays_after_the_measurement_it_reads() {
        let c = circuit_with(
            vec![
                Gate::Measure { qubit: 0, cbit: 0 },
                Gate::Conditioned {
                    gate: Box::new(Gate::X(1)),
                    mask: 1,
                    expected: 1,
                },
            ],
            2,
            1,
        );
        let out = layer_pass(&c);
        assert!(matches!(out[0], Gate::Measure { .. }));
        assert_eq!(c.depth(), 2);
    }

    #[test]
    fn empty_circuit_has_depth_zero() {
        let c = QuantumCircuit::new(2, 0).unwrap();
        assert_eq!(c.depth(), 0);
    }
}
