//! Activity-based qubit relabelling.

use crate::circuit::QuantumCircuit;

/// The permutations applied by [`remap_pass`]. `qubit_perm[old] = new`.
/// Classical bits keep their positions (a measurement still writes the
/// same bit after its qubit is relabelled), so `cbit_perm` is the
/// identity; it is recorded so callers compensating at the amplitude level
/// have the full relabelling in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapOutcome {
    pub qubit_perm: Vec<usize>,
    pub cbit_perm: Vec<usize>,
}

/// Relabels qubits so the most-used qubit becomes index 0, the next
/// most-used index 1, and so on. Ties keep the lower original index first.
/// Every gate's operand list is rewritten through the permutation; the
/// gate order is untouched.
pub fn remap_pass(circuit: &QuantumCircuit) -> (QuantumCircuit, RemapOutcome) {
    let mut activity = vec![0usize; circuit.num_qubits];
    for gate in &circuit.gates {
        for q in gate.qubits() {
            activity[q] += 1;
        }
    }

    let mut order: Vec<usize> = (0..circuit.num_qubits).collect();
    order.sort_by_key(|&q| (std::cmp::Reverse(activity[q]), q));

    let mut qubit_perm = vec![0usize; circuit.num_qubits];
    for (rank, &q) in order.iter().enumerate() {
        qubit_perm[q] = rank;
    }

    let mut remapped = circuit.clone();
    remapped.gates = circuit
        .gates
        .iter()
        .map(|g| g.permuted(&qubit_perm))
        .collect();

    let outcome = RemapOutcome {
        qubit_perm,
        cbit_perm: (0..circuit.num_cbits).collect(),
    };
    (remapped, outcome)
}
