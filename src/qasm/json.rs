//! JSON circuit emitter.
//!
//! Layout: `{version, qubits, cbits, gates: [{kind, qubits, params}]}` with
//! lower-case kind names. Measurements carry their classical bit and
//! conditioned gates nest the inner gate.

use serde_json::{Value, json};

use crate::circuit::{Gate, QuantumCircuit};

pub fn circuit_to_json(circuit: &QuantumCircuit) -> Value {
    json!({
        "version": "2.0",
        "qubits": circuit.num_qubits,
        "cbits": circuit.num_cbits,
        "gates": circuit.gates.iter().map(gate_to_json).collect::<Vec<_>>(),
    })
}

fn gate_to_json(gate: &Gate) -> Value {
    match gate {
        Gate::Measure { qubit, cbit } => json!({
            "kind": "measure",
            "qubits": [qubit],
            "params": [],
            "cbit": cbit,
        }),
        Gate::Conditioned { gate, mask, expected } => json!({
            "kind": "if",
            "qubits": gate.qubits(),
            "params": [],
            "mask": mask,
            "expected": expected,
            "gate": gate_to_json(gate),
        }),
        other => json!({
            "kind": other.name(),
            "qubits": other.qubits(),
            "params": other.params(),
        }),
    }
}
