//! Local-rewrite circuit optimization.
//!
//! Every pass is a pure `&[Gate] -> Vec<Gate>` transform iterated to a
//! fixed point. Rewrites are deterministic: passes run in a fixed order and
//! within a pass the lowest gate index wins. Meta operations (measurement,
//! reset, barriers, classically-conditioned gates) are opaque: no rewrite
//! matches them and no scan crosses them, which preserves the happens-before
//! order of measurements and the classical bits they write.

use log::debug;

use crate::circuit::{Gate, QuantumCircuit};
use crate::error::{Error, Result};

pub mod cancellation;
pub mod commutation;
pub mod layering;
pub mod merging;
pub mod remapping;

pub use remapping::RemapOutcome;

/// Rewrites `circuit` at the given optimization level.
///
/// * Level 0 returns the circuit unchanged.
/// * Level 1 runs inverse-pair cancellation and rotation merging to a
///   joint fixed point.
/// * Level 2 additionally lets gates move left past commuting neighbours
///   (bounded displacement) to expose more rewrites.
/// * Level 3 additionally schedules the result into depth layers and, when
///   the circuit measures into classical bits, relabels qubits by activity.
///
/// The result is observationally equivalent to the input for every
/// measurement-outcome distribution, up to a global phase. Levels above 3
/// are clamped to 3.
pub fn optimize(circuit: &QuantumCircuit, level: u8) -> Result<QuantumCircuit> {
    let level = level.min(3);
    if level == 0 {
        return Ok(circuit.clone());
    }

    let window = circuit.num_qubits.max(4);
    let mut gates = circuit.gates.clone();
    let mut sweeps = 0usize;
    loop {
        let mut changed = false;
        let (next, hit) = cancellation::cancel_pass(&gates);
        gates = next;
        changed |= hit;
        let (next, hit) = merging::merge_pass(&gates);
        gates = next;
        changed |= hit;
        if level >= 2 {
            let (next, hit) = commutation::commute_pass(&gates, window);
            gates = next;
            changed |= hit;
        }
        sweeps += 1;
        if !changed {
            break;
        }
        // Every commutation move is immediately followed by a sweep whose
        // cancellation or merge removes a gate, so the sweep count is
        // bounded by twice the input length.
        if sweeps > 2 * circuit.gates.len() + 4 {
            return Err(Error::Optimization(format!(
                "rewrite loop failed to reach a fixed point after {} sweeps",
                sweeps
            )));
        }
    }
    debug!(
        "optimize level {}: {} gates -> {} gates in {} sweeps",
        level,
        circuit.gates.len(),
        gates.len(),
        sweeps
    );

    let mut out = circuit.clone();
    out.gates = gates;
    if level >= 3 {
        out.gates = layering::layer_pass(&out);
        if out.gates.iter().any(|g| matches!(g, Gate::Measure { .. })) {
            let (remapped, outcome) = remapping::remap_pass(&out);
            debug!("remapped qubits: {:?}", outcome.qubit_perm);
            out = remapped;
        }
    }
    verify(circuit, &out)?;
    Ok(out)
}

/// Whether two gates may exchange places in the sequence.
///
/// Disjoint-qubit unitaries always commute. Overlapping unitaries commute
/// when both are diagonal in the computational basis, or both are members
/// of the X-axis family acting on the same qubit. Meta operations commute
/// with nothing.
pub(crate) fn commutes(a: &Gate, b: &Gate) -> bool {
    if !a.is_unitary_gate() || !b.is_unitary_gate() {
        return false;
    }
    let qa = a.qubits();
    let qb = b.qubits();
    if qa.iter().all(|q| !qb.contains(q)) {
        return true;
    }
    if a.is_diagonal() && b.is_diagonal() {
        return true;
    }
    a.is_antidiagonal() && b.is_antidiagonal() && qa == qb
}

/// Cheap structural invariants checked after a full optimization run. A
/// violation here is an internal error; the caller keeps its original
/// circuit.
fn verify(original: &QuantumCircuit, rewritten: &QuantumCircuit) -> Result<()> {
    for gate in &rewritten.gates {
        gate.validate(rewritten.num_qubits, rewritten.num_cbits)
            .map_err(|e| Error::Optimization(format!("rewritten gate is invalid: {}", e)))?;
    }
    let count = |gates: &[Gate]| {
        gates
            .iter()
            .filter(|g| !g.is_unitary_gate())
            .count()
    };
    if count(&original.gates) != count(&rewritten.gates) {
        return Err(Error::Optimization(
            "a pass added or removed a non-unitary operation".to_string(),
        ));
    }
    Ok(())
}
