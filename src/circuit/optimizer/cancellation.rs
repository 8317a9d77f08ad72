//! Inverse-pair cancellation.

use super::commutes;
use crate::circuit::Gate;

/// Removes the nearest pair of mutually-inverse gates on identical qubit
/// operand lists, scanning through gates that commute with the left
/// endpoint. One full sweep; returns the rewritten sequence and whether
/// anything changed.
pub fn cancel_pass(gates: &[Gate]) -> (Vec<Gate>, bool) {
    let mut gates = gates.to_vec();
    let mut changed = false;
    let mut i = 0;
    while i < gates.len() {
        if !gates[i].is_unitary_gate() {
            i += 1;
            continue;
        }
        if let Some(j) = find_partner(&gates, i) {
            gates.remove(j);
            gates.remove(i);
            changed = true;
            // Removal creates new adjacencies to the left; restart so the
            // lowest-index rewrite still wins.
            i = 0;
            continue;
        }
        i += 1;
    }
    (gates, changed)
}

/// The nearest later gate that cancels `gates[i]`, reachable through
/// commuting gates only. A non-commuting gate in between blocks the scan.
fn find_partner(gates: &[Gate], i: usize) -> Option<usize> {
    for j in i + 1..gates.len() {
        if gates[i].cancels_with(&gates[j]) {
            return Some(j);
        }
        if !commutes(&gates[i], &gates[j]) {
            return None;
        }
    }
    None
}
