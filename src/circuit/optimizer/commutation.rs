//! Commutation-based reordering.
//!
//! Gates may exchange places with commuting neighbours to bring a
//! cancellation or merge partner within reach of the rewrite passes.
//! Motion is bounded: a gate moves left past at most `window` neighbours
//! per sweep, and only when a partner is actually waiting at the
//! destination, so the joint rewrite loop terminates.

use super::{commutes, merging};
use crate::circuit::Gate;

/// One reordering sweep. For each gate (lowest index first), looks left
/// through up to `window` commuting neighbours for the nearest gate it
/// would cancel or merge with, and if found, moves the gate directly
/// behind its partner.
pub fn commute_pass(gates: &[Gate], window: usize) -> (Vec<Gate>, bool) {
    let mut gates = gates.to_vec();
    let mut changed = false;
    for i in 1..gates.len() {
        if !gates[i].is_unitary_gate() {
            continue;
        }
        if let Some(dest) = partner_slot(&gates, i, window) {
            if dest < i {
                gates[dest..=i].rotate_right(1);
                changed = true;
            }
        }
    }
    (gates, changed)
}

/// The position just after the nearest left-hand partner of `gates[i]`,
/// reachable by hopping over commuting gates only.
fn partner_slot(gates: &[Gate], i: usize, window: usize) -> Option<usize> {
    let mut k = i;
    let mut steps = 0;
    while k > 0 && steps < window {
        let left = &gates[k - 1];
        if gates[i].cancels_with(left) || merging::mergeable(left, &gates[i]) {
            return Some(k);
        }
        if !commutes(left, &gates[i]) {
            return None;
        }
        k -= 1;
        steps += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_moves_left_to_meet_its_partner() {
        let gates = vec![Gate::H(0), Gate::Cx(1, 2), Gate::Y(1), Gate::H(0)];
        let (out, changed) = commute_pass(&gates, 4);
        assert!(changed);
        assert_eq!(out[0], Gate::H(0));
        assert_eq!(out[1], Gate::H(0));
    }

    #[test]
    fn no_partner_means_no_motion() {
        let gates = vec![Gate::H(0), Gate::Cx(1, 2), Gate::X(0)];
        let (out, changed) = commute_pass(&gates, 4);
        assert!(!changed);
        assert_eq!(out, gates);
    }

    #[test]
    fn window_bounds_the_displacement() {
        let gates = vec![
            Gate::Rz(0, 0.1),
            Gate::H(1),
            Gate::H(2),
            Gate::H(3),
            Gate::Rz(0, 0.2),
        ];
        let (_, changed) = commute_pass(&gates, 2);
        assert!(!changed);
        let (out, changed) = commute_pass(&gates, 4);
        assert!(changed);
        assert_eq!(out[1], Gate::Rz(0, 0.2));
    }

    #[test]
    fn measurement_blocks_motion() {
        let gates = vec![
            Gate::X(0),
            Gate::Measure { qubit: 1, cbit: 0 },
            Gate::X(0),
        ];
        let (_, changed) = commute_pass(&gates, 4);
        assert!(!changed);
    }
}
