//! Same-axis rotation merging.

use std::f64::consts::TAU;

use super::commutes;
use crate::circuit::Gate;
use crate::types::ANGLE_TOLERANCE;

/// Combines rotations of the same axis on the same qubit:
/// `RX(a)·RX(b) -> RX(a+b)`, likewise RY, RZ, P, and U1. An angle that
/// reduces to a multiple of 2π drops the gate entirely (a 2π rotation is
/// the identity up to global phase). One full sweep.
pub fn merge_pass(gates: &[Gate]) -> (Vec<Gate>, bool) {
    let mut gates = gates.to_vec();
    let mut changed = false;
    let mut i = 0;
    while i < gates.len() {
        if let Some((j, merged)) = find_merge(&gates, i) {
            gates.remove(j);
            match merged {
                Some(gate) => gates[i] = gate,
                None => {
                    gates.remove(i);
                }
            }
            changed = true;
            i = 0;
            continue;
        }
        i += 1;
    }
    (gates, changed)
}

fn find_merge(gates: &[Gate], i: usize) -> Option<(usize, Option<Gate>)> {
    if !gates[i].is_unitary_gate() {
        return None;
    }
    for j in i + 1..gates.len() {
        if let Some(merged) = merge(&gates[i], &gates[j]) {
            return Some((j, merged));
        }
        if !commutes(&gates[i], &gates[j]) {
            return None;
        }
    }
    None
}

/// Whether two gates would combine under [`merge_pass`].
pub(super) fn mergeable(a: &Gate, b: &Gate) -> bool {
    merge(a, b).is_some()
}

/// The merged form of two same-axis rotations, or `None` when the pair is
/// not mergeable. `Some(None)` means the combined angle vanished.
fn merge(a: &Gate, b: &Gate) -> Option<Option<Gate>> {
    let merged = match (a, b) {
        (Gate::Rx(q, x), Gate::Rx(p, y)) if q == p => reduce(x + y).map(|t| Gate::Rx(*q, t)),
        (Gate::Ry(q, x), Gate::Ry(p, y)) if q == p => reduce(x + y).map(|t| Gate::Ry(*q, t)),
        (Gate::Rz(q, x), Gate::Rz(p, y)) if q == p => reduce(x + y).map(|t| Gate::Rz(*q, t)),
        (Gate::Phase(q, x), Gate::Phase(p, y)) if q == p => {
            reduce(x + y).map(|t| Gate::Phase(*q, t))
        }
        (Gate::U1(q, x), Gate::U1(p, y)) if q == p => reduce(x + y).map(|t| Gate::U1(*q, t)),
        _ => return None,
    };
    Some(merged)
}

/// `None` when the angle is a multiple of 2π within tolerance.
fn reduce(angle: f64) -> Option<f64> {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped < ANGLE_TOLERANCE || TAU - wrapped < ANGLE_TOLERANCE {
        None
    } else {
        Some(angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn same_axis_rotations_merge() {
        let gates = vec![Gate::Rx(0, PI / 4.0), Gate::Rx(0, PI / 4.0), Gate::Rx(0, PI / 2.0)];
        let (out, changed) = merge_pass(&gates);
        assert!(changed);
        assert_eq!(out.len(), 1);
        match &out[0] {
            Gate::Rx(0, t) => assert_abs_diff_eq!(*t, PI, epsilon = 1e-12),
            other => panic!("unexpected gate {:?}", other),
        }
    }

    #[test]
    fn full_turn_vanishes() {
        let gates = vec![Gate::Rz(1, PI), Gate::Rz(1, PI)];
        let (out, changed) = merge_pass(&gates);
        assert!(changed);
        assert!(out.is_empty());
    }

    #[test]
    fn different_axes_do_not_merge() {
        let gates = vec![Gate::Rx(0, 0.5), Gate::Ry(0, 0.5)];
        let (out, changed) = merge_pass(&gates);
        assert!(!changed);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn merge_reaches_across_disjoint_gates() {
        let gates = vec![Gate::Rz(0, 0.25), Gate::H(1), Gate::Rz(0, 0.25)];
        let (out, changed) = merge_pass(&gates);
        assert!(changed);
        assert_eq!(out.len(), 2);
        match &out[0] {
            Gate::Rz(0, t) => assert_abs_diff_eq!(*t, 0.5, epsilon = 1e-12),
            other => panic!("unexpected gate {:?}", other),
        }
    }
}
