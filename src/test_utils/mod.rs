use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::circuit::{Gate, QuantumCircuit};

#[allow(dead_code)]
pub fn assert_eq_complex(a: Complex64, b: Complex64) {
    let diff = (a - b).norm();
    assert!(
        diff <= 1e-9,
        "Complex numbers differ: |{} - {}| = {} > {}",
        a,
        b,
        diff,
        1e-9
    );
}

#[allow(dead_code)]
pub fn assert_eq_complex_slice(a: &[Complex64], b: &[Complex64]) {
    assert_eq!(a.len(), b.len(), "Amplitude vectors have different lengths.");
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).norm();
        assert!(
            diff <= 1e-9,
            "Amplitudes differ at index {}: |{} - {}| = {} > {}",
            i,
            x,
            y,
            diff,
            1e-9
        );
    }
}

/// Asserts two states are equal up to a global phase.
#[allow(dead_code)]
pub fn assert_states_equal_up_to_phase(a: &[Complex64], b: &[Complex64]) {
    assert_eq!(a.len(), b.len(), "Amplitude vectors have different lengths.");
    let pivot = a
        .iter()
        .enumerate()
        .max_by(|x, y| x.1.norm().partial_cmp(&y.1.norm()).unwrap())
        .map(|(i, _)| i)
        .unwrap();
    if a[pivot].norm() < 1e-12 {
        return assert_eq_complex_slice(a, b);
    }
    let phase = b[pivot] / a[pivot];
    assert!(
        (phase.norm() - 1.0).abs() < 1e-9,
        "States differ in magnitude at pivot {}: factor {}",
        pivot,
        phase
    );
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x * phase - y).norm();
        assert!(
            diff <= 1e-9,
            "Amplitudes differ at index {} after phase alignment: {} > {}",
            i,
            diff,
            1e-9
        );
    }
}

/// Generates a random measurement-free circuit from a pool of single- and
/// two-qubit gates. Deterministic for a given seed.
#[allow(dead_code)]
pub fn random_circuit(num_qubits: usize, gate_count: usize, seed: u64) -> QuantumCircuit {
    let mut circuit = QuantumCircuit::new(num_qubits, 0).expect("valid width");
    let mut rng = StdRng::seed_from_u64(seed);

    const NUM_1Q_KINDS: u32 = 12;
    const NUM_2Q_KINDS: u32 = 4;

    for _ in 0..gate_count {
        let max_kind = if num_qubits < 2 {
            NUM_1Q_KINDS
        } else {
            NUM_1Q_KINDS + NUM_2Q_KINDS
        };
        let kind = rng.gen_range(0..max_kind);
        let gate = if kind < NUM_1Q_KINDS {
            let q = rng.gen_range(0..num_qubits);
            let angle = rng.gen_range(-std::f64::consts::PI..std::f64::consts::PI);
            match kind {
                0 => Gate::H(q),
                1 => Gate::X(q),
                2 => Gate::Y(q),
                3 => Gate::Z(q),
                4 => Gate::S(q),
                5 => Gate::Sdg(q),
                6 => Gate::T(q),
                7 => Gate::Tdg(q),
                8 => Gate::Rx(q, angle),
                9 => Gate::Ry(q, angle),
                10 => Gate::Rz(q, angle),
                11 => Gate::Phase(q, angle),
                _ => unreachable!(),
            }
        } else {
            let a = rng.gen_range(0..num_qubits);
            let mut b = rng.gen_range(0..num_qubits);
            while b == a {
                b = rng.gen_range(0..num_qubits);
            }
            match kind - NUM_1Q_KINDS {
                0 => Gate::Cx(a, b),
                1 => Gate::Cz(a, b),
                2 => Gate::Swap(a, b),
                3 => Gate::CPhase(a, b, rng.gen_range(-1.0..1.0)),
                _ => unreachable!(),
            }
        };
        circuit.apply_gate(gate).expect("pool gates are valid");
    }
    circuit
}
