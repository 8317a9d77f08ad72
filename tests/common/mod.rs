use num_complex::Complex64;
use statevector_simulator_rust::prelude::*;

#[allow(dead_code)]
pub fn assert_eq_complex_slice(a: &[Complex64], b: &[Complex64]) {
    assert_eq!(a.len(), b.len(), "Amplitude vectors have different lengths.");
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).norm();
        assert!(
            diff <= 1e-9,
            "Amplitudes differ at index {}: |{} - {}| = {} > 1e-9",
            i,
            x,
            y,
            diff
        );
    }
}

#[allow(dead_code)]
pub fn seeded_simulator(seed: u64) -> Simulator {
    Simulator::new(SimulatorConfig {
        seed: Some(seed),
        ..SimulatorConfig::default()
    })
    .expect("default config is valid")
}

/// Standard quantum Fourier transform on every qubit of the circuit.
#[allow(dead_code)]
pub fn qft(circuit: &mut QuantumCircuit) {
    let n = circuit.num_qubits;
    for target in 0..n {
        circuit.apply_h(target).unwrap();
        for control in target + 1..n {
            let angle = std::f64::consts::PI / (1 << (control - target)) as f64;
            circuit.apply_cp(control, target, angle).unwrap();
        }
    }
    for q in 0..n / 2 {
        circuit.apply_swap(q, n - 1 - q).unwrap();
    }
}
