use ndarray::arr2;
use num_complex::Complex64;
use statevector_simulator_rust::prelude::*;

mod common;

fn noisy_simulator(seed: u64, noise: NoiseModel) -> Simulator {
    Simulator::new(SimulatorConfig {
        seed: Some(seed),
        noise: Some(noise),
        ..SimulatorConfig::default()
    })
    .unwrap()
}

#[test]
fn fully_depolarized_bell_pairs_sample_uniformly() {
    let circuit = qasm::parse_str(
        "qreg q[2]; creg c[2]; h q[0]; cx q[0],q[1]; measure q -> c;",
    )
    .unwrap();
    let shots = 1000usize;
    let counts = noisy_simulator(4242, NoiseModel::depolarizing(1.0).unwrap())
        .sample(&circuit, shots)
        .unwrap();

    let total: usize = counts.values().sum();
    assert_eq!(total, shots);
    for outcome in 0u64..4 {
        let fraction = counts.get(&outcome).copied().unwrap_or(0) as f64 / shots as f64;
        assert!(
            (fraction - 0.25).abs() < 0.1,
            "outcome {:02b} has fraction {}",
            outcome,
            fraction
        );
    }
}

#[test]
fn zero_noise_changes_nothing() {
    let circuit = qasm::parse_str("qreg q[2]; h q[0]; cx q[0],q[1];").unwrap();
    let noiseless = common::seeded_simulator(5).run(&circuit).unwrap();
    let noisy = noisy_simulator(5, NoiseModel::depolarizing(0.0).unwrap())
        .run(&circuit)
        .unwrap();
    for (a, b) in noiseless
        .state
        .probabilities()
        .iter()
        .zip(noisy.state.probabilities().iter())
    {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn trajectories_stay_normalised_under_noise() {
    let circuit = qasm::parse_str("qreg q[3]; h q[0]; cx q[0],q[1]; cx q[1],q[2];").unwrap();
    let mut simulator = noisy_simulator(17, NoiseModel::amplitude_damping(0.3).unwrap());
    for _ in 0..25 {
        let outcome = simulator.run(&circuit).unwrap();
        assert!((outcome.state.norm_sqr() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn amplitude_damping_pulls_towards_ground() {
    // X puts the qubit in |1>; heavy damping after the gate should often
    // relax it back to |0>.
    let circuit = qasm::parse_str("qreg q[1]; creg c[1]; x q[0]; measure q[0] -> c[0];").unwrap();
    let shots = 500usize;
    let counts = noisy_simulator(99, NoiseModel::amplitude_damping(0.8).unwrap())
        .sample(&circuit, shots)
        .unwrap();
    let zeros = counts.get(&0).copied().unwrap_or(0) as f64 / shots as f64;
    assert!(zeros > 0.6, "expected heavy relaxation, got {}", zeros);
}

#[test]
fn custom_kraus_sets_must_be_complete() {
    let identity_half = arr2(&[
        [Complex64::new(0.5, 0.0), Complex64::new(0.0, 0.0)],
        [Complex64::new(0.0, 0.0), Complex64::new(0.5, 0.0)],
    ]);
    assert!(matches!(
        NoiseModel::kraus(vec![identity_half]),
        Err(Error::KrausCompleteness(_))
    ));

    // A valid custom set: the bit-flip channel written out by hand.
    let p: f64 = 0.25;
    let keep = arr2(&[
        [Complex64::new((1.0 - p).sqrt(), 0.0), Complex64::new(0.0, 0.0)],
        [Complex64::new(0.0, 0.0), Complex64::new((1.0 - p).sqrt(), 0.0)],
    ]);
    let flip = arr2(&[
        [Complex64::new(0.0, 0.0), Complex64::new(p.sqrt(), 0.0)],
        [Complex64::new(p.sqrt(), 0.0), Complex64::new(0.0, 0.0)],
    ]);
    assert!(NoiseModel::kraus(vec![keep, flip]).is_ok());
}

#[test]
fn noise_parameters_validate_at_construction() {
    assert!(matches!(
        NoiseModel::phase_damping(1.2),
        Err(Error::InvalidNoiseParameter { .. })
    ));
    assert!(matches!(
        NoiseModel::pauli_channel(0.5, 0.5, 0.5),
        Err(Error::InvalidNoiseParameter { .. })
    ));
}

#[test]
fn bit_flip_statistics_match_the_rate() {
    // One X gate with bit-flip noise p: the qubit ends in |1> with
    // probability 1 - p.
    let circuit = qasm::parse_str("qreg q[1]; creg c[1]; x q[0]; measure q[0] -> c[0];").unwrap();
    let shots = 2000usize;
    let p = 0.2;
    let counts = noisy_simulator(1001, NoiseModel::bit_flip(p).unwrap())
        .sample(&circuit, shots)
        .unwrap();
    let ones = counts.get(&1).copied().unwrap_or(0) as f64 / shots as f64;
    assert!(
        (ones - (1.0 - p)).abs() < 0.05,
        "P(1) = {}, expected about {}",
        ones,
        1.0 - p
    );
}
