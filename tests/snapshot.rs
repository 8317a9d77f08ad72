use statevector_simulator_rust::prelude::*;

mod common;
use common::seeded_simulator;

#[test]
fn save_mutate_restore_recovers_the_state() {
    let bell = qasm::parse_str("qreg q[2]; h q[0]; cx q[0],q[1];").unwrap();
    let mut simulator = seeded_simulator(21);
    let mut state = simulator.run(&bell).unwrap().state;

    simulator.save_snapshot("bell", &state);
    let saved = state.snapshot();

    state.apply_gate(&Gate::X(0)).unwrap();
    state.apply_gate(&Gate::Rz(1, 0.7)).unwrap();

    simulator.load_snapshot("bell", &mut state).unwrap();
    for (a, b) in state.amplitudes().iter().zip(saved.iter()) {
        assert!((a - b).norm() < 1e-12);
    }
}

#[test]
fn missing_labels_and_width_mismatches_fail() {
    let mut simulator = seeded_simulator(1);
    let narrow = simulator
        .run(&qasm::parse_str("qreg q[1]; h q[0];").unwrap())
        .unwrap()
        .state;
    let mut wide = simulator
        .run(&qasm::parse_str("qreg q[2]; h q[0];").unwrap())
        .unwrap()
        .state;

    assert!(matches!(
        simulator.load_snapshot("absent", &mut wide),
        Err(Error::SnapshotMissing(_))
    ));

    simulator.save_snapshot("narrow", &narrow);
    assert!(matches!(
        simulator.load_snapshot("narrow", &mut wide),
        Err(Error::WidthMismatch { .. })
    ));
}

#[test]
fn cache_capacity_evicts_the_oldest_label() {
    let mut simulator = Simulator::new(SimulatorConfig {
        seed: Some(2),
        cache_capacity: 2,
        ..SimulatorConfig::default()
    })
    .unwrap();
    let state = simulator
        .run(&qasm::parse_str("qreg q[1]; h q[0];").unwrap())
        .unwrap()
        .state;

    simulator.save_snapshot("first", &state);
    simulator.save_snapshot("second", &state);
    simulator.save_snapshot("third", &state);

    assert_eq!(simulator.cache().len(), 2);
    let mut target = QuantumState::seeded(1, 1).unwrap();
    assert!(simulator.load_snapshot("first", &mut target).is_err());
    assert!(simulator.load_snapshot("second", &mut target).is_ok());
    assert!(simulator.load_snapshot("third", &mut target).is_ok());
}

#[test]
fn cache_files_round_trip_through_disk() {
    let mut simulator = seeded_simulator(33);
    let ghz = qasm::parse_str("qreg q[3]; h q[0]; cx q[0],q[1]; cx q[1],q[2];").unwrap();
    let state = simulator.run(&ghz).unwrap().state;
    simulator.save_snapshot("ghz", &state);

    let mut path = std::env::temp_dir();
    path.push(format!("snapshot_cache_{}.qssc", std::process::id()));

    simulator.cache().save_file(&path).unwrap();
    let restored = SnapshotCache::load_file(&path, 16).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(restored.len(), 1);
    let amps = restored.load("ghz").unwrap();
    for (a, b) in amps.iter().zip(state.amplitudes().iter()) {
        assert!((a - b).norm() < 1e-15);
    }
}

#[test]
fn corrupt_files_are_rejected() {
    let bytes = b"JUNKDATA";
    assert!(matches!(
        SnapshotCache::read_from(&bytes[..], 4),
        Err(Error::SnapshotFormat(_))
    ));
}
