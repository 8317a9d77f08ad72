use statevector_simulator_rust::prelude::*;
use statevector_simulator_rust::qasm::{circuit_to_json, circuit_to_qasm, parse_program, print_program};

mod common;

#[test]
fn parse_print_parse_is_a_fixpoint_on_asts() {
    let sources = [
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\ncreg c[3];\nh q[0];\ncx q[0],q[1];\nmeasure q -> c;",
        "qreg q[2]; u3(0.1, -0.2, pi/4) q[0]; barrier q[0], q[1]; reset q[1];",
        "gate entangle a, b { h a; cx a, b; } qreg q[2]; entangle q[0], q[1];",
        "qreg q[1]; creg c[1]; measure q[0] -> c[0]; if (c == 1) u1(2.0 * pi) q[0];",
        "qreg q[1]; rx(sin(pi/8) + cos(0.3) * 2.0) q[0];",
    ];
    for src in sources {
        let once = parse_program(src).unwrap();
        let twice = parse_program(&print_program(&once)).unwrap();
        assert_eq!(once, twice, "AST round trip failed for {:?}", src);
    }
}

#[test]
fn diagnostics_accumulate_across_statements() {
    let source = "qreg q[2];\nh q[5;\nbadgate;\ncx q[0] q[1];\n";
    let err = parse_program(source).unwrap_err();
    assert!(
        err.diagnostics.len() >= 2,
        "expected several diagnostics, got {:?}",
        err.diagnostics
    );
    for diag in &err.diagnostics {
        assert!(diag.line > 0 && diag.col > 0);
    }
}

#[test]
fn semantic_errors_carry_positions() {
    let result = qasm::parse_str("qreg q[1];\nh q[3];");
    match result {
        Err(Error::Semantic { line, col, message }) => {
            assert_eq!(line, 2);
            assert_eq!(col, 1);
            assert!(message.contains("out of range"));
        }
        other => panic!("expected a semantic error, got {:?}", other.map(|c| c.gates)),
    }
}

#[test]
fn printed_circuits_reparse_identically() {
    let source = "qreg left[2]; qreg right[1]; creg c[3]; h left[0]; cp(0.25) left[0], right[0]; \
                  swap left[0], left[1]; measure left[0] -> c[0]; reset right[0];";
    let circuit = qasm::parse_str(source).unwrap();
    let printed = circuit_to_qasm(&circuit);
    let reparsed = qasm::parse_str(&printed).unwrap();
    assert_eq!(circuit.gates, reparsed.gates);
    assert_eq!(circuit.num_qubits, reparsed.num_qubits);
    assert_eq!(circuit.num_cbits, reparsed.num_cbits);
}

#[test]
fn json_layout_matches_the_wire_format() {
    let circuit = qasm::parse_str(
        "qreg q[2]; creg c[1]; ry(0.5) q[1]; cx q[0],q[1]; measure q[1] -> c[0];",
    )
    .unwrap();
    let value = circuit_to_json(&circuit);
    assert_eq!(value["version"], "2.0");
    assert_eq!(value["qubits"], 2);
    assert_eq!(value["cbits"], 1);

    let gates = value["gates"].as_array().unwrap();
    assert_eq!(gates.len(), 3);
    assert_eq!(gates[0]["kind"], "ry");
    assert_eq!(gates[0]["qubits"][0], 1);
    assert!((gates[0]["params"][0].as_f64().unwrap() - 0.5).abs() < 1e-12);
    assert_eq!(gates[2]["kind"], "measure");
}

#[test]
fn qelib_names_all_resolve() {
    let source = "qreg q[3]; creg c[1]; \
        h q[0]; x q[0]; y q[0]; z q[0]; s q[0]; sdg q[0]; t q[0]; tdg q[0]; \
        rx(0.1) q[0]; ry(0.2) q[0]; rz(0.3) q[0]; u1(0.4) q[0]; u2(0.5, 0.6) q[0]; \
        u3(0.7, 0.8, 0.9) q[0]; p(1.0) q[0]; id q[0]; \
        cx q[0],q[1]; cz q[0],q[1]; swap q[0],q[1]; iswap q[0],q[1]; \
        cp(0.1) q[0],q[1]; cu1(0.2) q[0],q[1]; crx(0.3) q[0],q[1]; cry(0.4) q[0],q[1]; \
        crz(0.5) q[0],q[1]; cu3(0.6,0.7,0.8) q[0],q[1]; \
        ccx q[0],q[1],q[2]; ccz q[0],q[1],q[2]; cswap q[0],q[1],q[2];";
    let circuit = qasm::parse_str(source).unwrap();
    // Every call lowers to exactly one gate except `id`, which vanishes.
    assert_eq!(circuit.gate_count(), 28);
}

#[test]
fn gate_bodies_compose_recursively() {
    let source = "\
        qreg q[2];\n\
        gate layer a { h a; t a; }\n\
        gate stack a, b { layer a; layer b; cx a, b; }\n\
        stack q[0], q[1];";
    let circuit = qasm::parse_str(source).unwrap();
    assert_eq!(
        circuit.gates,
        vec![
            Gate::H(0),
            Gate::T(0),
            Gate::H(1),
            Gate::T(1),
            Gate::Cx(0, 1),
        ]
    );
}

#[test]
fn conditioned_calls_survive_the_text_round_trip() {
    let source = "qreg q[1]; creg c[2]; measure q[0] -> c[0]; if (c == 1) x q[0];";
    let circuit = qasm::parse_str(source).unwrap();
    let reparsed = qasm::parse_str(&circuit_to_qasm(&circuit)).unwrap();
    assert_eq!(circuit.gates, reparsed.gates);
}

#[test]
fn version_mismatch_is_rejected() {
    assert!(parse_program("OPENQASM 3.0; qreg q[1];").is_err());
}
