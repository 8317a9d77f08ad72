//! Deterministic QASM emitters.
//!
//! [`print_program`] renders an AST back to canonical source text such that
//! reparsing the output yields the same AST. [`circuit_to_qasm`] renders a
//! lowered circuit in the flat form `OPENQASM 2.0; include "qelib1.inc";
//! <registers> <gates> <measurements>`.

use itertools::Itertools;

use super::ast::*;
use crate::circuit::{Gate, QuantumCircuit, RegisterLayout};

/// Renders an AST to canonical source. Whitespace and expression
/// parenthesisation are normalised; the token structure is preserved, so
/// `parse(print(parse(src)))` equals `parse(src)`.
pub fn print_program(program: &Program) -> String {
    let mut out = String::new();
    out.push_str("OPENQASM 2.0;\n");
    for item in &program.items {
        match item {
            Item::Include(inc) => out.push_str(&format!("include \"{}\";\n", inc.file)),
            Item::QReg(decl) => out.push_str(&format!("qreg {}[{}];\n", decl.name, decl.size)),
            Item::CReg(decl) => out.push_str(&format!("creg {}[{}];\n", decl.name, decl.size)),
            Item::GateDef(def) => {
                out.push_str(&format!(
                    "gate {}{} {} {{\n",
                    def.name,
                    format_formal_params(&def.params),
                    def.qubits.iter().join(", ")
                ));
                for stmt in &def.body {
                    out.push_str("  ");
                    out.push_str(&format_statement(stmt));
                    out.push('\n');
                }
                out.push_str("}\n");
            }
            Item::Opaque(decl) => out.push_str(&format!(
                "opaque {}{} {};\n",
                decl.name,
                format_formal_params(&decl.params),
                decl.qubits.iter().join(", ")
            )),
            Item::Statement(stmt) => {
                out.push_str(&format_statement(stmt));
                out.push('\n');
            }
        }
    }
    out
}

fn format_formal_params(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("({})", params.iter().join(", "))
    }
}

fn format_statement(stmt: &Statement) -> String {
    match stmt {
        Statement::GateCall(call) => format_call(call),
        Statement::Measure { qubit, cbit, .. } => {
            format!("measure {} -> {};", format_ref(qubit), format_ref(cbit))
        }
        Statement::Barrier { args, .. } => {
            format!("barrier {};", args.iter().map(format_ref).join(", "))
        }
        Statement::Reset { qubit, .. } => format!("reset {};", format_ref(qubit)),
        Statement::If { creg, value, call, .. } => {
            format!("if ({} == {}) {}", creg, value, format_call(call))
        }
    }
}

fn format_call(call: &GateCall) -> String {
    let params = if call.params.is_empty() {
        String::new()
    } else {
        format!("({})", call.params.iter().map(format_expr).join(", "))
    };
    format!(
        "{}{} {};",
        call.name,
        params,
        call.qubits.iter().map(format_ref).join(", ")
    )
}

fn format_ref(arg: &QubitRef) -> String {
    match arg.index {
        Some(index) => format!("{}[{}]", arg.name, index),
        None => arg.name.clone(),
    }
}

/// Expressions print fully parenthesised so the reparse rebuilds the same
/// tree regardless of operator precedence.
fn format_expr(expr: &Expr) -> String {
    match expr {
        Expr::Number(v) => format_f64(*v),
        Expr::Pi => "pi".to_string(),
        Expr::Ident(name) => name.clone(),
        Expr::Neg(inner) => format!("(-{})", format_expr(inner)),
        Expr::Binary(op, lhs, rhs) => {
            let symbol = match op {
                BinOp::Add => "+",
                BinOp::Sub => "-",
                BinOp::Mul => "*",
                BinOp::Div => "/",
                BinOp::Pow => "^",
            };
            format!("({} {} {})", format_expr(lhs), symbol, format_expr(rhs))
        }
        Expr::Call(name, args) => {
            format!("{}({})", name, args.iter().map(format_expr).join(", "))
        }
    }
}

/// Shortest representation that parses back to the same `f64`; whole
/// numbers keep one decimal so they stay real literals.
fn format_f64(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// Renders a lowered circuit as flat QASM: fixed header, register
/// declarations, then one line per gate in circuit order.
pub fn circuit_to_qasm(circuit: &QuantumCircuit) -> String {
    let mut out = String::new();
    out.push_str("OPENQASM 2.0;\n");
    out.push_str("include \"qelib1.inc\";\n");

    let qregs = effective_regs(&circuit.qregs, "q", circuit.num_qubits);
    let cregs = effective_regs(&circuit.cregs, "c", circuit.num_cbits);
    for reg in &qregs {
        out.push_str(&format!("qreg {}[{}];\n", reg.name, reg.size));
    }
    for reg in &cregs {
        out.push_str(&format!("creg {}[{}];\n", reg.name, reg.size));
    }

    for gate in &circuit.gates {
        out.push_str(&format_gate_line(gate, &qregs, &cregs));
        out.push('\n');
    }
    out
}

fn effective_regs(regs: &[RegisterLayout], default_name: &str, width: usize) -> Vec<RegisterLayout> {
    if !regs.is_empty() {
        regs.to_vec()
    } else if width > 0 {
        vec![RegisterLayout {
            name: default_name.to_string(),
            size: width,
            offset: 0,
        }]
    } else {
        Vec::new()
    }
}

fn flat_ref(regs: &[RegisterLayout], flat: usize) -> String {
    for reg in regs {
        if flat >= reg.offset && flat < reg.offset + reg.size {
            return format!("{}[{}]", reg.name, flat - reg.offset);
        }
    }
    format!("q[{}]", flat)
}

fn format_gate_line(gate: &Gate, qregs: &[RegisterLayout], cregs: &[RegisterLayout]) -> String {
    match gate {
        Gate::Measure { qubit, cbit } => format!(
            "measure {} -> {};",
            flat_ref(qregs, *qubit),
            flat_ref(cregs, *cbit)
        ),
        Gate::Barrier(qubits) => format!(
            "barrier {};",
            qubits.iter().map(|&q| flat_ref(qregs, q)).join(", ")
        ),
        Gate::Reset(qubit) => format!("reset {};", flat_ref(qregs, *qubit)),
        Gate::Conditioned { gate, mask, expected } => {
            let offset = if *mask == 0 { 0 } else { mask.trailing_zeros() as usize };
            let reg = cregs
                .iter()
                .find(|r| r.offset == offset)
                .map(|r| r.name.as_str())
                .unwrap_or("c");
            format!(
                "if ({} == {}) {}",
                reg,
                expected >> offset,
                format_gate_line(gate, qregs, cregs)
            )
        }
        Gate::Custom { name, qubits, .. } => format!(
            "// custom gate '{}' on {}",
            name,
            qubits.iter().map(|&q| flat_ref(qregs, q)).join(", ")
        ),
        other => {
            let params = other.params();
            let params = if params.is_empty() {
                String::new()
            } else {
                format!("({})", params.iter().map(|&p| format_f64(p)).join(", "))
            };
            format!(
                "{}{} {};",
                other.name(),
                params,
                other.qubits().iter().map(|&q| flat_ref(qregs, q)).join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qasm::parser::parse_program;

    #[test]
    fn print_then_parse_is_a_fixpoint() {
        let sources = [
            "OPENQASM 2.0;\nqreg q[2];\ncreg c[2];\nh q[0];\ncx q[0],q[1];\nmeasure q -> c;",
            "qreg q[1]; rx(pi/2 + 0.25) q[0]; barrier q[0];",
            "gate tilt(angle) a { rz(angle/2) a; } qreg q[1]; tilt(-pi) q[0];",
            "qreg q[1]; creg c[1]; measure q[0] -> c[0]; if (c == 1) x q[0];",
        ];
        for src in sources {
            let first = parse_program(src).unwrap();
            let printed = print_program(&first);
            let second = parse_program(&printed).unwrap();
            assert_eq!(first, second, "round trip failed for {:?}", src);
        }
    }

    #[test]
    fn circuit_printing_uses_recorded_register_names() {
        let circuit =
            crate::qasm::parse_str("qreg left[1]; qreg right[1]; cx left[0], right[0];").unwrap();
        let text = circuit_to_qasm(&circuit);
        assert!(text.contains("qreg left[1];"));
        assert!(text.contains("cx left[0], right[0];"));
    }

    #[test]
    fn printed_circuits_reparse_to_the_same_gates() {
        let src = "qreg q[2]; creg c[2]; h q[0]; rz(0.5) q[1]; cx q[0],q[1]; measure q[0] -> c[0];";
        let circuit = crate::qasm::parse_str(src).unwrap();
        let reparsed = crate::qasm::parse_str(&circuit_to_qasm(&circuit)).unwrap();
        assert_eq!(circuit.gates, reparsed.gates);
    }

    #[test]
    fn whole_numbers_print_as_real_literals() {
        assert_eq!(format_f64(3.0), "3.0");
        assert_eq!(format_f64(0.5), "0.5");
        assert_eq!(format_f64(-2.0), "-2.0");
    }
}
