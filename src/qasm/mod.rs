//! OpenQASM 2.0 front end: lexer, parser, AST lowering, and the text/JSON
//! emitters.
//!
//! The usual entry point is [`parse_str`], which takes pre-concatenated
//! source. `include "qelib1.inc";` is satisfied internally (the built-in
//! gate table is qelib1); any other include needs a caller-supplied
//! resolver, see [`parse_str_with_resolver`].

use crate::circuit::QuantumCircuit;
use crate::error::{Error, Result};

pub mod ast;
pub mod json;
pub mod lexer;
pub mod lowering;
pub mod parser;
pub mod printer;

pub use ast::Program;
pub use json::circuit_to_json;
pub use lowering::{DEFAULT_MAX_INLINE_DEPTH, lower, lower_with_depth};
pub use parser::parse_program;
pub use printer::{circuit_to_qasm, print_program};

/// Callback mapping an include file name to its source text.
pub type IncludeResolver<'a> = dyn Fn(&str) -> Option<String> + 'a;

const MAX_INCLUDE_DEPTH: usize = 8;

/// Compiles OpenQASM 2.0 source into a circuit.
///
/// ## Examples
///
/// ```rust
/// use statevector_simulator_rust::qasm;
///
/// let circuit = qasm::parse_str(
///     "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\nh q[0];\ncx q[0],q[1];",
/// )
/// .unwrap();
/// assert_eq!(circuit.num_qubits, 2);
/// assert_eq!(circuit.gate_count(), 2);
/// ```
pub fn parse_str(source: &str) -> Result<QuantumCircuit> {
    let program = parse_program(source)?;
    let program = expand_includes(program, None, MAX_INCLUDE_DEPTH)?;
    lowering::lower(&program)
}

/// Like [`parse_str`], but resolves `include` directives through the given
/// callback. The resolver returns the included file's source text, or
/// `None` when it cannot provide it.
pub fn parse_str_with_resolver(
    source: &str,
    resolver: &IncludeResolver<'_>,
) -> Result<QuantumCircuit> {
    let program = parse_program(source)?;
    let program = expand_includes(program, Some(resolver), MAX_INCLUDE_DEPTH)?;
    lowering::lower(&program)
}

/// Splices included programs into the item list. `qelib1.inc` is dropped:
/// its gates are the built-in table.
fn expand_includes(
    program: Program,
    resolver: Option<&IncludeResolver<'_>>,
    depth: usize,
) -> Result<Program> {
    let mut items = Vec::with_capacity(program.items.len());
    for item in program.items {
        match item {
            ast::Item::Include(inc) => {
                if inc.file == "qelib1.inc" {
                    continue;
                }
                if depth == 0 {
                    return Err(Error::Semantic {
                        line: inc.line,
                        col: inc.col,
                        message: format!("include nesting too deep at \"{}\"", inc.file),
                    });
                }
                let source = resolver.and_then(|r| r(&inc.file)).ok_or_else(|| {
                    Error::Semantic {
                        line: inc.line,
                        col: inc.col,
                        message: format!("cannot resolve include \"{}\"", inc.file),
                    }
                })?;
                let included = parse_program(&source)?;
                let included = expand_includes(included, resolver, depth - 1)?;
                items.extend(included.items);
            }
            other => items.push(other),
        }
    }
    Ok(Program {
        version: program.version,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qelib_include_is_builtin() {
        let circuit = parse_str("OPENQASM 2.0; include \"qelib1.inc\"; qreg q[1]; h q[0];");
        assert!(circuit.is_ok());
    }

    #[test]
    fn unresolved_includes_are_semantic_errors() {
        let result = parse_str("OPENQASM 2.0; include \"mylib.inc\"; qreg q[1];");
        assert!(matches!(result, Err(Error::Semantic { .. })));
    }

    #[test]
    fn resolver_supplies_included_gates() {
        let resolver = |name: &str| {
            (name == "mylib.inc").then(|| "gate flip a { x a; }".to_string())
        };
        let circuit = parse_str_with_resolver(
            "OPENQASM 2.0; include \"mylib.inc\"; qreg q[1]; flip q[0];",
            &resolver,
        )
        .unwrap();
        assert_eq!(circuit.gates, vec![crate::circuit::Gate::X(0)]);
    }
}
