//! AST lowering: walks a validated [`Program`] in source order and produces
//! a flat [`QuantumCircuit`].
//!
//! Registers are concatenated in declaration order; the `(register, index)`
//! layout is recorded on the circuit so diagnostics and the printer can
//! speak in source names. User-defined gates are inlined at call sites up
//! to a configurable depth.

use std::collections::HashMap;
use std::f64::consts::PI;

use lazy_static::lazy_static;

use super::ast::*;
use crate::circuit::{Gate, QuantumCircuit, RegisterLayout};
use crate::error::{Error, Result};

/// Default maximum nesting when inlining user-defined gates.
pub const DEFAULT_MAX_INLINE_DEPTH: usize = 16;

lazy_static! {
    /// Built-in gate table: name -> (parameter count, qubit count).
    /// Calls resolve here before user definitions.
    static ref BUILTINS: HashMap<&'static str, (usize, usize)> = {
        let mut m = HashMap::new();
        for name in ["id", "h", "x", "y", "z", "s", "sdg", "t", "tdg"] {
            m.insert(name, (0, 1));
        }
        for name in ["rx", "ry", "rz", "p", "u1"] {
            m.insert(name, (1, 1));
        }
        m.insert("u2", (2, 1));
        m.insert("u3", (3, 1));
        m.insert("U", (3, 1));
        for name in ["cx", "CX", "cz", "swap", "iswap", "siswap"] {
            m.insert(name, (0, 2));
        }
        for name in ["cp", "cu1", "crx", "cry", "crz"] {
            m.insert(name, (1, 2));
        }
        m.insert("cu2", (2, 2));
        m.insert("cu3", (3, 2));
        for name in ["ccx", "ccz", "cswap"] {
            m.insert(name, (0, 3));
        }
        m
    };
}

/// Lowers a program with the default inlining depth.
pub fn lower(program: &Program) -> Result<QuantumCircuit> {
    lower_with_depth(program, DEFAULT_MAX_INLINE_DEPTH)
}

pub fn lower_with_depth(program: &Program, max_inline_depth: usize) -> Result<QuantumCircuit> {
    let mut lowerer = Lowerer {
        qregs: Vec::new(),
        cregs: Vec::new(),
        gatedefs: HashMap::new(),
        opaques: Vec::new(),
        max_inline_depth,
    };
    lowerer.collect_declarations(program)?;
    lowerer.build(program)
}

fn semantic(line: usize, col: usize, message: impl Into<String>) -> Error {
    Error::Semantic {
        line,
        col,
        message: message.into(),
    }
}

struct Lowerer {
    qregs: Vec<RegisterLayout>,
    cregs: Vec<RegisterLayout>,
    gatedefs: HashMap<String, GateDef>,
    opaques: Vec<String>,
    max_inline_depth: usize,
}

/// A resolved qubit (or classical bit) argument: one flat index, or a whole
/// register to broadcast over.
enum Operand {
    Single(usize),
    Whole(Vec<usize>),
}

impl Lowerer {
    fn collect_declarations(&mut self, program: &Program) -> Result<()> {
        for item in &program.items {
            match item {
                Item::QReg(decl) | Item::CReg(decl) => {
                    if decl.size == 0 {
                        return Err(semantic(
                            decl.line,
                            decl.col,
                            format!("register '{}' must have positive width", decl.name),
                        ));
                    }
                    if self.find_qreg(&decl.name).is_some() || self.find_creg(&decl.name).is_some()
                    {
                        return Err(semantic(
                            decl.line,
                            decl.col,
                            format!("register '{}' is already declared", decl.name),
                        ));
                    }
                    let (regs, offset) = if matches!(item, Item::QReg(_)) {
                        let offset = self.qregs.iter().map(|r| r.size).sum();
                        (&mut self.qregs, offset)
                    } else {
                        let offset = self.cregs.iter().map(|r| r.size).sum();
                        (&mut self.cregs, offset)
                    };
                    regs.push(RegisterLayout {
                        name: decl.name.clone(),
                        size: decl.size,
                        offset,
                    });
                }
                Item::GateDef(def) => {
                    if self.gatedefs.contains_key(&def.name) || self.opaques.contains(&def.name) {
                        return Err(semantic(
                            def.line,
                            def.col,
                            format!("gate '{}' is already defined", def.name),
                        ));
                    }
                    self.gatedefs.insert(def.name.clone(), def.clone());
                }
                Item::Opaque(decl) => {
                    if self.gatedefs.contains_key(&decl.name) || self.opaques.contains(&decl.name)
                    {
                        return Err(semantic(
                            decl.line,
                            decl.col,
                            format!("gate '{}' is already defined", decl.name),
                        ));
                    }
                    log::warn!(
                        "opaque gate '{}' declared at line {}; calls to it cannot be simulated",
                        decl.name,
                        decl.line
                    );
                    self.opaques.push(decl.name.clone());
                }
                Item::Include(_) | Item::Statement(_) => {}
            }
        }
        Ok(())
    }

    fn build(&mut self, program: &Program) -> Result<QuantumCircuit> {
        let num_qubits = self.qregs.iter().map(|r| r.size).sum();
        let num_cbits = self.cregs.iter().map(|r| r.size).sum();
        let mut circuit = QuantumCircuit::new(num_qubits, num_cbits)?;
        circuit.qregs = self.qregs.clone();
        circuit.cregs = self.cregs.clone();

        for item in &program.items {
            if let Item::Statement(stmt) = item {
                self.lower_statement(&mut circuit, stmt)?;
            }
        }
        Ok(circuit)
    }

    fn find_qreg(&self, name: &str) -> Option<&RegisterLayout> {
        self.qregs.iter().find(|r| r.name == name)
    }

    fn find_creg(&self, name: &str) -> Option<&RegisterLayout> {
        self.cregs.iter().find(|r| r.name == name)
    }

    fn resolve_qubit(
        &self,
        arg: &QubitRef,
        line: usize,
        col: usize,
    ) -> Result<Operand> {
        let reg = self.find_qreg(&arg.name).ok_or_else(|| {
            semantic(line, col, format!("unknown quantum register '{}'", arg.name))
        })?;
        match arg.index {
            Some(index) if index >= reg.size => Err(semantic(
                line,
                col,
                format!(
                    "index {} is out of range for register '{}' of size {}",
                    index, arg.name, reg.size
                ),
            )),
            Some(index) => Ok(Operand::Single(reg.offset + index)),
            None => Ok(Operand::Whole((reg.offset..reg.offset + reg.size).collect())),
        }
    }

    fn resolve_cbit(&self, arg: &QubitRef, line: usize, col: usize) -> Result<Operand> {
        let reg = self.find_creg(&arg.name).ok_or_else(|| {
            semantic(line, col, format!("unknown classical register '{}'", arg.name))
        })?;
        match arg.index {
            Some(index) if index >= reg.size => Err(semantic(
                line,
                col,
                format!(
                    "index {} is out of range for register '{}' of size {}",
                    index, arg.name, reg.size
                ),
            )),
            Some(index) => Ok(Operand::Single(reg.offset + index)),
            None => Ok(Operand::Whole((reg.offset..reg.offset + reg.size).collect())),
        }
    }

    /// Element-wise broadcast: whole-register arguments must agree on
    /// width; indexed arguments are replicated across the broadcast.
    fn broadcast(
        operands: Vec<Operand>,
        line: usize,
        col: usize,
    ) -> Result<Vec<Vec<usize>>> {
        let mut width: Option<usize> = None;
        for op in &operands {
            if let Operand::Whole(indices) = op {
                match width {
                    None => width = Some(indices.len()),
                    Some(w) if w != indices.len() => {
                        return Err(semantic(
                            line,
                            col,
                            format!(
                                "register operands have mismatched widths {} and {}",
                                w,
                                indices.len()
                            ),
                        ));
                    }
                    _ => {}
                }
            }
        }
        let width = width.unwrap_or(1);
        let mut instances = Vec::with_capacity(width);
        for k in 0..width {
            instances.push(
                operands
                    .iter()
                    .map(|op| match op {
                        Operand::Single(q) => *q,
                        Operand::Whole(indices) => indices[k],
                    })
                    .collect(),
            );
        }
        Ok(instances)
    }

    fn lower_statement(&self, circuit: &mut QuantumCircuit, stmt: &Statement) -> Result<()> {
        match stmt {
            Statement::GateCall(call) => {
                self.lower_call(circuit, call, None, self.max_inline_depth, None)
            }
            Statement::Measure { qubit, cbit, line, col } => {
                let q = self.resolve_qubit(qubit, *line, *col)?;
                let c = self.resolve_cbit(cbit, *line, *col)?;
                for pair in Self::broadcast(vec![q, c], *line, *col)? {
                    circuit
                        .apply_measure(pair[0], pair[1])
                        .map_err(|e| semantic(*line, *col, e.to_string()))?;
                }
                Ok(())
            }
            Statement::Reset { qubit, line, col } => {
                let q = self.resolve_qubit(qubit, *line, *col)?;
                for instance in Self::broadcast(vec![q], *line, *col)? {
                    circuit
                        .apply_reset(instance[0])
                        .map_err(|e| semantic(*line, *col, e.to_string()))?;
                }
                Ok(())
            }
            Statement::Barrier { args, line, col } => {
                let mut qubits = Vec::new();
                for arg in args {
                    match self.resolve_qubit(arg, *line, *col)? {
                        Operand::Single(q) => qubits.push(q),
                        Operand::Whole(indices) => qubits.extend(indices),
                    }
                }
                circuit
                    .apply_barrier(&qubits)
                    .map_err(|e| semantic(*line, *col, e.to_string()))
            }
            Statement::If { creg, value, call, line, col } => {
                let reg = self.find_creg(creg).ok_or_else(|| {
                    semantic(*line, *col, format!("unknown classical register '{}'", creg))
                })?;
                if reg.size < 64 && *value >> reg.size != 0 {
                    return Err(semantic(
                        *line,
                        *col,
                        format!(
                            "condition value {} does not fit register '{}' of size {}",
                            value, creg, reg.size
                        ),
                    ));
                }
                let mask = if reg.size >= 64 {
                    u64::MAX
                } else {
                    ((1u64 << reg.size) - 1) << reg.offset
                };
                let expected = value << reg.offset;
                self.lower_call(
                    circuit,
                    call,
                    None,
                    self.max_inline_depth,
                    Some((mask, expected)),
                )
            }
        }
    }

    /// Lowers one gate call, broadcasting whole-register operands and
    /// recursively inlining user-defined gates. `scope` carries the
    /// parameter and qubit bindings of the enclosing gate body, if any.
    fn lower_call(
        &self,
        circuit: &mut QuantumCircuit,
        call: &GateCall,
        scope: Option<&BodyScope>,
        depth: usize,
        condition: Option<(u64, u64)>,
    ) -> Result<()> {
        let params: Vec<f64> = call
            .params
            .iter()
            .map(|e| eval_expr(e, scope.map(|s| &s.params), call.line, call.col))
            .collect::<Result<_>>()?;

        let operands: Vec<Operand> = call
            .qubits
            .iter()
            .map(|arg| match scope {
                Some(body) => {
                    if arg.index.is_some() {
                        return Err(semantic(
                            call.line,
                            call.col,
                            "indexed qubit references are not allowed inside gate bodies",
                        ));
                    }
                    body.qubits
                        .get(&arg.name)
                        .map(|&q| Operand::Single(q))
                        .ok_or_else(|| {
                            semantic(
                                call.line,
                                call.col,
                                format!("unknown qubit '{}' in gate body", arg.name),
                            )
                        })
                }
                None => self.resolve_qubit(arg, call.line, call.col),
            })
            .collect::<Result<_>>()?;

        for qubits in Self::broadcast(operands, call.line, call.col)? {
            self.dispatch(circuit, call, &params, &qubits, depth, condition)?;
        }
        Ok(())
    }

    fn dispatch(
        &self,
        circuit: &mut QuantumCircuit,
        call: &GateCall,
        params: &[f64],
        qubits: &[usize],
        depth: usize,
        condition: Option<(u64, u64)>,
    ) -> Result<()> {
        // Built-in gates shadow user definitions.
        if let Some(&(n_params, n_qubits)) = BUILTINS.get(call.name.as_str()) {
            if params.len() != n_params {
                return Err(semantic(
                    call.line,
                    call.col,
                    format!(
                        "gate '{}' expects {} parameter(s), got {}",
                        call.name,
                        n_params,
                        params.len()
                    ),
                ));
            }
            if qubits.len() != n_qubits {
                return Err(semantic(
                    call.line,
                    call.col,
                    format!(
                        "gate '{}' expects {} qubit(s), got {}",
                        call.name,
                        n_qubits,
                        qubits.len()
                    ),
                ));
            }
            if let Some(gate) = make_builtin(&call.name, params, qubits) {
                let gate = match condition {
                    Some((mask, expected)) => Gate::Conditioned {
                        gate: Box::new(gate),
                        mask,
                        expected,
                    },
                    None => gate,
                };
                circuit
                    .apply_gate(gate)
                    .map_err(|e| semantic(call.line, call.col, e.to_string()))?;
            }
            return Ok(());
        }

        if let Some(def) = self.gatedefs.get(&call.name) {
            if depth == 0 {
                return Err(Error::RecursionLimit(
                    self.max_inline_depth,
                    call.name.clone(),
                ));
            }
            if params.len() != def.params.len() || qubits.len() != def.qubits.len() {
                return Err(semantic(
                    call.line,
                    call.col,
                    format!(
                        "gate '{}' expects {} parameter(s) and {} qubit(s), got {} and {}",
                        call.name,
                        def.params.len(),
                        def.qubits.len(),
                        params.len(),
                        qubits.len()
                    ),
                ));
            }
            let scope = BodyScope {
                params: def
                    .params
                    .iter()
                    .cloned()
                    .zip(params.iter().copied())
                    .collect(),
                qubits: def
                    .qubits
                    .iter()
                    .cloned()
                    .zip(qubits.iter().copied())
                    .collect(),
            };
            for stmt in &def.body {
                match stmt {
                    Statement::GateCall(inner) => {
                        self.lower_call(circuit, inner, Some(&scope), depth - 1, condition)?;
                    }
                    Statement::Barrier { args, line, col } => {
                        let mut fence = Vec::new();
                        for arg in args {
                            let q = scope.qubits.get(&arg.name).ok_or_else(|| {
                                semantic(
                                    *line,
                                    *col,
                                    format!("unknown qubit '{}' in gate body", arg.name),
                                )
                            })?;
                            fence.push(*q);
                        }
                        circuit
                            .apply_barrier(&fence)
                            .map_err(|e| semantic(*line, *col, e.to_string()))?;
                    }
                    other => {
                        let (line, col) = statement_position(other);
                        return Err(semantic(
                            line,
                            col,
                            "only gate calls and barriers are allowed in gate bodies",
                        ));
                    }
                }
            }
            return Ok(());
        }

        if self.opaques.contains(&call.name) {
            return Err(semantic(
                call.line,
                call.col,
                format!("opaque gate '{}' has no body to simulate", call.name),
            ));
        }

        Err(semantic(
            call.line,
            call.col,
            format!("unknown gate '{}'", call.name),
        ))
    }
}

struct BodyScope {
    params: HashMap<String, f64>,
    qubits: HashMap<String, usize>,
}

fn statement_position(stmt: &Statement) -> (usize, usize) {
    match stmt {
        Statement::GateCall(call) => (call.line, call.col),
        Statement::Measure { line, col, .. }
        | Statement::Barrier { line, col, .. }
        | Statement::Reset { line, col, .. }
        | Statement::If { line, col, .. } => (*line, *col),
    }
}

/// Maps a built-in name to a gate. `id` produces no gate at all.
fn make_builtin(name: &str, p: &[f64], q: &[usize]) -> Option<Gate> {
    let gate = match name {
        "id" => return None,
        "h" => Gate::H(q[0]),
        "x" => Gate::X(q[0]),
        "y" => Gate::Y(q[0]),
        "z" => Gate::Z(q[0]),
        "s" => Gate::S(q[0]),
        "sdg" => Gate::Sdg(q[0]),
        "t" => Gate::T(q[0]),
        "tdg" => Gate::Tdg(q[0]),
        "rx" => Gate::Rx(q[0], p[0]),
        "ry" => Gate::Ry(q[0], p[0]),
        "rz" => Gate::Rz(q[0], p[0]),
        "p" => Gate::Phase(q[0], p[0]),
        "u1" => Gate::U1(q[0], p[0]),
        "u2" => Gate::U2(q[0], p[0], p[1]),
        "u3" | "U" => Gate::U3(q[0], p[0], p[1], p[2]),
        "cx" | "CX" => Gate::Cx(q[0], q[1]),
        "cz" => Gate::Cz(q[0], q[1]),
        "swap" => Gate::Swap(q[0], q[1]),
        "iswap" => Gate::ISwap(q[0], q[1]),
        "siswap" => Gate::SqrtISwap(q[0], q[1]),
        "cp" => Gate::CPhase(q[0], q[1], p[0]),
        "cu1" => Gate::Cu1(q[0], q[1], p[0]),
        "crx" => Gate::Crx(q[0], q[1], p[0]),
        "cry" => Gate::Cry(q[0], q[1], p[0]),
        "crz" => Gate::Crz(q[0], q[1], p[0]),
        "cu2" => Gate::Cu2(q[0], q[1], p[0], p[1]),
        "cu3" => Gate::Cu3(q[0], q[1], p[0], p[1], p[2]),
        "ccx" => Gate::Ccx(q[0], q[1], q[2]),
        "ccz" => Gate::Ccz(q[0], q[1], q[2]),
        "cswap" => Gate::CSwap(q[0], q[1], q[2]),
        _ => unreachable!("name checked against the builtin table"),
    };
    Some(gate)
}

/// Evaluates a parameter expression to `f64`. Identifiers resolve against
/// the enclosing gate body's parameters; there are none at top level.
fn eval_expr(
    expr: &Expr,
    env: Option<&HashMap<String, f64>>,
    line: usize,
    col: usize,
) -> Result<f64> {
    let value = match expr {
        Expr::Number(v) => *v,
        Expr::Pi => PI,
        Expr::Ident(name) => match env.and_then(|e| e.get(name)) {
            Some(v) => *v,
            None => {
                return Err(semantic(
                    line,
                    col,
                    format!("unknown parameter '{}' in expression", name),
                ));
            }
        },
        Expr::Neg(inner) => -eval_expr(inner, env, line, col)?,
        Expr::Binary(op, lhs, rhs) => {
            let l = eval_expr(lhs, env, line, col)?;
            let r = eval_expr(rhs, env, line, col)?;
            match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
                BinOp::Pow => l.powf(r),
            }
        }
        Expr::Call(name, args) => {
            let arity = if name == "pow" { 2 } else { 1 };
            if args.len() != arity {
                return Err(semantic(
                    line,
                    col,
                    format!("function '{}' expects {} argument(s)", name, arity),
                ));
            }
            let first = eval_expr(&args[0], env, line, col)?;
            match name.as_str() {
                "sin" => first.sin(),
                "cos" => first.cos(),
                "tan" => first.tan(),
                "exp" => first.exp(),
                "ln" => first.ln(),
                "sqrt" => first.sqrt(),
                "pow" => first.powf(eval_expr(&args[1], env, line, col)?),
                _ => {
                    return Err(semantic(
                        line,
                        col,
                        format!("unknown function '{}' in expression", name),
                    ));
                }
            }
        }
    };
    Ok(value)
}
