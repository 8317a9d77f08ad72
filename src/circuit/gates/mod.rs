use ndarray::Array2;
use num_complex::Complex64;

use crate::error::{Error, Result};
use crate::types::UNITARY_TOLERANCE;

pub mod matrices;

/// A single operation in a quantum circuit.
///
/// The gate set is closed: every unitary the simulator understands is a
/// variant here, and matrix synthesis, inversion, and optimizer rewrite
/// tables all dispatch exhaustively on the tag. Arbitrary unitaries enter
/// through [`Gate::Custom`], which carries its own matrix.
///
/// Qubit operands are stored in the payload in call order. For multi-qubit
/// gates the first listed qubit is the least-significant sub-index of the
/// gate matrix (see [`matrices`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    // Single-qubit gates
    /// Pauli-X gate
    X(usize),
    /// Pauli-Y gate
    Y(usize),
    /// Pauli-Z gate
    Z(usize),
    /// Hadamard gate
    H(usize),
    /// S gate
    S(usize),
    /// S-dagger gate
    Sdg(usize),
    /// T gate
    T(usize),
    /// T-dagger gate
    Tdg(usize),
    /// Rotation about the X axis by the given angle
    Rx(usize, f64),
    /// Rotation about the Y axis by the given angle
    Ry(usize, f64),
    /// Rotation about the Z axis by the given angle
    Rz(usize, f64),
    /// Phase gate, `diag(1, e^{iλ})`
    Phase(usize, f64),
    /// U1 gate; same matrix as [`Gate::Phase`], kept as its own tag so the
    /// printer reproduces the source spelling
    U1(usize, f64),
    /// U2 gate with angles (φ, λ)
    U2(usize, f64, f64),
    /// U3 gate with angles (θ, φ, λ)
    U3(usize, f64, f64, f64),
    /// Non-unitary reset of one qubit to |0>
    Reset(usize),

    // Two-qubit gates
    /// Controlled-NOT with (control, target)
    Cx(usize, usize),
    /// Controlled-Z gate
    Cz(usize, usize),
    /// SWAP gate
    Swap(usize, usize),
    /// iSWAP gate
    ISwap(usize, usize),
    /// Square root of the iSWAP gate
    SqrtISwap(usize, usize),
    /// Controlled phase gate with (control, target, λ)
    CPhase(usize, usize, f64),
    /// Controlled X rotation
    Crx(usize, usize, f64),
    /// Controlled Y rotation
    Cry(usize, usize, f64),
    /// Controlled Z rotation
    Crz(usize, usize, f64),
    /// Controlled U1 gate; same matrix as [`Gate::CPhase`]
    Cu1(usize, usize, f64),
    /// Controlled U2 gate with (control, target, φ, λ)
    Cu2(usize, usize, f64, f64),
    /// Controlled U3 gate with (control, target, θ, φ, λ)
    Cu3(usize, usize, f64, f64, f64),

    // Three-qubit gates
    /// Toffoli gate with (control1, control2, target)
    Ccx(usize, usize, usize),
    /// Doubly-controlled Z gate
    Ccz(usize, usize, usize),
    /// Fredkin gate with (control, target1, target2)
    CSwap(usize, usize, usize),

    // Meta operations
    /// Projective measurement of `qubit` into classical bit `cbit`
    Measure { qubit: usize, cbit: usize },
    /// Scheduling fence over the listed qubits
    Barrier(Vec<usize>),
    /// A gate executed only when the masked classical register equals the
    /// expected value: `(creg & mask) == expected`
    Conditioned {
        gate: Box<Gate>,
        mask: u64,
        expected: u64,
    },
    /// An arbitrary k-qubit unitary supplied by the caller. The matrix is
    /// checked for unitarity when the gate is inserted into a circuit.
    Custom {
        name: String,
        matrix: Array2<Complex64>,
        qubits: Vec<usize>,
    },
}

impl Gate {
    /// The qubit operands of the gate, in call order.
    pub fn qubits(&self) -> Vec<usize> {
        match self {
            Gate::X(q)
            | Gate::Y(q)
            | Gate::Z(q)
            | Gate::H(q)
            | Gate::S(q)
            | Gate::Sdg(q)
            | Gate::T(q)
            | Gate::Tdg(q)
            | Gate::Rx(q, _)
            | Gate::Ry(q, _)
            | Gate::Rz(q, _)
            | Gate::Phase(q, _)
            | Gate::U1(q, _)
            | Gate::U2(q, _, _)
            | Gate::U3(q, _, _, _)
            | Gate::Reset(q) => vec![*q],
            Gate::Cx(a, b)
            | Gate::Cz(a, b)
            | Gate::Swap(a, b)
            | Gate::ISwap(a, b)
            | Gate::SqrtISwap(a, b)
            | Gate::CPhase(a, b, _)
            | Gate::Crx(a, b, _)
            | Gate::Cry(a, b, _)
            | Gate::Crz(a, b, _)
            | Gate::Cu1(a, b, _)
            | Gate::Cu2(a, b, _, _)
            | Gate::Cu3(a, b, _, _, _) => vec![*a, *b],
            Gate::Ccx(a, b, c) | Gate::Ccz(a, b, c) | Gate::CSwap(a, b, c) => vec![*a, *b, *c],
            Gate::Measure { qubit, .. } => vec![*qubit],
            Gate::Barrier(qs) => qs.clone(),
            Gate::Conditioned { gate, .. } => gate.qubits(),
            Gate::Custom { qubits, .. } => qubits.clone(),
        }
    }

    /// The real-valued parameters of the gate, in declaration order.
    pub fn params(&self) -> Vec<f64> {
        match self {
            Gate::Rx(_, t) | Gate::Ry(_, t) | Gate::Rz(_, t) | Gate::Phase(_, t) | Gate::U1(_, t) => {
                vec![*t]
            }
            Gate::U2(_, p, l) => vec![*p, *l],
            Gate::U3(_, t, p, l) => vec![*t, *p, *l],
            Gate::CPhase(_, _, l) | Gate::Crx(_, _, l) | Gate::Cry(_, _, l) | Gate::Crz(_, _, l)
            | Gate::Cu1(_, _, l) => vec![*l],
            Gate::Cu2(_, _, p, l) => vec![*p, *l],
            Gate::Cu3(_, _, t, p, l) => vec![*t, *p, *l],
            Gate::Conditioned { gate, .. } => gate.params(),
            _ => Vec::new(),
        }
    }

    /// The lower-case OpenQASM name of the gate.
    pub fn name(&self) -> &str {
        match self {
            Gate::X(_) => "x",
            Gate::Y(_) => "y",
            Gate::Z(_) => "z",
            Gate::H(_) => "h",
            Gate::S(_) => "s",
            Gate::Sdg(_) => "sdg",
            Gate::T(_) => "t",
            Gate::Tdg(_) => "tdg",
            Gate::Rx(..) => "rx",
            Gate::Ry(..) => "ry",
            Gate::Rz(..) => "rz",
            Gate::Phase(..) => "p",
            Gate::U1(..) => "u1",
            Gate::U2(..) => "u2",
            Gate::U3(..) => "u3",
            Gate::Reset(_) => "reset",
            Gate::Cx(..) => "cx",
            Gate::Cz(..) => "cz",
            Gate::Swap(..) => "swap",
            Gate::ISwap(..) => "iswap",
            Gate::SqrtISwap(..) => "siswap",
            Gate::CPhase(..) => "cp",
            Gate::Crx(..) => "crx",
            Gate::Cry(..) => "cry",
            Gate::Crz(..) => "crz",
            Gate::Cu1(..) => "cu1",
            Gate::Cu2(..) => "cu2",
            Gate::Cu3(..) => "cu3",
            Gate::Ccx(..) => "ccx",
            Gate::Ccz(..) => "ccz",
            Gate::CSwap(..) => "cswap",
            Gate::Measure { .. } => "measure",
            Gate::Barrier(_) => "barrier",
            Gate::Conditioned { .. } => "if",
            Gate::Custom { name, .. } => name,
        }
    }

    /// Whether the gate is a pure unitary the optimizer may reason about.
    /// Measurement, reset, barriers, and conditioned gates are opaque to
    /// algebraic rewriting.
    pub fn is_unitary_gate(&self) -> bool {
        !matches!(
            self,
            Gate::Measure { .. } | Gate::Barrier(_) | Gate::Reset(_) | Gate::Conditioned { .. }
        )
    }

    /// Diagonal in the computational basis.
    pub fn is_diagonal(&self) -> bool {
        matches!(
            self,
            Gate::Z(_)
                | Gate::S(_)
                | Gate::Sdg(_)
                | Gate::T(_)
                | Gate::Tdg(_)
                | Gate::Rz(..)
                | Gate::Phase(..)
                | Gate::U1(..)
                | Gate::Cz(..)
                | Gate::CPhase(..)
                | Gate::Crz(..)
                | Gate::Cu1(..)
                | Gate::Ccz(..)
        )
    }

    /// Anti-diagonal or X-axis: commutes with other members of this set on
    /// the same qubit.
    pub fn is_antidiagonal(&self) -> bool {
        matches!(self, Gate::X(_) | Gate::Rx(..))
    }

    /// Whether applying `other` immediately after `self` yields the
    /// identity. Pair lookup is symmetric and requires exact equality of
    /// the qubit operand lists.
    pub fn cancels_with(&self, other: &Gate) -> bool {
        if self.qubits() != other.qubits() {
            return false;
        }
        matches!(
            (self, other),
            (Gate::X(_), Gate::X(_))
                | (Gate::Y(_), Gate::Y(_))
                | (Gate::Z(_), Gate::Z(_))
                | (Gate::H(_), Gate::H(_))
                | (Gate::S(_), Gate::Sdg(_))
                | (Gate::Sdg(_), Gate::S(_))
                | (Gate::T(_), Gate::Tdg(_))
                | (Gate::Tdg(_), Gate::T(_))
                | (Gate::Cx(..), Gate::Cx(..))
                | (Gate::Cz(..), Gate::Cz(..))
                | (Gate::Swap(..), Gate::Swap(..))
        )
    }

    /// The inverse gate, or `None` for non-unitary operations.
    ///
    /// Inverses outside the closed gate set (iSWAP and its square root)
    /// come back as [`Gate::Custom`] carrying the adjoint matrix.
    pub fn inverse(&self) -> Option<Gate> {
        use std::f64::consts::FRAC_PI_2;
        let inv = match self {
            Gate::X(q) => Gate::X(*q),
            Gate::Y(q) => Gate::Y(*q),
            Gate::Z(q) => Gate::Z(*q),
            Gate::H(q) => Gate::H(*q),
            Gate::S(q) => Gate::Sdg(*q),
            Gate::Sdg(q) => Gate::S(*q),
            Gate::T(q) => Gate::Tdg(*q),
            Gate::Tdg(q) => Gate::T(*q),
            Gate::Rx(q, t) => Gate::Rx(*q, -t),
            Gate::Ry(q, t) => Gate::Ry(*q, -t),
            Gate::Rz(q, t) => Gate::Rz(*q, -t),
            Gate::Phase(q, l) => Gate::Phase(*q, -l),
            Gate::U1(q, l) => Gate::U1(*q, -l),
            Gate::U2(q, p, l) => Gate::U3(*q, -FRAC_PI_2, -l, -p),
            Gate::U3(q, t, p, l) => Gate::U3(*q, -t, -l, -p),
            Gate::Cx(a, b) => Gate::Cx(*a, *b),
            Gate::Cz(a, b) => Gate::Cz(*a, *b),
            Gate::Swap(a, b) => Gate::Swap(*a, *b),
            Gate::ISwap(a, b) => Gate::Custom {
                name: "iswap_dg".to_string(),
                matrix: matrices::adjoint(&matrices::ISWAP),
                qubits: vec![*a, *b],
            },
            Gate::SqrtISwap(a, b) => Gate::Custom {
                name: "siswap_dg".to_string(),
                matrix: matrices::adjoint(&matrices::SQRT_ISWAP),
                qubits: vec![*a, *b],
            },
            Gate::CPhase(a, b, l) => Gate::CPhase(*a, *b, -l),
            Gate::Crx(a, b, t) => Gate::Crx(*a, *b, -t),
            Gate::Cry(a, b, t) => Gate::Cry(*a, *b, -t),
            Gate::Crz(a, b, t) => Gate::Crz(*a, *b, -t),
            Gate::Cu1(a, b, l) => Gate::Cu1(*a, *b, -l),
            Gate::Cu2(a, b, p, l) => Gate::Cu3(*a, *b, -FRAC_PI_2, -l, -p),
            Gate::Cu3(a, b, t, p, l) => Gate::Cu3(*a, *b, -t, -l, -p),
            Gate::Ccx(a, b, c) => Gate::Ccx(*a, *b, *c),
            Gate::Ccz(a, b, c) => Gate::Ccz(*a, *b, *c),
            Gate::CSwap(a, b, c) => Gate::CSwap(*a, *b, *c),
            Gate::Custom {
                name,
                matrix,
                qubits,
            } => Gate::Custom {
                name: format!("{}_dg", name),
                matrix: matrices::adjoint(matrix),
                qubits: qubits.clone(),
            },
            Gate::Measure { .. } | Gate::Barrier(_) | Gate::Reset(_) | Gate::Conditioned { .. } => {
                return None;
            }
        };
        Some(inv)
    }

    /// Checks the gate against a circuit of the given widths: operands
    /// distinct and in range, classical bits in range, and custom matrices
    /// square, correctly sized, and unitary.
    pub fn validate(&self, num_qubits: usize, num_cbits: usize) -> Result<()> {
        let qubits = self.qubits();
        for &q in &qubits {
            if q >= num_qubits {
                return Err(Error::QubitIndexOutOfBounds(q, num_qubits));
            }
        }
        for (i, &q) in qubits.iter().enumerate() {
            if qubits[..i].contains(&q) {
                return Err(Error::DuplicateQubit(q));
            }
        }
        match self {
            Gate::Measure { cbit, .. } => {
                if *cbit >= num_cbits {
                    return Err(Error::CbitIndexOutOfBounds(*cbit, num_cbits));
                }
            }
            Gate::Conditioned { gate, mask, .. } => {
                if num_cbits < 64 && *mask >> num_cbits != 0 {
                    let high = 63 - mask.leading_zeros() as usize;
                    return Err(Error::CbitIndexOutOfBounds(high, num_cbits));
                }
                gate.validate(num_qubits, num_cbits)?;
            }
            Gate::Custom { name, matrix, qubits } => {
                let expected = 1usize << qubits.len();
                if matrix.nrows() != expected || matrix.ncols() != expected {
                    return Err(Error::DimensionMismatch {
                        name: name.clone(),
                        expected,
                        rows: matrix.nrows(),
                        cols: matrix.ncols(),
                    });
                }
                if !matrices::is_unitary(matrix, UNITARY_TOLERANCE) {
                    return Err(Error::NonUnitary(name.clone()));
                }
            }
            _ => {}
        }
        Ok(())
    }

    // --- Crate internal use only ---

    pub(crate) fn shift_indices(&mut self, offset: usize) {
        match self {
            Gate::X(q)
            | Gate::Y(q)
            | Gate::Z(q)
            | Gate::H(q)
            | Gate::S(q)
            | Gate::Sdg(q)
            | Gate::T(q)
            | Gate::Tdg(q)
            | Gate::Rx(q, _)
            | Gate::Ry(q, _)
            | Gate::Rz(q, _)
            | Gate::Phase(q, _)
            | Gate::U1(q, _)
            | Gate::U2(q, _, _)
            | Gate::U3(q, _, _, _)
            | Gate::Reset(q)
            | Gate::Measure { qubit: q, .. } => *q += offset,
            Gate::Cx(a, b)
            | Gate::Cz(a, b)
            | Gate::Swap(a, b)
            | Gate::ISwap(a, b)
            | Gate::SqrtISwap(a, b)
            | Gate::CPhase(a, b, _)
            | Gate::Crx(a, b, _)
            | Gate::Cry(a, b, _)
            | Gate::Crz(a, b, _)
            | Gate::Cu1(a, b, _)
            | Gate::Cu2(a, b, _, _)
            | Gate::Cu3(a, b, _, _, _) => {
                *a += offset;
                *b += offset;
            }
            Gate::Ccx(a, b, c) | Gate::Ccz(a, b, c) | Gate::CSwap(a, b, c) => {
                *a += offset;
                *b += offset;
                *c += offset;
            }
            Gate::Barrier(qs) => {
                for q in qs.iter_mut() {
                    *q += offset;
                }
            }
            Gate::Conditioned { gate, .. } => gate.shift_indices(offset),
            Gate::Custom { qubits, .. } => {
                for q in qubits.iter_mut() {
                    *q += offset;
                }
            }
        }
    }

    pub(crate) fn shifted(&self, offset: usize) -> Self {
        let mut new_gate = self.clone();
        new_gate.shift_indices(offset);
        new_gate
    }

    pub(crate) fn shift_cbits(&mut self, offset: usize) {
        match self {
            Gate::Measure { cbit, .. } => *cbit += offset,
            Gate::Conditioned {
                gate,
                mask,
                expected,
            } => {
                *mask <<= offset;
                *expected <<= offset;
                gate.shift_cbits(offset);
            }
            _ => {}
        }
    }

    /// Rewrites every qubit operand through the permutation `perm`, where
    /// `perm[old] = new`.
    pub(crate) fn permuted(&self, perm: &[usize]) -> Self {
        let mut gate = self.clone();
        gate.permute_indices(perm);
        gate
    }

    fn permute_indices(&mut self, perm: &[usize]) {
        match self {
            Gate::Conditioned { gate, .. } => gate.permute_indices(perm),
            Gate::Barrier(qs) => {
                for q in qs.iter_mut() {
                    *q = perm[*q];
                }
            }
            Gate::Custom { qubits, .. } => {
                for q in qubits.iter_mut() {
                    *q = perm[*q];
                }
            }
            _ => {
                // Reuse the shift walk by mapping each stored index in place.
                let mapped: Vec<usize> = self.qubits().iter().map(|&q| perm[q]).collect();
                self.replace_qubits(&mapped);
            }
        }
    }

    fn replace_qubits(&mut self, qubits: &[usize]) {
        match self {
            Gate::X(q)
            | Gate::Y(q)
            | Gate::Z(q)
            | Gate::H(q)
            | Gate::S(q)
            | Gate::Sdg(q)
            | Gate::T(q)
            | Gate::Tdg(q)
            | Gate::Rx(q, _)
            | Gate::Ry(q, _)
            | Gate::Rz(q, _)
            | Gate::Phase(q, _)
            | Gate::U1(q, _)
            | Gate::U2(q, _, _)
            | Gate::U3(q, _, _, _)
            | Gate::Reset(q)
            | Gate::Measure { qubit: q, .. } => *q = qubits[0],
            Gate::Cx(a, b)
            | Gate::Cz(a, b)
            | Gate::Swap(a, b)
            | Gate::ISwap(a, b)
            | Gate::SqrtISwap(a, b)
            | Gate::CPhase(a, b, _)
            | Gate::Crx(a, b, _)
            | Gate::Cry(a, b, _)
            | Gate::Crz(a, b, _)
            | Gate::Cu1(a, b, _)
            | Gate::Cu2(a, b, _, _)
            | Gate::Cu3(a, b, _, _, _) => {
                *a = qubits[0];
                *b = qubits[1];
            }
            Gate::Ccx(a, b, c) | Gate::Ccz(a, b, c) | Gate::CSwap(a, b, c) => {
                *a = qubits[0];
                *b = qubits[1];
                *c = qubits[2];
            }
            Gate::Barrier(qs) => *qs = qubits.to_vec(),
            Gate::Custom { qubits: qs, .. } => *qs = qubits.to_vec(),
            Gate::Conditioned { .. } => unreachable!("handled by permute_indices"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn qubit_lists_follow_call_order() {
        assert_eq!(Gate::Cx(2, 0).qubits(), vec![2, 0]);
        assert_eq!(Gate::Ccx(1, 2, 0).qubits(), vec![1, 2, 0]);
        assert_eq!(Gate::Measure { qubit: 3, cbit: 1 }.qubits(), vec![3]);
    }

    #[test]
    fn cancellation_requires_exact_operand_match() {
        assert!(Gate::Cx(0, 1).cancels_with(&Gate::Cx(0, 1)));
        assert!(!Gate::Cx(0, 1).cancels_with(&Gate::Cx(1, 0)));
        assert!(Gate::S(2).cancels_with(&Gate::Sdg(2)));
        assert!(!Gate::S(2).cancels_with(&Gate::Sdg(1)));
    }

    #[test]
    fn inverse_round_trips_rotations() {
        let g = Gate::Rx(0, PI / 3.0);
        assert_eq!(g.inverse().unwrap(), Gate::Rx(0, -PI / 3.0));
        assert!(Gate::Measure { qubit: 0, cbit: 0 }.inverse().is_none());
    }

    #[test]
    fn validate_rejects_out_of_range_and_duplicates() {
        assert!(Gate::Cx(0, 1).validate(2, 0).is_ok());
        assert!(matches!(
            Gate::Cx(0, 2).validate(2, 0),
            Err(Error::QubitIndexOutOfBounds(2, 2))
        ));
        assert!(matches!(
            Gate::Swap(1, 1).validate(2, 0),
            Err(Error::DuplicateQubit(1))
        ));
        assert!(matches!(
            Gate::Measure { qubit: 0, cbit: 4 }.validate(2, 2),
            Err(Error::CbitIndexOutOfBounds(4, 2))
        ));
    }
}
