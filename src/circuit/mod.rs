use ndarray::Array2;
use num_complex::Complex64;

use crate::error::{Error, Result};
use crate::types::{MAX_CBITS, MAX_QUBITS};

pub mod gates;
pub mod optimizer;

pub use gates::Gate;

/// Placement of a named source register inside the flat index space.
///
/// Lowering concatenates registers in declaration order; the layout is kept
/// on the circuit so diagnostics and the pretty-printer can speak in the
/// source's register names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterLayout {
    pub name: String,
    pub size: usize,
    pub offset: usize,
}

/// One gate's worth of rendering metadata, see
/// [`QuantumCircuit::render_nodes`].
#[derive(Debug, Clone, PartialEq)]
pub struct GateNode {
    pub index: usize,
    pub name: String,
    pub qubits: Vec<usize>,
    pub params: Vec<f64>,
    pub layer: usize,
}

/// An ordered sequence of gates over a fixed number of qubits and classical
/// bits.
///
/// A `QuantumCircuit` is the blueprint for a computation: it is built
/// incrementally through the `apply_*` methods (each of which validates its
/// operands), then handed by reference to the optimizer, the simulator, or
/// the debugger. Nothing mutates a circuit it does not own.
///
/// ## Examples
///
/// ```rust
/// use statevector_simulator_rust::prelude::*;
///
/// let mut circuit = QuantumCircuit::new(2, 2).unwrap();
/// circuit.apply_h(0).unwrap();
/// circuit.apply_cx(0, 1).unwrap();
/// circuit.apply_measure(0, 0).unwrap();
/// circuit.apply_measure(1, 1).unwrap();
/// assert_eq!(circuit.gate_count(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QuantumCircuit {
    pub num_qubits: usize,
    pub num_cbits: usize,
    pub gates: Vec<Gate>,
    pub qregs: Vec<RegisterLayout>,
    pub cregs: Vec<RegisterLayout>,
}

impl QuantumCircuit {
    /// Creates an empty circuit.
    ///
    /// ## Arguments
    /// * `num_qubits` - Width of the quantum register, in `1..=MAX_QUBITS`.
    /// * `num_cbits` - Width of the classical register; may be zero.
    pub fn new(num_qubits: usize, num_cbits: usize) -> Result<Self> {
        if num_qubits == 0 || num_qubits > MAX_QUBITS {
            return Err(Error::InvalidNumQubits {
                got: num_qubits,
                max: MAX_QUBITS,
            });
        }
        if num_cbits > MAX_CBITS {
            return Err(Error::CbitIndexOutOfBounds(num_cbits, MAX_CBITS));
        }
        Ok(Self {
            num_qubits,
            num_cbits,
            gates: Vec::new(),
            qregs: Vec::new(),
            cregs: Vec::new(),
        })
    }

    /// Validates a gate against this circuit's widths and appends it.
    pub fn apply_gate(&mut self, gate: Gate) -> Result<()> {
        gate.validate(self.num_qubits, self.num_cbits)?;
        self.gates.push(gate);
        Ok(())
    }

    /// Validates and appends a sequence of gates. Stops at the first
    /// invalid gate, leaving the earlier ones appended.
    pub fn apply_gates(&mut self, gates: &[Gate]) -> Result<()> {
        for gate in gates {
            self.apply_gate(gate.clone())?;
        }
        Ok(())
    }

    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// Number of parallel layers when gates sharing no qubit or classical
    /// bit are scheduled together.
    pub fn depth(&self) -> usize {
        optimizer::layering::circuit_depth(self)
    }

    /// Per-gate metadata in circuit order, for renderer collaborators
    /// (DOT, LaTeX, ASCII diagrams). The layer is the gate's scheduling
    /// column; gates in the same layer touch disjoint resources.
    pub fn render_nodes(&self) -> Vec<GateNode> {
        let layers = optimizer::layering::assign_layers(self);
        self.gates
            .iter()
            .zip(layers)
            .enumerate()
            .map(|(index, (gate, layer))| GateNode {
                index,
                name: gate.name().to_string(),
                qubits: gate.qubits(),
                params: gate.params(),
                layer,
            })
            .collect()
    }

    // *** Single-qubit gates ***

    /// Apply a Pauli-X gate to the target qubit.
    pub fn apply_x(&mut self, target: usize) -> Result<()> {
        self.apply_gate(Gate::X(target))
    }

    /// Apply a Pauli-Y gate to the target qubit.
    pub fn apply_y(&mut self, target: usize) -> Result<()> {
        self.apply_gate(Gate::Y(target))
    }

    /// Apply a Pauli-Z gate to the target qubit.
    pub fn apply_z(&mut self, target: usize) -> Result<()> {
        self.apply_gate(Gate::Z(target))
    }

    /// Apply a Hadamard gate to the target qubit.
    pub fn apply_h(&mut self, target: usize) -> Result<()> {
        self.apply_gate(Gate::H(target))
    }

    /// Apply an S gate to the target qubit.
    pub fn apply_s(&mut self, target: usize) -> Result<()> {
        self.apply_gate(Gate::S(target))
    }

    /// Apply an S-dagger gate to the target qubit.
    pub fn apply_sdg(&mut self, target: usize) -> Result<()> {
        self.apply_gate(Gate::Sdg(target))
    }

    /// Apply a T gate to the target qubit.
    pub fn apply_t(&mut self, target: usize) -> Result<()> {
        self.apply_gate(Gate::T(target))
    }

    /// Apply a T-dagger gate to the target qubit.
    pub fn apply_tdg(&mut self, target: usize) -> Result<()> {
        self.apply_gate(Gate::Tdg(target))
    }

    /// Apply an X rotation by `theta` to the target qubit.
    pub fn apply_rx(&mut self, target: usize, theta: f64) -> Result<()> {
        self.apply_gate(Gate::Rx(target, theta))
    }

    /// Apply a Y rotation by `theta` to the target qubit.
    pub fn apply_ry(&mut self, target: usize, theta: f64) -> Result<()> {
        self.apply_gate(Gate::Ry(target, theta))
    }

    /// Apply a Z rotation by `theta` to the target qubit.
    pub fn apply_rz(&mut self, target: usize, theta: f64) -> Result<()> {
        self.apply_gate(Gate::Rz(target, theta))
    }

    /// Apply a phase gate `diag(1, e^{iλ})` to the target qubit.
    pub fn apply_phase(&mut self, target: usize, lambda: f64) -> Result<()> {
        self.apply_gate(Gate::Phase(target, lambda))
    }

    /// Apply a U2 gate to the target qubit.
    pub fn apply_u2(&mut self, target: usize, phi: f64, lambda: f64) -> Result<()> {
        self.apply_gate(Gate::U2(target, phi, lambda))
    }

    /// Apply a U3 gate to the target qubit.
    pub fn apply_u3(&mut self, target: usize, theta: f64, phi: f64, lambda: f64) -> Result<()> {
        self.apply_gate(Gate::U3(target, theta, phi, lambda))
    }

    /// Reset the target qubit to |0>.
    pub fn apply_reset(&mut self, target: usize) -> Result<()> {
        self.apply_gate(Gate::Reset(target))
    }

    // *** Two-qubit gates ***

    /// Apply a CNOT gate with the specified control and target qubits.
    pub fn apply_cx(&mut self, control: usize, target: usize) -> Result<()> {
        self.apply_gate(Gate::Cx(control, target))
    }

    /// Apply a CZ gate between the specified qubits.
    pub fn apply_cz(&mut self, qarg1: usize, qarg2: usize) -> Result<()> {
        self.apply_gate(Gate::Cz(qarg1, qarg2))
    }

    /// Apply a SWAP gate between the specified qubits.
    pub fn apply_swap(&mut self, qarg1: usize, qarg2: usize) -> Result<()> {
        self.apply_gate(Gate::Swap(qarg1, qarg2))
    }

    /// Apply an iSWAP gate between the specified qubits.
    pub fn apply_iswap(&mut self, qarg1: usize, qarg2: usize) -> Result<()> {
        self.apply_gate(Gate::ISwap(qarg1, qarg2))
    }

    /// Apply the square root of the iSWAP gate between the specified qubits.
    pub fn apply_sqrt_iswap(&mut self, qarg1: usize, qarg2: usize) -> Result<()> {
        self.apply_gate(Gate::SqrtISwap(qarg1, qarg2))
    }

    /// Apply a controlled phase gate.
    pub fn apply_cp(&mut self, control: usize, target: usize, lambda: f64) -> Result<()> {
        self.apply_gate(Gate::CPhase(control, target, lambda))
    }

    /// Apply a controlled X rotation.
    pub fn apply_crx(&mut self, control: usize, target: usize, theta: f64) -> Result<()> {
        self.apply_gate(Gate::Crx(control, target, theta))
    }

    /// Apply a controlled Y rotation.
    pub fn apply_cry(&mut self, control: usize, target: usize, theta: f64) -> Result<()> {
        self.apply_gate(Gate::Cry(control, target, theta))
    }

    /// Apply a controlled Z rotation.
    pub fn apply_crz(&mut self, control: usize, target: usize, theta: f64) -> Result<()> {
        self.apply_gate(Gate::Crz(control, target, theta))
    }

    /// Apply a controlled U3 gate.
    pub fn apply_cu3(
        &mut self,
        control: usize,
        target: usize,
        theta: f64,
        phi: f64,
        lambda: f64,
    ) -> Result<()> {
        self.apply_gate(Gate::Cu3(control, target, theta, phi, lambda))
    }

    // *** Three-qubit gates ***

    /// Apply a Toffoli (CCX) gate.
    pub fn apply_ccx(&mut self, control1: usize, control2: usize, target: usize) -> Result<()> {
        self.apply_gate(Gate::Ccx(control1, control2, target))
    }

    /// Apply a doubly-controlled Z gate.
    pub fn apply_ccz(&mut self, control1: usize, control2: usize, target: usize) -> Result<()> {
        self.apply_gate(Gate::Ccz(control1, control2, target))
    }

    /// Apply a Fredkin (CSWAP) gate.
    pub fn apply_cswap(&mut self, control: usize, target1: usize, target2: usize) -> Result<()> {
        self.apply_gate(Gate::CSwap(control, target1, target2))
    }

    // *** Meta operations ***

    /// Measure a qubit into a classical bit.
    pub fn apply_measure(&mut self, qubit: usize, cbit: usize) -> Result<()> {
        self.apply_gate(Gate::Measure { qubit, cbit })
    }

    /// Insert a scheduling barrier over the given qubits.
    pub fn apply_barrier(&mut self, qubits: &[usize]) -> Result<()> {
        self.apply_gate(Gate::Barrier(qubits.to_vec()))
    }

    /// Append a gate that only executes when `(creg & mask) == expected`.
    pub fn apply_conditioned(&mut self, gate: Gate, mask: u64, expected: u64) -> Result<()> {
        self.apply_gate(Gate::Conditioned {
            gate: Box::new(gate),
            mask,
            expected,
        })
    }

    /// Append a caller-supplied unitary over `qubits`. The matrix must be
    /// `2^k x 2^k` for `k = qubits.len()` and unitary within 1e-9; anything
    /// else is rejected here, before the gate enters the circuit.
    pub fn apply_custom(
        &mut self,
        name: impl Into<String>,
        matrix: Array2<Complex64>,
        qubits: &[usize],
    ) -> Result<()> {
        self.apply_gate(Gate::Custom {
            name: name.into(),
            matrix,
            qubits: qubits.to_vec(),
        })
    }

    /// Appends the gates of another circuit to this one. The other circuit
    /// must not be wider in either register.
    pub fn append(&mut self, other: &QuantumCircuit) -> Result<()> {
        for gate in &other.gates {
            self.apply_gate(gate.clone())?;
        }
        Ok(())
    }

    /// Creates a new circuit as the tensor product of `self` and `other`:
    /// the other circuit's qubits and classical bits are shifted past this
    /// circuit's registers.
    pub fn tensor(&self, other: &QuantumCircuit) -> Result<QuantumCircuit> {
        let mut combined =
            QuantumCircuit::new(self.num_qubits + other.num_qubits, self.num_cbits + other.num_cbits)?;
        for gate in &self.gates {
            combined.apply_gate(gate.clone())?;
        }
        for gate in &other.gates {
            let mut shifted = gate.shifted(self.num_qubits);
            shifted.shift_cbits(self.num_cbits);
            combined.apply_gate(shifted)?;
        }
        Ok(combined)
    }

    /// The inverse circuit: inverted gates in reverse order. Fails if any
    /// gate is non-unitary (measurement, reset, barrier, conditioning).
    pub fn inverted(&self) -> Result<QuantumCircuit> {
        let mut inv = QuantumCircuit::new(self.num_qubits, self.num_cbits)?;
        for gate in self.gates.iter().rev() {
            let inverse = gate
                .inverse()
                .ok_or_else(|| Error::NonUnitary(gate.name().to_string()))?;
            inv.apply_gate(inverse)?;
        }
        Ok(inv)
    }
}
