//! # OpenQASM 2.0 compiler and dense state-vector simulator
//!
//! This crate compiles OpenQASM 2.0 programs and executes them on a dense
//! state-vector engine with optional Kraus-operator noise and a gate-level
//! debugger.
//!
//! # Features
//!
//! * **Full OpenQASM 2.0 front end**: a lexer and recursive-descent parser
//!   with line/column diagnostics, user-defined gate inlining, parameter
//!   expressions, and the complete `qelib1.inc` gate set built in.
//! * **Typed circuit IR**: a closed gate sum type over a fixed qubit and
//!   classical-bit width, validated at insertion, with deterministic QASM
//!   and JSON emitters.
//! * **Algebraic optimizer**: inverse-pair cancellation, rotation merging,
//!   bounded commutation reordering, depth layering, and activity-based
//!   qubit remapping, all observationally equivalent by construction.
//! * **Dense simulation**: `2^n` complex amplitudes with 1/2/3-qubit and
//!   arbitrary-unitary application, measurement collapse, reset, bounded
//!   snapshot caching, and reproducible seeded randomness.
//! * **Noise and debugging**: stochastic Kraus channels (depolarizing,
//!   damping, Pauli mixtures, custom sets) and a step-wise debugger with
//!   gate, probability, and custom breakpoints.
//!
//! # Usage Examples
//!
//! ```rust
//! use statevector_simulator_rust::prelude::*;
//!
//! let circuit = qasm::parse_str(
//!     "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\nh q[0];\ncx q[0],q[1];",
//! )
//! .unwrap();
//!
//! let optimized = optimize(&circuit, 2).unwrap();
//! let state = QuantumState::from_circuit(&optimized).unwrap();
//! let probabilities = state.probabilities();
//! assert!((probabilities[0] - 0.5).abs() < 1e-9);
//! assert!((probabilities[3] - 0.5).abs() < 1e-9);
//! ```

pub mod circuit;
pub mod debugger;
pub mod error;
pub mod noise;
pub mod qasm;
pub mod state;
pub mod types;

pub use circuit::optimizer::optimize;

pub mod prelude {
    pub use crate::circuit::optimizer::{RemapOutcome, optimize};
    pub use crate::circuit::{Gate, GateNode, QuantumCircuit, RegisterLayout};
    pub use crate::debugger::{Breakpoint, Debugger};
    pub use crate::error::{Error, Result};
    pub use crate::noise::NoiseModel;
    pub use crate::qasm;
    pub use crate::state::{
        ExecutionOutcome, QuantumState, Simulator, SimulatorConfig, SnapshotCache,
    };
    pub use crate::types::{MAX_QUBITS, Pauli, PauliString, PauliTerm, ShotCount};
}

// Hide test_utils from the public documentation.
#[cfg(test)]
pub mod test_utils;
