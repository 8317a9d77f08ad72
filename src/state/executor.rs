//! Circuit execution.
//!
//! A [`Simulator`] owns the run configuration and the snapshot cache, and
//! drives frozen circuits against fresh [`QuantumState`]s: unitaries are
//! dispatched to the engine, measurements write the classical register,
//! conditioned gates consult it, and the optional noise model fires after
//! every unitary on each qubit it touched.

use log::debug;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::circuit::{Gate, QuantumCircuit};
use crate::error::{Error, Result};
use crate::noise::NoiseModel;
use crate::state::{QuantumState, SnapshotCache};
use crate::types::{MAX_QUBITS, ShotCount};

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Upper bound on accepted circuit widths, at most [`MAX_QUBITS`].
    pub max_qubits: usize,
    /// RNG seed; `None` seeds from system entropy. Two simulators with the
    /// same seed and the same sequence of calls produce identical results.
    pub seed: Option<u64>,
    /// Noise applied after every unitary gate, per touched qubit.
    pub noise: Option<NoiseModel>,
    /// Bound on the snapshot cache; the oldest entry is evicted first.
    pub cache_capacity: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_qubits: MAX_QUBITS,
            seed: None,
            noise: None,
            cache_capacity: 16,
        }
    }
}

/// The final state and classical register of one circuit execution.
#[derive(Debug)]
pub struct ExecutionOutcome {
    pub state: QuantumState,
    pub cbits: Vec<bool>,
}

impl ExecutionOutcome {
    /// The classical register packed into an integer, bit `i` holding
    /// classical bit `i`.
    pub fn cbits_value(&self) -> u64 {
        pack_cbits(&self.cbits)
    }
}

/// Executes circuits under one configuration.
///
/// ## Examples
///
/// ```rust
/// use statevector_simulator_rust::prelude::*;
///
/// let circuit = qasm::parse_str(
///     "qreg q[2]; creg c[2]; h q[0]; cx q[0],q[1]; measure q -> c;",
/// )
/// .unwrap();
///
/// let mut simulator = Simulator::new(SimulatorConfig {
///     seed: Some(42),
///     ..SimulatorConfig::default()
/// })
/// .unwrap();
/// let counts = simulator.sample(&circuit, 100).unwrap();
/// // The Bell state only ever reads 00 or 11.
/// assert!(counts.keys().all(|&k| k == 0b00 || k == 0b11));
/// ```
pub struct Simulator {
    config: SimulatorConfig,
    cache: SnapshotCache,
    rng: StdRng,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Result<Self> {
        if config.max_qubits == 0 || config.max_qubits > MAX_QUBITS {
            return Err(Error::InvalidNumQubits {
                got: config.max_qubits,
                max: MAX_QUBITS,
            });
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let cache = SnapshotCache::new(config.cache_capacity);
        Ok(Self { config, cache, rng })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Runs the circuit once from `|0…0>`.
    pub fn run(&mut self, circuit: &QuantumCircuit) -> Result<ExecutionOutcome> {
        if circuit.num_qubits > self.config.max_qubits {
            return Err(Error::InvalidNumQubits {
                got: circuit.num_qubits,
                max: self.config.max_qubits,
            });
        }
        debug!(
            "running {} gates on {} qubits / {} cbits",
            circuit.gate_count(),
            circuit.num_qubits,
            circuit.num_cbits
        );
        let mut state = QuantumState::seeded(circuit.num_qubits, self.rng.next_u64())?;
        let mut cbits = vec![false; circuit.num_cbits];
        for gate in &circuit.gates {
            execute_gate(&mut state, gate, &mut cbits, self.config.noise.as_ref())?;
        }
        Ok(ExecutionOutcome { state, cbits })
    }

    /// Runs `shots` independent trajectories and histograms the outcomes.
    ///
    /// Circuits with classical bits are keyed by the final classical
    /// register; circuits without any are measured in full at the end of
    /// each trajectory.
    pub fn sample(&mut self, circuit: &QuantumCircuit, shots: usize) -> Result<ShotCount> {
        let mut counts = ShotCount::new();
        for _ in 0..shots {
            let outcome = self.run(circuit)?;
            let key = if circuit.num_cbits > 0 {
                outcome.cbits_value()
            } else {
                let mut state = outcome.state;
                state.measure_all()?
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Copies the state's amplitudes into the cache under `label`.
    pub fn save_snapshot(&mut self, label: impl Into<String>, state: &QuantumState) {
        self.cache.save(label, state.snapshot());
    }

    /// Restores `state` from the cached snapshot under `label`. Fails when
    /// the label is unknown or the widths differ.
    pub fn load_snapshot(&self, label: &str, state: &mut QuantumState) -> Result<()> {
        let snapshot = self.cache.load(label)?;
        state.restore(snapshot)
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut SnapshotCache {
        &mut self.cache
    }
}

/// Applies one gate, updating the classical register as needed. Shared by
/// the simulator and the debugger so stepping and batch execution agree
/// exactly.
pub(crate) fn execute_gate(
    state: &mut QuantumState,
    gate: &Gate,
    cbits: &mut [bool],
    noise: Option<&NoiseModel>,
) -> Result<()> {
    match gate {
        Gate::Measure { qubit, cbit } => {
            let outcome = state.measure(*qubit)?;
            cbits[*cbit] = outcome;
            Ok(())
        }
        Gate::Conditioned {
            gate,
            mask,
            expected,
        } => {
            if pack_cbits(cbits) & mask == *expected {
                execute_gate(state, gate, cbits, noise)?;
            }
            Ok(())
        }
        Gate::Barrier(_) => Ok(()),
        Gate::Reset(qubit) => state.reset(*qubit),
        unitary => {
            state.apply_gate(unitary)?;
            if let Some(model) = noise {
                for qubit in unitary.qubits() {
                    model.apply_stochastic(state, qubit)?;
                }
            }
            Ok(())
        }
    }
}

pub(crate) fn pack_cbits(cbits: &[bool]) -> u64 {
    cbits
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, &bit)| acc | (u64::from(bit) << i))
}
