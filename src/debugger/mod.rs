//! Gate-level debugger.
//!
//! Wraps a borrowed circuit and an owned state, executing one gate at a
//! time through the same dispatch as the batch executor. Breakpoints are
//! evaluated after every step in registration order; `continue` stops at
//! the first satisfied predicate, while a fresh `step` always advances.

use std::fmt;

use itertools::Itertools;

use crate::circuit::{Gate, QuantumCircuit};
use crate::error::Result;
use crate::state::executor::execute_gate;
use crate::state::{QuantumState, density};
use crate::types::outcome_bitstring;

pub enum Breakpoint {
    /// Stop when the gate at this index is about to execute.
    Gate(usize),
    /// Stop when `P(qubit = 1)` reaches the threshold.
    StateProbability { qubit: usize, threshold: f64 },
    /// Stop when the predicate holds on the current state.
    Custom {
        predicate: Box<dyn Fn(&QuantumState) -> bool>,
        description: String,
    },
}

impl Breakpoint {
    pub fn describe(&self) -> String {
        match self {
            Breakpoint::Gate(index) => format!("gate #{}", index),
            Breakpoint::StateProbability { qubit, threshold } => {
                format!("P(q{} = 1) >= {}", qubit, threshold)
            }
            Breakpoint::Custom { description, .. } => description.clone(),
        }
    }
}

impl fmt::Debug for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Breakpoint({})", self.describe())
    }
}

#[derive(Debug)]
pub struct Debugger<'a> {
    circuit: &'a QuantumCircuit,
    state: QuantumState,
    cbits: Vec<bool>,
    pc: usize,
    breakpoints: Vec<(usize, Breakpoint)>,
    next_breakpoint_id: usize,
    seed: Option<u64>,
}

impl<'a> Debugger<'a> {
    /// Wraps a circuit with a fresh `|0…0>` state and an entropy-seeded
    /// RNG.
    pub fn new(circuit: &'a QuantumCircuit) -> Result<Self> {
        Self::build(circuit, None)
    }

    /// Deterministic variant: measurements during stepping replay
    /// identically after [`Debugger::reset`].
    pub fn seeded(circuit: &'a QuantumCircuit, seed: u64) -> Result<Self> {
        Self::build(circuit, Some(seed))
    }

    fn build(circuit: &'a QuantumCircuit, seed: Option<u64>) -> Result<Self> {
        let state = match seed {
            Some(s) => QuantumState::seeded(circuit.num_qubits, s)?,
            None => QuantumState::new(circuit.num_qubits)?,
        };
        Ok(Self {
            circuit,
            state,
            cbits: vec![false; circuit.num_cbits],
            pc: 0,
            breakpoints: Vec::new(),
            next_breakpoint_id: 0,
            seed,
        })
    }

    pub fn state(&self) -> &QuantumState {
        &self.state
    }

    pub fn cbits(&self) -> &[bool] {
        &self.cbits
    }

    /// Index of the next gate to execute.
    pub fn current_index(&self) -> usize {
        self.pc
    }

    pub fn finished(&self) -> bool {
        self.pc >= self.circuit.gates.len()
    }

    /// Executes the gate at the current index and advances. Returns the
    /// gate that ran, or `None` at the end of the circuit. Breakpoints do
    /// not stop an explicit step.
    pub fn step(&mut self) -> Result<Option<&'a Gate>> {
        if self.finished() {
            return Ok(None);
        }
        let gate = &self.circuit.gates[self.pc];
        execute_gate(&mut self.state, gate, &mut self.cbits, None)?;
        self.pc += 1;
        Ok(Some(gate))
    }

    /// Steps until a breakpoint fires or the circuit ends.
    ///
    /// ## Returns
    /// The id of the breakpoint that stopped execution, or `None` when the
    /// end of the circuit was reached.
    pub fn continue_run(&mut self) -> Result<Option<usize>> {
        while !self.finished() {
            self.step()?;
            if let Some(id) = self.first_hit() {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Returns execution to gate 0 with a fresh `|0…0>` state. A seeded
    /// debugger replays the identical trajectory; breakpoints survive.
    pub fn reset(&mut self) -> Result<()> {
        self.state = match self.seed {
            Some(s) => QuantumState::seeded(self.circuit.num_qubits, s)?,
            None => QuantumState::new(self.circuit.num_qubits)?,
        };
        self.cbits = vec![false; self.circuit.num_cbits];
        self.pc = 0;
        Ok(())
    }

    pub fn add_gate_breakpoint(&mut self, index: usize) -> usize {
        self.add_breakpoint(Breakpoint::Gate(index))
    }

    pub fn add_probability_breakpoint(&mut self, qubit: usize, threshold: f64) -> usize {
        self.add_breakpoint(Breakpoint::StateProbability { qubit, threshold })
    }

    pub fn add_custom_breakpoint(
        &mut self,
        predicate: impl Fn(&QuantumState) -> bool + 'static,
        description: impl Into<String>,
    ) -> usize {
        self.add_breakpoint(Breakpoint::Custom {
            predicate: Box::new(predicate),
            description: description.into(),
        })
    }

    fn add_breakpoint(&mut self, breakpoint: Breakpoint) -> usize {
        let id = self.next_breakpoint_id;
        self.next_breakpoint_id += 1;
        self.breakpoints.push((id, breakpoint));
        id
    }

    pub fn remove_breakpoint(&mut self, id: usize) -> bool {
        let before = self.breakpoints.len();
        self.breakpoints.retain(|(existing, _)| *existing != id);
        self.breakpoints.len() != before
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    /// `(id, description)` of every registered breakpoint, in registration
    /// order.
    pub fn breakpoints(&self) -> Vec<(usize, String)> {
        self.breakpoints
            .iter()
            .map(|(id, bp)| (*id, bp.describe()))
            .collect()
    }

    fn first_hit(&self) -> Option<usize> {
        for (id, breakpoint) in &self.breakpoints {
            let hit = match breakpoint {
                Breakpoint::Gate(index) => *index == self.pc,
                Breakpoint::StateProbability { qubit, threshold } => self
                    .state
                    .probability(*qubit, true)
                    .map(|p| p >= *threshold)
                    .unwrap_or(false),
                Breakpoint::Custom { predicate, .. } => predicate(&self.state),
            };
            if hit {
                return Some(*id);
            }
        }
        None
    }

    /// `|ψ_i|²` for every basis state.
    pub fn state_probabilities(&self) -> Vec<f64> {
        self.state.probabilities()
    }

    /// Probability of reading `value` on one qubit.
    pub fn qubit_probability(&self, qubit: usize, value: bool) -> Result<f64> {
        self.state.probability(qubit, value)
    }

    /// Wootters concurrence between two qubits of the current state.
    pub fn entanglement(&self, q1: usize, q2: usize) -> Result<f64> {
        density::concurrence(&self.state, q1, q2)
    }

    /// Human-readable summary: position, norm, classical register, and the
    /// most likely basis states.
    pub fn state_info(&self) -> String {
        let n = self.circuit.num_qubits;
        let mut lines = vec![format!(
            "{} qubits, gate {}/{}, norm {:.9}",
            n,
            self.pc,
            self.circuit.gates.len(),
            self.state.norm_sqr().sqrt()
        )];
        if !self.cbits.is_empty() {
            let bits: String = self
                .cbits
                .iter()
                .rev()
                .map(|&b| if b { '1' } else { '0' })
                .collect();
            lines.push(format!("cbits: {}", bits));
        }
        let top = self
            .state
            .probabilities()
            .into_iter()
            .enumerate()
            .filter(|(_, p)| *p > 1e-12)
            .sorted_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal))
            .take(4);
        for (index, p) in top {
            lines.push(format!(
                "  |{}>  p = {:.6}",
                outcome_bitstring(index as u64, n),
                p
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bell() -> QuantumCircuit {
        let mut c = QuantumCircuit::new(2, 0).unwrap();
        c.apply_h(0).unwrap();
        c.apply_cx(0, 1).unwrap();
        c
    }

    #[test]
    fn step_walks_the_circuit_in_order() {
        let circuit = bell();
        let mut dbg = Debugger::seeded(&circuit, 1).unwrap();
        assert_eq!(dbg.current_index(), 0);
        assert!(dbg.step().unwrap().is_some());
        assert_eq!(dbg.current_index(), 1);
        assert!(dbg.step().unwrap().is_some());
        assert!(dbg.finished());
        assert!(dbg.step().unwrap().is_none());
        assert!((dbg.entanglement(0, 1).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn gate_breakpoint_stops_before_its_gate() {
        let circuit = bell();
        let mut dbg = Debugger::seeded(&circuit, 1).unwrap();
        let id = dbg.add_gate_breakpoint(1);
        assert_eq!(dbg.continue_run().unwrap(), Some(id));
        assert_eq!(dbg.current_index(), 1);
        // Resuming runs to the end.
        assert_eq!(dbg.continue_run().unwrap(), None);
        assert!(dbg.finished());
    }

    #[test]
    fn probability_breakpoint_fires_when_threshold_reached() {
        let mut circuit = QuantumCircuit::new(1, 0).unwrap();
        circuit.apply_h(0).unwrap();
        circuit.apply_h(0).unwrap();
        circuit.apply_x(0).unwrap();
        let mut dbg = Debugger::seeded(&circuit, 1).unwrap();
        let id = dbg.add_probability_breakpoint(0, 0.9);
        assert_eq!(dbg.continue_run().unwrap(), Some(id));
        // H leaves P(1) = 0.5; only the final X pushes it to 1.
        assert_eq!(dbg.current_index(), 3);
    }

    #[test]
    fn custom_breakpoints_and_removal() {
        let circuit = bell();
        let mut dbg = Debugger::seeded(&circuit, 1).unwrap();
        let id = dbg.add_custom_breakpoint(
            |state| state.probability(1, true).map(|p| p > 0.4).unwrap_or(false),
            "target entangled",
        );
        assert_eq!(dbg.continue_run().unwrap(), Some(id));
        assert!(dbg.remove_breakpoint(id));
        assert!(!dbg.remove_breakpoint(id));
        dbg.reset().unwrap();
        assert_eq!(dbg.continue_run().unwrap(), None);
    }

    #[test]
    fn reset_replays_seeded_measurements() {
        let mut circuit = QuantumCircuit::new(1, 1).unwrap();
        circuit.apply_h(0).unwrap();
        circuit.apply_measure(0, 0).unwrap();
        let mut dbg = Debugger::seeded(&circuit, 42).unwrap();
        dbg.continue_run().unwrap();
        let first = dbg.cbits().to_vec();
        dbg.reset().unwrap();
        dbg.continue_run().unwrap();
        assert_eq!(dbg.cbits(), first.as_slice());
    }

    #[test]
    fn state_info_reports_position_and_peaks() {
        let circuit = bell();
        let mut dbg = Debugger::seeded(&circuit, 1).unwrap();
        dbg.continue_run().unwrap();
        let info = dbg.state_info();
        assert!(info.contains("gate 2/2"));
        assert!(info.contains("|00>"));
        assert!(info.contains("|11>"));
    }
}
