//! Dense state-vector engine.
//!
//! A [`QuantumState`] owns the `2^n` complex amplitudes of an `n`-qubit
//! register plus the engine's random number generator. Qubit 0 is the
//! least-significant bit of every basis-state index.
//!
//! Unitary application never renormalises; only measurement collapse,
//! reset, and Kraus application do. Extra renormalisation after unitaries
//! would mask norm-drift bugs instead of surfacing them.

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::circuit::gates::matrices;
use crate::circuit::{Gate, QuantumCircuit};
use crate::error::{Error, Result};
use crate::types::pauli::{Pauli, PauliString};
use crate::types::{MAX_QUBITS, ShotCount, UNDERFLOW_TOLERANCE, UNITARY_TOLERANCE};

pub mod cache;
pub mod density;
pub mod executor;

pub use cache::SnapshotCache;
pub use executor::{ExecutionOutcome, Simulator, SimulatorConfig};

/// Amplitude count above which single-qubit sweeps fan out across threads.
const PARALLEL_THRESHOLD: usize = 1 << 14;

/// A dense `2^n`-amplitude quantum state with an owned RNG.
///
/// Two states created with the same seed and driven through the same
/// operations produce identical outcomes.
#[derive(Debug)]
pub struct QuantumState {
    num_qubits: usize,
    amps: Vec<Complex64>,
    rng: StdRng,
}

impl QuantumState {
    /// Creates the state `|0…0>` with an entropy-seeded RNG.
    pub fn new(num_qubits: usize) -> Result<Self> {
        Self::with_rng(num_qubits, StdRng::from_entropy())
    }

    /// Creates the state `|0…0>` with a deterministic RNG.
    pub fn seeded(num_qubits: usize, seed: u64) -> Result<Self> {
        Self::with_rng(num_qubits, StdRng::seed_from_u64(seed))
    }

    fn with_rng(num_qubits: usize, rng: StdRng) -> Result<Self> {
        if num_qubits == 0 || num_qubits > MAX_QUBITS {
            return Err(Error::InvalidNumQubits {
                got: num_qubits,
                max: MAX_QUBITS,
            });
        }
        let mut amps = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        amps[0] = Complex64::new(1.0, 0.0);
        Ok(Self {
            num_qubits,
            amps,
            rng,
        })
    }

    /// Executes a circuit from `|0…0>` with default configuration and
    /// returns the final state. Measurement outcomes are discarded; use
    /// [`Simulator::run`] to keep the classical register.
    pub fn from_circuit(circuit: &QuantumCircuit) -> Result<Self> {
        Ok(Simulator::new(SimulatorConfig::default())?.run(circuit)?.state)
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of amplitudes, `2^n`.
    pub fn dim(&self) -> usize {
        self.amps.len()
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amps
    }

    /// The state vector as an `Array1<Complex64>`, for inspection and
    /// tests.
    pub fn to_statevector(&self) -> Array1<Complex64> {
        Array1::from(self.amps.clone())
    }

    /// `Σ|ψ_i|²`; 1.0 for a well-formed state up to numerical drift.
    pub fn norm_sqr(&self) -> f64 {
        self.amps.iter().map(|a| a.norm_sqr()).sum()
    }

    /// Per-basis-state probabilities `|ψ_i|²`.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amps.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Probability of reading `value` on `qubit`.
    pub fn probability(&self, qubit: usize, value: bool) -> Result<f64> {
        self.check_qubit(qubit)?;
        let mask = 1usize << qubit;
        let p1: f64 = self
            .amps
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum();
        Ok(if value { p1 } else { 1.0 - p1 })
    }

    /// Applies a unitary gate. Barriers are no-ops and resets collapse the
    /// qubit; measurements and classically-conditioned gates need the
    /// executor's classical register and are rejected here.
    pub fn apply_gate(&mut self, gate: &Gate) -> Result<()> {
        match gate {
            Gate::Barrier(_) => Ok(()),
            Gate::Reset(q) => self.reset(*q),
            Gate::Measure { .. } | Gate::Conditioned { .. } => {
                Err(Error::ClassicalContext(gate.name().to_string()))
            }
            Gate::Custom { matrix, qubits, .. } => self.apply_custom(qubits, matrix),
            unitary => {
                let qubits = unitary.qubits();
                let matrix = unitary
                    .matrix()
                    .ok_or_else(|| Error::ClassicalContext(unitary.name().to_string()))?;
                match qubits.as_slice() {
                    [q] => self.apply_single(*q, &matrix),
                    [a, b] => self.apply_two(*a, *b, &matrix),
                    [a, b, c] => self.apply_three(*a, *b, *c, &matrix),
                    _ => self.apply_custom(&qubits, &matrix),
                }
            }
        }
    }

    /// Applies a sequence of gates in order.
    pub fn apply_gates(&mut self, gates: &[Gate]) -> Result<()> {
        for gate in gates {
            self.apply_gate(gate)?;
        }
        Ok(())
    }

    /// Applies a 2x2 unitary to one qubit.
    ///
    /// State indices pair up as `(i, i | 1<<q)`; each pair transforms
    /// independently, so large sweeps run data-parallel over pair blocks.
    pub fn apply_single(&mut self, qubit: usize, u: &Array2<Complex64>) -> Result<()> {
        self.check_qubit(qubit)?;
        check_dim("apply_single", u, 2)?;
        let m = [[u[[0, 0]], u[[0, 1]]], [u[[1, 0]], u[[1, 1]]]];
        let stride = 1usize << qubit;
        let block_len = stride << 1;

        let transform = move |block: &mut [Complex64]| {
            for off in 0..stride {
                let a0 = block[off];
                let a1 = block[off + stride];
                block[off] = m[0][0] * a0 + m[0][1] * a1;
                block[off + stride] = m[1][0] * a0 + m[1][1] * a1;
            }
        };
        if self.amps.len() >= PARALLEL_THRESHOLD {
            self.amps.par_chunks_mut(block_len).for_each(transform);
        } else {
            self.amps.chunks_mut(block_len).for_each(transform);
        }
        Ok(())
    }

    /// Applies a 4x4 unitary to two qubits. The first qubit argument is
    /// the least-significant sub-index of the matrix.
    pub fn apply_two(&mut self, q1: usize, q2: usize, u: &Array2<Complex64>) -> Result<()> {
        self.check_qubit(q1)?;
        self.check_qubit(q2)?;
        if q1 == q2 {
            return Err(Error::DuplicateQubit(q1));
        }
        check_dim("apply_two", u, 4)?;

        let m0 = 1usize << q1;
        let m1 = 1usize << q2;
        let mask = m0 | m1;
        for base in 0..self.amps.len() {
            if base & mask != 0 {
                continue;
            }
            let idx = [base, base | m0, base | m1, base | mask];
            let v = [
                self.amps[idx[0]],
                self.amps[idx[1]],
                self.amps[idx[2]],
                self.amps[idx[3]],
            ];
            for (r, &i) in idx.iter().enumerate() {
                self.amps[i] =
                    u[[r, 0]] * v[0] + u[[r, 1]] * v[1] + u[[r, 2]] * v[2] + u[[r, 3]] * v[3];
            }
        }
        Ok(())
    }

    /// Applies an 8x8 unitary to three qubits; qubit argument order maps to
    /// sub-index bits exactly as in [`apply_two`].
    pub fn apply_three(
        &mut self,
        q1: usize,
        q2: usize,
        q3: usize,
        u: &Array2<Complex64>,
    ) -> Result<()> {
        for &q in &[q1, q2, q3] {
            self.check_qubit(q)?;
        }
        if q1 == q2 || q1 == q3 || q2 == q3 {
            return Err(Error::DuplicateQubit(q2));
        }
        check_dim("apply_three", u, 8)?;

        let bits = [1usize << q1, 1usize << q2, 1usize << q3];
        let mask = bits[0] | bits[1] | bits[2];
        let mut v = [Complex64::new(0.0, 0.0); 8];
        for base in 0..self.amps.len() {
            if base & mask != 0 {
                continue;
            }
            let mut idx = [0usize; 8];
            for (g, slot) in idx.iter_mut().enumerate() {
                let mut i = base;
                for (bit, &m) in bits.iter().enumerate() {
                    if g >> bit & 1 == 1 {
                        i |= m;
                    }
                }
                *slot = i;
            }
            for (g, &i) in idx.iter().enumerate() {
                v[g] = self.amps[i];
            }
            for (r, &i) in idx.iter().enumerate() {
                let mut acc = Complex64::new(0.0, 0.0);
                for (c, &value) in v.iter().enumerate() {
                    acc += u[[r, c]] * value;
                }
                self.amps[i] = acc;
            }
        }
        Ok(())
    }

    /// Applies an arbitrary `2^k x 2^k` unitary to `k` qubits. The matrix
    /// is unitarity-checked on every call; prefer the fixed-arity entry
    /// points for gates from the closed set.
    pub fn apply_custom(&mut self, qubits: &[usize], u: &Array2<Complex64>) -> Result<()> {
        for &q in qubits {
            self.check_qubit(q)?;
        }
        for (i, &q) in qubits.iter().enumerate() {
            if qubits[..i].contains(&q) {
                return Err(Error::DuplicateQubit(q));
            }
        }
        let k = qubits.len();
        check_dim("apply_custom", u, 1 << k)?;
        if !matrices::is_unitary(u, UNITARY_TOLERANCE) {
            return Err(Error::NonUnitary("apply_custom".to_string()));
        }

        let bits: Vec<usize> = qubits.iter().map(|&q| 1usize << q).collect();
        let mask: usize = bits.iter().sum();
        let side = 1usize << k;
        let mut idx = vec![0usize; side];
        let mut v = vec![Complex64::new(0.0, 0.0); side];
        for base in 0..self.amps.len() {
            if base & mask != 0 {
                continue;
            }
            for (g, slot) in idx.iter_mut().enumerate() {
                let mut i = base;
                for (bit, &m) in bits.iter().enumerate() {
                    if g >> bit & 1 == 1 {
                        i |= m;
                    }
                }
                *slot = i;
            }
            for (g, &i) in idx.iter().enumerate() {
                v[g] = self.amps[i];
            }
            for (r, &i) in idx.iter().enumerate() {
                let mut acc = Complex64::new(0.0, 0.0);
                for (c, &value) in v.iter().enumerate() {
                    acc += u[[r, c]] * value;
                }
                self.amps[i] = acc;
            }
        }
        Ok(())
    }

    /// Measures one qubit in the computational basis, collapsing and
    /// renormalising the state.
    ///
    /// ## Returns
    /// `false` for `|0>`, `true` for `|1>`. Fails with
    /// [`Error::MeasurementUnderflow`] if the drawn outcome has probability
    /// below 1e-12, which cannot happen in a well-posed program.
    pub fn measure(&mut self, qubit: usize) -> Result<bool> {
        self.check_qubit(qubit)?;
        let mask = 1usize << qubit;
        let p1: f64 = self
            .amps
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum();

        let outcome = self.rng.gen_range(0.0..1.0) < p1;
        let p_outcome = if outcome { p1 } else { 1.0 - p1 };
        if p_outcome < UNDERFLOW_TOLERANCE {
            return Err(Error::MeasurementUnderflow {
                qubit,
                probability: p_outcome,
            });
        }

        let scale = 1.0 / p_outcome.sqrt();
        for (i, amp) in self.amps.iter_mut().enumerate() {
            if (i & mask != 0) != outcome {
                *amp = Complex64::new(0.0, 0.0);
            } else {
                *amp *= scale;
            }
        }
        Ok(outcome)
    }

    /// Measures every qubit, least-significant first, and packs the
    /// outcomes into a basis-state index.
    pub fn measure_all(&mut self) -> Result<u64> {
        let mut key = 0u64;
        for q in 0..self.num_qubits {
            if self.measure(q)? {
                key |= 1 << q;
            }
        }
        Ok(key)
    }

    /// Forces the qubit to `|0>`: zeroes the `bit = 1` amplitudes and
    /// renormalises, or relocates the `bit = 1` branch when the qubit was
    /// certainly `|1>`. Equivalent to measure-then-conditional-X with the
    /// outcome discarded.
    pub fn reset(&mut self, qubit: usize) -> Result<()> {
        self.check_qubit(qubit)?;
        let mask = 1usize << qubit;
        let p0 = self.probability(qubit, false)?;

        if p0 >= UNDERFLOW_TOLERANCE {
            let scale = 1.0 / p0.sqrt();
            for (i, amp) in self.amps.iter_mut().enumerate() {
                if i & mask != 0 {
                    *amp = Complex64::new(0.0, 0.0);
                } else {
                    *amp *= scale;
                }
            }
        } else {
            let scale = 1.0 / (1.0 - p0).sqrt();
            for i in 0..self.amps.len() {
                if i & mask == 0 {
                    self.amps[i] = self.amps[i | mask] * scale;
                    self.amps[i | mask] = Complex64::new(0.0, 0.0);
                }
            }
        }
        Ok(())
    }

    /// An independent copy of the amplitudes, suitable for the snapshot
    /// cache.
    pub fn snapshot(&self) -> Vec<Complex64> {
        self.amps.clone()
    }

    /// Replaces the amplitudes from a snapshot of equal width.
    pub fn restore(&mut self, snapshot: &[Complex64]) -> Result<()> {
        if snapshot.len() != self.amps.len() {
            return Err(Error::WidthMismatch {
                expected: self.num_qubits,
                got: snapshot.len().trailing_zeros() as usize,
            });
        }
        self.amps.copy_from_slice(snapshot);
        Ok(())
    }

    /// The inner product `<self|other>`.
    pub fn inner_product(&self, other: &QuantumState) -> Result<Complex64> {
        if other.dim() != self.dim() {
            return Err(Error::WidthMismatch {
                expected: self.num_qubits,
                got: other.num_qubits,
            });
        }
        Ok(self
            .amps
            .iter()
            .zip(other.amps.iter())
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    /// Expectation value `<ψ|P|ψ>` of a Pauli-string observable.
    ///
    /// ## Examples
    /// ```rust
    /// use statevector_simulator_rust::prelude::*;
    /// use std::str::FromStr;
    ///
    /// let mut circuit = QuantumCircuit::new(2, 0).unwrap();
    /// circuit.apply_h(0).unwrap();
    /// circuit.apply_cx(0, 1).unwrap();
    /// let state = QuantumState::from_circuit(&circuit).unwrap();
    ///
    /// let zz = PauliString::from_str("ZZ").unwrap();
    /// assert!((state.expectation_value(&zz).unwrap() - 1.0).abs() < 1e-9);
    /// ```
    pub fn expectation_value(&self, observable: &PauliString) -> Result<f64> {
        let terms = observable.terms(self.num_qubits)?;
        let mut flip = 0usize;
        let mut ymask = 0usize;
        let mut zmask = 0usize;
        for term in &terms {
            let bit = 1usize << term.qubit;
            match term.op {
                Pauli::X => flip |= bit,
                Pauli::Y => {
                    flip |= bit;
                    ymask |= bit;
                }
                Pauli::Z => zmask |= bit,
                Pauli::I => {}
            }
        }

        // P|i> = λ(i) |i ^ flip> with λ(i) = i^{|Y|} (-1)^{set Y bits}
        // (-1)^{set Z bits}, from Y|0> = i|1>, Y|1> = -i|0>, Z|b> = (-1)^b|b>.
        let y_front = match ymask.count_ones() % 4 {
            0 => Complex64::new(1.0, 0.0),
            1 => Complex64::new(0.0, 1.0),
            2 => Complex64::new(-1.0, 0.0),
            _ => Complex64::new(0.0, -1.0),
        };
        let mut acc = Complex64::new(0.0, 0.0);
        for i in 0..self.amps.len() {
            let sign_bits = (i & ymask).count_ones() + (i & zmask).count_ones();
            let sign = if sign_bits % 2 == 1 { -1.0 } else { 1.0 };
            acc += self.amps[i ^ flip].conj() * y_front * sign * self.amps[i];
        }
        Ok(acc.re)
    }

    /// Samples measurement outcomes for the given qubits without collapsing
    /// the state.
    ///
    /// ## Arguments
    /// * `qargs` - Qubits to read; bit `j` of each outcome key is the value
    ///   of `qargs[j]`.
    /// * `shots` - Number of samples to draw.
    /// * `seed` - Optional RNG seed for reproducibility; `None` draws the
    ///   seed from system entropy.
    pub fn sample(&self, qargs: &[usize], shots: usize, seed: Option<u64>) -> Result<ShotCount> {
        for &q in qargs {
            self.check_qubit(q)?;
        }
        for (i, &q) in qargs.iter().enumerate() {
            if qargs[..i].contains(&q) {
                return Err(Error::DuplicateQubit(q));
            }
        }
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let mut cumulative = Vec::with_capacity(self.amps.len());
        let mut total = 0.0;
        for amp in &self.amps {
            total += amp.norm_sqr();
            cumulative.push(total);
        }

        let mut counts = ShotCount::new();
        for _ in 0..shots {
            let r = rng.gen_range(0.0..total);
            let index = cumulative.partition_point(|&p| p <= r);
            let mut key = 0u64;
            for (j, &q) in qargs.iter().enumerate() {
                if index >> q & 1 == 1 {
                    key |= 1 << j;
                }
            }
            *counts.entry(key).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Rescales the amplitudes to unit norm. Used after collapse and Kraus
    /// application only.
    pub(crate) fn renormalize(&mut self) {
        let norm = self.norm_sqr().sqrt();
        if norm > 0.0 {
            let scale = 1.0 / norm;
            for amp in &mut self.amps {
                *amp *= scale;
            }
        }
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    fn check_qubit(&self, qubit: usize) -> Result<()> {
        if qubit >= self.num_qubits {
            return Err(Error::QubitIndexOutOfBounds(qubit, self.num_qubits));
        }
        Ok(())
    }
}

fn check_dim(name: &str, u: &Array2<Complex64>, expected: usize) -> Result<()> {
    if u.nrows() != expected || u.ncols() != expected {
        return Err(Error::DimensionMismatch {
            name: name.to_string(),
            expected,
            rows: u.nrows(),
            cols: u.ncols(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::gates::matrices;
    use crate::test_utils::assert_eq_complex;

    #[test]
    fn initial_state_is_all_zeros() {
        let state = QuantumState::seeded(3, 1).unwrap();
        assert_eq!(state.dim(), 8);
        assert_eq_complex(state.amplitudes()[0], Complex64::new(1.0, 0.0));
        assert!((state.norm_sqr() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hadamard_splits_the_amplitude() {
        let mut state = QuantumState::seeded(1, 1).unwrap();
        state.apply_single(0, &matrices::H).unwrap();
        let inv_sqrt2 = Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);
        assert_eq_complex(state.amplitudes()[0], inv_sqrt2);
        assert_eq_complex(state.amplitudes()[1], inv_sqrt2);
    }

    #[test]
    fn cnot_respects_the_bit_ordering() {
        // |q1 q0> = |01| after X on qubit 0; CX(0, 1) must give |11>.
        let mut state = QuantumState::seeded(2, 1).unwrap();
        state.apply_single(0, &matrices::X).unwrap();
        state.apply_two(0, 1, &matrices::CX).unwrap();
        assert_eq_complex(state.amplitudes()[3], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn cnot_with_unset_control_is_identity() {
        let mut state = QuantumState::seeded(2, 1).unwrap();
        state.apply_single(1, &matrices::X).unwrap(); // target=1 is the high bit
        state.apply_two(0, 1, &matrices::CX).unwrap();
        assert_eq_complex(state.amplitudes()[2], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn toffoli_needs_both_controls() {
        let mut state = QuantumState::seeded(3, 1).unwrap();
        state.apply_single(0, &matrices::X).unwrap();
        state.apply_single(1, &matrices::X).unwrap();
        state.apply_three(0, 1, 2, &matrices::CCX).unwrap();
        // |111> is index 7.
        assert_eq_complex(state.amplitudes()[7], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn measurement_collapses_and_renormalises() {
        let mut state = QuantumState::seeded(1, 7).unwrap();
        state.apply_single(0, &matrices::H).unwrap();
        let outcome = state.measure(0).unwrap();
        let expected = if outcome { 1 } else { 0 };
        assert_eq_complex(state.amplitudes()[expected], Complex64::new(1.0, 0.0));
        assert!((state.norm_sqr() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn measurement_is_reproducible_per_seed() {
        let run = |seed: u64| {
            let mut state = QuantumState::seeded(4, seed).unwrap();
            for q in 0..4 {
                state.apply_single(q, &matrices::H).unwrap();
            }
            state.measure_all().unwrap()
        };
        assert_eq!(run(99), run(99));
    }

    #[test]
    fn deterministic_measurement_of_one_state() {
        let mut state = QuantumState::seeded(1, 3).unwrap();
        state.apply_single(0, &matrices::X).unwrap();
        assert!(state.measure(0).unwrap());
    }

    #[test]
    fn reset_handles_both_branches() {
        let mut state = QuantumState::seeded(1, 5).unwrap();
        state.apply_single(0, &matrices::H).unwrap();
        state.reset(0).unwrap();
        assert_eq_complex(state.amplitudes()[0], Complex64::new(1.0, 0.0));

        // Pure |1> state: the amplitude has to migrate, not vanish.
        let mut state = QuantumState::seeded(1, 5).unwrap();
        state.apply_single(0, &matrices::X).unwrap();
        state.reset(0).unwrap();
        assert_eq_complex(state.amplitudes()[0], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn snapshot_round_trips() {
        let mut state = QuantumState::seeded(2, 11).unwrap();
        state.apply_single(0, &matrices::H).unwrap();
        let saved = state.snapshot();
        state.apply_single(1, &matrices::X).unwrap();
        state.restore(&saved).unwrap();
        assert_eq!(state.snapshot(), saved);
    }

    #[test]
    fn restore_rejects_width_mismatch() {
        let mut state = QuantumState::seeded(2, 1).unwrap();
        let narrow = vec![Complex64::new(1.0, 0.0); 2];
        assert!(matches!(
            state.restore(&narrow),
            Err(Error::WidthMismatch { .. })
        ));
    }

    #[test]
    fn custom_application_rejects_non_unitary() {
        let mut state = QuantumState::seeded(1, 1).unwrap();
        let bogus = Array2::from_elem((2, 2), Complex64::new(0.7, 0.0));
        assert!(matches!(
            state.apply_custom(&[0], &bogus),
            Err(Error::NonUnitary(_))
        ));
    }

    #[test]
    fn bell_state_pauli_expectations() {
        use std::str::FromStr;
        let mut state = QuantumState::seeded(2, 2).unwrap();
        state.apply_gate(&Gate::H(0)).unwrap();
        state.apply_gate(&Gate::Cx(0, 1)).unwrap();

        for (observable, expected) in [("ZZ", 1.0), ("XX", 1.0), ("ZI", 0.0), ("IZ", 0.0)] {
            let p = PauliString::from_str(observable).unwrap();
            let value = state.expectation_value(&p).unwrap();
            assert!(
                (value - expected).abs() < 1e-9,
                "<{}> = {}, expected {}",
                observable,
                value,
                expected
            );
        }
        // Sparse form agrees with dense.
        let sparse = PauliString::from_str("Z0 Z1").unwrap();
        assert!((state.expectation_value(&sparse).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn plus_state_y_expectation_vanishes() {
        use std::str::FromStr;
        let mut state = QuantumState::seeded(1, 2).unwrap();
        state.apply_single(0, &matrices::H).unwrap();
        let y = PauliString::from_str("Y").unwrap();
        assert!(state.expectation_value(&y).unwrap().abs() < 1e-12);
    }

    #[test]
    fn inner_product_matches_overlap() {
        let mut plus = QuantumState::seeded(1, 1).unwrap();
        plus.apply_single(0, &matrices::H).unwrap();
        let mut one = QuantumState::seeded(1, 1).unwrap();
        one.apply_single(0, &matrices::X).unwrap();

        let overlap = plus.inner_product(&one).unwrap();
        assert!((overlap.re - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
        assert!(overlap.im.abs() < 1e-12);

        let narrow = QuantumState::seeded(1, 1).unwrap();
        let wide = QuantumState::seeded(2, 1).unwrap();
        assert!(narrow.inner_product(&wide).is_err());
    }

    #[test]
    fn sampling_leaves_the_state_untouched() {
        let mut state = QuantumState::seeded(2, 6).unwrap();
        state.apply_single(0, &matrices::H).unwrap();
        state.apply_two(0, 1, &matrices::CX).unwrap();
        let before = state.snapshot();

        let counts = state.sample(&[0, 1], 500, Some(9)).unwrap();
        assert_eq!(state.snapshot(), before);
        assert_eq!(counts.values().sum::<usize>(), 500);
        assert!(counts.keys().all(|&k| k == 0b00 || k == 0b11));
        // Deterministic for a fixed seed.
        assert_eq!(counts, state.sample(&[0, 1], 500, Some(9)).unwrap());
    }

    #[test]
    fn gate_and_matrix_paths_agree() {
        let mut a = QuantumState::seeded(2, 21).unwrap();
        let mut b = QuantumState::seeded(2, 21).unwrap();
        a.apply_gate(&Gate::H(0)).unwrap();
        a.apply_gate(&Gate::Cx(0, 1)).unwrap();
        b.apply_single(0, &matrices::H).unwrap();
        b.apply_two(0, 1, &matrices::CX).unwrap();
        assert_eq!(a.snapshot(), b.snapshot());
    }
}
