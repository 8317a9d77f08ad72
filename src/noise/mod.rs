//! Kraus-operator noise channels.
//!
//! Every model expands to a set of single-qubit Kraus operators satisfying
//! `Σ K†K = I`. On a pure state vector the channel is applied
//! stochastically: operator `K_i` is selected with probability
//! `||K_i|ψ>||²` and the state renormalised, which keeps each trajectory
//! pure; ensemble expectations emerge by averaging over shots.

use ndarray::{Array2, arr2};
use num_complex::Complex64;
use rand::Rng;

use crate::circuit::gates::matrices::{self, c64};
use crate::error::{Error, Result};
use crate::state::QuantumState;
use crate::types::UNITARY_TOLERANCE;

#[derive(Debug, Clone, PartialEq)]
pub enum NoiseModel {
    /// Uniform Pauli error with total probability `p`.
    Depolarizing(f64),
    /// Energy relaxation towards `|0>` with rate `γ`.
    AmplitudeDamping(f64),
    /// Pure dephasing with rate `λ`.
    PhaseDamping(f64),
    /// X error with probability `p`.
    BitFlip(f64),
    /// Z error with probability `p`.
    PhaseFlip(f64),
    /// Y error with probability `p`.
    BitPhaseFlip(f64),
    /// Independent X/Y/Z error probabilities.
    PauliChannel(f64, f64, f64),
    /// Caller-supplied Kraus set.
    Kraus(Vec<Array2<Complex64>>),
}

impl NoiseModel {
    pub fn depolarizing(p: f64) -> Result<Self> {
        check_probability("p", p)?;
        Ok(NoiseModel::Depolarizing(p))
    }

    pub fn amplitude_damping(gamma: f64) -> Result<Self> {
        check_probability("gamma", gamma)?;
        Ok(NoiseModel::AmplitudeDamping(gamma))
    }

    pub fn phase_damping(lambda: f64) -> Result<Self> {
        check_probability("lambda", lambda)?;
        Ok(NoiseModel::PhaseDamping(lambda))
    }

    pub fn bit_flip(p: f64) -> Result<Self> {
        check_probability("p", p)?;
        Ok(NoiseModel::BitFlip(p))
    }

    pub fn phase_flip(p: f64) -> Result<Self> {
        check_probability("p", p)?;
        Ok(NoiseModel::PhaseFlip(p))
    }

    pub fn bit_phase_flip(p: f64) -> Result<Self> {
        check_probability("p", p)?;
        Ok(NoiseModel::BitPhaseFlip(p))
    }

    pub fn pauli_channel(px: f64, py: f64, pz: f64) -> Result<Self> {
        check_probability("px", px)?;
        check_probability("py", py)?;
        check_probability("pz", pz)?;
        check_probability("px + py + pz", px + py + pz)?;
        Ok(NoiseModel::PauliChannel(px, py, pz))
    }

    /// Validates completeness of a caller-supplied Kraus set: each operator
    /// 2x2 and `Σ K†K = I` within 1e-9.
    pub fn kraus(operators: Vec<Array2<Complex64>>) -> Result<Self> {
        for op in &operators {
            if op.nrows() != 2 || op.ncols() != 2 {
                return Err(Error::DimensionMismatch {
                    name: "kraus".to_string(),
                    expected: 2,
                    rows: op.nrows(),
                    cols: op.ncols(),
                });
            }
        }
        let deviation = completeness_deviation(&operators);
        if deviation > UNITARY_TOLERANCE {
            return Err(Error::KrausCompleteness(deviation));
        }
        Ok(NoiseModel::Kraus(operators))
    }

    /// The Kraus operators of the channel.
    pub fn kraus_operators(&self) -> Vec<Array2<Complex64>> {
        match self {
            NoiseModel::Depolarizing(p) => {
                let keep = (1.0 - p).sqrt();
                let flip = (p / 3.0).sqrt();
                vec![
                    scaled(&matrices::identity(2), keep),
                    scaled(&matrices::X, flip),
                    scaled(&matrices::Y, flip),
                    scaled(&matrices::Z, flip),
                ]
            }
            NoiseModel::AmplitudeDamping(gamma) => vec![
                arr2(&[
                    [c64(1.0, 0.0), c64(0.0, 0.0)],
                    [c64(0.0, 0.0), c64((1.0 - gamma).sqrt(), 0.0)],
                ]),
                arr2(&[
                    [c64(0.0, 0.0), c64(gamma.sqrt(), 0.0)],
                    [c64(0.0, 0.0), c64(0.0, 0.0)],
                ]),
            ],
            NoiseModel::PhaseDamping(lambda) => vec![
                arr2(&[
                    [c64(1.0, 0.0), c64(0.0, 0.0)],
                    [c64(0.0, 0.0), c64((1.0 - lambda).sqrt(), 0.0)],
                ]),
                arr2(&[
                    [c64(0.0, 0.0), c64(0.0, 0.0)],
                    [c64(0.0, 0.0), c64(lambda.sqrt(), 0.0)],
                ]),
            ],
            NoiseModel::BitFlip(p) => vec![
                scaled(&matrices::identity(2), (1.0 - p).sqrt()),
                scaled(&matrices::X, p.sqrt()),
            ],
            NoiseModel::PhaseFlip(p) => vec![
                scaled(&matrices::identity(2), (1.0 - p).sqrt()),
                scaled(&matrices::Z, p.sqrt()),
            ],
            NoiseModel::BitPhaseFlip(p) => vec![
                scaled(&matrices::identity(2), (1.0 - p).sqrt()),
                scaled(&matrices::Y, p.sqrt()),
            ],
            NoiseModel::PauliChannel(px, py, pz) => vec![
                scaled(&matrices::identity(2), (1.0 - px - py - pz).max(0.0).sqrt()),
                scaled(&matrices::X, px.sqrt()),
                scaled(&matrices::Y, py.sqrt()),
                scaled(&matrices::Z, pz.sqrt()),
            ],
            NoiseModel::Kraus(ops) => ops.clone(),
        }
    }

    /// Applies the channel to one qubit of a pure state: selects a Kraus
    /// operator with probability `||K_i|ψ>||²`, applies it, renormalises.
    ///
    /// ## Returns
    /// The index of the operator that fired.
    pub fn apply_stochastic(&self, state: &mut QuantumState, qubit: usize) -> Result<usize> {
        let operators = self.kraus_operators();
        let mask = 1usize << qubit;

        // Branch weights without touching the state.
        let mut weights = Vec::with_capacity(operators.len());
        for op in &operators {
            let k = [[op[[0, 0]], op[[0, 1]]], [op[[1, 0]], op[[1, 1]]]];
            let mut weight = 0.0;
            for i0 in 0..state.dim() {
                if i0 & mask != 0 {
                    continue;
                }
                let a0 = state.amplitudes()[i0];
                let a1 = state.amplitudes()[i0 | mask];
                weight += (k[0][0] * a0 + k[0][1] * a1).norm_sqr();
                weight += (k[1][0] * a0 + k[1][1] * a1).norm_sqr();
            }
            weights.push(weight);
        }

        let total: f64 = weights.iter().sum();
        let mut draw = state.rng().gen_range(0.0..1.0) * total;
        let mut chosen = operators.len() - 1;
        for (i, &w) in weights.iter().enumerate() {
            if draw < w {
                chosen = i;
                break;
            }
            draw -= w;
        }

        state.apply_single(qubit, &operators[chosen])?;
        state.renormalize();
        Ok(chosen)
    }
}

impl std::str::FromStr for NoiseModel {
    type Err = Error;

    /// Parses the `<kind>:<param>[,<param>…]` notation used by wrapping
    /// command-line tools, e.g. `depolarizing:0.05` or
    /// `pauli:0.01,0.02,0.03`.
    fn from_str(spec: &str) -> Result<Self> {
        let (kind, rest) = spec.split_once(':').unwrap_or((spec, ""));
        let params: Vec<f64> = rest
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| Error::UnsupportedNoise(spec.to_string()))
            })
            .collect::<Result<_>>()?;
        let one = |f: fn(f64) -> Result<NoiseModel>| {
            if params.len() == 1 {
                f(params[0])
            } else {
                Err(Error::UnsupportedNoise(spec.to_string()))
            }
        };
        match kind {
            "depolarizing" => one(NoiseModel::depolarizing),
            "amplitude-damping" => one(NoiseModel::amplitude_damping),
            "phase-damping" => one(NoiseModel::phase_damping),
            "bit-flip" => one(NoiseModel::bit_flip),
            "phase-flip" => one(NoiseModel::phase_flip),
            "bit-phase-flip" => one(NoiseModel::bit_phase_flip),
            "pauli" => {
                if params.len() == 3 {
                    NoiseModel::pauli_channel(params[0], params[1], params[2])
                } else {
                    Err(Error::UnsupportedNoise(spec.to_string()))
                }
            }
            _ => Err(Error::UnsupportedNoise(spec.to_string())),
        }
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) || value.is_nan() {
        return Err(Error::InvalidNoiseParameter { name, value });
    }
    Ok(())
}

fn scaled(m: &Array2<Complex64>, factor: f64) -> Array2<Complex64> {
    m.mapv(|v| v * factor)
}

/// Largest entry-wise deviation of `Σ K†K` from the identity.
fn completeness_deviation(operators: &[Array2<Complex64>]) -> f64 {
    let mut sum = Array2::from_elem((2, 2), c64(0.0, 0.0));
    for op in operators {
        sum = sum + matrices::adjoint(op).dot(op);
    }
    let mut worst: f64 = 0.0;
    for i in 0..2 {
        for j in 0..2 {
            let expected = if i == j { c64(1.0, 0.0) } else { c64(0.0, 0.0) };
            worst = worst.max((sum[[i, j]] - expected).norm());
        }
    }
    worst
}
