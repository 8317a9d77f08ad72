//! Reduced density matrices and two-qubit entanglement.
//!
//! Concurrence follows the standard Wootters formula: with
//! `ρ̃ = (σy⊗σy) ρ* (σy⊗σy)` and `λ_i` the decreasing square roots of the
//! eigenvalues of `ρρ̃`, `C = max(0, λ1 − λ2 − λ3 − λ4)`.
//!
//! The eigenvalues of the 4x4 product come from its characteristic
//! polynomial (Faddeev–LeVerrier) solved with Durand–Kerner iteration,
//! which keeps the crate free of a LAPACK binding for one small solve.

use ndarray::Array2;
use num_complex::Complex64;

use crate::error::{Error, Result};
use crate::state::QuantumState;

/// Reduced density matrix of two qubits, tracing out the rest.
///
/// Local basis order: `q1` is the least-significant bit of the 4x4 index,
/// matching the engine's gate-matrix convention.
pub fn reduced_density_matrix(
    state: &QuantumState,
    q1: usize,
    q2: usize,
) -> Result<Array2<Complex64>> {
    let n = state.num_qubits();
    for &q in &[q1, q2] {
        if q >= n {
            return Err(Error::QubitIndexOutOfBounds(q, n));
        }
    }
    if q1 == q2 {
        return Err(Error::DuplicateQubit(q1));
    }

    let m1 = 1usize << q1;
    let m2 = 1usize << q2;
    let mask = m1 | m2;
    let place = |g: usize| {
        let mut bits = 0usize;
        if g & 1 == 1 {
            bits |= m1;
        }
        if g & 2 == 2 {
            bits |= m2;
        }
        bits
    };

    let amps = state.amplitudes();
    let mut rho = Array2::from_elem((4, 4), Complex64::new(0.0, 0.0));
    for rest in 0..amps.len() {
        if rest & mask != 0 {
            continue;
        }
        for r in 0..4 {
            for c in 0..4 {
                rho[[r, c]] += amps[rest | place(r)] * amps[rest | place(c)].conj();
            }
        }
    }
    Ok(rho)
}

/// Wootters concurrence between two qubits of the state: 0 for product
/// states, 1 for maximal entanglement.
pub fn concurrence(state: &QuantumState, q1: usize, q2: usize) -> Result<f64> {
    let rho = reduced_density_matrix(state, q1, q2)?;
    let yy = sigma_yy();

    // ρ̃ = (σy⊗σy) ρ* (σy⊗σy)
    let rho_conj = rho.mapv(|v| v.conj());
    let rho_tilde = yy.dot(&rho_conj).dot(&yy);
    let product = rho.dot(&rho_tilde);

    let mut lambdas: Vec<f64> = eigenvalues_4x4(&product)
        .into_iter()
        .map(|ev| ev.re.max(0.0).sqrt())
        .collect();
    lambdas.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    Ok((lambdas[0] - lambdas[1] - lambdas[2] - lambdas[3]).max(0.0))
}

fn sigma_yy() -> Array2<Complex64> {
    let y = [
        [Complex64::new(0.0, 0.0), Complex64::new(0.0, -1.0)],
        [Complex64::new(0.0, 1.0), Complex64::new(0.0, 0.0)],
    ];
    Array2::from_shape_fn((4, 4), |(g, h)| y[g >> 1][h >> 1] * y[g & 1][h & 1])
}

/// Eigenvalues of a general 4x4 complex matrix.
fn eigenvalues_4x4(a: &Array2<Complex64>) -> [Complex64; 4] {
    let coeffs = characteristic_polynomial(a);
    durand_kerner(&coeffs)
}

/// Coefficients `[c1, c2, c3, c4]` of `λ⁴ + c1λ³ + c2λ² + c3λ + c4` via the
/// Faddeev–LeVerrier recurrence.
fn characteristic_polynomial(a: &Array2<Complex64>) -> [Complex64; 4] {
    let identity = Array2::from_shape_fn((4, 4), |(i, j)| {
        if i == j {
            Complex64::new(1.0, 0.0)
        } else {
            Complex64::new(0.0, 0.0)
        }
    });

    let mut coeffs = [Complex64::new(0.0, 0.0); 4];
    let mut m = a.clone();
    for k in 0..4 {
        let c = -trace(&m) / Complex64::new((k + 1) as f64, 0.0);
        coeffs[k] = c;
        if k < 3 {
            m = a.dot(&(&m + &identity.mapv(|v| v * c)));
        }
    }
    coeffs
}

fn trace(m: &Array2<Complex64>) -> Complex64 {
    (0..4).map(|i| m[[i, i]]).sum()
}

/// Durand–Kerner root finding for a monic quartic. The eigenvalues of
/// `ρρ̃` are non-negative reals in exact arithmetic, so convergence is
/// tame; 200 iterations with a 1e-14 step tolerance is far more than
/// needed.
fn durand_kerner(coeffs: &[Complex64; 4]) -> [Complex64; 4] {
    let poly = |z: Complex64| {
        let mut acc = Complex64::new(1.0, 0.0);
        for &c in coeffs {
            acc = acc * z + c;
        }
        acc
    };

    let seed = Complex64::new(0.4, 0.9);
    let mut roots = [
        seed,
        seed * seed,
        seed * seed * seed,
        seed * seed * seed * seed,
    ];
    for _ in 0..200 {
        let mut worst_step = 0.0f64;
        for k in 0..4 {
            let mut denom = Complex64::new(1.0, 0.0);
            for j in 0..4 {
                if j != k {
                    denom *= roots[k] - roots[j];
                }
            }
            if denom.norm() < 1e-300 {
                continue;
            }
            let step = poly(roots[k]) / denom;
            roots[k] -= step;
            worst_step = worst_step.max(step.norm());
        }
        if worst_step < 1e-14 {
            break;
        }
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::QuantumCircuit;

    fn state_of(build: impl FnOnce(&mut QuantumCircuit)) -> QuantumState {
        let mut circuit = QuantumCircuit::new(3, 0).unwrap();
        build(&mut circuit);
        QuantumState::from_circuit(&circuit).unwrap()
    }

    #[test]
    fn product_state_has_zero_concurrence() {
        let state = state_of(|c| {
            c.apply_h(0).unwrap();
            c.apply_x(1).unwrap();
        });
        assert!(concurrence(&state, 0, 1).unwrap() < 1e-9);
    }

    #[test]
    fn bell_pair_has_unit_concurrence() {
        let state = state_of(|c| {
            c.apply_h(0).unwrap();
            c.apply_cx(0, 1).unwrap();
        });
        assert!((concurrence(&state, 0, 1).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ghz_pairs_are_not_pairwise_entangled() {
        let state = state_of(|c| {
            c.apply_h(0).unwrap();
            c.apply_cx(0, 1).unwrap();
            c.apply_cx(1, 2).unwrap();
        });
        // Tracing one qubit out of GHZ leaves a classical mixture.
        assert!(concurrence(&state, 0, 1).unwrap() < 1e-9);
    }

    #[test]
    fn w_state_pairs_reach_two_thirds() {
        // |W> = (|001> + |010> + |100>)/sqrt(3), loaded directly.
        let mut state = QuantumState::seeded(3, 1).unwrap();
        let amp = 1.0 / (3.0f64).sqrt();
        let mut amps = vec![Complex64::new(0.0, 0.0); 8];
        amps[1] = Complex64::new(amp, 0.0);
        amps[2] = Complex64::new(amp, 0.0);
        amps[4] = Complex64::new(amp, 0.0);
        state.restore(&amps).unwrap();
        let c = concurrence(&state, 0, 1).unwrap();
        assert!((c - 2.0 / 3.0).abs() < 1e-9, "got {}", c);
    }

    #[test]
    fn reduced_matrix_has_unit_trace() {
        let state = state_of(|c| {
            c.apply_h(0).unwrap();
            c.apply_cx(0, 2).unwrap();
            c.apply_t(1).unwrap();
        });
        let rho = reduced_density_matrix(&state, 0, 2).unwrap();
        let trace: Complex64 = (0..4).map(|i| rho[[i, i]]).sum();
        assert!((trace.re - 1.0).abs() < 1e-12);
        assert!(trace.im.abs() < 1e-12);
    }
}
