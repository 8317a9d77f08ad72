//! Canonical unitaries for the closed gate set.
//!
//! Index convention: for a gate declared over qubits `[a, b, c]`, qubit `a`
//! is the least-significant bit of the matrix row/column index. Controlled
//! gates list their controls first, so the control occupies the low bits
//! and the embedded target unitary acts on the high bits.

use lazy_static::lazy_static;
use ndarray::{Array2, arr2};
use num_complex::Complex64;
use num_traits::{One, Zero};
use std::f64::consts::FRAC_1_SQRT_2;

use super::Gate;

#[inline]
pub(crate) fn c64(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

lazy_static! {
    pub static ref X: Array2<Complex64> = arr2(&[
        [c64(0.0, 0.0), c64(1.0, 0.0)],
        [c64(1.0, 0.0), c64(0.0, 0.0)],
    ]);
    pub static ref Y: Array2<Complex64> = arr2(&[
        [c64(0.0, 0.0), c64(0.0, -1.0)],
        [c64(0.0, 1.0), c64(0.0, 0.0)],
    ]);
    pub static ref Z: Array2<Complex64> = arr2(&[
        [c64(1.0, 0.0), c64(0.0, 0.0)],
        [c64(0.0, 0.0), c64(-1.0, 0.0)],
    ]);
    pub static ref H: Array2<Complex64> = arr2(&[
        [c64(FRAC_1_SQRT_2, 0.0), c64(FRAC_1_SQRT_2, 0.0)],
        [c64(FRAC_1_SQRT_2, 0.0), c64(-FRAC_1_SQRT_2, 0.0)],
    ]);
    pub static ref S: Array2<Complex64> = arr2(&[
        [c64(1.0, 0.0), c64(0.0, 0.0)],
        [c64(0.0, 0.0), c64(0.0, 1.0)],
    ]);
    pub static ref SDG: Array2<Complex64> = arr2(&[
        [c64(1.0, 0.0), c64(0.0, 0.0)],
        [c64(0.0, 0.0), c64(0.0, -1.0)],
    ]);
    pub static ref T: Array2<Complex64> = arr2(&[
        [c64(1.0, 0.0), c64(0.0, 0.0)],
        [c64(0.0, 0.0), c64(FRAC_1_SQRT_2, FRAC_1_SQRT_2)],
    ]);
    pub static ref TDG: Array2<Complex64> = arr2(&[
        [c64(1.0, 0.0), c64(0.0, 0.0)],
        [c64(0.0, 0.0), c64(FRAC_1_SQRT_2, -FRAC_1_SQRT_2)],
    ]);

    /// CNOT with the control on the low index bit.
    pub static ref CX: Array2<Complex64> = controlled(&X);
    pub static ref CZ: Array2<Complex64> = controlled(&Z);
    pub static ref SWAP: Array2<Complex64> = {
        let mut m = identity(4);
        m[[1, 1]] = c64(0.0, 0.0);
        m[[2, 2]] = c64(0.0, 0.0);
        m[[1, 2]] = c64(1.0, 0.0);
        m[[2, 1]] = c64(1.0, 0.0);
        m
    };
    pub static ref ISWAP: Array2<Complex64> = {
        let mut m = identity(4);
        m[[1, 1]] = c64(0.0, 0.0);
        m[[2, 2]] = c64(0.0, 0.0);
        m[[1, 2]] = c64(0.0, 1.0);
        m[[2, 1]] = c64(0.0, 1.0);
        m
    };
    pub static ref SQRT_ISWAP: Array2<Complex64> = {
        let mut m = identity(4);
        m[[1, 1]] = c64(FRAC_1_SQRT_2, 0.0);
        m[[2, 2]] = c64(FRAC_1_SQRT_2, 0.0);
        m[[1, 2]] = c64(0.0, FRAC_1_SQRT_2);
        m[[2, 1]] = c64(0.0, FRAC_1_SQRT_2);
        m
    };

    /// Toffoli with both controls on the two low index bits.
    pub static ref CCX: Array2<Complex64> = doubly_controlled(&X);
    pub static ref CCZ: Array2<Complex64> = doubly_controlled(&Z);
    /// Fredkin with the control on the low index bit; swaps the two high bits.
    pub static ref CSWAP: Array2<Complex64> = {
        let mut m = identity(8);
        m[[3, 3]] = c64(0.0, 0.0);
        m[[5, 5]] = c64(0.0, 0.0);
        m[[3, 5]] = c64(1.0, 0.0);
        m[[5, 3]] = c64(1.0, 0.0);
        m
    };
}

pub fn identity(dim: usize) -> Array2<Complex64> {
    Array2::from_shape_fn((dim, dim), |(i, j)| {
        if i == j { Complex64::one() } else { Complex64::zero() }
    })
}

/// `RX(θ) = [[cos(θ/2), -i sin(θ/2)], [-i sin(θ/2), cos(θ/2)]]`
pub fn rx(theta: f64) -> Array2<Complex64> {
    let (sin, cos) = (theta / 2.0).sin_cos();
    arr2(&[[c64(cos, 0.0), c64(0.0, -sin)], [c64(0.0, -sin), c64(cos, 0.0)]])
}

/// `RY(θ) = [[cos(θ/2), -sin(θ/2)], [sin(θ/2), cos(θ/2)]]`
pub fn ry(theta: f64) -> Array2<Complex64> {
    let (sin, cos) = (theta / 2.0).sin_cos();
    arr2(&[[c64(cos, 0.0), c64(-sin, 0.0)], [c64(sin, 0.0), c64(cos, 0.0)]])
}

/// `RZ(θ) = diag(e^{-iθ/2}, e^{iθ/2})`
pub fn rz(theta: f64) -> Array2<Complex64> {
    let half = theta / 2.0;
    arr2(&[
        [Complex64::from_polar(1.0, -half), c64(0.0, 0.0)],
        [c64(0.0, 0.0), Complex64::from_polar(1.0, half)],
    ])
}

/// `P(λ) = diag(1, e^{iλ})`; U1 shares this matrix.
pub fn phase(lambda: f64) -> Array2<Complex64> {
    arr2(&[
        [c64(1.0, 0.0), c64(0.0, 0.0)],
        [c64(0.0, 0.0), Complex64::from_polar(1.0, lambda)],
    ])
}

/// `U2(φ, λ) = (1/√2) [[1, -e^{iλ}], [e^{iφ}, e^{i(φ+λ)}]]`
pub fn u2(phi: f64, lambda: f64) -> Array2<Complex64> {
    let s = FRAC_1_SQRT_2;
    arr2(&[
        [c64(s, 0.0), -Complex64::from_polar(s, lambda)],
        [
            Complex64::from_polar(s, phi),
            Complex64::from_polar(s, phi + lambda),
        ],
    ])
}

/// `U3(θ, φ, λ)` per the OpenQASM definition.
pub fn u3(theta: f64, phi: f64, lambda: f64) -> Array2<Complex64> {
    let (sin, cos) = (theta / 2.0).sin_cos();
    arr2(&[
        [c64(cos, 0.0), -Complex64::from_polar(sin, lambda)],
        [
            Complex64::from_polar(sin, phi),
            Complex64::from_polar(cos, phi + lambda),
        ],
    ])
}

/// Embeds a single-qubit unitary as its controlled form. The control is the
/// low index bit; the target unitary lands on the `control = 1` subspace.
pub fn controlled(u: &Array2<Complex64>) -> Array2<Complex64> {
    let mut m = identity(4);
    m[[1, 1]] = u[[0, 0]];
    m[[1, 3]] = u[[0, 1]];
    m[[3, 1]] = u[[1, 0]];
    m[[3, 3]] = u[[1, 1]];
    m
}

/// Embeds a single-qubit unitary under two controls (the two low index
/// bits); the target unitary acts where both controls are 1.
pub fn doubly_controlled(u: &Array2<Complex64>) -> Array2<Complex64> {
    let mut m = identity(8);
    m[[3, 3]] = u[[0, 0]];
    m[[3, 7]] = u[[0, 1]];
    m[[7, 3]] = u[[1, 0]];
    m[[7, 7]] = u[[1, 1]];
    m
}

/// Conjugate transpose.
pub fn adjoint(m: &Array2<Complex64>) -> Array2<Complex64> {
    let mut out = Array2::from_elem((m.ncols(), m.nrows()), Complex64::zero());
    for i in 0..m.nrows() {
        for j in 0..m.ncols() {
            out[[j, i]] = m[[i, j]].conj();
        }
    }
    out
}

/// Checks `U†U = I` entry-wise within `tol`.
pub fn is_unitary(m: &Array2<Complex64>, tol: f64) -> bool {
    if m.nrows() != m.ncols() {
        return false;
    }
    let dim = m.nrows();
    let product = adjoint(m).dot(m);
    for i in 0..dim {
        for j in 0..dim {
            let expected = if i == j { c64(1.0, 0.0) } else { c64(0.0, 0.0) };
            if (product[[i, j]] - expected).norm() > tol {
                return false;
            }
        }
    }
    true
}

impl Gate {
    /// The unitary matrix of the gate, or `None` for non-unitary meta
    /// operations (measure, barrier, reset, classical conditioning).
    pub fn matrix(&self) -> Option<Array2<Complex64>> {
        let m = match self {
            Gate::X(_) => X.clone(),
            Gate::Y(_) => Y.clone(),
            Gate::Z(_) => Z.clone(),
            Gate::H(_) => H.clone(),
            Gate::S(_) => S.clone(),
            Gate::Sdg(_) => SDG.clone(),
            Gate::T(_) => T.clone(),
            Gate::Tdg(_) => TDG.clone(),
            Gate::Rx(_, t) => rx(*t),
            Gate::Ry(_, t) => ry(*t),
            Gate::Rz(_, t) => rz(*t),
            Gate::Phase(_, l) | Gate::U1(_, l) => phase(*l),
            Gate::U2(_, p, l) => u2(*p, *l),
            Gate::U3(_, t, p, l) => u3(*t, *p, *l),
            Gate::Cx(..) => CX.clone(),
            Gate::Cz(..) => CZ.clone(),
            Gate::Swap(..) => SWAP.clone(),
            Gate::ISwap(..) => ISWAP.clone(),
            Gate::SqrtISwap(..) => SQRT_ISWAP.clone(),
            Gate::CPhase(_, _, l) | Gate::Cu1(_, _, l) => controlled(&phase(*l)),
            Gate::Crx(_, _, t) => controlled(&rx(*t)),
            Gate::Cry(_, _, t) => controlled(&ry(*t)),
            Gate::Crz(_, _, t) => controlled(&rz(*t)),
            Gate::Cu2(_, _, p, l) => controlled(&u2(*p, *l)),
            Gate::Cu3(_, _, t, p, l) => controlled(&u3(*t, *p, *l)),
            Gate::Ccx(..) => CCX.clone(),
            Gate::Ccz(..) => CCZ.clone(),
            Gate::CSwap(..) => CSWAP.clone(),
            Gate::Custom { matrix, .. } => matrix.clone(),
            Gate::Measure { .. } | Gate::Barrier(_) | Gate::Reset(_) | Gate::Conditioned { .. } => {
                return None;
            }
        };
        Some(m)
    }
}
