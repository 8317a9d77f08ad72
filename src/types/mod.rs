use std::collections::HashMap;

pub mod pauli;

pub use pauli::{Pauli, PauliString, PauliTerm};

/// Upper bound on the number of qubits a single state vector may hold.
///
/// At 16 bytes per amplitude a 30-qubit state occupies 16 GiB; anything
/// larger is out of reach for a dense simulator on one host.
pub const MAX_QUBITS: usize = 30;

/// Upper bound on the classical register width; outcomes pack into a
/// `u64`.
pub const MAX_CBITS: usize = 64;

/// Tolerated norm drift of the state vector outside of collapse operations.
pub const NORM_TOLERANCE: f64 = 1e-9;

/// Tolerance for the unitarity check on custom gate matrices and for
/// Kraus completeness.
pub const UNITARY_TOLERANCE: f64 = 1e-9;

/// Probability below which a measurement outcome is treated as numerically
/// impossible.
pub const UNDERFLOW_TOLERANCE: f64 = 1e-12;

/// Tolerance used when deciding whether a merged rotation angle reduces to
/// a multiple of 2π.
pub const ANGLE_TOLERANCE: f64 = 1e-12;

/// Histogram of sampled outcomes, keyed by the flat basis-state index of the
/// measured bits (bit `i` of the key is the outcome of classical bit `i`).
///
/// With [`MAX_QUBITS`] capped at 30 every outcome fits a `u64` key.
pub type ShotCount = HashMap<u64, usize>;

/// Renders an outcome key as a bitstring, most-significant bit first, the
/// way basis states are conventionally written (`|b_{n-1} … b_0>`).
pub fn outcome_bitstring(key: u64, width: usize) -> String {
    (0..width).rev().map(|i| if key >> i & 1 == 1 { '1' } else { '0' }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitstring_is_msb_first() {
        assert_eq!(outcome_bitstring(0b011, 3), "011");
        assert_eq!(outcome_bitstring(0b100, 3), "100");
        assert_eq!(outcome_bitstring(0, 2), "00");
    }
}
