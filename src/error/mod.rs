use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// A single parser or semantic diagnostic, anchored to a source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub col: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: usize, col: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            col,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}: {}", self.line, self.col, self.message)
    }
}

/// The accumulated diagnostics of a failed parse.
///
/// The parser recovers at statement boundaries, so a single call reports
/// every malformed statement in the source rather than only the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ParseErrors {
    pub diagnostics: Vec<Diagnostic>,
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.diagnostics.as_slice() {
            [] => write!(f, "parse failed with no diagnostics"),
            [only] => write!(f, "{}", only),
            [first, rest @ ..] => write!(f, "{} (and {} more)", first, rest.len()),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// One or more syntax errors in the QASM source.
    #[error(transparent)]
    Parse(#[from] ParseErrors),

    /// A name, width, or arity problem found while lowering a valid AST.
    #[error("Semantic error at line {line}, column {col}: {message}")]
    Semantic {
        line: usize,
        col: usize,
        message: String,
    },

    /// Error for invalid qubit index.
    #[error("Qubit index {0} is out of bounds for {1} qubits.")]
    QubitIndexOutOfBounds(usize, usize),

    /// Error for invalid classical bit index.
    #[error("Classical bit index {0} is out of bounds for {1} classical bits.")]
    CbitIndexOutOfBounds(usize, usize),

    /// Error for invalid number of qubits.
    #[error("Number of qubits must be between 1 and {max}, got {got}.")]
    InvalidNumQubits { got: usize, max: usize },

    #[error("Qubit index {0} appears more than once in a gate operand list.")]
    DuplicateQubit(usize),

    #[error("Gate '{name}' expects a {expected}x{expected} matrix, got {rows}x{cols}.")]
    DimensionMismatch {
        name: String,
        expected: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Matrix for gate '{0}' is not unitary.")]
    NonUnitary(String),

    /// A pass produced a circuit that violates its own invariants. Internal.
    #[error("Optimizer invariant violated: {0}")]
    Optimization(String),

    #[error(
        "Measurement underflow on qubit {qubit}: outcome probability {probability:.3e} is below 1e-12."
    )]
    MeasurementUnderflow { qubit: usize, probability: f64 },

    #[error("Operation '{0}' needs the executor's classical register.")]
    ClassicalContext(String),

    #[error("Snapshot '{0}' not found in the cache.")]
    SnapshotMissing(String),

    #[error("State width mismatch: operand holds {got} qubits, target holds {expected}.")]
    WidthMismatch { expected: usize, got: usize },

    #[error("Invalid snapshot file: {0}")]
    SnapshotFormat(String),

    #[error("Gate inlining exceeded the maximum depth of {0} while expanding '{1}'.")]
    RecursionLimit(usize, String),

    #[error("Kraus operators violate completeness: max |sum K'K - I| entry is {0:.3e}.")]
    KrausCompleteness(f64),

    #[error("Invalid noise parameter {name} = {value}; expected a probability in [0, 1].")]
    InvalidNoiseParameter { name: &'static str, value: f64 },

    #[error("Unsupported noise kind '{0}'.")]
    UnsupportedNoise(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
