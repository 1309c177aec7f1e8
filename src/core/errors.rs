use num_complex::Complex64;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum GateError {
    #[error("Matrix is not Unitary (U†U != I)")]
    NonUnitary,

    #[error("Gate must be a 2x2 single-qubit operator, got {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },
}

#[derive(Error, Debug, Clone)]
pub enum MeasurementError {
    #[error("Measurement operators do not sum to Identity (Completeness relation failed)")]
    NotComplete,

    #[error("Measurement must have exactly two 2x2 projectors")]
    InvalidDimensions,
}

#[derive(Error, Debug, Clone)]
pub enum ChannelError {
    #[error("Channel must have at least one Kraus operator")]
    Empty,

    #[error("Kraus operators do not sum to Identity (Trace preserving relation failed)")]
    NotComplete,

    #[error("Invalid operator dimensions: Kraus operators must be 2x2")]
    InvalidDimensions,

    #[error("Invalid probability: {0}. Must be between 0.0 and 1.0")]
    InvalidProbability(f64),
}

#[derive(Error, Debug, Clone)]
pub enum StateError {
    #[error("Trace is not unity: {0}")]
    InvalidTrace(Complex64),

    #[error("Outcome {outcome} has zero probability and cannot be collapsed onto")]
    ImpossibleOutcome { outcome: usize },

    #[error("Measurement error: {0}")]
    MeasurementError(#[from] MeasurementError),

    #[error("Gate error: {0}")]
    GateError(#[from] GateError),

    #[error("Channel error: {0}")]
    ChannelError(#[from] ChannelError),
}

/// Failures that terminate a simulation run.
#[derive(Error, Debug, Clone)]
pub enum SimulationError {
    #[error("Parameter `{parameter}` = {value} violates {constraint}")]
    ParameterDomain {
        parameter: &'static str,
        value: f64,
        constraint: &'static str,
    },

    #[error("Degenerate run: only {count} bits left after {stage}")]
    DegenerateRun { stage: &'static str, count: usize },

    #[error("Cannot estimate QBER from an empty sample")]
    DegenerateSample,

    #[error("Samples differ in length ({left} vs {right})")]
    SampleLengthMismatch { left: usize, right: usize },

    #[error("Sequence length mismatch: {what} has {got} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Position {position} is outside a sequence of length {len}")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Configuration could not be parsed: {0}")]
    Config(String),

    #[error("Quantum state error: {0}")]
    State(#[from] StateError),
}
