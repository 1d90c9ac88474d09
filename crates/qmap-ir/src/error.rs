//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit operand outside the kernel's qubit range.
    #[error("Qubit {qubit} out of range 0..{qubit_count} (gate: {gate_name})")]
    QubitOutOfRange {
        /// The offending operand.
        qubit: usize,
        /// Number of qubits of the kernel.
        qubit_count: usize,
        /// Gate carrying the operand.
        gate_name: String,
    },

    /// Classical register operand outside the kernel's register range.
    #[error("Classical register {creg} out of range 0..{creg_count} (gate: {gate_name})")]
    CregOutOfRange {
        /// The offending operand.
        creg: usize,
        /// Number of classical registers of the kernel.
        creg_count: usize,
        /// Gate carrying the operand.
        gate_name: String,
    },

    /// The same qubit appears twice in one gate.
    #[error("Duplicate qubit {qubit} in operation (gate: {gate_name})")]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: usize,
        /// Gate carrying the operand.
        gate_name: String,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
