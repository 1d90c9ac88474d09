//! Error types for the mapper.

use qmap_ir::IrError;
use qmap_platform::PlatformError;
use thiserror::Error;

/// Errors that abort mapping of a kernel.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MapError {
    /// IR error.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    /// Platform error.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Topology form other than `xy` or `irregular`.
    #[error("Unknown topology form '{0}'")]
    UnknownForm(String),

    /// Connectivity mode other than `specified` or `full`.
    #[error("Unknown connectivity '{0}'")]
    UnknownConnectivity(String),

    /// A regular layout without coordinates.
    #[error("Topology form 'xy' requires qubit coordinates")]
    MissingCoordinates,

    /// Coordinate list does not cover the platform's qubits.
    #[error("Topology lists {listed} qubit coordinates but the platform has {qubit_count} qubits")]
    CoordinateCountMismatch {
        /// Coordinates listed.
        listed: usize,
        /// Platform qubit count.
        qubit_count: usize,
    },

    /// Qubit id outside `0..qubit_count` in the topology.
    #[error("Topology refers to qubit {qubit}, outside 0..{qubit_count}")]
    QubitOutOfRange {
        /// Offending id.
        qubit: usize,
        /// Platform qubit count.
        qubit_count: usize,
    },

    /// Coordinate outside the layout's size.
    #[error("Qubit {qubit} has coordinate ({x}, {y}) outside the {x_size}x{y_size} layout")]
    CoordinateOutOfRange {
        /// Offending qubit.
        qubit: usize,
        /// Its column.
        x: i64,
        /// Its row.
        y: i64,
        /// Layout columns.
        x_size: i64,
        /// Layout rows.
        y_size: i64,
    },

    /// The same qubit has two coordinate entries.
    #[error("Qubit {0} has more than one coordinate")]
    DuplicateCoordinate(usize),

    /// `specified` connectivity without edges.
    #[error("Connectivity 'specified' requires edges")]
    MissingEdges,

    /// The same directed edge listed twice.
    #[error("Edge {src} -> {dst} is defined more than once")]
    DuplicateEdge {
        /// Source qubit.
        src: usize,
        /// Destination qubit.
        dst: usize,
    },

    /// Cores do not evenly partition the qubits.
    #[error("{qubit_count} qubits cannot be split over {cores} cores")]
    InvalidCores {
        /// Number of cores.
        cores: usize,
        /// Platform qubit count.
        qubit_count: usize,
    },

    /// Border path selection on a layout without coordinates.
    #[error("Path selection 'borders' requires a topology with qubit coordinates")]
    BordersRequireCoordinates,

    /// Unknown option key.
    #[error("Unknown mapper option '{0}'")]
    UnknownOption(String),

    /// Value not accepted by an option.
    #[error("Invalid value '{value}' for mapper option '{option}'")]
    InvalidOptionValue {
        /// Option key.
        option: String,
        /// Rejected value.
        value: String,
    },

    /// Kernel uses more qubits than the platform has.
    #[error("Kernel '{kernel}' uses {required} qubits but the platform has {available}")]
    KernelTooLarge {
        /// Kernel name.
        kernel: String,
        /// Qubits used.
        required: usize,
        /// Qubits available.
        available: usize,
    },

    /// A gate with more than two qubit operands reached the mapper.
    #[error("Gate '{gate}' has {operands} qubit operands; decompose it before mapping")]
    TooManyOperands {
        /// Gate as text.
        gate: String,
        /// Its operand count.
        operands: usize,
    },

    /// No free physical qubit for a virtual one.
    #[error("No free physical qubit left to allocate virtual qubit {0}")]
    QubitsExhausted(usize),

    /// No configured instruction for any of the tried names.
    #[error("No instruction found for any of [{}] on qubits {qubits:?}", names.join(", "))]
    MissingInstruction {
        /// Names tried, in order.
        names: Vec<String>,
        /// Physical operands.
        qubits: Vec<usize>,
    },

    /// Two qubits cannot be brought together.
    #[error("No route between physical qubits {src} and {tgt}")]
    NoRoute {
        /// Source qubit.
        src: usize,
        /// Target qubit.
        tgt: usize,
    },

    /// Initial placement timed out and was configured to abort.
    #[error("Initial placement timed out after {0:?}")]
    PlacementTimedOut(std::time::Duration),
}

/// Result type for mapping operations.
pub type MapResult<T> = Result<T, MapError>;
