//! qmap Circuit Representation
//!
//! The data the qubit mapper consumes and produces: flat [`Gate`] records
//! grouped into [`Kernel`]s, and the [`DependencyGraph`] used for lookahead.
//!
//! # Core Components
//!
//! - **Gates**: [`Gate`] with a closed [`GateKind`] discriminator
//! - **Kernels**: [`Kernel`] (one straight-line circuit) and [`Program`]
//! - **Dependencies**: [`DependencyGraph`] with source/sink boundary nodes and
//!   remaining critical-path lengths
//!
//! # Example
//!
//! ```rust
//! use qmap_ir::{Gate, Kernel};
//!
//! let mut kernel = Kernel::new("bell", 2, 0);
//! kernel.push(Gate::custom("h", vec![0]).with_duration(20)).unwrap();
//! kernel.push(Gate::custom("cnot", vec![0, 1]).with_duration(40)).unwrap();
//!
//! assert_eq!(kernel.two_qubit_count(), 1);
//! ```

pub mod dag;
pub mod error;
pub mod gate;
pub mod kernel;

pub use dag::{DependencyGraph, GateId};
pub use error::{IrError, IrResult};
pub use gate::{Gate, GateKind};
pub use kernel::{Kernel, Program};
