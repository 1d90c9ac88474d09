//! qmap Qubit Mapper
//!
//! Maps kernels written for fully connected virtual qubits onto a device
//! with restricted connectivity. Two-qubit gates whose operands are not
//! nearest neighbours are made executable by inserting swaps (or cheaper
//! moves into fresh qubits) along shortest paths, and the result is
//! scheduled against the device's timing and resources.
//!
//! # Architecture
//!
//! ```text
//! Kernel (virtual qubits)
//!       │
//!       ├── placement   optional initial mapping (QAP, timeout-bounded)
//!       ▼
//! ┌────────┐   available gates   ┌──────────┐
//! │ Future │ ──────────────────► │  Router  │ ── Alter candidates
//! └────────┘                     └──────────┘    (paths, splits, scores)
//!                                      │
//!                                      ▼
//!                                 ┌────────┐
//!                                 │  Past  │  mapping, timeline, output
//!                                 └────────┘
//!       │
//!       ▼
//! Kernel (real qubits, primitives, cycles)
//! ```
//!
//! - [`Grid`]: distances, neighbour order and cores of the device
//! - [`Virt2Real`]: the virtual-to-real mapping with per-qubit state
//! - [`FreeCycle`]: per-qubit first free cycle plus resource reservations
//! - [`Past`]: what has been mapped; owns the mapping and the schedule
//! - [`Future`]: what remains; program order or dependency-graph frontier
//! - [`Alter`]: one way to route one gate
//! - [`Mapper`]: the driver
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use qmap_ir::{Gate, Kernel};
//! use qmap_mapper::{Mapper, MapperOptions};
//! use qmap_platform::Platform;
//!
//! let platform = Platform::from_json(r#"{
//!     "hardware_settings": {"qubit_number": 3, "cycle_time": 20},
//!     "topology": {"edges": [
//!         {"src": 0, "dst": 1}, {"src": 1, "dst": 0},
//!         {"src": 1, "dst": 2}, {"src": 2, "dst": 1}
//!     ]},
//!     "instructions": {
//!         "x": {"duration": 20, "type": "mw"},
//!         "cz": {"duration": 40, "type": "flux"},
//!         "swap": {"duration": 60, "type": "flux"}
//!     }
//! }"#).unwrap();
//!
//! let mut options = MapperOptions::default();
//! options.apply(["mapseed=1", "mapusemoves=no"]).unwrap();
//! let mapper = Mapper::new(Arc::new(platform), options).unwrap();
//!
//! let mut kernel = Kernel::new("k", 3, 0);
//! kernel.push(Gate::custom("x", vec![0])).unwrap();
//! kernel.push(Gate::custom("x", vec![2])).unwrap();
//! kernel.push(Gate::custom("cz", vec![0, 2])).unwrap();
//!
//! let report = mapper.map(&mut kernel).unwrap();
//! assert_eq!(report.swaps_added, 1);
//! ```

pub mod alter;
pub mod context;
pub mod error;
pub mod free_cycle;
pub mod future;
pub mod grid;
pub mod mapper;
pub mod options;
pub mod past;
pub mod placement;
pub mod virt2real;

pub use alter::Alter;
pub use context::MapContext;
pub use error::{MapError, MapResult};
pub use free_cycle::FreeCycle;
pub use future::Future;
pub use grid::{Grid, GridForm};
pub use mapper::{MapReport, Mapper, make_primitives};
pub use options::{
    Heuristic, InitialPlace, Lookahead, MapperOptions, MaxLevel, MaxWidth, MoveMode, PathSelect,
    SelectSwaps, SwapOrder, TieBreak,
};
pub use past::Past;
pub use placement::{PlaceOutcome, PlacementProblem, PlacementSolver, QapPlacer};
pub use virt2real::{RealState, Virt2Real};
