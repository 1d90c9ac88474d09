//! qmap Platform Descriptions
//!
//! Everything the mapper needs to know about a target device, loaded once
//! and shared read-only:
//!
//! - [`Platform`]: qubit count, cycle time, topology, instruction library and
//!   resource definitions
//! - [`TopologyConfig`]: coordinates, edges, cores and connectivity mode
//! - [`InstructionLibrary`]: name-based gate creation with decompositions
//! - [`ResourceManager`]: availability and reservation of shared resources
//!   for resource-constrained scheduling

pub mod error;
pub mod instruction;
pub mod platform;
pub mod resource;
pub mod topology;

pub use error::{PlatformError, PlatformResult};
pub use instruction::{InstructionDef, InstructionLibrary, InstructionType};
pub use platform::{HardwareSettings, Platform, PlatformConfig};
pub use resource::{
    ControlLineConfig, ControlLineResource, QubitResource, QubitResourceConfig, Resource,
    ResourceManager, ResourcesConfig,
};
pub use topology::{Edge, QubitCoord, TopologyConfig};
