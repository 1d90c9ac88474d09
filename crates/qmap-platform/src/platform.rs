//! The platform descriptor.
//!
//! A [`Platform`] is loaded once from a JSON or YAML file and then shared
//! read-only by everything that maps for it.
//!
//! ```
//! use qmap_platform::Platform;
//!
//! let platform = Platform::from_json(r#"{
//!     "hardware_settings": {"qubit_number": 2, "cycle_time": 20},
//!     "topology": {"edges": [{"src": 0, "dst": 1}, {"src": 1, "dst": 0}]},
//!     "instructions": {"cz": {"duration": 40, "type": "flux"}}
//! }"#).unwrap();
//!
//! assert_eq!(platform.qubit_count(), 2);
//! assert!(platform.try_create("cz", &[0, 1], &[], None, 0.0).is_some());
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use qmap_ir::Gate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PlatformError, PlatformResult};
use crate::instruction::{InstructionDef, InstructionLibrary};
use crate::resource::{ControlLineResource, ResourcesConfig};
use crate::topology::TopologyConfig;

/// Global hardware parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareSettings {
    /// Number of physical qubits.
    pub qubit_number: usize,
    /// Device time units per cycle.
    pub cycle_time: u64,
}

/// Platform configuration as written on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Platform name.
    #[serde(default)]
    pub name: String,
    /// Hardware parameters.
    pub hardware_settings: HardwareSettings,
    /// Qubit connectivity.
    #[serde(default)]
    pub topology: TopologyConfig,
    /// Named instructions.
    #[serde(default)]
    pub instructions: BTreeMap<String, InstructionDef>,
    /// Decompositions, `"name %0,%1" -> ["part %0,%1", ...]`.
    #[serde(default)]
    pub gate_decomposition: BTreeMap<String, Vec<String>>,
    /// Schedulable resources.
    #[serde(default)]
    pub resources: ResourcesConfig,
}

/// Immutable description of a target device.
#[derive(Debug, Clone)]
pub struct Platform {
    config: PlatformConfig,
    library: InstructionLibrary,
}

impl Platform {
    /// Check a configuration and build the platform from it.
    pub fn new(config: PlatformConfig) -> PlatformResult<Self> {
        let hw = config.hardware_settings;
        if hw.qubit_number == 0 {
            return Err(PlatformError::InvalidHardwareSettings(
                "qubit_number must be positive".into(),
            ));
        }
        if hw.cycle_time == 0 {
            return Err(PlatformError::InvalidHardwareSettings(
                "cycle_time must be positive".into(),
            ));
        }
        if let Some(cl) = &config.resources.control_lines {
            ControlLineResource::new(&cl.groups, hw.qubit_number)?;
        }
        let library = InstructionLibrary::new(&config.instructions, &config.gate_decomposition)?;
        Ok(Self { config, library })
    }

    /// Parse a JSON platform description.
    pub fn from_json(source: &str) -> PlatformResult<Self> {
        Self::new(serde_json::from_str(source)?)
    }

    /// Parse a YAML platform description.
    pub fn from_yaml(source: &str) -> PlatformResult<Self> {
        Self::new(serde_yaml_ng::from_str(source)?)
    }

    /// Load a platform file; the extension selects the format.
    pub fn load(path: impl AsRef<Path>) -> PlatformResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| PlatformError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let platform = match ext.as_str() {
            "json" => Self::from_json(&source)?,
            "yaml" | "yml" => Self::from_yaml(&source)?,
            other => return Err(PlatformError::UnsupportedFormat(other.to_string())),
        };
        info!(
            path = %path.display(),
            qubits = platform.qubit_count(),
            instructions = platform.config.instructions.len(),
            "platform loaded"
        );
        Ok(platform)
    }

    /// Platform name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Number of physical qubits.
    pub fn qubit_count(&self) -> usize {
        self.config.hardware_settings.qubit_number
    }

    /// Device time units per cycle.
    pub fn cycle_time(&self) -> u64 {
        self.config.hardware_settings.cycle_time
    }

    /// Topology section.
    pub fn topology(&self) -> &TopologyConfig {
        &self.config.topology
    }

    /// Resources section.
    pub fn resources(&self) -> &ResourcesConfig {
        &self.config.resources
    }

    /// The configuration this platform was built from.
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Whether `name` is a configured instruction or decomposition.
    pub fn has_instruction(&self, name: &str) -> bool {
        self.library.contains(name)
    }

    /// Create the gate(s) named `name`; see [`InstructionLibrary::try_create`].
    pub fn try_create(
        &self,
        name: &str,
        qubits: &[usize],
        cregs: &[usize],
        duration: Option<u64>,
        angle: f64,
    ) -> Option<Vec<Gate>> {
        self.library
            .try_create(name, qubits, cregs, duration, angle)
    }

    /// Duration rounded up to cycles of a configured instruction.
    pub fn duration_cycles(&self, name: &str) -> Option<u64> {
        self.library
            .duration(name)
            .map(|d| d.div_ceil(self.cycle_time()))
    }
}
