//! Gate records consumed and produced by the mapper.
//!
//! A [`Gate`] is a flat record: a name, its operand lists and the timing data
//! the scheduler needs. What the gate *is* is carried by [`GateKind`]; the
//! mapper never inspects matrices or pulse data, it only resolves gate names
//! through the platform's instruction library.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateKind {
    /// A named gate from the platform's instruction set.
    #[default]
    Custom,
    /// A gate that was expanded from a configured decomposition.
    Composite,
    /// Measurement.
    Measure,
    /// Explicit idle time on its operands.
    Wait,
    /// Classical operation on classical registers only.
    Classical,
    /// Boundary marker (source/sink of a dependency graph).
    Dummy,
}

impl GateKind {
    /// Whether gates of this kind act on qubits and take part in mapping.
    pub fn is_quantum(self) -> bool {
        !matches!(self, GateKind::Classical | GateKind::Dummy)
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GateKind::Custom => "custom",
            GateKind::Composite => "composite",
            GateKind::Measure => "measure",
            GateKind::Wait => "wait",
            GateKind::Classical => "classical",
            GateKind::Dummy => "dummy",
        };
        write!(f, "{s}")
    }
}

/// A single operation of a kernel.
///
/// Before mapping, `qubits` holds virtual qubit indices; after mapping it
/// holds physical ones and `cycle` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// Gate name, as known to the instruction library.
    pub name: String,
    /// Kind discriminator.
    #[serde(default)]
    pub kind: GateKind,
    /// Qubit operands.
    #[serde(default)]
    pub qubits: Vec<usize>,
    /// Classical register operands.
    #[serde(default)]
    pub cregs: Vec<usize>,
    /// Duration in device time units (ns).
    #[serde(default)]
    pub duration: u64,
    /// Rotation angle for parametrized gates.
    #[serde(default)]
    pub angle: f64,
    /// Start cycle, once scheduled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<u64>,
}

impl Gate {
    /// Create a gate of the given kind on the given qubits.
    pub fn new(name: impl Into<String>, kind: GateKind, qubits: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            kind,
            qubits,
            cregs: Vec::new(),
            duration: 0,
            angle: 0.0,
            cycle: None,
        }
    }

    /// Create a custom gate.
    pub fn custom(name: impl Into<String>, qubits: Vec<usize>) -> Self {
        Self::new(name, GateKind::Custom, qubits)
    }

    /// Create a classical operation on classical registers.
    pub fn classical(name: impl Into<String>, cregs: Vec<usize>) -> Self {
        Self::new(name, GateKind::Classical, Vec::new()).with_cregs(cregs)
    }

    /// Create a wait on the given qubits.
    pub fn wait(qubits: Vec<usize>, duration: u64) -> Self {
        Self::new("wait", GateKind::Wait, qubits).with_duration(duration)
    }

    /// Create a boundary marker.
    pub fn dummy(name: impl Into<String>) -> Self {
        Self::new(name, GateKind::Dummy, Vec::new())
    }

    /// Set the classical register operands.
    #[must_use]
    pub fn with_cregs(mut self, cregs: Vec<usize>) -> Self {
        self.cregs = cregs;
        self
    }

    /// Set the duration in device time units.
    #[must_use]
    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = duration;
        self
    }

    /// Set the rotation angle.
    #[must_use]
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    /// The name up to the first space.
    ///
    /// Qubit-specific instruction names such as `"x q0"` resolve to `"x"`.
    pub fn base_name(&self) -> &str {
        self.name
            .split_once(' ')
            .map_or(self.name.as_str(), |(base, _)| base)
    }

    /// Duration rounded up to whole cycles.
    pub fn duration_cycles(&self, cycle_time: u64) -> u64 {
        self.duration.div_ceil(cycle_time.max(1))
    }

    /// Whether this gate acts on qubits.
    pub fn is_quantum(&self) -> bool {
        self.kind.is_quantum()
    }

    /// Whether this is a two-qubit gate.
    pub fn is_two_qubit(&self) -> bool {
        self.qubits.len() == 2
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        let operands: Vec<String> = self
            .qubits
            .iter()
            .map(|q| format!("q[{q}]"))
            .chain(self.cregs.iter().map(|c| format!("c[{c}]")))
            .collect();
        if !operands.is_empty() {
            write!(f, " {}", operands.join(","))?;
        }
        if let Some(cycle) = self.cycle {
            write!(f, " @{cycle}")?;
        }
        Ok(())
    }
}
