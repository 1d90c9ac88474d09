//! Resource model for resource-constrained scheduling.
//!
//! A [`ResourceManager`] answers two questions for the scheduler: may this
//! gate start in this cycle, and, once it does, what becomes busy. It is a
//! plain value; the mapper clones it freely when exploring alternatives and
//! only the authoritative copy sees real reservations.

use std::fmt;

use qmap_ir::{Gate, GateKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlatformError, PlatformResult};
use crate::platform::Platform;

/// Per-qubit busy tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QubitResourceConfig {
    /// Number of qubits tracked.
    pub count: usize,
}

/// Control lines, each driving a group of qubits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlLineConfig {
    /// Qubits driven by each line.
    pub groups: Vec<Vec<usize>>,
}

/// The `resources` section of a platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesConfig {
    /// Qubit resource, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qubits: Option<QubitResourceConfig>,
    /// Control-line resource, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_lines: Option<ControlLineConfig>,
}

/// A schedulable resource.
pub trait Resource: fmt::Debug + Send + Sync {
    /// Resource name, for diagnostics.
    fn name(&self) -> &str;

    /// Whether `gate` may start at `start` as far as this resource is concerned.
    fn available(&self, start: u64, gate: &Gate, platform: &Platform) -> bool;

    /// Record that `gate` starts at `start`.
    fn reserve(&mut self, start: u64, gate: &Gate, platform: &Platform);

    /// First cycle from which every gate is admitted.
    fn busy_until(&self) -> u64;

    /// Clone into a box.
    fn box_clone(&self) -> Box<dyn Resource>;
}

impl Clone for Box<dyn Resource> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Each qubit executes one gate at a time.
#[derive(Debug, Clone)]
pub struct QubitResource {
    busy_until: Vec<u64>,
}

impl QubitResource {
    /// Track `count` qubits, all free.
    pub fn new(count: usize) -> Self {
        Self {
            busy_until: vec![0; count],
        }
    }
}

impl Resource for QubitResource {
    fn name(&self) -> &str {
        "qubits"
    }

    fn available(&self, start: u64, gate: &Gate, _platform: &Platform) -> bool {
        gate.qubits
            .iter()
            .all(|&q| self.busy_until.get(q).is_none_or(|&busy| start >= busy))
    }

    fn reserve(&mut self, start: u64, gate: &Gate, platform: &Platform) {
        let end = start + gate.duration_cycles(platform.cycle_time());
        for &q in &gate.qubits {
            if let Some(busy) = self.busy_until.get_mut(q) {
                *busy = end;
            }
        }
    }

    fn busy_until(&self) -> u64 {
        self.busy_until.iter().copied().max().unwrap_or(0)
    }

    fn box_clone(&self) -> Box<dyn Resource> {
        Box::new(self.clone())
    }
}

#[derive(Debug, Clone, Default)]
struct LineState {
    from: u64,
    to: u64,
    operation: Option<String>,
}

/// Shared control lines.
///
/// One line drives all qubits of its group with single-qubit pulses. While
/// it is playing a pulse, other qubits in the group may only join with the
/// same operation.
#[derive(Debug, Clone)]
pub struct ControlLineResource {
    line_of: Vec<Option<usize>>,
    lines: Vec<LineState>,
}

impl ControlLineResource {
    /// Build from groups over `qubit_count` qubits.
    pub fn new(groups: &[Vec<usize>], qubit_count: usize) -> PlatformResult<Self> {
        let mut line_of = vec![None; qubit_count];
        for (line, group) in groups.iter().enumerate() {
            for &q in group {
                let slot = line_of.get_mut(q).ok_or_else(|| PlatformError::InvalidResource {
                    resource: "control_lines".into(),
                    reason: format!("qubit {q} out of range 0..{qubit_count}"),
                })?;
                if slot.is_some() {
                    return Err(PlatformError::InvalidResource {
                        resource: "control_lines".into(),
                        reason: format!("qubit {q} is driven by more than one line"),
                    });
                }
                *slot = Some(line);
            }
        }
        Ok(Self {
            line_of,
            lines: vec![LineState::default(); groups.len()],
        })
    }

    fn applies_to(gate: &Gate) -> bool {
        gate.qubits.len() == 1 && matches!(gate.kind, GateKind::Custom | GateKind::Composite)
    }

    fn lines_of<'a>(&'a self, gate: &'a Gate) -> impl Iterator<Item = usize> + 'a {
        gate.qubits
            .iter()
            .filter_map(|&q| self.line_of.get(q).copied().flatten())
    }
}

impl Resource for ControlLineResource {
    fn name(&self) -> &str {
        "control_lines"
    }

    fn available(&self, start: u64, gate: &Gate, platform: &Platform) -> bool {
        if !Self::applies_to(gate) {
            return true;
        }
        let end = start + gate.duration_cycles(platform.cycle_time()).max(1);
        self.lines_of(gate).all(|line| {
            let state = &self.lines[line];
            let overlaps = start < state.to && state.from < end;
            !overlaps || state.operation.as_deref() == Some(gate.name.as_str())
        })
    }

    fn reserve(&mut self, start: u64, gate: &Gate, platform: &Platform) {
        if !Self::applies_to(gate) {
            return;
        }
        let end = start + gate.duration_cycles(platform.cycle_time()).max(1);
        let lines: Vec<usize> = self.lines_of(gate).collect();
        for line in lines {
            let state = &mut self.lines[line];
            let same = state.operation.as_deref() == Some(gate.name.as_str());
            if same && start < state.to && state.from < end {
                state.from = state.from.min(start);
                state.to = state.to.max(end);
            } else {
                *state = LineState {
                    from: start,
                    to: end,
                    operation: Some(gate.name.clone()),
                };
            }
        }
    }

    fn busy_until(&self) -> u64 {
        self.lines.iter().map(|l| l.to).max().unwrap_or(0)
    }

    fn box_clone(&self) -> Box<dyn Resource> {
        Box::new(self.clone())
    }
}

/// All resources of a platform.
#[derive(Debug, Clone, Default)]
pub struct ResourceManager {
    resources: Vec<Box<dyn Resource>>,
}

impl ResourceManager {
    /// Build the resources configured for `platform`.
    pub fn new(platform: &Platform) -> PlatformResult<Self> {
        let config = platform.resources();
        let mut resources: Vec<Box<dyn Resource>> = Vec::new();
        if let Some(q) = &config.qubits {
            resources.push(Box::new(QubitResource::new(q.count)));
        }
        if let Some(cl) = &config.control_lines {
            resources.push(Box::new(ControlLineResource::new(
                &cl.groups,
                platform.qubit_count(),
            )?));
        }
        debug!(count = resources.len(), "resource manager created");
        Ok(Self { resources })
    }

    /// Add a resource.
    #[must_use]
    pub fn with_resource(mut self, resource: Box<dyn Resource>) -> Self {
        self.resources.push(resource);
        self
    }

    /// Whether no resource is tracked.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Names of the tracked resources.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|r| r.name())
    }

    /// Whether every resource admits `gate` at `start`.
    pub fn available(&self, start: u64, gate: &Gate, platform: &Platform) -> bool {
        self.resources
            .iter()
            .all(|r| r.available(start, gate, platform))
    }

    /// First cycle from which every resource admits every gate.
    pub fn busy_until(&self) -> u64 {
        self.resources
            .iter()
            .map(|r| r.busy_until())
            .max()
            .unwrap_or(0)
    }

    /// Reserve every resource for `gate` at `start`.
    pub fn reserve(&mut self, start: u64, gate: &Gate, platform: &Platform) {
        for r in &mut self.resources {
            r.reserve(start, gate, platform);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;

    fn platform() -> Platform {
        Platform::from_json(
            r#"{
                "hardware_settings": {"qubit_number": 4, "cycle_time": 20},
                "resources": {
                    "qubits": {"count": 4},
                    "control_lines": {"groups": [[0, 1], [2, 3]]}
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_qubit_resource() {
        let p = platform();
        let mut r = QubitResource::new(4);
        let g = Gate::custom("cz", vec![0, 1]).with_duration(40);
        assert!(r.available(1, &g, &p));
        r.reserve(1, &g, &p);
        assert!(!r.available(2, &g, &p));
        assert!(r.available(3, &g, &p));
        assert!(r.available(1, &Gate::custom("x", vec![2]), &p));
        assert_eq!(r.busy_until(), 3);
    }

    #[test]
    fn test_control_line_shares_same_operation() {
        let p = platform();
        let mut r = ControlLineResource::new(&[vec![0, 1], vec![2, 3]], 4).unwrap();
        let x0 = Gate::custom("x", vec![0]).with_duration(20);
        let x1 = Gate::custom("x", vec![1]).with_duration(20);
        let y1 = Gate::custom("y", vec![1]).with_duration(20);
        let y2 = Gate::custom("y", vec![2]).with_duration(20);

        r.reserve(1, &x0, &p);
        assert!(r.available(1, &x1, &p));
        assert!(!r.available(1, &y1, &p));
        assert!(r.available(2, &y1, &p));
        assert!(r.available(1, &y2, &p));
        assert_eq!(r.busy_until(), 2);
    }

    #[test]
    fn test_control_line_ignores_two_qubit_gates() {
        let p = platform();
        let mut r = ControlLineResource::new(&[vec![0, 1]], 4).unwrap();
        r.reserve(1, &Gate::custom("x", vec![0]).with_duration(20), &p);
        assert!(r.available(1, &Gate::custom("cz", vec![0, 1]).with_duration(40), &p));
    }

    #[test]
    fn test_control_line_rejects_bad_groups() {
        assert!(ControlLineResource::new(&[vec![0, 5]], 4).is_err());
        assert!(ControlLineResource::new(&[vec![0, 1], vec![1]], 4).is_err());
    }

    #[test]
    fn test_manager_clone_is_independent() {
        let p = platform();
        let mut rm = ResourceManager::new(&p).unwrap();
        assert_eq!(rm.names().collect::<Vec<_>>(), vec!["qubits", "control_lines"]);
        let x0 = Gate::custom("x", vec![0]).with_duration(20);
        let snapshot = rm.clone();
        rm.reserve(1, &x0, &p);
        assert!(!rm.available(1, &Gate::custom("x", vec![0]), &p));
        assert!(snapshot.available(1, &Gate::custom("x", vec![0]), &p));
        assert_eq!(rm.busy_until(), 2);
        assert_eq!(snapshot.busy_until(), 0);
    }
}
