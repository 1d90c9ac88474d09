//! Kernels and programs.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::Gate;

/// A straight-line sequence of gates over a fixed number of qubits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kernel {
    /// Kernel name.
    pub name: String,
    /// Number of qubits the gates may address.
    pub qubit_count: usize,
    /// Number of classical registers the gates may address.
    #[serde(default)]
    pub creg_count: usize,
    /// The gates, in program order.
    #[serde(default)]
    pub gates: Vec<Gate>,
    /// Whether every gate carries a valid start cycle.
    #[serde(default)]
    pub cycles_valid: bool,
}

impl Kernel {
    /// Create an empty kernel.
    pub fn new(name: impl Into<String>, qubit_count: usize, creg_count: usize) -> Self {
        Self {
            name: name.into(),
            qubit_count,
            creg_count,
            gates: Vec::new(),
            cycles_valid: false,
        }
    }

    /// Append a gate after checking its operands.
    pub fn push(&mut self, gate: Gate) -> IrResult<&mut Self> {
        self.check_gate(&gate)?;
        self.gates.push(gate);
        self.cycles_valid = false;
        Ok(self)
    }

    /// Check every gate's operands against the kernel's ranges.
    pub fn validate(&self) -> IrResult<()> {
        self.gates.iter().try_for_each(|g| self.check_gate(g))
    }

    fn check_gate(&self, gate: &Gate) -> IrResult<()> {
        for (i, &q) in gate.qubits.iter().enumerate() {
            if q >= self.qubit_count {
                return Err(IrError::QubitOutOfRange {
                    qubit: q,
                    qubit_count: self.qubit_count,
                    gate_name: gate.name.clone(),
                });
            }
            if gate.qubits[..i].contains(&q) {
                return Err(IrError::DuplicateQubit {
                    qubit: q,
                    gate_name: gate.name.clone(),
                });
            }
        }
        if let Some(&c) = gate.cregs.iter().find(|&&c| c >= self.creg_count) {
            return Err(IrError::CregOutOfRange {
                creg: c,
                creg_count: self.creg_count,
                gate_name: gate.name.clone(),
            });
        }
        Ok(())
    }

    /// Number of gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether the kernel has no gates.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Number of two-qubit gates.
    pub fn two_qubit_count(&self) -> usize {
        self.gates.iter().filter(|g| g.is_two_qubit()).count()
    }

    /// Length of the schedule in cycles: the latest end cycle over all gates.
    ///
    /// Returns 0 when the kernel has not been scheduled.
    pub fn depth(&self, cycle_time: u64) -> u64 {
        if !self.cycles_valid {
            return 0;
        }
        let first = self.gates.iter().filter_map(|g| g.cycle).min().unwrap_or(0);
        let end = self
            .gates
            .iter()
            .filter_map(|g| g.cycle.map(|c| c + g.duration_cycles(cycle_time)))
            .max()
            .unwrap_or(0);
        end.saturating_sub(first)
    }
}

/// A sequence of kernels mapped one after the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Program name.
    pub name: String,
    /// Kernels in execution order.
    pub kernels: Vec<Kernel>,
}

impl Program {
    /// Check every kernel.
    pub fn validate(&self) -> IrResult<()> {
        self.kernels.iter().try_for_each(Kernel::validate)
    }
}
