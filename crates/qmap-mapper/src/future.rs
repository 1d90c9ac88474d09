//! Lookahead window.
//!
//! A [`Future`] presents the gates of a kernel that may be mapped next.
//! Without lookahead that is exactly the next gate in program order. With
//! lookahead it is the frontier of the kernel's [`DependencyGraph`]: every
//! gate whose predecessors have all been mapped, most critical first.
//!
//! Gates are identified by their [`GateId`] in the kernel. A `Future` is
//! cheap to clone: the gates and the graph are shared.

use std::sync::Arc;

use qmap_ir::{DependencyGraph, Gate, GateId, Kernel};

use crate::context::MapContext;
use crate::error::{MapError, MapResult};

#[derive(Debug, Clone)]
enum Input {
    Cursor {
        gates: Arc<[Gate]>,
        next: usize,
    },
    Graph {
        dag: Arc<DependencyGraph>,
        pending: Vec<usize>,
        available: Vec<GateId>,
    },
}

/// The not yet mapped part of a kernel.
#[derive(Debug, Clone)]
pub struct Future {
    input: Input,
}

impl Future {
    /// Present `kernel` according to the lookahead option.
    pub fn new(kernel: &Kernel, ctx: MapContext<'_>) -> Self {
        let input = if ctx.options.lookahead.uses_dependency_graph() {
            let dag = DependencyGraph::build(kernel, ctx.cycle_time());
            let pending = (0..dag.len()).map(|id| dag.in_degree(id)).collect();
            Input::Graph {
                available: vec![dag.source()],
                pending,
                dag: Arc::new(dag),
            }
        } else {
            Input::Cursor {
                gates: kernel.gates.clone().into(),
                next: 0,
            }
        };
        Self { input }
    }

    /// The gate with the given id.
    pub fn gate(&self, id: GateId) -> &Gate {
        match &self.input {
            Input::Cursor { gates, .. } => &gates[id],
            Input::Graph { dag, .. } => dag.gate(id),
        }
    }

    /// Available gates that do not act on qubits: classical operations and
    /// graph boundaries.
    pub fn non_quantum_gates(&self) -> Vec<GateId> {
        self.available()
            .into_iter()
            .filter(|&id| !self.gate(id).is_quantum())
            .collect()
    }

    /// All available gates, most critical first.
    ///
    /// Fails on a gate with more than two qubit operands.
    pub fn gates(&self) -> MapResult<Vec<GateId>> {
        let ids = self.available();
        for &id in &ids {
            let gate = self.gate(id);
            if gate.qubits.len() > 2 {
                return Err(MapError::TooManyOperands {
                    gate: gate.to_string(),
                    operands: gate.qubits.len(),
                });
            }
        }
        Ok(ids)
    }

    /// Whether every gate has been mapped.
    pub fn is_empty(&self) -> bool {
        self.available().is_empty()
    }

    /// Take a mapped gate out and make its successors available.
    pub fn done(&mut self, id: GateId) {
        match &mut self.input {
            Input::Cursor { next, .. } => {
                debug_assert_eq!(*next, id);
                *next += 1;
            }
            Input::Graph {
                dag,
                pending,
                available,
            } => {
                if let Some(pos) = available.iter().position(|&a| a == id) {
                    available.remove(pos);
                }
                for succ in dag.successors(id) {
                    pending[succ] -= 1;
                    if pending[succ] == 0 {
                        let remaining = dag.remaining(succ);
                        let at = available
                            .iter()
                            .position(|&a| dag.remaining(a) < remaining)
                            .unwrap_or(available.len());
                        available.insert(at, succ);
                    }
                }
            }
        }
    }

    /// The most critical of `ids`: longest remaining path, first among
    /// equals. Without lookahead simply the first.
    pub fn most_critical(&self, ids: &[GateId]) -> Option<GateId> {
        match &self.input {
            Input::Cursor { .. } => ids.first().copied(),
            Input::Graph { dag, .. } => ids.iter().copied().reduce(|best, id| {
                if dag.remaining(id) > dag.remaining(best) {
                    id
                } else {
                    best
                }
            }),
        }
    }

    fn available(&self) -> Vec<GateId> {
        match &self.input {
            Input::Cursor { gates, next } => {
                if *next < gates.len() {
                    vec![*next]
                } else {
                    Vec::new()
                }
            }
            Input::Graph { available, .. } => available.clone(),
        }
    }
}
