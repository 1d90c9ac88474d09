//! Dependency graph of a kernel.
//!
//! The graph has one node per gate plus a `SOURCE` and a `SINK` boundary
//! node. A gate depends on the previous gate on each of its wires (qubits
//! and classical registers). Gates without any operand act as barriers:
//! they depend on every open wire and every later gate depends on them.
//!
//! Besides the structure, each node records its *remaining* length: the
//! number of cycles on the longest path from the start of that gate to the
//! sink. This is the criticality measure used to order lookahead.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

use crate::gate::Gate;
use crate::kernel::Kernel;

/// Index of a gate in a [`DependencyGraph`].
pub type GateId = usize;

/// Identifier for a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum WireId {
    Qubit(usize),
    Creg(usize),
}

/// Gate dependencies of one kernel.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<GateId, ()>,
    nodes: Vec<NodeIndex>,
    gates: Vec<Gate>,
    remaining: Vec<u64>,
    source: GateId,
    sink: GateId,
}

impl DependencyGraph {
    /// Build the graph for a kernel.
    ///
    /// Gate ids `0..kernel.len()` are the kernel's gates in program order;
    /// the source and sink follow.
    pub fn build(kernel: &Kernel, cycle_time: u64) -> Self {
        let n = kernel.gates.len();
        let mut gates = kernel.gates.clone();
        gates.push(Gate::dummy("SOURCE"));
        gates.push(Gate::dummy("SINK"));
        let source = n;
        let sink = n + 1;

        let mut graph = DiGraph::with_capacity(n + 2, 2 * n + 2);
        let nodes: Vec<NodeIndex> = (0..n + 2).map(|id| graph.add_node(id)).collect();

        let mut last: FxHashMap<WireId, GateId> = FxHashMap::default();
        let mut barrier = source;

        for (id, gate) in kernel.gates.iter().enumerate() {
            let wires: Vec<WireId> = gate
                .qubits
                .iter()
                .map(|&q| WireId::Qubit(q))
                .chain(gate.cregs.iter().map(|&c| WireId::Creg(c)))
                .collect();

            if wires.is_empty() {
                graph.update_edge(nodes[barrier], nodes[id], ());
                for &prev in last.values() {
                    graph.update_edge(nodes[prev], nodes[id], ());
                }
                last.clear();
                barrier = id;
                continue;
            }

            for wire in wires {
                let prev = last.get(&wire).copied().unwrap_or(barrier);
                graph.update_edge(nodes[prev], nodes[id], ());
                last.insert(wire, id);
            }
        }

        // close every gate without successors onto the sink
        for id in 0..n {
            if graph
                .neighbors_directed(nodes[id], Direction::Outgoing)
                .next()
                .is_none()
            {
                graph.update_edge(nodes[id], nodes[sink], ());
            }
        }
        if n == 0 {
            graph.update_edge(nodes[source], nodes[sink], ());
        }

        // gate order is a topological order, so one reverse sweep suffices
        let mut remaining = vec![0u64; n + 2];
        for id in (0..n).rev().chain(std::iter::once(source)) {
            let tail = graph
                .neighbors_directed(nodes[id], Direction::Outgoing)
                .map(|s| remaining[graph[s]])
                .max()
                .unwrap_or(0);
            remaining[id] = tail + gates[id].duration_cycles(cycle_time);
        }

        Self {
            graph,
            nodes,
            gates,
            remaining,
            source,
            sink,
        }
    }

    /// Number of nodes, boundary nodes included.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether the graph has no nodes; the boundary nodes make this false.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// The source boundary node.
    pub fn source(&self) -> GateId {
        self.source
    }

    /// The sink boundary node.
    pub fn sink(&self) -> GateId {
        self.sink
    }

    /// The gate with the given id.
    pub fn gate(&self, id: GateId) -> &Gate {
        &self.gates[id]
    }

    /// Number of direct predecessors.
    pub fn in_degree(&self, id: GateId) -> usize {
        self.graph
            .neighbors_directed(self.nodes[id], Direction::Incoming)
            .count()
    }

    /// Direct successors, in program order.
    pub fn successors(&self, id: GateId) -> impl Iterator<Item = GateId> + '_ {
        let mut ids: Vec<GateId> = self
            .graph
            .neighbors_directed(self.nodes[id], Direction::Outgoing)
            .map(|n| self.graph[n])
            .collect();
        ids.sort_unstable();
        ids.into_iter()
    }

    /// Cycles on the longest path from the start of `id` to the sink.
    pub fn remaining(&self, id: GateId) -> u64 {
        self.remaining[id]
    }
}
