//! Topology section of a platform description.
//!
//! These types are the configuration as written. They are checked when the
//! mapper builds its grid from them, so unknown connectivity modes or
//! out-of-range ids survive deserialization and are reported with context
//! there.

use serde::{Deserialize, Serialize};

/// Position of a qubit on a 2-D layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QubitCoord {
    /// Qubit index.
    pub id: usize,
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
}

/// A directed coupling edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Optional edge id, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<usize>,
    /// Source qubit.
    pub src: usize,
    /// Destination qubit.
    pub dst: usize,
}

impl Edge {
    /// Create an edge without id.
    pub fn new(src: usize, dst: usize) -> Self {
        Self { id: None, src, dst }
    }
}

fn default_cores() -> usize {
    1
}

/// Qubit connectivity of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// `"xy"` or `"irregular"`; defaults to `"xy"` when coordinates are given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    /// Number of columns of the layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_size: Option<i64>,
    /// Number of rows of the layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_size: Option<i64>,
    /// Qubit coordinates, one per qubit for the `"xy"` form.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qubits: Vec<QubitCoord>,
    /// Number of cores the qubits are evenly partitioned over.
    #[serde(default = "default_cores")]
    pub number_of_cores: usize,
    /// `"specified"` (use `edges`) or `"full"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connectivity: Option<String>,
    /// Coupling edges; both directions must be listed for symmetric coupling.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<Edge>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            form: None,
            x_size: None,
            y_size: None,
            qubits: Vec::new(),
            number_of_cores: 1,
            connectivity: None,
            edges: Vec::new(),
        }
    }
}

impl TopologyConfig {
    /// A linear chain `0 - 1 - ... - n-1` laid out on one row.
    pub fn linear(n: usize) -> Self {
        let qubits = (0..n)
            .map(|i| QubitCoord {
                id: i,
                x: i as i64,
                y: 0,
            })
            .collect();
        Self {
            form: Some("xy".into()),
            x_size: Some(n as i64),
            y_size: Some(1),
            qubits,
            edges: bidirectional((1..n).map(|i| (i - 1, i))),
            ..Self::default()
        }
    }

    /// A ring `0 - 1 - ... - n-1 - 0` without coordinates; `n` must be at least 3.
    pub fn ring(n: usize) -> Self {
        Self {
            form: Some("irregular".into()),
            edges: bidirectional((0..n).map(|i| (i, (i + 1) % n))),
            ..Self::default()
        }
    }

    /// A `rows x cols` nearest-neighbour grid, qubit `r * cols + c` at `(c, r)`.
    pub fn grid(rows: usize, cols: usize) -> Self {
        let mut qubits = Vec::with_capacity(rows * cols);
        let mut pairs = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let idx = r * cols + c;
                qubits.push(QubitCoord {
                    id: idx,
                    x: c as i64,
                    y: r as i64,
                });
                if c + 1 < cols {
                    pairs.push((idx, idx + 1));
                }
                if r + 1 < rows {
                    pairs.push((idx, idx + cols));
                }
            }
        }
        Self {
            form: Some("xy".into()),
            x_size: Some(cols as i64),
            y_size: Some(rows as i64),
            qubits,
            edges: bidirectional(pairs),
            ..Self::default()
        }
    }

    /// All-to-all connectivity.
    pub fn full() -> Self {
        Self {
            form: Some("irregular".into()),
            connectivity: Some("full".into()),
            ..Self::default()
        }
    }

    /// Set the number of cores.
    #[must_use]
    pub fn with_cores(mut self, cores: usize) -> Self {
        self.number_of_cores = cores;
        self
    }
}

fn bidirectional(pairs: impl IntoIterator<Item = (usize, usize)>) -> Vec<Edge> {
    pairs
        .into_iter()
        .flat_map(|(a, b)| [Edge::new(a, b), Edge::new(b, a)])
        .collect()
}
