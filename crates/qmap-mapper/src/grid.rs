//! Physical qubit topology.
//!
//! A [`Grid`] is built once per platform from its `topology` section and is
//! read-only afterwards. It holds, per physical qubit, the ordered neighbour
//! list and the all-pairs hop distances, plus the optional 2-D layout and
//! core partition.
//!
//! ## Neighbour order
//!
//! With coordinates, each neighbour list is sorted by clockwise angle
//! around its qubit, starting at 12 o'clock. [`Grid::normalize`] rotates a
//! list so that the widest angular gap falls at the wrap-around; path
//! enumeration uses this to tell the left-most from the right-most way out.
//! Without coordinates, lists keep the configured edge order.

use std::f64::consts::TAU;

use qmap_platform::{Platform, TopologyConfig};
use tracing::debug;

use crate::error::{MapError, MapResult};

/// Distance between qubits that are not connected.
pub const UNREACHABLE: usize = usize::MAX / 4;

/// Layout form of a topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridForm {
    /// Every qubit has an `(x, y)` coordinate.
    Xy,
    /// Only connectivity is known.
    Irregular,
}

/// Immutable connectivity model of a device.
#[derive(Debug, Clone)]
pub struct Grid {
    qubit_count: usize,
    form: GridForm,
    coords: Vec<(i64, i64)>,
    neighbors: Vec<Vec<usize>>,
    dist: Vec<Vec<usize>>,
    cores: usize,
}

impl Grid {
    /// Build the grid of a platform, checking its topology.
    pub fn new(platform: &Platform) -> MapResult<Self> {
        Self::from_topology(platform.topology(), platform.qubit_count())
    }

    /// Build a grid for `qubit_count` qubits from a topology section.
    pub fn from_topology(topology: &TopologyConfig, qubit_count: usize) -> MapResult<Self> {
        let form = match topology.form.as_deref() {
            None if topology.qubits.is_empty() => GridForm::Irregular,
            None | Some("xy") => GridForm::Xy,
            Some("irregular") => GridForm::Irregular,
            Some(other) => return Err(MapError::UnknownForm(other.to_string())),
        };

        let coords = match form {
            GridForm::Xy => init_coords(topology, qubit_count)?,
            GridForm::Irregular => Vec::new(),
        };
        let mut neighbors = init_neighbors(topology, qubit_count)?;

        let cores = topology.number_of_cores;
        if cores == 0 || qubit_count % cores != 0 {
            return Err(MapError::InvalidCores { cores, qubit_count });
        }

        if form == GridForm::Xy {
            for (q, nbs) in neighbors.iter_mut().enumerate() {
                let (cx, cy) = coords[q];
                nbs.sort_by(|&a, &b| {
                    angle(cx, cy, coords[a].0, coords[a].1)
                        .total_cmp(&angle(cx, cy, coords[b].0, coords[b].1))
                });
            }
        }

        let dist = floyd_warshall(&neighbors);
        debug!(
            qubits = qubit_count,
            form = ?form,
            cores,
            edges = neighbors.iter().map(Vec::len).sum::<usize>(),
            "grid built"
        );

        Ok(Self {
            qubit_count,
            form,
            coords,
            neighbors,
            dist,
            cores,
        })
    }

    /// Number of physical qubits.
    pub fn qubit_count(&self) -> usize {
        self.qubit_count
    }

    /// Layout form.
    pub fn form(&self) -> GridForm {
        self.form
    }

    /// Whether qubits have 2-D coordinates.
    pub fn has_coordinates(&self) -> bool {
        self.form == GridForm::Xy
    }

    /// Coordinate of `q`, if the layout has them.
    pub fn coordinate(&self, q: usize) -> Option<(i64, i64)> {
        self.coords.get(q).copied()
    }

    /// Number of cores.
    pub fn core_count(&self) -> usize {
        self.cores
    }

    /// Core that `q` belongs to.
    pub fn core_of(&self, q: usize) -> usize {
        if self.cores == 1 {
            return 0;
        }
        q / (self.qubit_count / self.cores)
    }

    /// Whether the hop `a -> b` crosses cores.
    pub fn is_inter_core_hop(&self, a: usize, b: usize) -> bool {
        self.core_of(a) != self.core_of(b)
    }

    /// Hop distance, [`UNREACHABLE`] when disconnected.
    #[inline]
    pub fn distance(&self, from: usize, to: usize) -> usize {
        self.dist[from][to]
    }

    /// Whether `a` and `b` are nearest neighbours.
    #[inline]
    pub fn is_adjacent(&self, a: usize, b: usize) -> bool {
        self.dist[a][b] == 1
    }

    /// Minimum number of hops needed to execute a two-qubit gate on `from`
    /// and `to`.
    ///
    /// An inter-core hop cannot host the gate, so when every shortest hop is
    /// inter-core one extra hop is needed.
    pub fn min_hops(&self, from: usize, to: usize) -> usize {
        let d = self.distance(from, to);
        if self.cores == 1 || d == UNREACHABLE {
            return d;
        }
        let core_distance = usize::from(self.is_inter_core_hop(from, to));
        if core_distance == d { d + 1 } else { d }
    }

    /// Neighbours of `q`, in clockwise order when coordinates exist.
    pub fn neighbors(&self, q: usize) -> &[usize] {
        &self.neighbors[q]
    }

    /// Rotate `nbs`, a subset of `src`'s neighbours in angle order, so that
    /// the widest angular gap lies between its last and first element.
    ///
    /// Leaves the list unchanged without coordinates.
    pub fn normalize(&self, src: usize, nbs: &mut [usize]) {
        if self.form != GridForm::Xy || nbs.len() <= 1 {
            return;
        }
        let (cx, cy) = self.coords[src];
        let angles: Vec<f64> = nbs
            .iter()
            .map(|&n| angle(cx, cy, self.coords[n].0, self.coords[n].1))
            .collect();

        let mut max_gap = 0.0;
        let mut start = 0;
        for i in 0..nbs.len() {
            let next = (i + 1) % nbs.len();
            let mut gap = angles[next] - angles[i];
            if gap < 0.0 {
                gap += TAU;
            }
            if gap > max_gap {
                max_gap = gap;
                start = next;
            }
        }
        nbs.rotate_left(start);
    }
}

/// Clockwise angle of `(x, y)` around `(cx, cy)`, 0 at 12 o'clock, in `[0, 2pi)`.
fn angle(cx: i64, cy: i64, x: i64, y: i64) -> f64 {
    let a = ((x - cx) as f64).atan2((y - cy) as f64);
    if a < 0.0 { a + TAU } else { a }
}

fn init_coords(topology: &TopologyConfig, qubit_count: usize) -> MapResult<Vec<(i64, i64)>> {
    if topology.qubits.is_empty() {
        return Err(MapError::MissingCoordinates);
    }
    if topology.qubits.len() != qubit_count {
        return Err(MapError::CoordinateCountMismatch {
            listed: topology.qubits.len(),
            qubit_count,
        });
    }
    let x_size = topology
        .x_size
        .unwrap_or_else(|| topology.qubits.iter().map(|c| c.x + 1).max().unwrap_or(0));
    let y_size = topology
        .y_size
        .unwrap_or_else(|| topology.qubits.iter().map(|c| c.y + 1).max().unwrap_or(0));

    let mut coords: Vec<Option<(i64, i64)>> = vec![None; qubit_count];
    for c in &topology.qubits {
        let slot = coords.get_mut(c.id).ok_or(MapError::QubitOutOfRange {
            qubit: c.id,
            qubit_count,
        })?;
        if slot.is_some() {
            return Err(MapError::DuplicateCoordinate(c.id));
        }
        if !(0..x_size).contains(&c.x) || !(0..y_size).contains(&c.y) {
            return Err(MapError::CoordinateOutOfRange {
                qubit: c.id,
                x: c.x,
                y: c.y,
                x_size,
                y_size,
            });
        }
        *slot = Some((c.x, c.y));
    }
    // as many entries as qubits and no duplicates, so every slot is filled
    Ok(coords.into_iter().flatten().collect())
}

fn init_neighbors(topology: &TopologyConfig, qubit_count: usize) -> MapResult<Vec<Vec<usize>>> {
    let mut neighbors = vec![Vec::new(); qubit_count];
    match topology.connectivity.as_deref() {
        None | Some("specified") => {
            if topology.edges.is_empty() {
                return Err(MapError::MissingEdges);
            }
            for edge in &topology.edges {
                for q in [edge.src, edge.dst] {
                    if q >= qubit_count {
                        return Err(MapError::QubitOutOfRange { qubit: q, qubit_count });
                    }
                }
                let nbs: &mut Vec<usize> = &mut neighbors[edge.src];
                if nbs.contains(&edge.dst) {
                    return Err(MapError::DuplicateEdge {
                        src: edge.src,
                        dst: edge.dst,
                    });
                }
                nbs.push(edge.dst);
            }
        }
        Some("full") => {
            for (src, nbs) in neighbors.iter_mut().enumerate() {
                nbs.extend((0..qubit_count).filter(|&dst| dst != src));
            }
        }
        Some(other) => return Err(MapError::UnknownConnectivity(other.to_string())),
    }
    Ok(neighbors)
}

fn floyd_warshall(neighbors: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = neighbors.len();
    let mut dist = vec![vec![UNREACHABLE; n]; n];
    for (i, nbs) in neighbors.iter().enumerate() {
        dist[i][i] = 0;
        for &j in nbs {
            dist[i][j] = 1;
        }
    }
    for k in 0..n {
        for i in 0..n {
            let dik = dist[i][k];
            if dik == UNREACHABLE {
                continue;
            }
            for j in 0..n {
                let through = dik + dist[k][j];
                if through < dist[i][j] {
                    dist[i][j] = through;
                }
            }
        }
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmap_platform::{Edge, QubitCoord};

    fn grid(topology: TopologyConfig, n: usize) -> Grid {
        Grid::from_topology(&topology, n).unwrap()
    }

    #[test]
    fn test_linear_distances() {
        let g = grid(TopologyConfig::linear(4), 4);
        assert_eq!(g.distance(0, 3), 3);
        assert_eq!(g.distance(3, 0), 3);
        assert_eq!(g.distance(2, 2), 0);
        assert!(g.is_adjacent(1, 2));
        assert_eq!(g.min_hops(0, 3), 3);
    }

    #[test]
    fn test_ring_without_coordinates() {
        let g = grid(TopologyConfig::ring(4), 4);
        assert!(!g.has_coordinates());
        assert_eq!(g.distance(0, 2), 2);
        assert_eq!(g.neighbors(0), &[1, 3]);
    }

    #[test]
    fn test_directed_edges() {
        let mut t = TopologyConfig::ring(3);
        t.edges = vec![Edge::new(0, 1), Edge::new(1, 2)];
        let g = grid(t, 3);
        assert_eq!(g.distance(0, 2), 2);
        assert_eq!(g.distance(2, 0), UNREACHABLE);
    }

    #[test]
    fn test_full_connectivity() {
        let g = grid(TopologyConfig::full(), 5);
        assert!((0..5).all(|i| (0..5).all(|j| g.distance(i, j) == usize::from(i != j))));
    }

    #[test]
    fn test_neighbors_sorted_clockwise() {
        // 3x3 grid, centre qubit 4 at (1, 1); y grows downwards in the layout
        let g = grid(TopologyConfig::grid(3, 3), 9);
        // angles: 7 (below, 0), 5 (right, pi/2), 1 (above, pi), 3 (left, 3pi/2)
        assert_eq!(g.neighbors(4), &[7, 5, 1, 3]);
    }

    #[test]
    fn test_normalize_moves_gap_to_wrap() {
        let g = grid(TopologyConfig::grid(3, 3), 9);
        // 7 at 0 and 3 at 3pi/2: widest gap is from 7 to 3, so 3 comes first
        let mut nbs = vec![7, 3];
        g.normalize(4, &mut nbs);
        assert_eq!(nbs, vec![3, 7]);

        let mut nbs = vec![7, 5];
        g.normalize(4, &mut nbs);
        assert_eq!(nbs, vec![7, 5]);
    }

    #[test]
    fn test_multi_core_min_hops() {
        // two cores of two qubits: 0,1 | 2,3, chain 0-1-2-3
        let t = TopologyConfig::linear(4).with_cores(2);
        let g = grid(t, 4);
        assert_eq!(g.core_of(1), 0);
        assert_eq!(g.core_of(2), 1);
        assert!(g.is_inter_core_hop(1, 2));
        assert_eq!(g.min_hops(1, 2), 2);
        assert_eq!(g.min_hops(0, 1), 1);
        assert_eq!(g.min_hops(0, 2), 2);
    }

    #[test]
    fn test_rejects_malformed_topologies() {
        let mut t = TopologyConfig::linear(3);
        t.qubits[2] = QubitCoord { id: 1, x: 2, y: 0 };
        assert!(matches!(
            Grid::from_topology(&t, 3),
            Err(MapError::DuplicateCoordinate(1))
        ));

        let mut t = TopologyConfig::linear(3);
        t.qubits[2].x = 7;
        assert!(matches!(
            Grid::from_topology(&t, 3),
            Err(MapError::CoordinateOutOfRange { qubit: 2, .. })
        ));

        let t = TopologyConfig::linear(3);
        assert!(matches!(
            Grid::from_topology(&t, 4),
            Err(MapError::CoordinateCountMismatch { listed: 3, qubit_count: 4 })
        ));

        let mut t = TopologyConfig::ring(3);
        t.edges.push(Edge::new(0, 1));
        assert!(matches!(
            Grid::from_topology(&t, 3),
            Err(MapError::DuplicateEdge { src: 0, dst: 1 })
        ));

        let mut t = TopologyConfig::ring(3);
        t.edges.push(Edge::new(0, 9));
        assert!(matches!(
            Grid::from_topology(&t, 3),
            Err(MapError::QubitOutOfRange { qubit: 9, .. })
        ));

        let mut t = TopologyConfig::ring(3);
        t.connectivity = Some("sparse".into());
        assert!(matches!(
            Grid::from_topology(&t, 3),
            Err(MapError::UnknownConnectivity(_))
        ));

        let mut t = TopologyConfig::ring(3);
        t.edges.clear();
        assert!(matches!(Grid::from_topology(&t, 3), Err(MapError::MissingEdges)));

        let mut t = TopologyConfig::ring(3);
        t.form = Some("xy".into());
        assert!(matches!(
            Grid::from_topology(&t, 3),
            Err(MapError::MissingCoordinates)
        ));

        let t = TopologyConfig::ring(3).with_cores(2);
        assert!(matches!(
            Grid::from_topology(&t, 3),
            Err(MapError::InvalidCores { cores: 2, .. })
        ));
    }
}
