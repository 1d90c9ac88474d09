//! Candidate routes.
//!
//! An [`Alter`] is one way to make a blocked two-qubit gate executable: a
//! shortest path between its physical operands, cut at one hop. The part
//! before the cut is walked from the source, the part after it from the
//! target; each step of either walk becomes a swap (or move) and the gate
//! itself ends up on the hop at the cut.
//!
//! ```text
//! path:          2 -> 5 -> 7 -> 3 -> 1 -> 4
//! cut at 3-1:    from_source = [2, 5, 7, 3]   from_target = [4, 1]
//! ```

use qmap_ir::GateId;
use tracing::trace;

use crate::context::MapContext;
use crate::error::{MapError, MapResult};
use crate::grid::{Grid, UNREACHABLE};
use crate::options::{PathSelect, SelectSwaps};
use crate::past::Past;

/// Which shortest paths to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhichPaths {
    /// Every shortest path.
    AllShortest,
    /// Only paths that keep to the left-most way out.
    Left,
    /// Only paths that keep to the right-most way out.
    Right,
    /// The left-most and the right-most path.
    LeftRight,
}

/// A candidate route for one two-qubit gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alter {
    target: GateId,
    total: Vec<usize>,
    from_source: Vec<usize>,
    from_target: Vec<usize>,
    score: Option<u64>,
}

impl Alter {
    fn new(target: GateId, total: Vec<usize>) -> Self {
        Self {
            target,
            total,
            from_source: Vec::new(),
            from_target: Vec::new(),
            score: None,
        }
    }

    /// Generate every candidate for `target`, whose operands sit on `src`
    /// and `tgt`.
    ///
    /// Paths are as long as [`Grid::min_hops`] allows and are restricted by
    /// the path selection option. Fails when the qubits are disconnected or
    /// every hop of every path crosses cores.
    pub fn generate(
        ctx: MapContext<'_>,
        target: GateId,
        src: usize,
        tgt: usize,
    ) -> MapResult<Vec<Alter>> {
        let budget = ctx.grid.min_hops(src, tgt);
        if budget == UNREACHABLE {
            return Err(MapError::NoRoute { src, tgt });
        }
        let which = match ctx.options.path_select {
            PathSelect::All => WhichPaths::AllShortest,
            PathSelect::Borders => WhichPaths::LeftRight,
        };
        let alters: Vec<Alter> = generate_shortest_paths(ctx.grid, target, src, tgt, budget, which)
            .iter()
            .flat_map(|a| a.split(ctx.grid))
            .collect();
        trace!(target, src, tgt, budget, count = alters.len(), "alternatives generated");
        if alters.is_empty() {
            return Err(MapError::NoRoute { src, tgt });
        }
        Ok(alters)
    }

    /// The gate this route is for.
    pub fn target(&self) -> GateId {
        self.target
    }

    /// The whole path, source first.
    pub fn path(&self) -> &[usize] {
        &self.total
    }

    /// Swap chain walked from the source, empty before splitting.
    pub fn from_source(&self) -> &[usize] {
        &self.from_source
    }

    /// Swap chain walked from the target, empty before splitting.
    pub fn from_target(&self) -> &[usize] {
        &self.from_target
    }

    /// Cycle extension, once scored.
    pub fn score(&self) -> Option<u64> {
        self.score
    }

    pub(crate) fn set_score(&mut self, score: Option<u64>) {
        self.score = score;
    }

    /// Number of swaps the route needs in full.
    pub fn swap_count(&self) -> usize {
        self.from_source.len().saturating_sub(1) + self.from_target.len().saturating_sub(1)
    }

    /// Every way to cut the path at one hop.
    ///
    /// Cuts are produced from the target end towards the source. Inter-core
    /// hops cannot host the gate and yield no candidate.
    pub fn split(&self, grid: &Grid) -> Vec<Alter> {
        let length = self.total.len();
        debug_assert!(length >= 2);
        let mut out = Vec::with_capacity(length.saturating_sub(1));
        for right in (1..length).rev() {
            let left = right - 1;
            if grid.is_inter_core_hop(self.total[left], self.total[right]) {
                continue;
            }
            let mut alter = self.clone();
            alter.from_source = self.total[..=left].to_vec();
            alter.from_target = self.total[right..].iter().rev().copied().collect();
            out.push(alter);
        }
        out
    }

    /// Add the route's swaps to `past` and schedule them.
    ///
    /// [`SelectSwaps::One`] adds only the first swap, walking the source
    /// chain before the target chain; [`SelectSwaps::Earliest`] adds the
    /// first swap of whichever chain would start first.
    pub fn add_swaps(&self, past: &mut Past, mode: SelectSwaps, ctx: MapContext<'_>) -> MapResult<()> {
        match mode {
            SelectSwaps::One | SelectSwaps::All => {
                let limit = if mode == SelectSwaps::One { 1 } else { usize::MAX };
                let hops = self
                    .from_source
                    .windows(2)
                    .chain(self.from_target.windows(2))
                    .take(limit);
                for hop in hops {
                    past.add_swap(ctx, hop[0], hop[1])?;
                }
            }
            SelectSwaps::Earliest => {
                let s = &self.from_source;
                let t = &self.from_target;
                match (s.len() >= 2, t.len() >= 2) {
                    (true, true) => {
                        if past.is_first_swap_earliest(ctx, (s[0], s[1]), (t[0], t[1])) {
                            past.add_swap(ctx, s[0], s[1])?;
                        } else {
                            past.add_swap(ctx, t[0], t[1])?;
                        }
                    }
                    (true, false) => past.add_swap(ctx, s[0], s[1])?,
                    (false, true) => past.add_swap(ctx, t[0], t[1])?,
                    (false, false) => {}
                }
            }
        }
        past.schedule(ctx);
        Ok(())
    }

    /// Score the route: add all its swaps to a fork of `current` and record
    /// how far the result extends beyond `base`.
    pub fn extend(&mut self, current: &Past, base: &Past, ctx: MapContext<'_>) -> MapResult<()> {
        let mut past = current.fork();
        self.add_swaps(&mut past, SelectSwaps::All, ctx)?;
        let score = past.max_free_cycle().saturating_sub(base.max_free_cycle());
        trace!(target = self.target, path = ?self.total, score, "alternative scored");
        self.score = Some(score);
        Ok(())
    }
}

/// Every path from `src` to `tgt` of at most `budget` hops, as unsplit
/// alternatives for `target`.
pub fn generate_shortest_paths(
    grid: &Grid,
    target: GateId,
    src: usize,
    tgt: usize,
    budget: usize,
    which: WhichPaths,
) -> Vec<Alter> {
    paths(grid, src, tgt, budget, which)
        .into_iter()
        .map(|total| Alter::new(target, total))
        .collect()
}

fn paths(grid: &Grid, src: usize, tgt: usize, budget: usize, which: WhichPaths) -> Vec<Vec<usize>> {
    if src == tgt {
        return vec![vec![src]];
    }

    let mut nbs: Vec<usize> = grid
        .neighbors(src)
        .iter()
        .copied()
        .filter(|&n| grid.distance(n, tgt) < budget)
        .collect();
    grid.normalize(src, &mut nbs);

    let (Some(&front), Some(&back)) = (nbs.first(), nbs.last()) else {
        return Vec::new();
    };
    match which {
        WhichPaths::AllShortest => {}
        WhichPaths::Left => nbs.retain(|&n| n == front),
        WhichPaths::Right => nbs.retain(|&n| n == back),
        WhichPaths::LeftRight => nbs.retain(|&n| n == front || n == back),
    }

    let mut out = Vec::new();
    for &n in &nbs {
        let next = if which == WhichPaths::LeftRight && nbs.len() != 1 {
            if n == front {
                WhichPaths::Left
            } else {
                WhichPaths::Right
            }
        } else {
            which
        };
        for mut path in paths(grid, n, tgt, budget - 1, next) {
            path.insert(0, src);
            out.push(path);
        }
    }
    out
}
