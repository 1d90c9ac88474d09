//! Initial placement.
//!
//! Before routing, the virtual qubits of a kernel can be placed so that the
//! two-qubit gates it contains are as close as possible. This is a
//! quadratic assignment problem: put facility `i` (a used virtual qubit) on
//! location `k` (a physical qubit) minimising
//!
//! ```text
//! sum over i, j of refcount[i][j] * (distance(loc(i), loc(j)) - 1)
//! ```
//!
//! where `refcount[i][j]` counts the two-qubit gates between `i` and `j`.
//!
//! Solving is delegated to a [`PlacementSolver`]. It runs on the blocking
//! thread pool and, with a time limit, under a timeout. A solver that
//! overruns is left to finish on its own; its result is dropped and the
//! mapping it was asked to improve is left as it was.

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::Instant;

use qmap_ir::Gate;
use serde::{Deserialize, Serialize};
use tokio::task;
use tracing::{debug, info, warn};

use crate::error::{MapError, MapResult};
use crate::grid::Grid;
use crate::options::{InitialPlace, MapperOptions};
use crate::virt2real::Virt2Real;

/// Result of an initial placement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceOutcome {
    /// No two-qubit gates; any mapping will do.
    Any,
    /// The current mapping already makes every two-qubit gate adjacent.
    Current,
    /// A new mapping was found and installed.
    NewMap,
    /// The solver found no mapping.
    Failed,
    /// The solver did not finish in time.
    TimedOut,
}

impl fmt::Display for PlaceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlaceOutcome::Any => "any",
            PlaceOutcome::Current => "current",
            PlaceOutcome::NewMap => "newmap",
            PlaceOutcome::Failed => "failed",
            PlaceOutcome::TimedOut => "timedout",
        };
        write!(f, "{s}")
    }
}

/// One placement problem, owned so that it can move to another thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementProblem {
    /// Two-qubit gate counts between facilities.
    pub refcount: Vec<Vec<u64>>,
    /// Hop distances between locations.
    pub distance: Vec<Vec<usize>>,
}

impl PlacementProblem {
    /// Number of facilities.
    pub fn facilities(&self) -> usize {
        self.refcount.len()
    }

    /// Number of locations.
    pub fn locations(&self) -> usize {
        self.distance.len()
    }

    /// Objective value of an assignment, `locs[i]` being the location of
    /// facility `i`.
    pub fn cost(&self, locs: &[usize]) -> u64 {
        let mut total = 0u64;
        for (i, row) in self.refcount.iter().enumerate() {
            for (j, &count) in row.iter().enumerate() {
                if count == 0 {
                    continue;
                }
                let extra = self.distance[locs[i]][locs[j]].saturating_sub(1) as u64;
                total = total.saturating_add(count.saturating_mul(extra));
            }
        }
        total
    }
}

/// Solves placement problems.
///
/// Implementations run on a blocking thread and cannot be interrupted; a
/// slow solver only costs its own thread.
pub trait PlacementSolver: fmt::Debug + Send + Sync {
    /// Solver name, for diagnostics.
    fn name(&self) -> &str;

    /// A location for every facility, pairwise distinct, or `None` when
    /// no placement was found.
    fn solve(&self, problem: &PlacementProblem) -> Option<Vec<usize>>;
}

/// Greedy construction followed by pairwise-exchange improvement.
///
/// Facilities are placed in order of decreasing gate count, each on the
/// free location that adds least to the cost so far; the first goes to the
/// most central location. Then single swaps of two facilities, or moves of
/// one facility to a free location, are applied while they lower the cost.
/// Deterministic; fails only when facilities outnumber locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct QapPlacer;

impl QapPlacer {
    fn construct(problem: &PlacementProblem) -> Vec<usize> {
        let nfac = problem.facilities();
        let nlocs = problem.locations();
        let weight = |i: usize| -> u64 {
            (0..nfac)
                .map(|j| problem.refcount[i][j] + problem.refcount[j][i])
                .sum()
        };
        let mut order: Vec<usize> = (0..nfac).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(weight(i)));

        let mut locs = vec![usize::MAX; nfac];
        let mut used = vec![false; nlocs];
        for (n, &i) in order.iter().enumerate() {
            let best = (0..nlocs).filter(|&k| !used[k]).min_by_key(|&k| {
                if n == 0 {
                    problem.distance[k]
                        .iter()
                        .map(|&d| d.min(nlocs) as u64)
                        .sum::<u64>()
                } else {
                    order[..n]
                        .iter()
                        .map(|&j| {
                            let count = problem.refcount[i][j] + problem.refcount[j][i];
                            count.saturating_mul(
                                problem.distance[k][locs[j]].saturating_sub(1) as u64,
                            )
                        })
                        .fold(0u64, u64::saturating_add)
                }
            });
            if let Some(k) = best {
                locs[i] = k;
                used[k] = true;
            }
        }
        locs
    }

    fn improve(problem: &PlacementProblem, locs: &mut [usize]) {
        let nfac = problem.facilities();
        let nlocs = problem.locations();
        let mut cost = problem.cost(locs);
        loop {
            let mut improved = false;
            for i in 0..nfac {
                for j in i + 1..nfac {
                    locs.swap(i, j);
                    let c = problem.cost(locs);
                    if c < cost {
                        cost = c;
                        improved = true;
                    } else {
                        locs.swap(i, j);
                    }
                }
                for k in 0..nlocs {
                    if locs.contains(&k) {
                        continue;
                    }
                    let old = locs[i];
                    locs[i] = k;
                    let c = problem.cost(locs);
                    if c < cost {
                        cost = c;
                        improved = true;
                    } else {
                        locs[i] = old;
                    }
                }
            }
            if !improved {
                break;
            }
        }
    }
}

impl PlacementSolver for QapPlacer {
    fn name(&self) -> &str {
        "qap-greedy"
    }

    fn solve(&self, problem: &PlacementProblem) -> Option<Vec<usize>> {
        if problem.facilities() > problem.locations() {
            return None;
        }
        let mut locs = Self::construct(problem);
        Self::improve(problem, &mut locs);
        Some(locs)
    }
}

/// Try to improve `v2r` for the two-qubit gates among `gates`.
///
/// Returns `None` when initial placement is disabled. `v2r` is changed
/// only on [`PlaceOutcome::NewMap`]. A solver answer that does not put
/// every facility on its own location counts as [`PlaceOutcome::Failed`].
/// A timeout is an outcome, unless the option asks to abort, in which case
/// it is an error.
pub async fn place(
    gates: &[Gate],
    v2r: &mut Virt2Real,
    grid: &Grid,
    options: &MapperOptions,
    solver: Arc<dyn PlacementSolver>,
) -> MapResult<Option<PlaceOutcome>> {
    let limit = match options.initial_place {
        InitialPlace::No => return Ok(None),
        InitialPlace::Unlimited => None,
        InitialPlace::Limited {
            limit,
            abort_on_timeout,
        } => Some((limit, abort_on_timeout)),
    };

    if let Some(gate) = gates.iter().find(|g| g.qubits.len() > 2) {
        return Err(MapError::TooManyOperands {
            gate: gate.to_string(),
            operands: gate.qubits.len(),
        });
    }

    let horizon = options.placement_horizon;
    let within = |seen: usize| horizon == 0 || seen < horizon;

    // facilities are the virtual qubits used within the horizon
    let nvq = v2r.len();
    let mut used = vec![false; nvq];
    let mut seen = 0;
    for gate in gates {
        if within(seen) {
            for &v in &gate.qubits {
                used[v] = true;
            }
        }
        if gate.qubits.len() == 2 {
            seen += 1;
        }
    }
    let facilities: Vec<usize> = (0..nvq).filter(|&v| used[v]).collect();
    let mut fac_of = vec![usize::MAX; nvq];
    for (i, &v) in facilities.iter().enumerate() {
        fac_of[v] = i;
    }

    let nfac = facilities.len();
    let mut refcount = vec![vec![0u64; nfac]; nfac];
    let mut any = true;
    let mut current = true;
    let mut seen = 0;
    for gate in gates.iter().filter(|g| g.qubits.len() == 2) {
        if within(seen) {
            let (a, b) = (gate.qubits[0], gate.qubits[1]);
            any = false;
            refcount[fac_of[a]][fac_of[b]] += 1;
            match (v2r.get(a), v2r.get(b)) {
                (Some(ra), Some(rb)) if grid.distance(ra, rb) <= 1 => {}
                _ => current = false,
            }
        }
        seen += 1;
    }
    if horizon != 0 && seen > horizon {
        debug!(horizon, two_qubit_gates = seen, "placement considers a prefix only");
    }
    if any {
        debug!("no two-qubit gates, any mapping will do");
        return Ok(Some(PlaceOutcome::Any));
    }
    if current {
        debug!("current mapping already adjacent");
        return Ok(Some(PlaceOutcome::Current));
    }

    let nlocs = grid.qubit_count();
    let problem = PlacementProblem {
        refcount,
        distance: (0..nlocs)
            .map(|k| (0..nlocs).map(|l| grid.distance(k, l)).collect())
            .collect(),
    };

    let started = Instant::now();
    let solver_name = solver.name().to_string();
    let handle = task::spawn_blocking(move || solver.solve(&problem));
    let joined = match limit {
        None => handle.await,
        Some((limit, abort)) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) if abort => return Err(MapError::PlacementTimedOut(limit)),
            Err(_) => {
                warn!(solver = %solver_name, ?limit, "initial placement timed out, keeping current mapping");
                return Ok(Some(PlaceOutcome::TimedOut));
            }
        },
    };
    let solution = match joined {
        Ok(solution) => solution,
        Err(e) => {
            warn!(solver = %solver_name, error = %e, "placement solver did not complete");
            None
        }
    };
    let elapsed = started.elapsed();

    let Some(locs) = solution else {
        info!(solver = %solver_name, ?elapsed, facilities = nfac, "initial placement failed");
        return Ok(Some(PlaceOutcome::Failed));
    };
    if !is_assignment(&locs, nfac, nlocs) {
        warn!(solver = %solver_name, ?locs, facilities = nfac, "placement solver returned an invalid assignment");
        return Ok(Some(PlaceOutcome::Failed));
    }

    for v in 0..nvq {
        v2r.set(v, None);
    }
    for (i, &v) in facilities.iter().enumerate() {
        v2r.set(v, Some(locs[i]));
    }
    if options.init_one_to_one {
        // unused virtual qubits go to unused locations, in index order
        let mut taken = vec![false; nlocs];
        for &k in &locs {
            taken[k] = true;
        }
        let mut free = (0..nlocs).filter(|&k| !taken[k]);
        for v in 0..nvq {
            if v2r.get(v).is_none() {
                v2r.set(v, free.next());
            }
        }
    }
    info!(solver = %solver_name, ?elapsed, facilities = nfac, "initial placement found new mapping");
    Ok(Some(PlaceOutcome::NewMap))
}

/// Whether `locs` puts `nfac` facilities on distinct locations below `nlocs`.
fn is_assignment(locs: &[usize], nfac: usize, nlocs: usize) -> bool {
    if locs.len() != nfac {
        return false;
    }
    let mut taken = vec![false; nlocs];
    locs.iter().all(|&k| k < nlocs && !mem::replace(&mut taken[k], true))
}
