//! Scheduling window.
//!
//! A [`Past`] owns the current [`Virt2Real`] and [`FreeCycle`] and moves
//! gates through three lists: *waiting* (mapped, not yet scheduled),
//! *scheduled* (cycle assigned, ordered by cycle) and *output* (flushed,
//! out of view of the scheduler). All gates in a `Past` have physical
//! operands.
//!
//! Exploring an alternative works on a [`Past::fork`], a copy that keeps
//! mapping and timing but not the gate lists. Nothing done to a fork is
//! visible in the original.

use std::mem;

use qmap_ir::Gate;
use tracing::{debug, trace};

use crate::context::MapContext;
use crate::error::{MapError, MapResult};
use crate::free_cycle::FreeCycle;
use crate::options::{MoveMode, SwapOrder};
use crate::virt2real::{RealState, Virt2Real};

/// Gates of one kernel on their way from mapping to output.
#[derive(Debug, Clone)]
pub struct Past {
    v2r: Virt2Real,
    fc: FreeCycle,
    waiting: Vec<Gate>,
    scheduled: Vec<Gate>,
    output: Vec<Gate>,
    swaps_added: usize,
    moves_added: usize,
}

impl Past {
    /// An empty past with the configured initial mapping.
    pub fn new(ctx: MapContext<'_>) -> MapResult<Self> {
        let nq = ctx.platform.qubit_count();
        Ok(Self {
            v2r: Virt2Real::new(
                nq,
                ctx.options.init_one_to_one,
                ctx.options.assume_zero_init_state,
            ),
            fc: FreeCycle::new(ctx.platform, ctx.options)?,
            waiting: Vec::new(),
            scheduled: Vec::new(),
            output: Vec::new(),
            swaps_added: 0,
            moves_added: 0,
        })
    }

    /// Copy for what-if exploration: same mapping, timing and counters,
    /// empty gate lists.
    pub fn fork(&self) -> Self {
        debug_assert!(self.waiting.is_empty());
        Self {
            v2r: self.v2r.clone(),
            fc: self.fc.clone(),
            waiting: Vec::new(),
            scheduled: Vec::new(),
            output: Vec::new(),
            swaps_added: self.swaps_added,
            moves_added: self.moves_added,
        }
    }

    /// Replace the mapping.
    pub fn import_v2r(&mut self, v2r: Virt2Real) {
        self.v2r = v2r;
    }

    /// The current mapping.
    pub fn v2r(&self) -> &Virt2Real {
        &self.v2r
    }

    /// The timeline.
    pub fn free_cycle(&self) -> &FreeCycle {
        &self.fc
    }

    /// Routing operations added so far, moves included.
    pub fn swaps_added(&self) -> usize {
        self.swaps_added
    }

    /// Moves added so far.
    pub fn moves_added(&self) -> usize {
        self.moves_added
    }

    /// Latest first-free cycle over all qubits.
    pub fn max_free_cycle(&self) -> u64 {
        self.fc.max()
    }

    /// Gates scheduled but not yet flushed, in cycle order.
    pub fn scheduled(&self) -> &[Gate] {
        &self.scheduled
    }

    /// Physical qubit of `v`, allocating one when unmapped.
    pub fn map_qubit(&mut self, v: usize) -> MapResult<usize> {
        self.v2r.allocate(v)
    }

    /// Append a mapped gate to the waiting list.
    pub fn add(&mut self, gate: Gate) {
        self.waiting.push(gate);
    }

    /// Append a mapped gate and schedule.
    pub fn add_and_schedule(&mut self, ctx: MapContext<'_>, gate: Gate) {
        self.add(gate);
        self.schedule(ctx);
    }

    /// Schedule every waiting gate.
    ///
    /// Repeatedly picks the waiting gate that can start first, trying them
    /// in list order against a scratch copy of the timeline, and commits it.
    /// The waiting list must be in a valid execution order, which holds
    /// because the two swap chains of an alternative use disjoint qubits.
    pub fn schedule(&mut self, ctx: MapContext<'_>) {
        while !self.waiting.is_empty() {
            let mut trial = self.fc.clone();
            let mut best: Option<(usize, u64)> = None;
            for (i, gate) in self.waiting.iter().enumerate() {
                let start = trial.start_cycle(gate, ctx.platform);
                trial.add(gate, start, ctx.platform);
                if best.is_none_or(|(_, earliest)| start < earliest) {
                    best = Some((i, start));
                }
            }
            let Some((i, start)) = best else { break };

            let mut gate = self.waiting.remove(i);
            self.fc.add(&gate, start, ctx.platform);
            gate.cycle = Some(start);

            // keep cycle order, latest among equals
            let at = self
                .scheduled
                .iter()
                .rposition(|g| g.cycle.is_some_and(|c| c <= start))
                .map_or(0, |p| p + 1);
            self.scheduled.insert(at, gate);
        }
    }

    /// Extra cycles that scheduling `init` before `ops` costs over
    /// scheduling `ops` alone, resources ignored.
    pub fn insertion_cost(&self, init: &[Gate], ops: &[Gate]) -> u64 {
        let fake = |gates: &mut dyn Iterator<Item = &Gate>| {
            let mut fc = self.fc.clone();
            for gate in gates {
                let start = fc.start_cycle_no_rc(gate);
                fc.add_no_rc(gate, start);
            }
            fc.max()
        };
        let with_init = fake(&mut init.iter().chain(ops));
        let without = fake(&mut ops.iter());
        debug_assert!(with_init >= without);
        with_init.saturating_sub(without)
    }

    /// Whether `swap(first)` would start before `swap(second)`.
    pub fn is_first_swap_earliest(
        &self,
        ctx: MapContext<'_>,
        first: (usize, usize),
        second: (usize, usize),
    ) -> bool {
        self.fc.is_first_swap_earliest(
            first,
            second,
            ctx.options.swap_order,
            ctx.options.swap_lead,
        )
    }

    /// Try a move from `r0`, which holds state, to stateless `r1`.
    ///
    /// When `r1` is not initialised, an initialisation is put in front, but
    /// only if it costs at most `threshold` extra cycles; otherwise no move
    /// is made and `None` is returned.
    fn gen_move(
        &mut self,
        ctx: MapContext<'_>,
        r0: usize,
        r1: usize,
        threshold: u64,
    ) -> MapResult<Option<Vec<Gate>>> {
        debug_assert_eq!(self.v2r.state(r0), RealState::HasState);
        let names = if ctx.grid.is_inter_core_hop(r0, r1) {
            ["tmove_real", "tmove"]
        } else {
            ["move_real", "move"]
        };
        let mv = create(ctx, names, &[r0, r1], &[], None, 0.0)?;

        if self.v2r.state(r1) != RealState::NoState {
            return Ok(Some(mv));
        }
        let init = create(ctx, ["move_init", "prepz"], &[r1], &[], None, 0.0)?;
        let cost = self.insertion_cost(&init, &mv);
        if cost > threshold {
            debug!(r0, r1, cost, threshold, "move rejected, initialisation not free");
            return Ok(None);
        }
        debug!(r0, r1, cost, "move accepted");
        self.v2r.set_state(r1, RealState::WasInited);
        let mut gates = init;
        gates.extend(mv);
        Ok(Some(gates))
    }

    /// Exchange the contents of physical qubits `r0` and `r1`.
    ///
    /// With no live state on either side only the mapping changes. With
    /// live state on one side a move is tried first, if enabled; otherwise
    /// a swap is generated. Generated gates are appended to the waiting
    /// list.
    pub fn add_swap(&mut self, ctx: MapContext<'_>, r0: usize, r1: usize) -> MapResult<()> {
        let s0 = self.v2r.state(r0);
        let s1 = self.v2r.state(r1);
        if s0 != RealState::HasState && s1 != RealState::HasState {
            trace!(r0, r1, "no state on either side, relabel only");
            self.v2r.swap(r0, r1);
            return Ok(());
        }

        let mut gates = None;
        if let MoveMode::Enabled { threshold } = ctx.options.use_moves {
            if s0 != RealState::HasState || s1 != RealState::HasState {
                let (from, to) = if s0 == RealState::HasState {
                    (r0, r1)
                } else {
                    (r1, r0)
                };
                gates = self.gen_move(ctx, from, to, threshold)?;
                if gates.is_some() {
                    self.moves_added += 1;
                }
            }
        }

        let gates = match gates {
            Some(gates) => gates,
            None => {
                let (a, b) = if ctx.options.swap_order == SwapOrder::EarlierFirst
                    && self.fc.is_first_operand_earlier(r0, r1)
                {
                    (r1, r0)
                } else {
                    (r0, r1)
                };
                let names = if ctx.grid.is_inter_core_hop(a, b) {
                    ["tswap_real", "tswap"]
                } else {
                    ["swap_real", "swap"]
                };
                trace!(a, b, "swap");
                create(ctx, names, &[a, b], &[], None, 0.0)?
            }
        };

        self.swaps_added += 1;
        self.waiting.extend(gates);
        self.v2r.swap(r0, r1);
        Ok(())
    }

    /// Map a gate's operands to physical qubits and create its physical
    /// form: `<name>_real` when configured, else `<name>` itself.
    pub fn make_real(&mut self, ctx: MapContext<'_>, gate: &Gate) -> MapResult<Vec<Gate>> {
        let base = gate.base_name();
        let inits = ctx.options.prep_inits_state && base.eq_ignore_ascii_case("prepz");
        let mut qubits = Vec::with_capacity(gate.qubits.len());
        for &v in &gate.qubits {
            let r = self.map_qubit(v)?;
            let state = if inits {
                RealState::WasInited
            } else {
                RealState::HasState
            };
            self.v2r.set_state(r, state);
            qubits.push(r);
        }
        let real = format!("{base}_real");
        create(
            ctx,
            [real.as_str(), base],
            &qubits,
            &gate.cregs,
            explicit_duration(gate),
            gate.angle,
        )
    }

    /// Lower a physical gate to `<name>_prim` when configured, else keep it.
    pub fn make_primitive(&self, ctx: MapContext<'_>, gate: &Gate) -> MapResult<Vec<Gate>> {
        let base = gate.base_name();
        let prim = format!("{base}_prim");
        create(
            ctx,
            [prim.as_str(), base],
            &gate.qubits,
            &gate.cregs,
            explicit_duration(gate),
            gate.angle,
        )
    }

    /// Move all scheduled gates to the output.
    pub fn flush_all(&mut self) {
        self.output.append(&mut self.scheduled);
    }

    /// Output a non-quantum gate, after everything scheduled so far.
    ///
    /// It is given the cycle in which every qubit is free. The timeline is
    /// left alone, so later quantum gates may still start earlier.
    pub fn bypass(&mut self, mut gate: Gate) {
        if !self.scheduled.is_empty() {
            self.flush_all();
        }
        gate.cycle = Some(self.fc.max());
        self.output.push(gate);
    }

    /// Take the output gates.
    pub fn take_output(&mut self) -> Vec<Gate> {
        mem::take(&mut self.output)
    }
}

fn explicit_duration(gate: &Gate) -> Option<u64> {
    (gate.duration > 0).then_some(gate.duration)
}

/// Create `names[0]` without duration override, falling back to `names[1]`
/// with `duration`.
fn create(
    ctx: MapContext<'_>,
    names: [&str; 2],
    qubits: &[usize],
    cregs: &[usize],
    duration: Option<u64>,
    angle: f64,
) -> MapResult<Vec<Gate>> {
    let [specific, generic] = names;
    ctx.platform
        .try_create(specific, qubits, cregs, None, angle)
        .or_else(|| ctx.platform.try_create(generic, qubits, cregs, duration, angle))
        .ok_or_else(|| MapError::MissingInstruction {
            names: names.iter().map(|n| (*n).to_string()).collect(),
            qubits: qubits.to_vec(),
        })
}
