//! The mapper.
//!
//! [`Mapper`] maps one kernel at a time. Per kernel it:
//!
//! 1. optionally computes an initial placement (async entry point only);
//! 2. routes: repeatedly maps every gate that needs no routing, then picks
//!    a route for a blocked two-qubit gate and commits (part of) it;
//! 3. lowers the result to primitives and reschedules it.
//!
//! Route selection under the `minextend` heuristics scores each candidate
//! by how far it extends the schedule and, up to the configured level,
//! looks ahead by committing the candidate on a fork of the state and
//! recursing into the next routing decision.

use std::sync::Arc;

use qmap_ir::{Gate, GateId, GateKind, Kernel};
use qmap_platform::Platform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

use crate::alter::Alter;
use crate::context::MapContext;
use crate::error::{MapError, MapResult};
use crate::future::Future;
use crate::grid::Grid;
use crate::options::{InitialPlace, Lookahead, MapperOptions, PathSelect, TieBreak};
use crate::past::Past;
use crate::placement::{self, PlaceOutcome, PlacementSolver, QapPlacer};
use crate::virt2real::{RealState, Virt2Real};

/// What happened to one kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapReport {
    /// Kernel name.
    pub kernel: String,
    /// Routing operations added, moves included.
    pub swaps_added: usize,
    /// Moves added.
    pub moves_added: usize,
    /// Mapping before anything was done.
    pub v2r_in: Vec<Option<usize>>,
    /// Qubit states before anything was done.
    pub rs_in: Vec<RealState>,
    /// Mapping after initial placement.
    pub v2r_ip: Vec<Option<usize>>,
    /// Final mapping.
    pub v2r_out: Vec<Option<usize>>,
    /// Final qubit states.
    pub rs_out: Vec<RealState>,
    /// Initial placement outcome, when attempted.
    pub placement: Option<PlaceOutcome>,
    /// Output length in cycles.
    pub depth: u64,
}

impl MapReport {
    /// The final mapping, to continue with in a next kernel.
    pub fn final_mapping(&self) -> Virt2Real {
        Virt2Real::from_parts(self.v2r_out.clone(), self.rs_out.clone())
    }
}

/// Maps kernels onto one platform.
#[derive(Debug)]
pub struct Mapper {
    platform: Arc<Platform>,
    grid: Grid,
    options: MapperOptions,
    solver: Arc<dyn PlacementSolver>,
}

impl Mapper {
    /// Build the grid of `platform` and check the options against it.
    pub fn new(platform: Arc<Platform>, options: MapperOptions) -> MapResult<Self> {
        let grid = Grid::new(&platform)?;
        if options.path_select == PathSelect::Borders && !grid.has_coordinates() {
            return Err(MapError::BordersRequireCoordinates);
        }
        debug!(platform = platform.name(), ?options, "mapper created");
        Ok(Self {
            platform,
            grid,
            options,
            solver: Arc::new(QapPlacer),
        })
    }

    /// Use another initial placement solver.
    #[must_use]
    pub fn with_solver(mut self, solver: Arc<dyn PlacementSolver>) -> Self {
        self.solver = solver;
        self
    }

    /// The target platform.
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// The platform's topology.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The options in effect.
    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    fn context(&self) -> MapContext<'_> {
        MapContext::new(&self.platform, &self.grid, &self.options)
    }

    /// The configured mapping a kernel starts from.
    pub fn initial_mapping(&self) -> Virt2Real {
        Virt2Real::new(
            self.platform.qubit_count(),
            self.options.init_one_to_one,
            self.options.assume_zero_init_state,
        )
    }

    /// Map `kernel` in place, starting from the configured initial mapping.
    ///
    /// Initial placement needs [`Mapper::map_with_placement`] and is skipped
    /// here.
    #[instrument(skip_all, fields(kernel = %kernel.name))]
    pub fn map(&self, kernel: &mut Kernel) -> MapResult<MapReport> {
        if self.options.initial_place != InitialPlace::No {
            warn!(
                initial_place = %self.options.initial_place,
                "initial placement needs the async entry point, skipped"
            );
        }
        self.check_kernel(kernel)?;
        let v2r = self.initial_mapping();
        self.run(kernel, v2r.clone(), v2r, None)
    }

    /// Map `kernel` in place, continuing from `v2r`, typically the final
    /// mapping of the previous kernel.
    #[instrument(skip_all, fields(kernel = %kernel.name))]
    pub fn map_from(&self, kernel: &mut Kernel, v2r: Virt2Real) -> MapResult<MapReport> {
        self.check_kernel(kernel)?;
        if v2r.len() < kernel.qubit_count {
            return Err(MapError::KernelTooLarge {
                kernel: kernel.name.clone(),
                required: kernel.qubit_count,
                available: v2r.len(),
            });
        }
        self.run(kernel, v2r.clone(), v2r, None)
    }

    /// Map `kernel` in place, running initial placement first when enabled.
    #[instrument(skip_all, fields(kernel = %kernel.name))]
    pub async fn map_with_placement(&self, kernel: &mut Kernel) -> MapResult<MapReport> {
        self.check_kernel(kernel)?;
        let v2r_in = self.initial_mapping();
        let mut v2r = v2r_in.clone();
        let outcome = placement::place(
            &kernel.gates,
            &mut v2r,
            &self.grid,
            &self.options,
            Arc::clone(&self.solver),
        )
        .await?;
        self.run(kernel, v2r_in, v2r, outcome)
    }

    fn check_kernel(&self, kernel: &Kernel) -> MapResult<()> {
        kernel.validate()?;
        let available = self.platform.qubit_count();
        if kernel.qubit_count > available {
            return Err(MapError::KernelTooLarge {
                kernel: kernel.name.clone(),
                required: kernel.qubit_count,
                available,
            });
        }
        Ok(())
    }

    fn run(
        &self,
        kernel: &mut Kernel,
        v2r_in: Virt2Real,
        v2r_ip: Virt2Real,
        placement: Option<PlaceOutcome>,
    ) -> MapResult<MapReport> {
        let ctx = self.context();
        let mut router = Router::new(ctx);
        let mut past = router.map_circuit(kernel, v2r_ip.clone())?;
        let routed = past.take_output();
        let gates = make_primitives(ctx, routed)?;

        kernel.gates = gates;
        kernel.cycles_valid = true;
        kernel.qubit_count = self.platform.qubit_count();

        let report = MapReport {
            kernel: kernel.name.clone(),
            swaps_added: past.swaps_added(),
            moves_added: past.moves_added(),
            v2r_in: v2r_in.mapping().to_vec(),
            rs_in: v2r_in.states().to_vec(),
            v2r_ip: v2r_ip.mapping().to_vec(),
            v2r_out: past.v2r().mapping().to_vec(),
            rs_out: past.v2r().states().to_vec(),
            placement,
            depth: kernel.depth(ctx.cycle_time()),
        };
        info!(
            kernel = %kernel.name,
            gates = kernel.len(),
            swaps = report.swaps_added,
            moves = report.moves_added,
            depth = report.depth,
            placement = ?report.placement,
            "kernel mapped"
        );
        Ok(report)
    }
}

/// Lower every gate to its `_prim` form and reschedule from scratch.
pub fn make_primitives(ctx: MapContext<'_>, gates: Vec<Gate>) -> MapResult<Vec<Gate>> {
    let mut past = Past::new(ctx)?;
    for gate in gates {
        if !gate.is_quantum() {
            past.bypass(gate);
            continue;
        }
        for prim in past.make_primitive(ctx, &gate)? {
            past.add_and_schedule(ctx, prim);
        }
    }
    past.flush_all();
    Ok(past.take_output())
}

/// Routing state of one kernel: the context and the tie-break generator.
struct Router<'a> {
    ctx: MapContext<'a>,
    rng: StdRng,
}

impl<'a> Router<'a> {
    fn new(ctx: MapContext<'a>) -> Self {
        let rng = match ctx.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { ctx, rng }
    }

    fn map_circuit(&mut self, kernel: &Kernel, v2r: Virt2Real) -> MapResult<Past> {
        let mut future = Future::new(kernel, self.ctx);
        let mut past = Past::new(self.ctx)?;
        past.import_v2r(v2r);
        self.map_gates(&mut future, &mut past)?;
        past.flush_all();
        Ok(past)
    }

    /// Route until nothing is left. The past being extended is its own
    /// scoring base.
    fn map_gates(&mut self, future: &mut Future, past: &mut Past) -> MapResult<()> {
        let also_nn2q = self.ctx.options.lookahead.maps_adjacent_first();
        while let Some(blocked) = self.map_mappable_gates(future, past, also_nn2q)? {
            let alters = self.gen_alters(&blocked, future, past)?;
            let chosen = self.select_alter(alters, future, &*past, &*past, 0)?;
            debug!(
                target = chosen.target(),
                path = ?chosen.path(),
                score = ?chosen.score(),
                "alternative selected"
            );
            self.commit_alter(&chosen, future, past)?;
        }
        Ok(())
    }

    /// Map every available gate that needs no routing.
    ///
    /// Returns the remaining (two-qubit) gates, or `None` when the kernel is
    /// done. With `also_nn2q` two-qubit gates on adjacent qubits are mapped
    /// too, so only gates that need routing are returned.
    fn map_mappable_gates(
        &self,
        future: &mut Future,
        past: &mut Past,
        also_nn2q: bool,
    ) -> MapResult<Option<Vec<GateId>>> {
        loop {
            let non_quantum = future.non_quantum_gates();
            if !non_quantum.is_empty() {
                for id in non_quantum {
                    let gate = future.gate(id);
                    if gate.kind != GateKind::Dummy {
                        trace!(gate = %gate, "bypassing non-quantum gate");
                        past.bypass(gate.clone());
                    }
                    future.done(id);
                }
                continue;
            }

            let available = future.gates()?;
            if available.is_empty() {
                return Ok(None);
            }

            // one gate at a time: mapping it may expose more critical ones
            let trivial = available.iter().copied().find(|&id| {
                let gate = future.gate(id);
                gate.kind == GateKind::Wait || gate.qubits.len() < 2
            });
            if let Some(id) = trivial {
                self.map_routed_gate(id, future, past)?;
                continue;
            }

            if also_nn2q {
                let mut adjacent = None;
                for &id in &available {
                    if self.is_adjacent(future.gate(id), past)? {
                        adjacent = Some(id);
                        break;
                    }
                }
                if let Some(id) = adjacent {
                    self.map_routed_gate(id, future, past)?;
                    continue;
                }
            }

            return Ok(Some(available));
        }
    }

    /// Whether the operands of a two-qubit gate are nearest neighbours in
    /// the current mapping.
    fn is_adjacent(&self, gate: &Gate, past: &mut Past) -> MapResult<bool> {
        let src = past.map_qubit(gate.qubits[0])?;
        let tgt = past.map_qubit(gate.qubits[1])?;
        Ok(self.ctx.grid.min_hops(src, tgt) == 1)
    }

    fn map_routed_gate(&self, id: GateId, future: &mut Future, past: &mut Past) -> MapResult<()> {
        for gate in past.make_real(self.ctx, future.gate(id))? {
            past.add_and_schedule(self.ctx, gate);
        }
        future.done(id);
        Ok(())
    }

    /// Candidates for the most critical blocked gate, or for all of them
    /// under full lookahead.
    fn gen_alters(
        &self,
        blocked: &[GateId],
        future: &Future,
        past: &mut Past,
    ) -> MapResult<Vec<Alter>> {
        let targets: Vec<GateId> = if self.ctx.options.lookahead == Lookahead::All {
            blocked.to_vec()
        } else {
            future.most_critical(blocked).into_iter().collect()
        };
        let mut alters = Vec::new();
        for id in targets {
            let gate = future.gate(id);
            let src = past.map_qubit(gate.qubits[0])?;
            let tgt = past.map_qubit(gate.qubits[1])?;
            trace!(gate = %gate, src, tgt, hops = self.ctx.grid.min_hops(src, tgt), "routing");
            alters.extend(Alter::generate(self.ctx, id, src, tgt)?);
        }
        Ok(alters)
    }

    /// Pick one of `alters`.
    ///
    /// The base heuristics pick by tie-break directly. The others score each
    /// alternative against `base`, keep the best few and, below the maximum
    /// level, replace each kept score by that of the best continuation
    /// after committing it.
    fn select_alter(
        &mut self,
        mut alters: Vec<Alter>,
        future: &Future,
        past: &Past,
        base: &Past,
        level: usize,
    ) -> MapResult<Alter> {
        debug_assert!(!alters.is_empty());
        if self.ctx.options.heuristic.is_base() {
            return Ok(self.choose_alter(alters, future));
        }

        for alter in &mut alters {
            alter.extend(past, base, self.ctx)?;
        }
        alters.sort_by_key(Alter::score);
        let min = alters[0].score();
        let tied = alters.iter().take_while(|a| a.score() == min).count();
        let keep = self.ctx.options.max_width.keep(tied, alters.len());
        alters.truncate(keep);
        trace!(level, tied, keep, score = ?min, "alternatives scored");

        if self.ctx.options.max_level.reached(level) {
            alters.truncate(tied);
            return Ok(self.choose_alter(alters, future));
        }

        let also_nn2q =
            self.ctx.options.rec_nn2q && self.ctx.options.lookahead.maps_adjacent_first();
        for alter in &mut alters {
            let mut future = future.clone();
            let mut past = past.fork();
            self.commit_alter(alter, &mut future, &mut past)?;

            let score = match self.map_mappable_gates(&mut future, &mut past, also_nn2q)? {
                Some(blocked) => {
                    let next = self.gen_alters(&blocked, &future, &mut past)?;
                    self.select_alter(next, &future, &past, base, level + 1)?
                        .score()
                }
                None => Some(past.max_free_cycle().saturating_sub(base.max_free_cycle())),
            };
            trace!(level, target = alter.target(), before = ?alter.score(), after = ?score, "lookahead");
            alter.set_score(score);
        }

        alters.sort_by_key(Alter::score);
        let min = alters[0].score();
        alters.retain(|a| a.score() == min);
        Ok(self.choose_alter(alters, future))
    }

    /// Tie-break among equally good alternatives.
    fn choose_alter(&mut self, mut alters: Vec<Alter>, future: &Future) -> Alter {
        let len = alters.len();
        let index = if len == 1 {
            0
        } else {
            match self.ctx.options.tie_break {
                TieBreak::First => 0,
                TieBreak::Last => len - 1,
                TieBreak::Random => self.rng.gen_range(0..len),
                TieBreak::Critical => {
                    let targets: Vec<GateId> = alters.iter().map(Alter::target).collect();
                    future
                        .most_critical(&targets)
                        .and_then(|id| targets.iter().position(|&t| t == id))
                        .unwrap_or(0)
                }
            }
        };
        alters.swap_remove(index)
    }

    /// Add the chosen route's swaps to `past`; map its gate once adjacent.
    fn commit_alter(&self, alter: &Alter, future: &mut Future, past: &mut Past) -> MapResult<()> {
        alter.add_swaps(past, self.ctx.options.select_swaps, self.ctx)?;
        let id = alter.target();
        if self.is_adjacent(future.gate(id), past)? {
            self.map_routed_gate(id, future, past)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmap_platform::{
        HardwareSettings, InstructionDef, InstructionType, PlatformConfig, ResourcesConfig,
        TopologyConfig,
    };
    use std::collections::BTreeMap;

    fn platform(qubits: usize) -> Arc<Platform> {
        let instructions = [
            ("x", 20, InstructionType::Mw),
            ("cz", 40, InstructionType::Flux),
            ("prepz", 20, InstructionType::None),
            ("measure", 300, InstructionType::Readout),
            ("swap", 60, InstructionType::Flux),
            ("move", 40, InstructionType::Flux),
        ]
        .into_iter()
        .map(|(name, duration, kind)| (name.to_string(), InstructionDef::new(duration, kind)))
        .collect();
        let config = PlatformConfig {
            name: format!("line{qubits}"),
            hardware_settings: HardwareSettings {
                qubit_number: qubits,
                cycle_time: 20,
            },
            topology: TopologyConfig::linear(qubits),
            instructions,
            gate_decomposition: BTreeMap::new(),
            resources: ResourcesConfig::default(),
        };
        Arc::new(Platform::new(config).unwrap())
    }

    fn options() -> MapperOptions {
        MapperOptions::default().with("mapseed", "7").unwrap()
    }

    #[test]
    fn test_adjacent_gate_needs_no_routing() {
        let mapper = Mapper::new(platform(2), options()).unwrap();
        let mut k = Kernel::new("k", 2, 0);
        k.push(Gate::custom("cz", vec![0, 1])).unwrap();
        let report = mapper.map(&mut k).unwrap();
        assert_eq!(report.swaps_added, 0);
        assert_eq!(k.len(), 1);
        assert_eq!(k.gates[0].cycle, Some(1));
        assert_eq!(report.depth, 2);
        assert!(k.cycles_valid);
    }

    #[test]
    fn test_distant_gate_gets_one_route() {
        let mapper = Mapper::new(platform(3), options().with("mapusemoves", "no").unwrap()).unwrap();
        let mut k = Kernel::new("k", 3, 0);
        k.push(Gate::custom("x", vec![0])).unwrap();
        k.push(Gate::custom("x", vec![2])).unwrap();
        k.push(Gate::custom("cz", vec![0, 2])).unwrap();
        let report = mapper.map(&mut k).unwrap();
        assert_eq!(report.swaps_added, 1);
        let names: Vec<&str> = k.gates.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names.iter().filter(|n| **n == "swap").count(), 1);
        let cz = k.gates.iter().find(|g| g.name == "cz").unwrap();
        assert!(mapper.grid().is_adjacent(cz.qubits[0], cz.qubits[1]));
    }

    #[test]
    fn test_classical_gate_keeps_its_place() {
        let opts = options().with("maplookahead", "no").unwrap();
        let mapper = Mapper::new(platform(2), opts).unwrap();
        let mut k = Kernel::new("k", 2, 1);
        k.push(Gate::custom("x", vec![0])).unwrap();
        k.push(Gate::classical("add", vec![0])).unwrap();
        k.push(Gate::custom("x", vec![1])).unwrap();
        mapper.map(&mut k).unwrap();
        let names: Vec<&str> = k.gates.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["x", "add", "x"]);
        assert!(k.gates.iter().all(|g| g.cycle.is_some()));
        assert_eq!(k.gates[1].cycle, Some(2));
    }

    #[test]
    fn test_kernel_too_large() {
        let mapper = Mapper::new(platform(2), options()).unwrap();
        let mut k = Kernel::new("big", 3, 0);
        k.push(Gate::custom("x", vec![2])).unwrap();
        assert!(matches!(
            mapper.map(&mut k),
            Err(MapError::KernelTooLarge { required: 3, available: 2, .. })
        ));
    }

    #[test]
    fn test_missing_instruction_is_fatal() {
        let mapper = Mapper::new(platform(2), options()).unwrap();
        let mut k = Kernel::new("k", 2, 0);
        k.push(Gate::custom("h", vec![0])).unwrap();
        assert!(matches!(
            mapper.map(&mut k),
            Err(MapError::MissingInstruction { .. })
        ));
    }

    #[test]
    fn test_borders_need_coordinates() {
        let platform = Arc::new(
            Platform::from_json(
                r#"{"hardware_settings": {"qubit_number": 3, "cycle_time": 20},
                    "topology": {"connectivity": "full"}}"#,
            )
            .unwrap(),
        );
        let opts = options().with("mappathselect", "borders").unwrap();
        assert!(matches!(
            Mapper::new(platform, opts),
            Err(MapError::BordersRequireCoordinates)
        ));
    }

    #[test]
    fn test_map_from_continues_mapping() {
        let mapper = Mapper::new(platform(3), options().with("mapusemoves", "no").unwrap()).unwrap();
        let mut first = Kernel::new("first", 3, 0);
        first.push(Gate::custom("x", vec![0])).unwrap();
        first.push(Gate::custom("x", vec![2])).unwrap();
        first.push(Gate::custom("cz", vec![0, 2])).unwrap();
        let report = mapper.map(&mut first).unwrap();
        assert_ne!(report.v2r_out, report.v2r_in);

        let mut second = Kernel::new("second", 3, 0);
        second.push(Gate::custom("cz", vec![0, 2])).unwrap();
        let next = mapper.map_from(&mut second, report.final_mapping()).unwrap();
        assert_eq!(next.swaps_added, 0);
        assert_eq!(next.v2r_in, report.v2r_out);
    }

    #[tokio::test]
    async fn test_map_with_placement_avoids_swaps() {
        let opts = options().with("initialplace", "yes").unwrap();
        let mapper = Mapper::new(platform(3), opts).unwrap();
        let mut k = Kernel::new("k", 3, 0);
        k.push(Gate::custom("cz", vec![0, 2])).unwrap();
        k.push(Gate::custom("cz", vec![2, 0])).unwrap();
        let report = mapper.map_with_placement(&mut k).await.unwrap();
        assert_eq!(report.placement, Some(PlaceOutcome::NewMap));
        assert_eq!(report.swaps_added, 0);
        assert_ne!(report.v2r_ip, report.v2r_in);
    }

    #[test]
    fn test_make_primitives_reschedules() {
        let platform = platform(2);
        let grid = Grid::new(&platform).unwrap();
        let opts = options();
        let ctx = MapContext::new(&platform, &grid, &opts);
        let mut late = Gate::custom("x", vec![0]).with_duration(20);
        late.cycle = Some(40);
        let out = make_primitives(ctx, vec![late]).unwrap();
        assert_eq!(out[0].cycle, Some(1));
    }
}
