//! Per-qubit timeline.
//!
//! [`FreeCycle`] records for every physical qubit the first cycle in which
//! it is free. Cycle numbering starts at 1. Under a resource-constrained
//! heuristic it also carries a [`ResourceManager`] that may push a start
//! cycle further out.
//!
//! The `_no_rc` variants ignore resources and never touch them; they model
//! plain gate dependences and are what cost estimates use.

use qmap_ir::Gate;
use qmap_platform::{Platform, ResourceManager};

use crate::error::MapResult;
use crate::options::{MapperOptions, SwapOrder};

/// First free cycle per physical qubit.
#[derive(Debug, Clone)]
pub struct FreeCycle {
    fcv: Vec<u64>,
    cycle_time: u64,
    resources: Option<ResourceManager>,
}

impl FreeCycle {
    /// All qubits free from cycle 1.
    pub fn new(platform: &Platform, options: &MapperOptions) -> MapResult<Self> {
        let resources = if options.heuristic.is_resource_constrained() {
            Some(ResourceManager::new(platform)?)
        } else {
            None
        };
        Ok(Self {
            fcv: vec![1; platform.qubit_count()],
            cycle_time: platform.cycle_time(),
            resources,
        })
    }

    /// First free cycle of `q`.
    #[inline]
    pub fn get(&self, q: usize) -> u64 {
        self.fcv[q]
    }

    /// Latest first-free cycle over all qubits.
    pub fn max(&self) -> u64 {
        self.fcv.iter().copied().max().unwrap_or(0)
    }

    /// Earliest first-free cycle over all qubits.
    pub fn min(&self) -> u64 {
        self.fcv.iter().copied().min().unwrap_or(0)
    }

    /// Spread between the busiest and the idlest qubit.
    pub fn depth(&self) -> u64 {
        self.max() - self.min()
    }

    /// Whether `r0` becomes free strictly before `r1`.
    pub fn is_first_operand_earlier(&self, r0: usize, r1: usize) -> bool {
        self.fcv[r0] < self.fcv[r1]
    }

    /// Whether `swap(fr0, fr1)` would start before `swap(sr0, sr1)`.
    ///
    /// The second operand of a swap starts `lead` cycles before the first;
    /// with [`SwapOrder::EarlierFirst`] both swaps are first reordered the
    /// way they would be generated.
    pub fn is_first_swap_earliest(
        &self,
        first: (usize, usize),
        second: (usize, usize),
        order: SwapOrder,
        lead: u64,
    ) -> bool {
        let arrange = |(r0, r1): (usize, usize)| {
            if order == SwapOrder::EarlierFirst && self.is_first_operand_earlier(r0, r1) {
                (r1, r0)
            } else {
                (r0, r1)
            }
        };
        let start = |(r0, r1): (usize, usize)| self.fcv[r0].saturating_sub(lead).max(self.fcv[r1]);
        start(arrange(first)) < start(arrange(second))
    }

    /// Start cycle of `gate` from operand availability alone.
    ///
    /// A gate without qubit operands waits for every qubit.
    pub fn start_cycle_no_rc(&self, gate: &Gate) -> u64 {
        if gate.qubits.is_empty() {
            return self.max();
        }
        gate.qubits.iter().map(|&q| self.fcv[q]).max().unwrap_or(1)
    }

    /// Start cycle of `gate`, delayed until every resource admits it.
    ///
    /// The delay ends at the latest where the resources stop being busy.
    pub fn start_cycle(&self, gate: &Gate, platform: &Platform) -> u64 {
        let mut start = self.start_cycle_no_rc(gate);
        if let Some(rm) = &self.resources {
            let horizon = rm.busy_until().max(start);
            while start < horizon && !rm.available(start, gate, platform) {
                start += 1;
            }
        }
        start
    }

    /// Occupy the operands of `gate` from `start`, ignoring resources.
    pub fn add_no_rc(&mut self, gate: &Gate, start: u64) {
        let end = start + gate.duration_cycles(self.cycle_time);
        if gate.qubits.is_empty() {
            self.fcv.iter_mut().for_each(|f| *f = end);
            return;
        }
        for &q in &gate.qubits {
            self.fcv[q] = end;
        }
    }

    /// Occupy the operands of `gate` from `start` and reserve its resources.
    pub fn add(&mut self, gate: &Gate, start: u64, platform: &Platform) {
        self.add_no_rc(gate, start);
        if let Some(rm) = &mut self.resources {
            rm.reserve(start, gate, platform);
        }
    }
}
