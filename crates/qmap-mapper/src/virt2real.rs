//! Virtual to physical qubit mapping.

use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};

/// What a physical qubit holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealState {
    /// Garbage; nothing meaningful.
    #[default]
    NoState,
    /// Known to be |0>, usable as the target of a move.
    WasInited,
    /// Live quantum state of a virtual qubit.
    HasState,
}

/// The current mapping plus the state of every physical qubit.
///
/// Defined entries of the map are injective: no physical qubit is owned by
/// two virtual qubits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Virt2Real {
    v2r: Vec<Option<usize>>,
    rs: Vec<RealState>,
}

impl Virt2Real {
    /// A mapping over `qubit_count` qubits.
    ///
    /// With `one_to_one` virtual qubit `i` starts on physical qubit `i`,
    /// otherwise everything is unmapped. With `assume_zero` every physical
    /// qubit starts as [`RealState::WasInited`].
    pub fn new(qubit_count: usize, one_to_one: bool, assume_zero: bool) -> Self {
        let v2r = (0..qubit_count).map(|i| one_to_one.then_some(i)).collect();
        let state = if assume_zero {
            RealState::WasInited
        } else {
            RealState::NoState
        };
        Self {
            v2r,
            rs: vec![state; qubit_count],
        }
    }

    /// Rebuild from exported parts: one entry per virtual qubit and one
    /// state per physical qubit.
    pub fn from_parts(v2r: Vec<Option<usize>>, rs: Vec<RealState>) -> Self {
        Self { v2r, rs }
    }

    /// Number of virtual qubits.
    pub fn len(&self) -> usize {
        self.v2r.len()
    }

    /// Whether the mapping covers no qubits.
    pub fn is_empty(&self) -> bool {
        self.v2r.is_empty()
    }

    /// Physical qubit of `v`, if mapped.
    #[inline]
    pub fn get(&self, v: usize) -> Option<usize> {
        self.v2r[v]
    }

    /// Map `v` to `r`, or unmap it.
    pub fn set(&mut self, v: usize, r: Option<usize>) {
        self.v2r[v] = r;
    }

    /// Virtual qubit on physical qubit `r`, if any.
    pub fn virt_of(&self, r: usize) -> Option<usize> {
        self.v2r.iter().position(|&m| m == Some(r))
    }

    /// State of physical qubit `r`.
    #[inline]
    pub fn state(&self, r: usize) -> RealState {
        self.rs[r]
    }

    /// Set the state of physical qubit `r`.
    pub fn set_state(&mut self, r: usize, state: RealState) {
        self.rs[r] = state;
    }

    /// Physical qubit of `v`, allocating the lowest free one when unmapped.
    pub fn allocate(&mut self, v: usize) -> MapResult<usize> {
        if let Some(r) = self.v2r[v] {
            return Ok(r);
        }
        let r = (0..self.rs.len())
            .find(|&r| !self.v2r.contains(&Some(r)))
            .ok_or(MapError::QubitsExhausted(v))?;
        debug_assert_ne!(self.rs[r], RealState::HasState);
        self.v2r[v] = Some(r);
        Ok(r)
    }

    /// Exchange the owners and states of physical qubits `r0` and `r1`.
    pub fn swap(&mut self, r0: usize, r1: usize) {
        debug_assert_ne!(r0, r1);
        let v0 = self.virt_of(r0);
        let v1 = self.virt_of(r1);
        if let Some(v0) = v0 {
            self.v2r[v0] = Some(r1);
        }
        if let Some(v1) = v1 {
            self.v2r[v1] = Some(r0);
        }
        self.rs.swap(r0, r1);
    }

    /// The virtual to physical map.
    pub fn mapping(&self) -> &[Option<usize>] {
        &self.v2r
    }

    /// The physical qubit states.
    pub fn states(&self) -> &[RealState] {
        &self.rs
    }
}
