//! Instruction library: named gates and their decompositions.
//!
//! Gates are created by name only. A name either refers to a configured
//! instruction (one gate) or to a decomposition (a sequence of configured
//! instructions with operands substituted). The mapper discovers the
//! `_real`, `_prim`, `move` and `swap` families purely by trying names, so
//! [`InstructionLibrary::try_create`] returns `None` instead of failing.

use std::collections::BTreeMap;

use qmap_ir::{Gate, GateKind};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, PlatformResult};

/// Instruction type as written in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionType {
    /// Microwave (single-qubit) pulse.
    Mw,
    /// Flux (two-qubit) pulse.
    Flux,
    /// Measurement.
    Readout,
    /// Classical operation.
    Classical,
    /// Idle.
    Wait,
    /// Unspecified.
    #[default]
    None,
}

impl From<InstructionType> for GateKind {
    fn from(t: InstructionType) -> Self {
        match t {
            InstructionType::Readout => GateKind::Measure,
            InstructionType::Classical => GateKind::Classical,
            InstructionType::Wait => GateKind::Wait,
            InstructionType::Mw | InstructionType::Flux | InstructionType::None => GateKind::Custom,
        }
    }
}

/// One configured instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionDef {
    /// Duration in device time units.
    pub duration: u64,
    /// Instruction type.
    #[serde(rename = "type", default)]
    pub kind: InstructionType,
}

impl InstructionDef {
    /// Instruction of the given duration and type.
    pub fn new(duration: u64, kind: InstructionType) -> Self {
        Self { duration, kind }
    }
}

/// A parsed decomposition: `name %0,%1 -> [part %i,%j, ...]`.
#[derive(Debug, Clone, PartialEq)]
struct Decomposition {
    arity: usize,
    parts: Vec<(String, Vec<usize>)>,
}

/// Split `"cnot %0,%1"` into `("cnot", [0, 1])`.
fn parse_invocation(text: &str) -> Option<(String, Vec<usize>)> {
    let text = text.trim();
    let (name, args) = match text.split_once(' ') {
        Some((name, args)) => (name, args.trim()),
        None => (text, ""),
    };
    if name.is_empty() {
        return None;
    }
    let params = if args.is_empty() {
        Vec::new()
    } else {
        args.split(',')
            .map(|a| a.trim().strip_prefix('%')?.parse().ok())
            .collect::<Option<Vec<usize>>>()?
    };
    Some((name.to_string(), params))
}

/// Named gate definitions of a platform.
#[derive(Debug, Clone, Default)]
pub struct InstructionLibrary {
    instructions: FxHashMap<String, InstructionDef>,
    decompositions: FxHashMap<String, Decomposition>,
}

impl InstructionLibrary {
    /// Build the library, parsing and checking every decomposition.
    pub fn new(
        instructions: &BTreeMap<String, InstructionDef>,
        decompositions: &BTreeMap<String, Vec<String>>,
    ) -> PlatformResult<Self> {
        let instructions: FxHashMap<String, InstructionDef> = instructions
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut parsed = FxHashMap::default();
        for (key, parts) in decompositions {
            let invalid = |reason: String| PlatformError::InvalidDecomposition {
                name: key.clone(),
                reason,
            };
            let (name, params) =
                parse_invocation(key).ok_or_else(|| invalid("cannot parse name".into()))?;
            if params.iter().enumerate().any(|(i, &p)| p != i) {
                return Err(invalid("parameters must be %0, %1, ... in order".into()));
            }
            let arity = params.len();

            let mut resolved = Vec::with_capacity(parts.len());
            for part in parts {
                let (pname, pparams) = parse_invocation(part)
                    .ok_or_else(|| invalid(format!("cannot parse part '{part}'")))?;
                if pname != "wait" && !instructions.contains_key(&pname) {
                    return Err(invalid(format!("part '{pname}' is not a configured instruction")));
                }
                if let Some(&p) = pparams.iter().find(|&&p| p >= arity) {
                    return Err(invalid(format!("part '{part}' uses %{p} beyond arity {arity}")));
                }
                resolved.push((pname, pparams));
            }
            parsed.insert(name, Decomposition {
                arity,
                parts: resolved,
            });
        }

        Ok(Self {
            instructions,
            decompositions: parsed,
        })
    }

    /// Whether `name` is a configured instruction or decomposition.
    pub fn contains(&self, name: &str) -> bool {
        self.instructions.contains_key(name) || self.decompositions.contains_key(name)
    }

    /// Configured duration of a plain instruction.
    pub fn duration(&self, name: &str) -> Option<u64> {
        self.instructions.get(name).map(|d| d.duration)
    }

    /// Create the gate(s) named `name` on the given operands.
    ///
    /// A decomposition yields its parts; a plain instruction yields one
    /// gate, with `duration` overriding the configured one when given.
    /// `wait` is always available. Returns `None` when nothing with this
    /// name (and, for decompositions, this arity) is configured.
    pub fn try_create(
        &self,
        name: &str,
        qubits: &[usize],
        cregs: &[usize],
        duration: Option<u64>,
        angle: f64,
    ) -> Option<Vec<Gate>> {
        if let Some(dec) = self.decompositions.get(name) {
            if dec.arity != qubits.len() {
                return None;
            }
            return dec
                .parts
                .iter()
                .map(|(pname, params)| {
                    let operands: Vec<usize> = params.iter().map(|&p| qubits[p]).collect();
                    self.create_one(pname, operands, cregs, None, angle)
                })
                .collect();
        }
        self.create_one(name, qubits.to_vec(), cregs, duration, angle)
            .map(|g| vec![g])
    }

    fn create_one(
        &self,
        name: &str,
        qubits: Vec<usize>,
        cregs: &[usize],
        duration: Option<u64>,
        angle: f64,
    ) -> Option<Gate> {
        let gate = match self.instructions.get(name) {
            Some(def) => Gate::new(name, def.kind.into(), qubits)
                .with_duration(duration.unwrap_or(def.duration)),
            None if name == "wait" => Gate::wait(qubits, duration.unwrap_or(0)),
            None => return None,
        };
        Some(gate.with_cregs(cregs.to_vec()).with_angle(angle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> InstructionLibrary {
        let mut instr = BTreeMap::new();
        instr.insert("cnot".to_string(), InstructionDef::new(40, InstructionType::Flux));
        instr.insert("x".to_string(), InstructionDef::new(20, InstructionType::Mw));
        instr.insert("measure".to_string(), InstructionDef::new(300, InstructionType::Readout));
        let mut dec = BTreeMap::new();
        dec.insert(
            "swap %0,%1".to_string(),
            vec!["cnot %0,%1".to_string(), "cnot %1,%0".to_string(), "cnot %0,%1".to_string()],
        );
        InstructionLibrary::new(&instr, &dec).unwrap()
    }

    #[test]
    fn test_parse_invocation() {
        assert_eq!(parse_invocation("cnot %0,%1"), Some(("cnot".into(), vec![0, 1])));
        assert_eq!(parse_invocation(" x %0 "), Some(("x".into(), vec![0])));
        assert_eq!(parse_invocation("sync"), Some(("sync".into(), vec![])));
        assert_eq!(parse_invocation("cnot q0,q1"), None);
    }

    #[test]
    fn test_plain_instruction() {
        let lib = library();
        let gates = lib.try_create("x", &[3], &[], None, 0.0).unwrap();
        assert_eq!(gates.len(), 1);
        assert_eq!(gates[0].duration, 20);
        assert_eq!(gates[0].qubits, vec![3]);
        assert_eq!(gates[0].kind, GateKind::Custom);

        let gates = lib.try_create("x", &[3], &[], Some(60), 0.0).unwrap();
        assert_eq!(gates[0].duration, 60);

        let gates = lib.try_create("measure", &[0], &[1], None, 0.0).unwrap();
        assert_eq!(gates[0].kind, GateKind::Measure);
        assert_eq!(gates[0].cregs, vec![1]);
    }

    #[test]
    fn test_decomposition() {
        let lib = library();
        let gates = lib.try_create("swap", &[2, 5], &[], None, 0.0).unwrap();
        let operands: Vec<_> = gates.iter().map(|g| g.qubits.clone()).collect();
        assert_eq!(operands, vec![vec![2, 5], vec![5, 2], vec![2, 5]]);
        assert!(gates.iter().all(|g| g.name == "cnot" && g.duration == 40));
        assert!(lib.try_create("swap", &[2], &[], None, 0.0).is_none());
    }

    #[test]
    fn test_unknown_and_builtin_wait() {
        let lib = library();
        assert!(lib.try_create("move", &[0, 1], &[], None, 0.0).is_none());
        let gates = lib.try_create("wait", &[0], &[], Some(40), 0.0).unwrap();
        assert_eq!(gates[0].kind, GateKind::Wait);
        assert_eq!(gates[0].duration, 40);
    }

    #[test]
    fn test_bad_decomposition() {
        let instr = BTreeMap::new();
        let mut dec = BTreeMap::new();
        dec.insert("swap %0,%1".to_string(), vec!["cz %0,%1".to_string()]);
        assert!(matches!(
            InstructionLibrary::new(&instr, &dec),
            Err(PlatformError::InvalidDecomposition { .. })
        ));

        let mut instr = BTreeMap::new();
        instr.insert("cz".to_string(), InstructionDef::new(40, InstructionType::Flux));
        let mut dec = BTreeMap::new();
        dec.insert("swap %0,%1".to_string(), vec!["cz %0,%2".to_string()]);
        assert!(InstructionLibrary::new(&instr, &dec).is_err());
    }
}
